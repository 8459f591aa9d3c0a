use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub security: SecurityConfig,
    pub history: HistoryConfig,
    pub cache: CacheConfig,
    pub aliases: AliasConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable audit logging.
    pub audit_enabled: bool,
    /// Custom audit log path. Defaults to ~/.local/share/shellsensei/audit.jsonl.
    pub audit_log_path: Option<String>,
    /// Wall-clock timeout for confirmed commands, in seconds.
    pub command_timeout_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            audit_enabled: true,
            audit_log_path: None,
            command_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    /// How many shell-history entries to load for context.
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: 30 }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the oracle response cache.
    pub enabled: bool,
    /// Custom cache directory. Defaults to ~/.local/share/shellsensei/cache/.
    pub dir: Option<String>,
    /// Record lifetime in hours.
    pub ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            ttl_hours: 24,
        }
    }
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AliasConfig {
    /// Custom aliases file. Defaults to ~/.local/share/shellsensei/aliases.json.
    pub path: Option<String>,
}

impl Config {
    pub fn load_or_default() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("warning: failed to parse {}: {e}", path.display());
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }
}

impl SecurityConfig {
    /// Resolve the audit log path, using the configured path or the XDG default.
    pub fn resolve_audit_path(&self) -> PathBuf {
        match self.audit_log_path {
            Some(ref custom) => PathBuf::from(custom),
            None => data_dir().join("audit.jsonl"),
        }
    }
}

impl CacheConfig {
    /// Resolve the cache directory, using the configured path or the XDG default.
    pub fn resolve_dir(&self) -> PathBuf {
        match self.dir {
            Some(ref custom) => PathBuf::from(custom),
            None => data_dir().join("cache"),
        }
    }

    /// Configured record lifetime as a duration.
    pub fn ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.ttl_hours * 60 * 60)
    }
}

impl AliasConfig {
    /// Resolve the aliases file, using the configured path or the XDG default.
    pub fn resolve_path(&self) -> PathBuf {
        match self.path {
            Some(ref custom) => PathBuf::from(custom),
            None => data_dir().join("aliases.json"),
        }
    }
}

fn data_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("shellsensei")
}

fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("shellsensei").join("config.toml")
}
