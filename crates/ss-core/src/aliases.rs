//! User-defined command aliases with load-time validation.
//!
//! Aliases live in a JSON file (`name` → command text) read once at session
//! start. Entries whose command matches the dangerous-substring denylist
//! are excluded from the active set but left in the file, so a user can fix
//! them by hand; to the session they simply do not exist.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::RegexBuilder;

/// Denylist applied to alias commands at load time (case-insensitive).
const DENIED_ALIAS_PATTERNS: &[&str] = &[
    r"curl\s+http",  // remote download
    r"wget\s+http",  // remote download
    r"\$\(",         // command substitution
    r"`",            // backtick substitution
    r";\s*rm\s+-rf", // force-delete chained after another command
    r"\|\s*sh",      // piped shell execution
    r"\|\s*bash",    // piped bash execution
];

static DENIED: LazyLock<Vec<regex::Regex>> = LazyLock::new(|| {
    DENIED_ALIAS_PATTERNS
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .expect("alias denylist pattern must compile")
        })
        .collect()
});

/// Aliases written on first run, before the user has defined any.
fn default_aliases() -> BTreeMap<String, String> {
    [
        ("update", "sudo apt update && sudo apt upgrade -y"),
        ("ports", "sudo netstat -tulpn"),
        ("myip", "curl -s ifconfig.me"),
        ("clean", "sudo apt autoremove -y && sudo apt clean"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// The active alias set: loaded once, read-only for the session.
#[derive(Debug, Default)]
pub struct AliasStore {
    active: BTreeMap<String, String>,
    rejected: usize,
}

impl AliasStore {
    /// Load aliases from `path`, filtering out denied entries.
    ///
    /// If the file does not exist, the default set is written and loaded.
    /// An unreadable or unparsable file yields an empty store — aliases
    /// are a convenience, never a reason to fail startup.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            let defaults = default_aliases();
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(json) = serde_json::to_string_pretty(&defaults) {
                let _ = std::fs::write(path, json);
            }
            return Self::from_entries(defaults);
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
            Ok(entries) => Self::from_entries(entries),
            Err(_) => Self::default(),
        }
    }

    /// Build a store from raw entries, applying the denylist.
    pub fn from_entries(entries: BTreeMap<String, String>) -> Self {
        let total = entries.len();
        let active: BTreeMap<String, String> = entries
            .into_iter()
            .filter(|(_, command)| is_safe_alias(command))
            .collect();
        let rejected = total - active.len();
        Self { active, rejected }
    }

    /// Resolve an alias name to its command text.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.active.get(name).map(String::as_str)
    }

    /// Names in the active set, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.active.keys().map(String::as_str)
    }

    /// How many stored entries were excluded by the denylist.
    pub fn rejected_count(&self) -> usize {
        self.rejected
    }
}

fn is_safe_alias(command: &str) -> bool {
    !DENIED.iter().any(|p| p.is_match(command))
}
