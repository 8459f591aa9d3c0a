//! Append-only JSONL audit log for the confirmation flow.
//!
//! One JSON object per line: commands proposed, blocked by policy,
//! confirmed, cancelled, and executed. Write errors are ignored — the
//! audit trail must never take the session down with it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub struct AuditLog {
    writer: Option<BufWriter<File>>,
    session_id: String,
}

impl AuditLog {
    /// Open an audit log at `path`, creating parent directories as needed.
    pub fn open(path: &PathBuf) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            session_id: generate_session_id(),
        })
    }

    /// A logger that discards every event.
    pub fn noop() -> Self {
        Self {
            writer: None,
            session_id: generate_session_id(),
        }
    }

    /// A command (or resolved alias) entered the confirmation flow.
    pub fn log_proposed(&mut self, command: &str, tier: &str, source: &str) {
        self.write_event(serde_json::json!({
            "ts": epoch_secs(),
            "session": self.session_id,
            "type": "proposed",
            "command": command,
            "tier": tier,
            "source": source,
        }));
    }

    /// A command was refused outright by the classifier.
    pub fn log_blocked(&mut self, command: &str, reason: &str) {
        self.write_event(serde_json::json!({
            "ts": epoch_secs(),
            "session": self.session_id,
            "type": "blocked",
            "command": command,
            "reason": reason,
        }));
    }

    /// The user confirmed the pending action.
    pub fn log_confirmed(&mut self, command: &str) {
        self.write_event(serde_json::json!({
            "ts": epoch_secs(),
            "session": self.session_id,
            "type": "confirmed",
            "command": command,
        }));
    }

    /// The user cancelled the pending action.
    pub fn log_cancelled(&mut self, command: &str) {
        self.write_event(serde_json::json!({
            "ts": epoch_secs(),
            "session": self.session_id,
            "type": "cancelled",
            "command": command,
        }));
    }

    /// A confirmed command finished executing.
    pub fn log_executed(&mut self, command: &str, exit_code: i32, duration_ms: u64) {
        self.write_event(serde_json::json!({
            "ts": epoch_secs(),
            "session": self.session_id,
            "type": "executed",
            "command": command,
            "exit_code": exit_code,
            "duration_ms": duration_ms,
        }));
    }

    fn write_event(&mut self, value: serde_json::Value) {
        if let Some(ref mut writer) = self.writer {
            if let Ok(line) = serde_json::to_string(&value) {
                let _ = writeln!(writer, "{line}");
                let _ = writer.flush();
            }
        }
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn generate_session_id() -> String {
    let pid = std::process::id();
    let ts = epoch_secs();
    format!("s{:x}", pid ^ (ts as u32))
}
