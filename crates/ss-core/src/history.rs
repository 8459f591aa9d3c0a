//! Shell history parsing for bash, zsh, and fish.
//!
//! Reads the user's real history file, detected from `$SHELL`, and
//! normalizes the per-shell formats into a flat list of command strings
//! (oldest first). A missing or unreadable file degrades to an empty list;
//! history is context, never a hard dependency.

use std::path::{Path, PathBuf};

/// The history-file formats we know how to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDialect {
    /// One literal command per line.
    Bash,
    /// Extended-history lines `": <timestamp>:<elapsed>:<command>"`,
    /// plain lines otherwise.
    Zsh,
    /// Structured entries; only `- cmd: <command>` lines carry commands.
    Fish,
}

impl HistoryDialect {
    /// Detect the dialect from a shell command path (e.g. `$SHELL`).
    /// Unknown shells fall back to Bash, whose format is the least strict.
    pub fn detect(shell: &str) -> Self {
        let basename = shell.rsplit('/').next().unwrap_or(shell);
        // Strip leading dash (login shell convention)
        let name = basename.strip_prefix('-').unwrap_or(basename);
        match name {
            "zsh" => HistoryDialect::Zsh,
            "fish" => HistoryDialect::Fish,
            _ => HistoryDialect::Bash,
        }
    }

    /// History file path for this dialect, relative to `$HOME`.
    pub fn history_file(&self) -> &'static str {
        match self {
            HistoryDialect::Bash => ".bash_history",
            HistoryDialect::Zsh => ".zsh_history",
            HistoryDialect::Fish => ".local/share/fish/fish_history",
        }
    }
}

/// Parse raw history file contents into cleaned command strings.
///
/// Blank entries are removed; order is preserved (oldest first).
pub fn parse_lines(dialect: HistoryDialect, contents: &str) -> Vec<String> {
    let cleaned: Vec<String> = match dialect {
        HistoryDialect::Bash => contents.lines().map(|l| l.trim().to_string()).collect(),
        HistoryDialect::Zsh => contents
            .lines()
            .filter_map(|line| {
                if line.starts_with(": ") {
                    // ": 1700000000:0:command" — exactly 4 colon fields;
                    // metadata lines with fewer are malformed and dropped.
                    let parts: Vec<&str> = line.splitn(4, ':').collect();
                    if parts.len() >= 4 {
                        Some(parts[3].trim().to_string())
                    } else {
                        None
                    }
                } else {
                    Some(line.trim().to_string())
                }
            })
            .collect(),
        HistoryDialect::Fish => contents
            .lines()
            .filter_map(|line| line.strip_prefix("- cmd: "))
            .map(|cmd| cmd.trim().to_string())
            .collect(),
    };

    cleaned.into_iter().filter(|l| !l.is_empty()).collect()
}

/// Read the last `max_entries` commands from the active shell's history.
///
/// Returns an empty list if `$HOME` is unset or the file is missing or
/// unreadable.
pub fn read_history(max_entries: usize) -> Vec<String> {
    let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string());
    let dialect = HistoryDialect::detect(&shell);

    let home = match std::env::var("HOME") {
        Ok(home) => home,
        Err(_) => return Vec::new(),
    };
    let path = PathBuf::from(home).join(dialect.history_file());
    read_history_file(&path, dialect, max_entries)
}

/// Read and parse one history file. Bytes are decoded lossily: zsh metafies
/// multibyte input (raw bytes >= 0x80), and one such byte must not throw
/// away every other entry in the file.
fn read_history_file(path: &Path, dialect: HistoryDialect, max_entries: usize) -> Vec<String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return Vec::new(),
    };
    let contents = String::from_utf8_lossy(&bytes);
    last_n(parse_lines(dialect, &contents), max_entries)
}

/// Keep the last `max` entries, preserving oldest-to-newest order.
fn last_n(mut lines: Vec<String>, max: usize) -> Vec<String> {
    if lines.len() > max {
        lines.drain(..lines.len() - max);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_dialects() {
        assert_eq!(HistoryDialect::detect("/bin/bash"), HistoryDialect::Bash);
        assert_eq!(HistoryDialect::detect("/usr/bin/zsh"), HistoryDialect::Zsh);
        assert_eq!(
            HistoryDialect::detect("/usr/local/bin/fish"),
            HistoryDialect::Fish
        );
        assert_eq!(HistoryDialect::detect("-zsh"), HistoryDialect::Zsh);
        // Unknown shells fall back to bash
        assert_eq!(HistoryDialect::detect("/bin/sh"), HistoryDialect::Bash);
    }

    #[test]
    fn bash_lines_used_verbatim() {
        let lines = parse_lines(HistoryDialect::Bash, "ls -la\n  cd /tmp  \n\ngit status\n");
        assert_eq!(lines, vec!["ls -la", "cd /tmp", "git status"]);
    }

    #[test]
    fn zsh_metadata_lines_yield_fourth_field() {
        let contents = ": 1700000000:0:git pull\n: 1700000001:0:make test\n";
        let lines = parse_lines(HistoryDialect::Zsh, contents);
        assert_eq!(lines, vec!["git pull", "make test"]);
    }

    #[test]
    fn zsh_plain_lines_used_verbatim() {
        let lines = parse_lines(HistoryDialect::Zsh, "ls\n: 1700000000:0:pwd\n");
        assert_eq!(lines, vec!["ls", "pwd"]);
    }

    #[test]
    fn zsh_malformed_metadata_dropped() {
        // Second line has only 3 colon fields — dropped, not misparsed.
        let contents = ": 1700000000:0:echo ok\n: 1700000001:broken\n";
        let lines = parse_lines(HistoryDialect::Zsh, contents);
        assert_eq!(lines, vec!["echo ok"]);
    }

    #[test]
    fn zsh_command_containing_colons_is_kept_whole() {
        let contents = ": 1700000000:0:echo a:b:c\n";
        let lines = parse_lines(HistoryDialect::Zsh, contents);
        assert_eq!(lines, vec!["echo a:b:c"]);
    }

    #[test]
    fn fish_only_cmd_lines_kept() {
        let contents = "- cmd: ls -la\n  when: 1700000000\n- cmd: git status\n  when: 1700000001\n";
        let lines = parse_lines(HistoryDialect::Fish, contents);
        assert_eq!(lines, vec!["ls -la", "git status"]);
    }

    #[test]
    fn blank_entries_removed() {
        let lines = parse_lines(HistoryDialect::Bash, "\n   \nls\n\n");
        assert_eq!(lines, vec!["ls"]);
    }

    #[test]
    fn metafied_byte_does_not_discard_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".zsh_history");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b": 1700000000:0:git pull\n");
        // zsh metafied entry: a raw byte above 0x7f inside the command
        bytes.extend_from_slice(b": 1700000001:0:echo \x83caf\n");
        bytes.extend_from_slice(b": 1700000002:0:make test\n");
        std::fs::write(&path, &bytes).unwrap();

        let lines = read_history_file(&path, HistoryDialect::Zsh, 10);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "git pull");
        assert_eq!(lines[2], "make test");
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".bash_history");
        assert!(read_history_file(&path, HistoryDialect::Bash, 10).is_empty());
    }

    #[test]
    fn last_n_keeps_newest_in_order() {
        let lines: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(last_n(lines.clone(), 2), vec!["c", "d"]);
        assert_eq!(last_n(lines.clone(), 10), lines);
        assert!(last_n(lines, 0).is_empty());
    }
}
