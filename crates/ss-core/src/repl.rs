//! Line-oriented interactive loop.
//!
//! The loop is a thin caller over the session: `run <cmd>` proposes a raw
//! command, `/name` proposes an alias, `y`/`n` answers a pending
//! confirmation, and any other line is a plain-English query sent to the
//! oracle through the response cache. `handle_line` is pure with respect
//! to the terminal (it returns the lines to print), so the whole loop is
//! testable without a TTY.

use std::io::{self, BufRead, Write};

use ss_oracle::{CommandSuggestion, Oracle, QueryContext};

use crate::cache::ResponseCache;
use crate::history;
use crate::session::{Answer, Cancellation, Confirmation, PendingAction, Proposal, Runner, Session};

/// Whether the loop should keep reading lines.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Continue,
    Quit,
}

pub struct Repl<R: Runner, O: Oracle> {
    session: Session<R>,
    oracle: O,
    cache: Option<ResponseCache>,
    shell_history: Vec<String>,
    /// Cache key context: cwd plus shell name, captured at startup.
    profile: String,
    last_error: Option<String>,
}

impl<R: Runner, O: Oracle> Repl<R, O> {
    pub fn new(
        session: Session<R>,
        oracle: O,
        cache: Option<ResponseCache>,
        shell_history: Vec<String>,
    ) -> Self {
        let cwd = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "/".to_string());
        let shell = std::env::var("SHELL").unwrap_or_default();
        Self {
            session,
            oracle,
            cache,
            shell_history,
            profile: format!("{cwd}|{shell}"),
            last_error: None,
        }
    }

    /// Process one input line and return what to print.
    pub async fn handle_line(&mut self, line: &str) -> (Step, Vec<String>) {
        let line = line.trim();
        if line.is_empty() {
            return (Step::Continue, Vec::new());
        }

        // A pending action owns the y/n vocabulary; anything else falls
        // through and supersedes it.
        if self.session.pending() != &PendingAction::None {
            match Answer::parse(line) {
                Answer::Yes => return (Step::Continue, self.run_confirmed().await),
                Answer::No => {
                    let out = match self.session.cancel() {
                        Cancellation::Cancelled(cmd) => vec![format!("Cancelled: {cmd}")],
                        Cancellation::NothingPending => Vec::new(),
                    };
                    return (Step::Continue, out);
                }
                Answer::Other => {}
            }
        }

        match line {
            "exit" | "quit" => (Step::Quit, vec!["Bye.".to_string()]),
            "help" => (Step::Continue, help_text()),
            "history" => (Step::Continue, self.history_text()),
            _ => {
                if let Some(cmd) = line.strip_prefix("run ") {
                    let proposal = self.session.propose_command(cmd.trim());
                    (Step::Continue, render_proposal(&proposal))
                } else if let Some(name) = line.strip_prefix('/') {
                    let proposal = self.session.propose_alias(name.trim());
                    (Step::Continue, self.render_alias_proposal(&proposal))
                } else {
                    (Step::Continue, self.ask_oracle(line))
                }
            }
        }
    }

    /// Blocking stdin/stdout loop around `handle_line`.
    pub async fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            write!(stdout, "{}", self.prompt())?;
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break; // EOF
            }

            let (step, output) = self.handle_line(&line).await;
            for msg in output {
                writeln!(stdout, "{msg}")?;
            }
            if step == Step::Quit {
                break;
            }
        }
        Ok(())
    }

    fn prompt(&self) -> &'static str {
        match self.session.pending() {
            PendingAction::None => "sensei> ",
            _ => "[y/n]> ",
        }
    }

    async fn run_confirmed(&mut self) -> Vec<String> {
        match self.session.confirm().await {
            Confirmation::Executed { command, result } => {
                let mut out = Vec::new();
                if !result.stdout.is_empty() {
                    out.push(result.stdout.trim_end().to_string());
                }
                if !result.stderr.is_empty() {
                    out.push(result.stderr.trim_end().to_string());
                }
                if result.succeeded {
                    out.push(format!("ok ({} ms)", result.duration_ms));
                    self.last_error = None;
                } else {
                    out.push(format!("failed with exit code {}", result.exit_code));
                    self.last_error = Some(result.stderr.trim_end().to_string());
                }
                self.shell_history.push(command);
                out
            }
            Confirmation::NothingPending => Vec::new(),
        }
    }

    fn render_alias_proposal(&self, proposal: &Proposal) -> Vec<String> {
        match proposal {
            Proposal::UnknownAlias(name) => {
                let known: Vec<&str> = self.session.aliases().names().collect();
                vec![format!(
                    "Unknown alias '{name}'. Available: {}",
                    if known.is_empty() {
                        "(none)".to_string()
                    } else {
                        known.join(", ")
                    }
                )]
            }
            other => render_proposal(other),
        }
    }

    /// Plain-English query: consult the cache, then the oracle. A
    /// suggestion with a runnable command enters the confirmation flow
    /// like any other proposal.
    fn ask_oracle(&mut self, query: &str) -> Vec<String> {
        let suggestion = match self.lookup(query) {
            Ok(suggestion) => suggestion,
            Err(e) => return vec![format!("oracle error: {e}")],
        };

        let mut out = Vec::new();
        if !suggestion.explanation.is_empty() {
            out.push(suggestion.explanation.clone());
        }
        if !suggestion.warning.is_empty() {
            out.push(format!("warning: {}", suggestion.warning));
        }
        for step in &suggestion.next_steps {
            out.push(format!("  next: {} ({})", step.cmd, step.why));
        }

        if suggestion.command.is_empty() {
            return out;
        }
        out.push(format!("$ {}", suggestion.command));
        out.extend(render_proposal(
            &self.session.propose_command(&suggestion.command),
        ));
        out
    }

    fn lookup(&mut self, query: &str) -> Result<CommandSuggestion, ss_oracle::OracleError> {
        if let Some(cache) = &self.cache {
            if let Some(payload) = cache.get(query, &self.profile) {
                match serde_json::from_slice(&payload) {
                    Ok(suggestion) => return Ok(suggestion),
                    // Verified but undeserializable: purge and re-ask.
                    Err(_) => cache.remove(query, &self.profile),
                }
            }
        }

        let context = self.query_context();
        let suggestion = self.oracle.suggest(query, &self.profile, &context)?;

        if let Some(cache) = &self.cache {
            if let Ok(payload) = serde_json::to_vec(&suggestion) {
                cache.put(query, &self.profile, &payload);
            }
        }
        Ok(suggestion)
    }

    fn query_context(&self) -> QueryContext {
        let cwd = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "/".to_string());
        let files = std::fs::read_dir(&cwd)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        let history = self
            .shell_history
            .iter()
            .rev()
            .take(5)
            .rev()
            .cloned()
            .collect();
        QueryContext {
            cwd,
            files,
            history,
            last_error: self.last_error.clone(),
        }
    }

    fn history_text(&self) -> Vec<String> {
        if self.shell_history.is_empty() {
            return vec!["(no history)".to_string()];
        }
        self.shell_history
            .iter()
            .enumerate()
            .map(|(i, cmd)| format!("{:3}  {cmd}", i + 1))
            .collect()
    }
}

fn render_proposal(proposal: &Proposal) -> Vec<String> {
    match proposal {
        Proposal::Refused(verdict) => vec![format!("Refused. {}", verdict.summary())],
        Proposal::AwaitingConfirm(verdict) => {
            let mut out = Vec::new();
            for reason in &verdict.reasons {
                out.push(format!("caution: {reason}"));
            }
            out.push("Run this? [y/n]".to_string());
            out
        }
        Proposal::AwaitingAliasConfirm { name, command } => {
            vec![format!("{name} -> {command}"), "Run this? [y/n]".to_string()]
        }
        Proposal::UnknownAlias(name) => vec![format!("Unknown alias '{name}'.")],
    }
}

fn help_text() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  run <command>   propose a shell command for confirmed execution".to_string(),
        "  /<alias>        propose a saved alias".to_string(),
        "  y / n           confirm or cancel the pending command".to_string(),
        "  history         show commands run this session".to_string(),
        "  help            this text".to_string(),
        "  exit            quit".to_string(),
        "Anything else is sent to the oracle as a plain-English question.".to_string(),
    ]
}

/// Load shell-history context for the session, capped by config.
pub fn load_shell_history(max_entries: usize) -> Vec<String> {
    history::read_history(max_entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::AliasStore;
    use crate::audit::AuditLog;
    use crate::executor::ExecutionResult;
    use ss_oracle::{MockOracle, OracleError, SafetyHint};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeRunner {
        calls: Arc<AtomicUsize>,
        result: ExecutionResult,
    }

    impl Runner for FakeRunner {
        async fn run(&self, _command: &str, _timeout_secs: u64) -> ExecutionResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    struct CountingOracle {
        inner: MockOracle,
        calls: Arc<AtomicUsize>,
    }

    impl Oracle for CountingOracle {
        fn suggest(
            &self,
            query: &str,
            profile: &str,
            context: &QueryContext,
        ) -> Result<CommandSuggestion, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.suggest(query, profile, context)
        }
    }

    fn ok_result() -> ExecutionResult {
        ExecutionResult {
            succeeded: true,
            stdout: "done\n".to_string(),
            stderr: String::new(),
            exit_code: 0,
            duration_ms: 3,
        }
    }

    fn repl_with(
        aliases: &[(&str, &str)],
        oracle: MockOracle,
        cache: Option<ResponseCache>,
    ) -> (Repl<FakeRunner, MockOracle>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = FakeRunner {
            calls: calls.clone(),
            result: ok_result(),
        };
        let map: BTreeMap<String, String> = aliases
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let session =
            Session::with_runner(AliasStore::from_entries(map), runner, 30, AuditLog::noop());
        (Repl::new(session, oracle, cache, Vec::new()), calls)
    }

    #[tokio::test]
    async fn run_then_yes_executes() {
        let (mut repl, calls) = repl_with(&[], MockOracle::new(), None);

        let (_, out) = repl.handle_line("run echo hi").await;
        assert!(out.iter().any(|l| l.contains("[y/n]")));

        let (_, out) = repl.handle_line("y").await;
        assert!(out.iter().any(|l| l.contains("ok (")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_then_no_cancels() {
        let (mut repl, calls) = repl_with(&[], MockOracle::new(), None);

        repl.handle_line("run echo hi").await;
        let (_, out) = repl.handle_line("n").await;
        assert!(out.iter().any(|l| l.starts_with("Cancelled")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dangerous_command_is_refused() {
        let (mut repl, calls) = repl_with(&[], MockOracle::new(), None);

        let (_, out) = repl.handle_line("run rm -rf /").await;
        assert!(out.iter().any(|l| l.starts_with("Refused")));

        // There is nothing pending, so "y" is treated as a query, not a
        // confirmation.
        repl.handle_line("y").await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn alias_flow() {
        let (mut repl, calls) = repl_with(&[("ll", "ls -la")], MockOracle::new(), None);

        let (_, out) = repl.handle_line("/ll").await;
        assert!(out.iter().any(|l| l.contains("ll -> ls -la")));

        repl.handle_line("y").await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_alias_lists_known_names() {
        let (mut repl, _) = repl_with(&[("ll", "ls -la")], MockOracle::new(), None);
        let (_, out) = repl.handle_line("/nope").await;
        assert!(out[0].contains("Unknown alias 'nope'"));
        assert!(out[0].contains("ll"));
    }

    #[tokio::test]
    async fn other_text_supersedes_pending() {
        let oracle = MockOracle::new().with_command("list files", "ls", "Lists files.");
        let (mut repl, calls) = repl_with(&[], oracle, None);

        repl.handle_line("run echo first").await;
        // Not y/n, so it falls through and replaces the pending command.
        repl.handle_line("list files").await;
        let (_, _) = repl.handle_line("y").await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn oracle_suggestion_enters_confirmation() {
        let oracle = MockOracle::new().with_suggestion(
            "install docker",
            CommandSuggestion {
                command: "sudo apt install docker.io".to_string(),
                explanation: "Installs Docker.".to_string(),
                safety: SafetyHint::Caution,
                warning: "Needs sudo.".to_string(),
                ..Default::default()
            },
        );
        let (mut repl, _) = repl_with(&[], oracle, None);

        let (_, out) = repl.handle_line("install docker").await;
        assert!(out.iter().any(|l| l == "Installs Docker."));
        assert!(out.iter().any(|l| l.contains("warning: Needs sudo.")));
        assert!(out.iter().any(|l| l.contains("[y/n]")));
    }

    #[tokio::test]
    async fn empty_command_suggestion_stays_idle() {
        let (mut repl, _) = repl_with(&[], MockOracle::new(), None);
        let (_, out) = repl.handle_line("what is a symlink").await;
        assert!(out.iter().all(|l| !l.contains("[y/n]")));
        assert_eq!(repl.session.pending(), &PendingAction::None);
    }

    #[tokio::test]
    async fn repeated_query_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::open(dir.path().to_path_buf());
        let oracle_calls = Arc::new(AtomicUsize::new(0));
        let oracle = CountingOracle {
            inner: MockOracle::new().with_command("list files", "ls", "Lists files."),
            calls: oracle_calls.clone(),
        };

        let runner_calls = Arc::new(AtomicUsize::new(0));
        let runner = FakeRunner {
            calls: runner_calls,
            result: ok_result(),
        };
        let session = Session::with_runner(
            AliasStore::from_entries(BTreeMap::new()),
            runner,
            30,
            AuditLog::noop(),
        );
        let mut repl = Repl::new(session, oracle, Some(cache), Vec::new());

        repl.handle_line("list files").await;
        repl.handle_line("n").await;
        repl.handle_line("list files").await;
        assert_eq!(oracle_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn quit_and_help() {
        let (mut repl, _) = repl_with(&[], MockOracle::new(), None);
        let (step, _) = repl.handle_line("help").await;
        assert_eq!(step, Step::Continue);
        let (step, _) = repl.handle_line("exit").await;
        assert_eq!(step, Step::Quit);
    }

    #[tokio::test]
    async fn failed_execution_records_last_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = FakeRunner {
            calls,
            result: ExecutionResult {
                succeeded: false,
                stdout: String::new(),
                stderr: "No such file or directory\n".to_string(),
                exit_code: 2,
                duration_ms: 1,
            },
        };
        let session = Session::with_runner(
            AliasStore::from_entries(BTreeMap::new()),
            runner,
            30,
            AuditLog::noop(),
        );
        let mut repl = Repl::new(session, MockOracle::new(), None, Vec::new());

        repl.handle_line("run cat /nope").await;
        let (_, out) = repl.handle_line("y").await;
        assert!(out.iter().any(|l| l.contains("exit code 2")));
        assert_eq!(
            repl.last_error.as_deref(),
            Some("No such file or directory")
        );
    }
}
