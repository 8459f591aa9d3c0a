//! The propose → confirm/cancel → execute state machine.
//!
//! A session holds at most one pending action — a classified command or a
//! resolved alias — awaiting the user's yes/no. Proposing a new action
//! while one is pending silently discards the old one; there is no queue.
//! Dangerous commands are refused at proposal time and never become
//! pending. Execution happens only from `confirm`, through the session's
//! runner, so the single-pending invariant also bounds in-flight
//! executions to one.

use crate::aliases::AliasStore;
use crate::audit::AuditLog;
use crate::executor::{self, ExecutionResult};
use crate::policy::{classify, RiskTier, Verdict};

/// The one action a session may have awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    None,
    Command(String),
    Alias { name: String, command: String },
}

/// Outcome of a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proposal {
    /// Classifier said Dangerous; nothing was queued.
    Refused(Verdict),
    /// Command queued; verdict (tier + warnings) surfaced for display.
    AwaitingConfirm(Verdict),
    /// Alias resolved and queued; resolved text surfaced for display.
    AwaitingAliasConfirm { name: String, command: String },
    /// No such alias in the active set.
    UnknownAlias(String),
}

/// Outcome of `confirm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Executed {
        command: String,
        result: ExecutionResult,
    },
    NothingPending,
}

/// Outcome of `cancel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cancellation {
    Cancelled(String),
    NothingPending,
}

/// The confirmation vocabulary. Anything that is not a clear yes or no is
/// `Other` and must fall through to normal input handling, superseding the
/// pending action only if the caller proposes something new.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Other,
}

impl Answer {
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => Answer::Yes,
            "n" | "no" => Answer::No,
            _ => Answer::Other,
        }
    }
}

/// Seam between the state machine and the execution sandbox, so tests can
/// count invocations without spawning processes.
#[allow(async_fn_in_trait)]
pub trait Runner {
    async fn run(&self, command: &str, timeout_secs: u64) -> ExecutionResult;
}

/// The production runner: delegates to the execution sandbox.
pub struct Sandbox;

impl Runner for Sandbox {
    async fn run(&self, command: &str, timeout_secs: u64) -> ExecutionResult {
        executor::run(command, timeout_secs).await
    }
}

pub struct Session<R: Runner> {
    aliases: AliasStore,
    runner: R,
    timeout_secs: u64,
    audit: AuditLog,
    pending: PendingAction,
}

impl Session<Sandbox> {
    pub fn new(aliases: AliasStore, timeout_secs: u64, audit: AuditLog) -> Self {
        Self::with_runner(aliases, Sandbox, timeout_secs, audit)
    }
}

impl<R: Runner> Session<R> {
    pub fn with_runner(aliases: AliasStore, runner: R, timeout_secs: u64, audit: AuditLog) -> Self {
        Self {
            aliases,
            runner,
            timeout_secs,
            audit,
            pending: PendingAction::None,
        }
    }

    pub fn pending(&self) -> &PendingAction {
        &self.pending
    }

    pub fn is_idle(&self) -> bool {
        self.pending == PendingAction::None
    }

    pub fn aliases(&self) -> &AliasStore {
        &self.aliases
    }

    /// Propose a command for confirmation. Dangerous commands are refused
    /// and the session returns to idle; anything else becomes the pending
    /// action, discarding whatever was pending before.
    pub fn propose_command(&mut self, text: &str) -> Proposal {
        let verdict = classify(text);
        if verdict.tier == RiskTier::Dangerous {
            self.audit.log_blocked(text, &verdict.summary());
            self.pending = PendingAction::None;
            return Proposal::Refused(verdict);
        }

        self.audit.log_proposed(text, verdict.tier.as_str(), "command");
        self.pending = PendingAction::Command(text.to_string());
        Proposal::AwaitingConfirm(verdict)
    }

    /// Propose an alias by name. The resolved command is surfaced for
    /// display but not re-classified: the active set was already filtered
    /// at load time, and confirmation alone gates execution.
    pub fn propose_alias(&mut self, name: &str) -> Proposal {
        let Some(command) = self.aliases.resolve(name) else {
            self.pending = PendingAction::None;
            return Proposal::UnknownAlias(name.to_string());
        };
        let command = command.to_string();

        self.audit.log_proposed(&command, "unclassified", "alias");
        self.pending = PendingAction::Alias {
            name: name.to_string(),
            command: command.clone(),
        };
        Proposal::AwaitingAliasConfirm {
            name: name.to_string(),
            command,
        }
    }

    /// Execute the pending action, returning the session to idle.
    pub async fn confirm(&mut self) -> Confirmation {
        let command = match std::mem::replace(&mut self.pending, PendingAction::None) {
            PendingAction::None => return Confirmation::NothingPending,
            PendingAction::Command(command) => command,
            PendingAction::Alias { command, .. } => command,
        };

        self.audit.log_confirmed(&command);
        let result = self.runner.run(&command, self.timeout_secs).await;
        self.audit
            .log_executed(&command, result.exit_code, result.duration_ms);
        Confirmation::Executed { command, result }
    }

    /// Discard the pending action without executing it.
    pub fn cancel(&mut self) -> Cancellation {
        match std::mem::replace(&mut self.pending, PendingAction::None) {
            PendingAction::None => Cancellation::NothingPending,
            PendingAction::Command(command) | PendingAction::Alias { command, .. } => {
                self.audit.log_cancelled(&command);
                Cancellation::Cancelled(command)
            }
        }
    }
}
