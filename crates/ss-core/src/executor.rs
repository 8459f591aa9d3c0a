//! Command execution with a wall-clock timeout.
//!
//! Runs an approved command under `sh -c` in the current working directory,
//! capturing both output streams, the exit code, and the duration. The
//! function is total: timeouts and launch faults come back as a failed
//! `ExecutionResult`, never as an error or panic. Callers must classify the
//! command and obtain confirmation before invoking this module.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::time::timeout;

/// Default wall-clock timeout for command execution.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything captured from one command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub succeeded: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: u64,
}

impl ExecutionResult {
    fn fault(message: String, duration_ms: u64) -> Self {
        Self {
            succeeded: false,
            stdout: String::new(),
            stderr: message,
            exit_code: -1,
            duration_ms,
        }
    }
}

/// Run a command with a timeout, capturing output as text.
///
/// The child inherits the current environment and working directory. On
/// timeout the process is killed and the result reports exit code -1 with a
/// synthetic timeout message; no partial output is preserved.
pub async fn run(command: &str, timeout_secs: u64) -> ExecutionResult {
    let start = Instant::now();

    let child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(e) => {
            return ExecutionResult::fault(
                format!("Failed to launch: {e}"),
                start.elapsed().as_millis() as u64,
            )
        }
    };

    match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let exit_code = output.status.code().unwrap_or(-1);
            ExecutionResult {
                succeeded: exit_code == 0,
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                exit_code,
                duration_ms: start.elapsed().as_millis() as u64,
            }
        }
        Ok(Err(e)) => ExecutionResult::fault(
            format!("Failed to execute: {e}"),
            start.elapsed().as_millis() as u64,
        ),
        // Dropping the wait future kills the child (kill_on_drop).
        Err(_) => ExecutionResult::fault(
            format!("Command timed out after {timeout_secs} seconds."),
            start.elapsed().as_millis() as u64,
        ),
    }
}
