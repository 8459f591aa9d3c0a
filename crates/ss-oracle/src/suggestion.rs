//! Oracle wire format and the trait the core programs against.
//!
//! Oracles are expected to return a single JSON object, but real providers
//! like to wrap JSON in markdown fences anyway, so `parse_suggestion`
//! strips a ```/```json wrapper before parsing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    #[error("malformed oracle response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

/// The oracle's own coarse risk rating for its suggested command. Advisory
/// only: the caller runs its own classifier before anything executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyHint {
    #[default]
    Safe,
    Caution,
    Dangerous,
}

/// A follow-up command the oracle thinks the user may want next.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextStep {
    pub cmd: String,
    pub why: String,
}

/// One oracle answer. `command` may be empty when the query has no
/// runnable answer; `warning` is empty unless the hint is caution or worse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSuggestion {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub safety: SafetyHint,
    #[serde(default)]
    pub warning: String,
    #[serde(default)]
    pub next_steps: Vec<NextStep>,
}

/// Snapshot of the caller's environment, sent alongside the query so the
/// oracle can tailor its answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    pub cwd: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub last_error: Option<String>,
}

/// The interface the core calls: text in, structured suggestion out. No
/// state, no side effects visible to the caller.
pub trait Oracle {
    fn suggest(
        &self,
        query: &str,
        profile: &str,
        context: &QueryContext,
    ) -> Result<CommandSuggestion, OracleError>;
}

/// Parse an oracle response, tolerating a markdown code fence around the
/// JSON object.
pub fn parse_suggestion(text: &str) -> Result<CommandSuggestion, OracleError> {
    let text = strip_fences(text.trim());
    Ok(serde_json::from_str(text)?)
}

fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start();
    rest.strip_suffix("```").map_or(rest, str::trim_end)
}
