//! Mock oracle for tests and offline runs.
//!
//! Returns canned suggestions by exact query match, falling back to an
//! empty-command answer, which is also the shape a real provider degrades
//! to when it cannot produce a runnable command.

use std::collections::BTreeMap;

use crate::suggestion::{CommandSuggestion, Oracle, OracleError, QueryContext};

#[derive(Debug, Default)]
pub struct MockOracle {
    canned: BTreeMap<String, CommandSuggestion>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a canned suggestion for an exact query string.
    pub fn with_suggestion(mut self, query: &str, suggestion: CommandSuggestion) -> Self {
        self.canned.insert(query.to_string(), suggestion);
        self
    }

    /// Shorthand for the common case of a plain safe command.
    pub fn with_command(self, query: &str, command: &str, explanation: &str) -> Self {
        self.with_suggestion(
            query,
            CommandSuggestion {
                command: command.to_string(),
                explanation: explanation.to_string(),
                ..Default::default()
            },
        )
    }
}

impl Oracle for MockOracle {
    fn suggest(
        &self,
        query: &str,
        _profile: &str,
        _context: &QueryContext,
    ) -> Result<CommandSuggestion, OracleError> {
        if let Some(suggestion) = self.canned.get(query) {
            return Ok(suggestion.clone());
        }
        Ok(CommandSuggestion {
            explanation: format!("No canned answer for: {query}"),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestion::{NextStep, SafetyHint};

    #[test]
    fn canned_query_returns_registered_suggestion() {
        let oracle = MockOracle::new().with_suggestion(
            "install docker",
            CommandSuggestion {
                command: "sudo apt install docker.io".to_string(),
                explanation: "Installs Docker.".to_string(),
                safety: SafetyHint::Caution,
                warning: "Uses sudo.".to_string(),
                next_steps: vec![NextStep {
                    cmd: "docker run hello-world".to_string(),
                    why: "verify the install".to_string(),
                }],
            },
        );

        let suggestion = oracle
            .suggest("install docker", "", &QueryContext::default())
            .unwrap();
        assert_eq!(suggestion.command, "sudo apt install docker.io");
        assert_eq!(suggestion.safety, SafetyHint::Caution);
    }

    #[test]
    fn unknown_query_degrades_to_empty_command() {
        let oracle = MockOracle::new();
        let suggestion = oracle
            .suggest("how do I exit vim", "", &QueryContext::default())
            .unwrap();
        assert!(suggestion.command.is_empty());
        assert!(suggestion.explanation.contains("how do I exit vim"));
    }

    #[test]
    fn with_command_shorthand() {
        let oracle = MockOracle::new().with_command("list files", "ls -la", "Lists everything.");
        let suggestion = oracle
            .suggest("list files", "", &QueryContext::default())
            .unwrap();
        assert_eq!(suggestion.command, "ls -la");
        assert_eq!(suggestion.safety, SafetyHint::Safe);
    }
}
