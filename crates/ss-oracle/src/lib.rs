//! ss-oracle: suggestion oracle interface for ShellSensei.
//!
//! The core consumes the oracle as a pure function: query text plus
//! environment context in, a structured `CommandSuggestion` out. This crate
//! defines that interface, the JSON wire format, and a mock implementation
//! so every other layer can be tested without a network.

pub mod mock;
pub mod suggestion;

pub use mock::MockOracle;
pub use suggestion::{
    parse_suggestion, CommandSuggestion, NextStep, Oracle, OracleError, QueryContext, SafetyHint,
};
