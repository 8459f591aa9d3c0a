//! ss-core: safety layer and interactive loop for ShellSensei.
//!
//! Exposed as a library so integration tests can drive the full
//! propose/confirm/execute flow without a terminal.

pub mod aliases;
pub mod audit;
pub mod cache;
pub mod config;
pub mod executor;
pub mod history;
pub mod policy;
pub mod repl;
pub mod session;
