//! Error types for the CLI

use async_runtime::AwaitError;
use core_types::JsError;

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// No scenario with that name
    #[error("unknown scenario '{0}' (use --list to see the available scenarios)")]
    UnknownScenario(String),

    /// Awaiting a task inside a scenario failed
    #[error("await failed: {0}")]
    Await(#[from] AwaitError),

    /// The event loop failed while running a scenario
    #[error("event loop error: {0}")]
    Loop(#[from] JsError),

    /// A scenario produced a different result than it demonstrates
    #[error("expected {expected}, got {actual}")]
    Mismatch {
        /// What the scenario should produce
        expected: serde_json::Value,
        /// What it produced
        actual: serde_json::Value,
    },

    /// Report serialization error
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Output error
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
