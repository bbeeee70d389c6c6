//! Deferred task demonstration CLI library
//!
//! Provides the scenarios and the Runner that executes them for the
//! `deferred-demo` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod runner;
pub mod scenarios;

pub use cli::Cli;
pub use error::{CliError, CliResult};
pub use runner::Runner;
pub use scenarios::{Scenario, ScenarioReport, SCENARIOS};
