//! Command-line arguments

use async_runtime::{ClockMode, EventLoopConfig};
use clap::{ArgAction, Parser};

/// Runs the deferred task demonstrations
#[derive(Parser, Debug, Clone)]
#[command(
    name = "deferred-demo",
    version,
    about = "Runs the deferred task demonstrations"
)]
pub struct Cli {
    /// Scenario to run (see --list)
    pub scenario: Option<String>,

    /// Run every scenario
    #[arg(short = 'a', long = "all", action = ArgAction::SetTrue, conflicts_with = "scenario")]
    pub all: bool,

    /// List the available scenarios
    #[arg(short = 'l', long = "list", action = ArgAction::SetTrue)]
    pub list: bool,

    /// Print reports as JSON
    #[arg(long = "json", action = ArgAction::SetTrue)]
    pub json: bool,

    /// Run timers on the wall clock instead of the virtual clock
    #[arg(long = "wall-clock", action = ArgAction::SetTrue)]
    pub wall_clock: bool,

    /// Maximum microtasks drained per turn
    #[arg(long = "max-microtasks", default_value_t = EventLoopConfig::DEFAULT_MAX_MICROTASKS)]
    pub max_microtasks: usize,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbosity: u8,

    /// Log filter directive, e.g. `async_runtime=trace`; overrides -v and RUST_LOG
    #[arg(long = "log-level")]
    pub log_level: Option<String>,
}

impl Cli {
    /// The event loop configuration selected by the flags.
    pub fn event_loop_config(&self) -> EventLoopConfig {
        let clock = if self.wall_clock {
            ClockMode::Wall
        } else {
            ClockMode::Virtual
        };
        EventLoopConfig::default()
            .with_clock(clock)
            .with_max_microtasks_per_turn(self.max_microtasks)
    }

    /// The log filter used when neither `--log-level` nor `RUST_LOG` is set.
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
