//! Deferred task demonstration CLI
//!
//! Entry point for `deferred-demo`. Parses CLI arguments, sets up logging and
//! delegates to the Runner.

use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use task_cli::{Cli, CliResult, Runner};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = match &cli.log_level {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(cli.default_log_filter())),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .try_init();
}

fn run(cli: &Cli) -> CliResult<bool> {
    let runner = Runner::new(cli.event_loop_config()).with_json(cli.json);
    let mut out = io::stdout().lock();

    if cli.list {
        runner.list(&mut out)?;
        return Ok(true);
    }

    let reports = if cli.all {
        runner.run_all()
    } else if let Some(name) = &cli.scenario {
        vec![runner.run_one(name)?]
    } else {
        // Default: show usage
        writeln!(out, "Deferred task demonstrations v{}", env!("CARGO_PKG_VERSION"))?;
        writeln!(out)?;
        writeln!(out, "Usage:")?;
        writeln!(out, "  deferred-demo --list          List the scenarios")?;
        writeln!(out, "  deferred-demo <SCENARIO>      Run one scenario")?;
        writeln!(out, "  deferred-demo --all           Run every scenario")?;
        writeln!(out)?;
        writeln!(out, "Run 'deferred-demo --help' for more options.")?;
        return Ok(true);
    };

    runner.print_reports(&reports, &mut out)
}
