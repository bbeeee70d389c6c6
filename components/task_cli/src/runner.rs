//! Scenario orchestration
//!
//! The Runner selects scenarios, runs each on its own event loop and writes
//! the reports either as text or as JSON.

use crate::error::CliResult;
use crate::scenarios::{self, ScenarioReport, SCENARIOS};
use async_runtime::EventLoopConfig;
use std::io::Write;

/// Runs scenarios and prints their reports
#[derive(Debug, Clone, Default)]
pub struct Runner {
    config: EventLoopConfig,
    json: bool,
}

impl Runner {
    /// Create a runner whose scenarios use `config`
    ///
    /// # Example
    /// ```
    /// use async_runtime::EventLoopConfig;
    /// use task_cli::Runner;
    ///
    /// let runner = Runner::new(EventLoopConfig::default());
    /// let report = runner.run_one("all").unwrap();
    /// assert!(report.passed);
    /// ```
    pub fn new(config: EventLoopConfig) -> Self {
        Self {
            config,
            json: false,
        }
    }

    /// Print reports as JSON
    pub fn with_json(mut self, enabled: bool) -> Self {
        self.json = enabled;
        self
    }

    /// Run the scenario called `name`
    ///
    /// # Errors
    /// Returns `CliError::UnknownScenario` if there is no such scenario
    pub fn run_one(&self, name: &str) -> CliResult<ScenarioReport> {
        let scenario = scenarios::find(name)?;
        Ok(scenario.run(self.config.clone()))
    }

    /// Run every scenario in order
    pub fn run_all(&self) -> Vec<ScenarioReport> {
        SCENARIOS
            .iter()
            .map(|scenario| scenario.run(self.config.clone()))
            .collect()
    }

    /// Write the scenario names and descriptions
    pub fn list(&self, out: &mut impl Write) -> CliResult<()> {
        if self.json {
            let names: Vec<_> = SCENARIOS
                .iter()
                .map(|s| serde_json::json!({ "name": s.name, "description": s.description }))
                .collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&names)?)?;
        } else {
            let width = SCENARIOS.iter().map(|s| s.name.len()).max().unwrap_or(0);
            for scenario in SCENARIOS {
                writeln!(out, "{:width$}  {}", scenario.name, scenario.description)?;
            }
        }
        Ok(())
    }

    /// Write `reports`
    ///
    /// # Returns
    /// Whether every report passed
    pub fn print_reports(
        &self,
        reports: &[ScenarioReport],
        out: &mut impl Write,
    ) -> CliResult<bool> {
        if self.json {
            writeln!(out, "{}", serde_json::to_string_pretty(reports)?)?;
        } else {
            for report in reports {
                let status = if report.passed { "ok" } else { "FAILED" };
                write!(out, "{:<16} {:<6} ({} ms)", report.name, status, report.elapsed_ms)?;
                if let Some(result) = &report.result {
                    write!(out, "  {}", result)?;
                }
                if let Some(error) = &report.error {
                    write!(out, "  {}", error)?;
                }
                if report.unhandled_rejections > 0 {
                    write!(out, "  [{} unhandled rejection(s)]", report.unhandled_rejections)?;
                }
                writeln!(out)?;
            }
            let passed = reports.iter().filter(|r| r.passed).count();
            writeln!(out, "\n{} of {} scenarios passed", passed, reports.len())?;
        }
        Ok(reports.iter().all(|r| r.passed))
    }
}
