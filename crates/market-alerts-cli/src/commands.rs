//! Command implementations.
//!
//! Each command reads its JSON inputs, runs the engine and writes a report
//! through [`OutputFormat`].

use std::io::Write;
use std::path::Path;

use chrono::Utc;
use market_alerts::{AlertRule, EngineConfig, MetricsSnapshot, Pipeline};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::cli::{EvaluateArgs, ValidateArgs};
use crate::error::CliError;
use crate::output::{EvaluationReport, OutputFormat, RuleCheck, ValidationReport};

/// Reads and deserializes a JSON file.
///
/// # Errors
///
/// Returns `CliError::Read` or `CliError::Parse` naming the file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn check_rules(rules: &[AlertRule]) -> ValidationReport {
    ValidationReport {
        rules: rules
            .iter()
            .map(|rule| RuleCheck {
                id: rule.id.clone(),
                name: rule.name.clone(),
                summary: rule.to_string(),
                error: rule.validate().err().map(|e| e.to_string()),
            })
            .collect(),
    }
}

/// Runs one evaluation tick over files on disk.
#[derive(Debug, Clone)]
pub struct EvaluateCommand<'a> {
    args: &'a EvaluateArgs,
}

impl<'a> EvaluateCommand<'a> {
    /// Creates the command.
    #[must_use]
    pub const fn new(args: &'a EvaluateArgs) -> Self {
        Self { args }
    }

    /// Executes the command.
    ///
    /// Invalid rules abort the run before anything is evaluated.
    ///
    /// # Errors
    ///
    /// Returns an error if an input cannot be loaded, a rule or the
    /// configuration is invalid, or output fails.
    pub fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let config = match &self.args.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        let rules: Vec<AlertRule> = read_json(&self.args.rules)?;
        let snapshot: MetricsSnapshot = read_json(&self.args.metrics)?;

        let checks = check_rules(&rules);
        let invalid = checks.invalid_count();
        if invalid > 0 {
            for check in checks.rules.iter().filter(|c| !c.is_valid()) {
                warn!(rule_id = %check.id, error = ?check.error, "invalid rule");
            }
            return Err(CliError::InvalidRules { count: invalid });
        }

        let now = self.args.now.unwrap_or_else(Utc::now);
        debug!(
            rules = rules.len(),
            targets = snapshot.len(),
            now = %now,
            "evaluating"
        );

        let output = Pipeline::new(&config).run(&rules, &snapshot, now);
        info!(fired = output.fired.len(), messages = output.messages.len(), "evaluation finished");

        let report = EvaluationReport {
            evaluated_at: now,
            output,
            show_payloads: self.args.payloads,
        };
        format.write(writer, &report)
    }
}

/// Checks a rules file without evaluating it.
#[derive(Debug, Clone)]
pub struct ValidateCommand<'a> {
    args: &'a ValidateArgs,
}

impl<'a> ValidateCommand<'a> {
    /// Creates the command.
    #[must_use]
    pub const fn new(args: &'a ValidateArgs) -> Self {
        Self { args }
    }

    /// Executes the command. The report is written even when rules fail.
    ///
    /// # Errors
    ///
    /// Returns `CliError::InvalidRules` if any rule fails validation, or an
    /// error if the file cannot be loaded or output fails.
    pub fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let rules: Vec<AlertRule> = read_json(&self.args.rules)?;
        let report = check_rules(&rules);
        format.write(writer, &report)?;

        match report.invalid_count() {
            0 => Ok(()),
            count => Err(CliError::InvalidRules { count }),
        }
    }
}
