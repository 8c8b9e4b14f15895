//! Command-line argument parsing with clap.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Market alerts - dry-run alert rules against a metrics snapshot.
#[derive(Parser, Debug, Clone)]
#[command(name = "market-alerts")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,

    /// Log evaluation details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run one evaluation tick and print what would be sent.
    Evaluate(EvaluateArgs),

    /// Check a rules file for authoring mistakes.
    Validate(ValidateArgs),
}

/// Arguments for the evaluate command.
#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// JSON file holding an array of alert rules.
    #[arg(short, long)]
    pub rules: PathBuf,

    /// JSON file holding the metrics snapshot, keyed by game id.
    #[arg(short, long)]
    pub metrics: PathBuf,

    /// JSON engine configuration.
    #[arg(short, long, env = "MARKET_ALERTS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Evaluation time as RFC 3339. Defaults to the current time.
    #[arg(long, value_parser = parse_timestamp)]
    pub now: Option<DateTime<Utc>>,

    /// Print rendered channel payloads in table output.
    #[arg(long)]
    pub payloads: bool,
}

/// Arguments for the validate command.
#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// JSON file holding an array of alert rules.
    #[arg(short, long)]
    pub rules: PathBuf,
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}
