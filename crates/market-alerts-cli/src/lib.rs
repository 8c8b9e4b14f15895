//! # market-alerts-cli
//!
//! Offline dry-run tool for market alert rules.
//!
//! Provides commands for:
//! - Evaluating a rules file against a metrics snapshot and printing the
//!   messages and channel payloads a tick would produce
//! - Validating a rules file before it is deployed
//!
//! Nothing is delivered: payloads are printed as table or JSON output.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, EvaluateArgs, Format, ValidateArgs};
pub use commands::{EvaluateCommand, ValidateCommand};
pub use error::CliError;
pub use output::OutputFormat;
