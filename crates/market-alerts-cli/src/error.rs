//! CLI error types.

use std::path::PathBuf;

use market_alerts::AlertError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// An input file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An input file is not valid JSON for its expected shape.
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Rules failed validation.
    #[error("{count} invalid rule(s)")]
    InvalidRules {
        /// Number of rules that failed.
        count: usize,
    },

    /// The engine rejected an input.
    #[error(transparent)]
    Engine(#[from] AlertError),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error while writing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
