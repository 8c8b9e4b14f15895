//! Error types for the market-alerts crate.
//!
//! Errors only surface while authoring rules or loading configuration. The
//! evaluation pipeline itself is infallible and degrades toward "no alert".

use thiserror::Error;

/// Errors that can occur while building rules or loading configuration.
#[derive(Debug, Error)]
pub enum AlertError {
    /// Invalid alert rule configuration.
    #[error("invalid alert rule: {reason}")]
    InvalidRule {
        /// The reason the rule is invalid.
        reason: String,
    },

    /// Invalid alert condition.
    #[error("invalid alert condition: {reason}")]
    InvalidCondition {
        /// The reason the condition is invalid.
        reason: String,
    },

    /// Invalid engine configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// The reason the configuration is invalid.
        reason: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Filesystem error while reading configuration or rule files.
    #[error("io error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for AlertError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for AlertError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for alert operations.
pub type Result<T> = std::result::Result<T, AlertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_rule() {
        let err = AlertError::InvalidRule {
            reason: "no conditions".to_string(),
        };
        assert_eq!(err.to_string(), "invalid alert rule: no conditions");
    }

    #[test]
    fn error_display_invalid_condition() {
        let err = AlertError::InvalidCondition {
            reason: "threshold is NaN".to_string(),
        };
        assert_eq!(err.to_string(), "invalid alert condition: threshold is NaN");
    }

    #[test]
    fn error_display_invalid_config() {
        let err = AlertError::InvalidConfig {
            reason: "grouping window must be positive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration: grouping window must be positive"
        );
    }

    #[test]
    fn error_from_serde_json() {
        let json_err = serde_json::from_str::<String>("invalid json");
        assert!(json_err.is_err());
        let alert_err: AlertError = json_err.unwrap_err().into();
        assert!(matches!(alert_err, AlertError::SerializationError(_)));
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "rules.json");
        let alert_err: AlertError = io_err.into();
        assert!(matches!(alert_err, AlertError::Io(_)));
        assert!(alert_err.to_string().contains("rules.json"));
    }
}
