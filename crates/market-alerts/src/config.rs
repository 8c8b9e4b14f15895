//! Engine configuration.
//!
//! Configuration is stored as JSON. Every field has a default, so an empty
//! object (`{}`) is a valid configuration.

use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{AlertError, Result};
use crate::metrics::BaselinePolicy;

/// Default grouping window in minutes.
pub const DEFAULT_GROUPING_WINDOW_MINUTES: u32 = 5;

/// Default timestamp format for rendered messages.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Configuration for the alert pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Firings of the same rule and target closer than this are merged.
    pub grouping_window_minutes: u32,
    /// Baseline selection when history doesn't reach a condition's window.
    pub baseline_policy: BaselinePolicy,
    /// Derive priority from the size of the change instead of the rule.
    pub dynamic_priority: bool,
    /// Base URL of the dashboard, used to build action links.
    pub action_base_url: Option<String>,
    /// strftime pattern for timestamps in email and Slack messages.
    pub timestamp_format: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grouping_window_minutes: DEFAULT_GROUPING_WINDOW_MINUTES,
            baseline_policy: BaselinePolicy::default(),
            dynamic_priority: false,
            action_base_url: None,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::SerializationError` for malformed JSON and
    /// `AlertError::InvalidConfig` if validation fails.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Io` if the file cannot be read, otherwise the
    /// errors of [`EngineConfig::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading engine config");
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.grouping_window_minutes == 0 {
            return Err(AlertError::InvalidConfig {
                reason: "grouping_window_minutes must be positive".to_string(),
            });
        }

        if self.timestamp_format.trim().is_empty() {
            return Err(AlertError::InvalidConfig {
                reason: "timestamp_format cannot be empty".to_string(),
            });
        }

        if StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(AlertError::InvalidConfig {
                reason: format!(
                    "timestamp_format '{}' is not a valid strftime pattern",
                    self.timestamp_format
                ),
            });
        }

        self.action_base()?;

        Ok(())
    }

    /// Parses `action_base_url`.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidConfig` unless the value is an absolute
    /// http(s) URL that can carry a path.
    pub fn action_base(&self) -> Result<Option<Url>> {
        let Some(raw) = &self.action_base_url else {
            return Ok(None);
        };

        let url = Url::parse(raw).map_err(|e| AlertError::InvalidConfig {
            reason: format!("action_base_url '{raw}' is not a valid URL: {e}"),
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(AlertError::InvalidConfig {
                reason: format!("action_base_url must be an http(s) URL, got '{raw}'"),
            });
        }

        Ok(Some(url))
    }

    /// Sets the grouping window.
    #[must_use]
    pub const fn with_grouping_window(mut self, minutes: u32) -> Self {
        self.grouping_window_minutes = minutes;
        self
    }

    /// Sets the baseline policy.
    #[must_use]
    pub const fn with_baseline_policy(mut self, policy: BaselinePolicy) -> Self {
        self.baseline_policy = policy;
        self
    }

    /// Enables or disables dynamic priority.
    #[must_use]
    pub const fn with_dynamic_priority(mut self, enabled: bool) -> Self {
        self.dynamic_priority = enabled;
        self
    }

    /// Sets the dashboard base URL.
    #[must_use]
    pub fn with_action_base_url(mut self, url: impl Into<String>) -> Self {
        self.action_base_url = Some(url.into());
        self
    }
}
