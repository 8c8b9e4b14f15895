//! Rule evaluation and notification composition for Steam market alerts.
//!
//! `market-alerts` decides, for each tick, which user-defined alert rules
//! fire against the latest per-game market metrics, and turns the firings
//! into human-readable messages rendered for email, Slack, Discord, push
//! and in-app delivery.
//!
//! # Features
//!
//! - **Conditions**: direct comparisons and percent-change operators with
//!   optional lookback windows over per-metric history
//! - **Rules**: AND/OR logic, single/group/global targeting, rule-level cooldown
//! - **Composition**: titles, bodies and action links, with optional dynamic
//!   priority derived from the size of the change
//! - **Grouping**: bursts of firings for the same rule and game collapse into
//!   one message with an audit trail
//! - **Formatting**: typed Slack Block Kit and Discord embed documents, HTML email
//!
//! The engine performs no I/O and keeps no state between ticks. Fetching
//! metrics, persisting `last_triggered_at` and delivering payloads belong to
//! the caller.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use market_alerts::{
//!     AlertCondition, AlertRule, Channel, ConditionOperator, EngineConfig, MetricKind,
//!     MetricsSnapshot, Pipeline, TargetMetrics,
//! };
//!
//! let condition = AlertCondition::new(
//!     MetricKind::ConcurrentUsers,
//!     ConditionOperator::GreaterThanOrEqual,
//!     10_000.0,
//! )
//! .unwrap();
//! let rule = AlertRule::builder("Player surge", condition)
//!     .target("1145360")
//!     .channels([Channel::Slack])
//!     .build()
//!     .unwrap();
//!
//! let snapshot = MetricsSnapshot::new()
//!     .with_target("1145360", TargetMetrics::new("Hades").with_concurrent_users(12_000));
//!
//! let output = Pipeline::new(&EngineConfig::default()).run(&[rule], &snapshot, Utc::now());
//! assert_eq!(output.messages.len(), 1);
//! assert_eq!(output.messages[0].body, "Concurrent players reached 12,000.");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod channels;
pub mod composer;
pub mod condition;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod grouper;
pub mod metrics;
pub mod pipeline;
pub mod priority;
pub mod types;

// Re-export main types at crate root
pub use channels::{ChannelFormatter, FormattedMessage, RichContent};
pub use composer::MessageComposer;
pub use condition::{ConditionEvaluator, ConditionOutcome, percent_change};
pub use config::EngineConfig;
pub use error::{AlertError, Result};
pub use evaluator::{
    RuleEvaluation, RuleEvaluator, SkipReason, TargetTrigger, TriggeredCondition,
};
pub use grouper::{AlertGrouper, group};
pub use metrics::{
    BaselinePolicy, BaselineSource, MetricPoint, MetricRegistry, MetricsSnapshot, TargetMetrics,
};
pub use pipeline::{ChannelDelivery, Pipeline, RuleFired, RuleSkipped, TickOutput, TickStats};
pub use priority::{ChangeDirection, PriorityCalculator};
pub use types::{
    AlertCondition, AlertData, AlertMessage, AlertPriority, AlertRule, AlertRuleBuilder, Channel,
    ConditionLogic, ConditionOperator, MetricKind, TargetType,
};
pub use url::Url;
