//! Core types for the alerting system.
//!
//! This module provides the fundamental types used throughout the market-alerts crate:
//! - [`MetricKind`]: The closed set of tracked game metrics
//! - [`ConditionOperator`]: Direct comparisons and change-style operators
//! - [`AlertCondition`]: A metric/operator/threshold triple
//! - [`AlertRule`]: A set of conditions with targeting, logic, channels and cooldown
//! - [`AlertMessage`]: A composed alert ready for grouping and channel rendering

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AlertError, Result};

/// A tracked game metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Concurrent players currently in game.
    ConcurrentUsers,
    /// Reviews posted during the current day.
    DailyReviewCount,
    /// Share of positive reviews, expressed as a percentage (0-100).
    PositiveReviewRatio,
    /// Current store price.
    Price,
    /// Whether the game shipped an update recently (1 or 0).
    HasUpdate,
    /// Whether the game is currently discounted (1 or 0).
    SaleActive,
}

impl MetricKind {
    /// Every metric kind, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::ConcurrentUsers,
        Self::DailyReviewCount,
        Self::PositiveReviewRatio,
        Self::Price,
        Self::HasUpdate,
        Self::SaleActive,
    ];

    /// Returns the metric identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConcurrentUsers => "concurrent_users",
            Self::DailyReviewCount => "daily_review_count",
            Self::PositiveReviewRatio => "positive_review_ratio",
            Self::Price => "price",
            Self::HasUpdate => "has_update",
            Self::SaleActive => "sale_active",
        }
    }

    /// Returns a human-readable label used in message bodies.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ConcurrentUsers => "Concurrent players",
            Self::DailyReviewCount => "Daily reviews",
            Self::PositiveReviewRatio => "Positive review ratio",
            Self::Price => "Price",
            Self::HasUpdate => "Update published",
            Self::SaleActive => "Sale active",
        }
    }

    /// Renders a metric value the way players and publishers read it.
    #[must_use]
    pub fn format_value(&self, value: f64) -> String {
        match self {
            Self::ConcurrentUsers | Self::DailyReviewCount => format_number(value),
            Self::PositiveReviewRatio => format!("{value:.1}%"),
            Self::Price => format!("${}", format_decimal(value, 2)),
            Self::HasUpdate | Self::SaleActive => {
                let flag = if value == 0.0 { "no" } else { "yes" };
                flag.to_string()
            }
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Formats a number with thousands separators, keeping up to two decimals.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format_decimal(value, 0)
    } else {
        format_decimal(value, 2)
    }
}

fn format_decimal(value: f64, decimals: usize) -> String {
    let rendered = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (rendered, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Operators for alert conditions.
///
/// Direct comparisons only look at the current value. Change-style operators
/// compare the current value against a historical baseline and test the
/// percentage change against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionOperator {
    /// Greater than (>).
    #[serde(rename = ">")]
    GreaterThan,
    /// Greater than or equal (>=).
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    /// Less than (<).
    #[serde(rename = "<")]
    LessThan,
    /// Less than or equal (<=).
    #[serde(rename = "<=")]
    LessThanOrEqual,
    /// Equal (==).
    #[serde(rename = "==")]
    Equal,
    /// Not equal (!=).
    #[serde(rename = "!=")]
    NotEqual,
    /// Rose by at least the threshold percentage.
    #[serde(rename = "increased_by")]
    IncreasedBy,
    /// Fell by at least the threshold percentage.
    #[serde(rename = "decreased_by")]
    DecreasedBy,
    /// Moved in either direction by at least the threshold percentage.
    #[serde(rename = "changed_by")]
    ChangedBy,
}

impl ConditionOperator {
    /// Returns true for operators that need a historical baseline.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        matches!(self, Self::IncreasedBy | Self::DecreasedBy | Self::ChangedBy)
    }

    /// Evaluates a direct comparison between two values.
    ///
    /// Change-style operators never match here; they are evaluated against a
    /// percentage change by [`ConditionOperator::matches_change`].
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn compare(&self, left: f64, right: f64) -> bool {
        match self {
            Self::GreaterThan => left > right,
            Self::GreaterThanOrEqual => left >= right,
            Self::LessThan => left < right,
            Self::LessThanOrEqual => left <= right,
            Self::Equal => left == right,
            Self::NotEqual => left != right,
            Self::IncreasedBy | Self::DecreasedBy | Self::ChangedBy => false,
        }
    }

    /// Tests a signed percentage change against a threshold percentage.
    ///
    /// Direct comparisons never match here.
    #[must_use]
    pub fn matches_change(&self, change_percent: f64, threshold: f64) -> bool {
        match self {
            Self::IncreasedBy => change_percent >= threshold,
            Self::DecreasedBy => -change_percent >= threshold,
            Self::ChangedBy => change_percent.abs() >= threshold,
            Self::GreaterThan
            | Self::GreaterThanOrEqual
            | Self::LessThan
            | Self::LessThanOrEqual
            | Self::Equal
            | Self::NotEqual => false,
        }
    }

    /// Returns the operator as a short symbol.
    #[must_use]
    pub const fn as_symbol(&self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::IncreasedBy => "increased by >=",
            Self::DecreasedBy => "decreased by >=",
            Self::ChangedBy => "changed by >=",
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_symbol())
    }
}

/// A single metric/operator/threshold triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCondition {
    /// The metric to evaluate.
    pub metric: MetricKind,
    /// The comparison operator.
    pub operator: ConditionOperator,
    /// Threshold value, or threshold percentage for change-style operators.
    pub value: f64,
    /// Lookback window for change-style operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window_minutes: Option<u32>,
}

impl AlertCondition {
    /// Creates a new alert condition.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidCondition` if the threshold is not finite,
    /// or is negative for a change-style operator.
    pub fn new(metric: MetricKind, operator: ConditionOperator, value: f64) -> Result<Self> {
        let condition = Self {
            metric,
            operator,
            value,
            time_window_minutes: None,
        };
        condition.validate()?;
        Ok(condition)
    }

    /// Sets the lookback window used by change-style operators.
    #[must_use]
    pub const fn with_time_window(mut self, minutes: u32) -> Self {
        self.time_window_minutes = Some(minutes);
        self
    }

    /// Checks the condition for authoring mistakes.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidCondition` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if !self.value.is_finite() {
            return Err(AlertError::InvalidCondition {
                reason: format!("threshold for {} must be finite", self.metric),
            });
        }

        if self.operator.is_change() && self.value < 0.0 {
            return Err(AlertError::InvalidCondition {
                reason: format!(
                    "change threshold for {} must not be negative",
                    self.metric
                ),
            });
        }

        Ok(())
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator.is_change() {
            write!(f, "{} {} {}%", self.metric, self.operator, self.value)?;
            if let Some(window) = self.time_window_minutes {
                write!(f, " over {window}m")?;
            }
            Ok(())
        } else {
            write!(f, "{} {} {}", self.metric, self.operator, self.value)
        }
    }
}

/// How the results of a rule's conditions are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConditionLogic {
    /// Every condition must trigger.
    #[default]
    And,
    /// At least one condition must trigger.
    Or,
}

impl ConditionLogic {
    /// Returns true if `triggered` out of `total` conditions satisfies the logic.
    #[must_use]
    pub const fn is_satisfied(&self, triggered: usize, total: usize) -> bool {
        match self {
            Self::And => total > 0 && triggered == total,
            Self::Or => triggered > 0,
        }
    }
}

/// Which targets a rule applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// A single game.
    Single,
    /// A hand-picked group of games.
    Group,
    /// Every game the metrics snapshot knows about.
    #[default]
    Global,
}

/// The severity of an alert.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    /// Informational.
    Low,
    /// Worth a look.
    #[default]
    Medium,
    /// Needs attention soon.
    High,
    /// Needs attention now.
    Critical,
}

impl AlertPriority {
    /// Returns the priority as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A delivery medium for alert messages.
///
/// Identifiers that are not recognized are kept as [`Channel::Other`] so that
/// rule records written by newer authoring surfaces still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Channel {
    /// HTML email.
    Email,
    /// Slack incoming webhook (Block Kit).
    Slack,
    /// Discord webhook (embeds).
    Discord,
    /// Mobile/web push notification.
    Push,
    /// In-app notification center.
    InApp,
    /// Any other channel identifier.
    Other(String),
}

impl Channel {
    /// Returns the channel identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Email => "email",
            Self::Slack => "slack",
            Self::Discord => "discord",
            Self::Push => "push",
            Self::InApp => "in_app",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Channel {
    fn from(value: String) -> Self {
        match value.as_str() {
            "email" => Self::Email,
            "slack" => Self::Slack,
            "discord" => Self::Discord,
            "push" => Self::Push,
            "in_app" | "inapp" => Self::InApp,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Channel {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Channel> for String {
    fn from(value: Channel) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rule describing when and how to alert on game metrics.
///
/// `last_triggered_at` is owned by the rule store. The engine reads it for the
/// cooldown gate and reports new firings, but never writes it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    /// Unique identifier for the rule.
    pub id: String,
    /// Human-readable name for the rule.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Whether this rule is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Which targets the rule applies to.
    #[serde(default)]
    pub target_type: TargetType,
    /// Target identifiers for single and group rules.
    #[serde(default)]
    pub target_ids: Vec<String>,
    /// Conditions, in authoring order.
    pub conditions: Vec<AlertCondition>,
    /// How conditions are combined.
    #[serde(default)]
    pub condition_logic: ConditionLogic,
    /// Channels the resulting message is delivered to.
    #[serde(default)]
    pub channels: Vec<Channel>,
    /// Static priority of messages from this rule.
    #[serde(default)]
    pub priority: AlertPriority,
    /// Minimum minutes between two firings of this rule.
    #[serde(default)]
    pub cooldown_minutes: u32,
    /// When the rule last fired, as recorded by the rule store.
    #[serde(default)]
    pub last_triggered_at: Option<DateTime<Utc>>,
}

const fn default_enabled() -> bool {
    true
}

impl AlertRule {
    /// Maximum allowed length for rule names.
    pub const MAX_NAME_LENGTH: usize = 256;

    /// Creates a new alert rule builder.
    pub fn builder(name: impl Into<String>, condition: AlertCondition) -> AlertRuleBuilder {
        AlertRuleBuilder::new(name, condition)
    }

    /// Returns the cooldown as a duration.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::minutes(i64::from(self.cooldown_minutes))
    }

    /// Returns true if the rule fired less than one cooldown ago.
    #[must_use]
    pub fn is_cooling_down(&self, now: DateTime<Utc>) -> bool {
        self.cooldown_remaining(now).is_some()
    }

    /// Returns when a firing at `fired_at` re-arms, saturating at the latest
    /// representable instant.
    #[must_use]
    pub fn rearm_after(&self, fired_at: DateTime<Utc>) -> DateTime<Utc> {
        fired_at
            .checked_add_signed(self.cooldown())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns when the cooldown from the last firing ends.
    #[must_use]
    pub fn cooldown_until(&self) -> Option<DateTime<Utc>> {
        self.last_triggered_at.map(|last| self.rearm_after(last))
    }

    /// Returns how long the rule stays quiescent, if it is cooling down.
    ///
    /// A `last_triggered_at` in the future keeps the rule quiet until one
    /// cooldown past that instant.
    #[must_use]
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let until = self.cooldown_until()?;
        (now < until).then(|| until.signed_duration_since(now))
    }

    /// Checks the rule for authoring mistakes.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidRule` or `AlertError::InvalidCondition`
    /// describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(AlertError::InvalidRule {
                reason: "rule name cannot be empty".to_string(),
            });
        }

        if self.name.len() > Self::MAX_NAME_LENGTH {
            return Err(AlertError::InvalidRule {
                reason: format!(
                    "rule name exceeds maximum length of {} characters",
                    Self::MAX_NAME_LENGTH
                ),
            });
        }

        if self.conditions.is_empty() {
            return Err(AlertError::InvalidRule {
                reason: format!("rule '{}' has no conditions", self.name),
            });
        }

        for condition in &self.conditions {
            condition.validate()?;
        }

        match self.target_type {
            TargetType::Single if self.target_ids.len() != 1 => {
                return Err(AlertError::InvalidRule {
                    reason: format!(
                        "single-target rule '{}' needs exactly one target id, got {}",
                        self.name,
                        self.target_ids.len()
                    ),
                });
            }
            TargetType::Group if self.target_ids.is_empty() => {
                return Err(AlertError::InvalidRule {
                    reason: format!("group rule '{}' has no target ids", self.name),
                });
            }
            _ => {}
        }

        if self.channels.is_empty() {
            return Err(AlertError::InvalidRule {
                reason: format!("rule '{}' has no delivery channels", self.name),
            });
        }

        Ok(())
    }
}

impl fmt::Display for AlertRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joiner = match self.condition_logic {
            ConditionLogic::And => " AND ",
            ConditionLogic::Or => " OR ",
        };
        let conditions: Vec<String> = self.conditions.iter().map(ToString::to_string).collect();
        write!(f, "{}: {}", self.name, conditions.join(joiner))
    }
}

/// Builder for creating [`AlertRule`] instances.
#[derive(Debug)]
pub struct AlertRuleBuilder {
    id: Option<String>,
    name: String,
    description: String,
    enabled: bool,
    target_type: TargetType,
    target_ids: Vec<String>,
    conditions: Vec<AlertCondition>,
    condition_logic: ConditionLogic,
    channels: Vec<Channel>,
    priority: AlertPriority,
    cooldown_minutes: u32,
    last_triggered_at: Option<DateTime<Utc>>,
}

impl AlertRuleBuilder {
    /// Creates a new builder with required fields.
    fn new(name: impl Into<String>, condition: AlertCondition) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            enabled: true,
            target_type: TargetType::Global,
            target_ids: Vec::new(),
            conditions: vec![condition],
            condition_logic: ConditionLogic::And,
            channels: vec![Channel::InApp],
            priority: AlertPriority::Medium,
            cooldown_minutes: 0,
            last_triggered_at: None,
        }
    }

    /// Uses a fixed rule ID instead of a generated one.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets whether the rule is enabled.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Targets a single game.
    #[must_use]
    pub fn target(mut self, target_id: impl Into<String>) -> Self {
        self.target_type = TargetType::Single;
        self.target_ids = vec![target_id.into()];
        self
    }

    /// Targets a group of games.
    #[must_use]
    pub fn targets<I, S>(mut self, target_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_type = TargetType::Group;
        self.target_ids = target_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Targets every known game.
    #[must_use]
    pub fn global(mut self) -> Self {
        self.target_type = TargetType::Global;
        self.target_ids.clear();
        self
    }

    /// Adds another condition.
    #[must_use]
    pub fn condition(mut self, condition: AlertCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Sets how conditions are combined.
    #[must_use]
    pub const fn logic(mut self, logic: ConditionLogic) -> Self {
        self.condition_logic = logic;
        self
    }

    /// Replaces the delivery channels.
    #[must_use]
    pub fn channels<I>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = Channel>,
    {
        self.channels = channels.into_iter().collect();
        self
    }

    /// Sets the static priority.
    #[must_use]
    pub const fn priority(mut self, priority: AlertPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the cooldown in minutes.
    #[must_use]
    pub const fn cooldown_minutes(mut self, minutes: u32) -> Self {
        self.cooldown_minutes = minutes;
        self
    }

    /// Records when the rule last fired.
    #[must_use]
    pub const fn last_triggered_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_triggered_at = Some(at);
        self
    }

    /// Builds the [`AlertRule`].
    ///
    /// # Errors
    ///
    /// Returns an error if [`AlertRule::validate`] rejects the rule.
    pub fn build(self) -> Result<AlertRule> {
        let rule = AlertRule {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: self.name,
            description: self.description,
            enabled: self.enabled,
            target_type: self.target_type,
            target_ids: self.target_ids,
            conditions: self.conditions,
            condition_logic: self.condition_logic,
            channels: self.channels,
            priority: self.priority,
            cooldown_minutes: self.cooldown_minutes,
            last_triggered_at: self.last_triggered_at,
        };
        rule.validate()?;
        Ok(rule)
    }
}

/// One original firing folded into a grouped message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedAlert {
    /// ID of the original message.
    pub id: String,
    /// When the original message's condition triggered.
    pub triggered_at: DateTime<Utc>,
    /// Current value carried by the original message.
    pub value: Option<f64>,
}

/// Extra information attached to a message after composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    /// Every firing merged into this message, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grouped_alerts: Vec<GroupedAlert>,
}

/// Structured data carried by an alert message for auditing and rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertData {
    /// The metric of the first triggered condition.
    pub metric: Option<MetricKind>,
    /// Baseline value for change-style conditions.
    pub previous_value: Option<f64>,
    /// Value at evaluation time.
    pub current_value: Option<f64>,
    /// Signed percentage change from the baseline.
    pub change_percent: Option<f64>,
    /// Threshold of the first triggered condition.
    pub threshold: Option<f64>,
    /// When the rule was evaluated and triggered.
    pub triggered_at: DateTime<Utc>,
    /// True if the baseline came from the oldest available point rather than
    /// the requested window.
    #[serde(default)]
    pub baseline_fallback: bool,
    /// Extra information such as grouped firings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<AdditionalInfo>,
}

/// A composed alert message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    /// Unique identifier for this message.
    pub id: String,
    /// The rule that produced the message.
    pub rule_id: String,
    /// Name of the rule that produced the message.
    pub rule_name: String,
    /// The target the rule triggered for, if any.
    pub target_id: Option<String>,
    /// Display name of the target.
    pub target_name: Option<String>,
    /// Rendered title.
    pub title: String,
    /// Rendered body.
    pub body: String,
    /// Optional summary shown by rich channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Structured data.
    pub data: AlertData,
    /// Severity.
    pub priority: AlertPriority,
    /// Channels to deliver to.
    pub channels: Vec<Channel>,
    /// When the message was created.
    pub created_at: DateTime<Utc>,
    /// Optional link to act on the alert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

impl AlertMessage {
    /// Returns the key grouping firings of the same rule against the same target.
    #[must_use]
    pub fn group_key(&self) -> (String, String) {
        (
            self.rule_id.clone(),
            self.target_id.clone().unwrap_or_else(|| "global".to_string()),
        )
    }

    /// Attaches a summary.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}
