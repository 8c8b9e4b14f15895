//! Evaluation of a single condition against one target's metrics.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::metrics::{BaselinePolicy, BaselineSource, MetricRegistry, TargetMetrics};
use crate::types::AlertCondition;

/// The result of evaluating one condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionOutcome {
    /// Whether the condition holds.
    pub triggered: bool,
    /// Current value of the metric, if the target reported one.
    pub current: Option<f64>,
    /// Baseline value for change-style operators.
    pub previous: Option<f64>,
    /// Signed percentage change from the baseline.
    pub change_percent: Option<f64>,
    /// How the baseline was chosen, if one was used.
    pub baseline_source: Option<BaselineSource>,
}

impl ConditionOutcome {
    const fn no_data() -> Self {
        Self {
            triggered: false,
            current: None,
            previous: None,
            change_percent: None,
            baseline_source: None,
        }
    }

    const fn direct(triggered: bool, current: f64) -> Self {
        Self {
            triggered,
            current: Some(current),
            previous: None,
            change_percent: None,
            baseline_source: None,
        }
    }
}

/// Evaluates conditions against target metrics.
///
/// Evaluation is pure: the same condition, metrics and `now` always produce
/// the same outcome, and missing data yields an untriggered outcome rather
/// than an error.
#[derive(Debug, Clone, Default)]
pub struct ConditionEvaluator {
    registry: MetricRegistry,
    baseline_policy: BaselinePolicy,
}

impl ConditionEvaluator {
    /// Creates an evaluator with the standard metric registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an evaluator with a custom registry and baseline policy.
    #[must_use]
    pub const fn with_registry(registry: MetricRegistry, baseline_policy: BaselinePolicy) -> Self {
        Self {
            registry,
            baseline_policy,
        }
    }

    /// Sets the baseline policy.
    #[must_use]
    pub const fn baseline_policy(mut self, policy: BaselinePolicy) -> Self {
        self.baseline_policy = policy;
        self
    }

    /// Returns the metric registry.
    #[must_use]
    pub const fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Evaluates a condition against a target's metrics at `now`.
    ///
    /// `metrics` is `None` when the snapshot has no entry for the target.
    #[must_use]
    pub fn evaluate(
        &self,
        condition: &AlertCondition,
        metrics: Option<&TargetMetrics>,
        now: DateTime<Utc>,
    ) -> ConditionOutcome {
        let Some(metrics) = metrics else {
            return ConditionOutcome::no_data();
        };

        let Some(current) = self.registry.current(condition.metric, metrics) else {
            debug!(metric = %condition.metric, game = %metrics.name, "no current value");
            return ConditionOutcome::no_data();
        };

        if !condition.operator.is_change() {
            let triggered = condition.operator.compare(current, condition.value);
            return ConditionOutcome::direct(triggered, current);
        }

        let Some(baseline) = metrics.baseline(
            condition.metric,
            condition.time_window_minutes,
            now,
            self.baseline_policy,
        ) else {
            debug!(metric = %condition.metric, game = %metrics.name, "no baseline for change");
            return ConditionOutcome::direct(false, current);
        };

        if baseline.source == BaselineSource::OldestFallback {
            warn!(
                metric = %condition.metric,
                game = %metrics.name,
                window_minutes = ?condition.time_window_minutes,
                baseline_at = %baseline.timestamp,
                "history does not reach the requested window, comparing against oldest point"
            );
        }

        let previous = baseline.value;
        let change_percent = percent_change(previous, current);
        let triggered = change_percent
            .is_some_and(|change| condition.operator.matches_change(change, condition.value));

        ConditionOutcome {
            triggered,
            current: Some(current),
            previous: Some(previous),
            change_percent,
            baseline_source: Some(baseline.source),
        }
    }
}

/// Signed percentage change from `previous` to `current`.
///
/// Returns `None` when `previous` is zero or either value is not finite.
#[must_use]
pub fn percent_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return None;
    }
    Some((current - previous) * 100.0 / previous.abs())
}
