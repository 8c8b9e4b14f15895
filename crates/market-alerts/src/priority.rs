//! Dynamic severity derived from the size and direction of a metric change.
//!
//! Rules carry a static priority. Callers that prefer severity to follow the
//! magnitude of the change can use [`PriorityCalculator`] instead.

use serde::{Deserialize, Serialize};

use crate::types::{AlertPriority, MetricKind};

/// Direction of a metric change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    /// The metric rose.
    Increase,
    /// The metric fell.
    Decrease,
}

impl ChangeDirection {
    /// Direction of a signed percentage change. Zero counts as an increase.
    #[must_use]
    pub fn of(change_percent: f64) -> Self {
        if change_percent < 0.0 {
            Self::Decrease
        } else {
            Self::Increase
        }
    }
}

/// Derives alert severity from percentage changes using per-metric tiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityCalculator;

impl PriorityCalculator {
    /// Creates a calculator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the severity of a change of `change_percent` (magnitude) on
    /// `metric` in `direction`.
    #[must_use]
    pub fn calculate(
        &self,
        metric: MetricKind,
        change_percent: f64,
        direction: ChangeDirection,
    ) -> AlertPriority {
        let magnitude = change_percent.abs();
        if !magnitude.is_finite() {
            return AlertPriority::Low;
        }

        match (metric, direction) {
            (MetricKind::ConcurrentUsers, _) => tier(
                magnitude,
                &[
                    (100.0, AlertPriority::Critical),
                    (50.0, AlertPriority::High),
                    (20.0, AlertPriority::Medium),
                ],
            ),
            // Sentiment drops hurt more than sentiment gains help.
            (MetricKind::PositiveReviewRatio, ChangeDirection::Decrease) => tier(
                magnitude,
                &[
                    (20.0, AlertPriority::Critical),
                    (10.0, AlertPriority::High),
                    (5.0, AlertPriority::Medium),
                ],
            ),
            (MetricKind::PositiveReviewRatio, ChangeDirection::Increase) => tier(
                magnitude,
                &[(20.0, AlertPriority::High), (10.0, AlertPriority::Medium)],
            ),
            (
                MetricKind::DailyReviewCount
                | MetricKind::Price
                | MetricKind::HasUpdate
                | MetricKind::SaleActive,
                _,
            ) => tier(
                magnitude,
                &[(100.0, AlertPriority::High), (50.0, AlertPriority::Medium)],
            ),
        }
    }

    /// Severity of a signed percentage change.
    #[must_use]
    pub fn from_signed(&self, metric: MetricKind, change_percent: f64) -> AlertPriority {
        self.calculate(metric, change_percent, ChangeDirection::of(change_percent))
    }
}

fn tier(magnitude: f64, tiers: &[(f64, AlertPriority)]) -> AlertPriority {
    tiers
        .iter()
        .find(|(min, _)| magnitude >= *min)
        .map_or(AlertPriority::Low, |(_, priority)| *priority)
}
