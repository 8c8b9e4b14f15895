//! Metric snapshots and history supplied by the metrics collaborator.
//!
//! A [`MetricsSnapshot`] maps target identifiers (Steam app ids) to the
//! [`TargetMetrics`] gathered for the current tick. Current values are read
//! through a [`MetricRegistry`], which holds one extraction function per
//! [`MetricKind`].

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::MetricKind;

/// A single historical measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// The measured value.
    pub value: f64,
    /// When the value was measured.
    pub timestamp: DateTime<Utc>,
}

impl MetricPoint {
    /// Creates a new metric point.
    #[must_use]
    pub const fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }
}

/// Everything known about one target for the current tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetMetrics {
    /// Display name of the target.
    pub name: String,
    /// Concurrent players.
    #[serde(default)]
    pub concurrent_users: Option<u64>,
    /// Reviews posted today.
    #[serde(default)]
    pub daily_review_count: Option<u64>,
    /// Positive review share, 0-100.
    #[serde(default)]
    pub positive_review_ratio: Option<f64>,
    /// Current store price.
    #[serde(default)]
    pub price: Option<f64>,
    /// Whether an update shipped recently.
    #[serde(default)]
    pub has_update: Option<bool>,
    /// Whether a discount is running.
    #[serde(default)]
    pub sale_active: Option<bool>,
    /// Bounded history per metric.
    #[serde(default)]
    pub history: HashMap<MetricKind, Vec<MetricPoint>>,
}

impl TargetMetrics {
    /// Creates an empty snapshot for a named target.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the concurrent player count.
    #[must_use]
    pub const fn with_concurrent_users(mut self, value: u64) -> Self {
        self.concurrent_users = Some(value);
        self
    }

    /// Sets today's review count.
    #[must_use]
    pub const fn with_daily_review_count(mut self, value: u64) -> Self {
        self.daily_review_count = Some(value);
        self
    }

    /// Sets the positive review ratio.
    #[must_use]
    pub const fn with_positive_review_ratio(mut self, value: f64) -> Self {
        self.positive_review_ratio = Some(value);
        self
    }

    /// Sets the store price.
    #[must_use]
    pub const fn with_price(mut self, value: f64) -> Self {
        self.price = Some(value);
        self
    }

    /// Sets the update flag.
    #[must_use]
    pub const fn with_has_update(mut self, value: bool) -> Self {
        self.has_update = Some(value);
        self
    }

    /// Sets the sale flag.
    #[must_use]
    pub const fn with_sale_active(mut self, value: bool) -> Self {
        self.sale_active = Some(value);
        self
    }

    /// Appends a historical point for a metric.
    #[must_use]
    pub fn with_point(mut self, metric: MetricKind, point: MetricPoint) -> Self {
        self.history.entry(metric).or_default().push(point);
        self
    }

    /// Returns the recorded history of a metric, which may be empty.
    #[must_use]
    pub fn history(&self, metric: MetricKind) -> &[MetricPoint] {
        self.history.get(&metric).map_or(&[], Vec::as_slice)
    }

    /// Finds the comparison point for a change-style condition.
    ///
    /// With a window, this is the most recent point at or before
    /// `now - window`. When no point is that old, [`BaselinePolicy`] decides
    /// whether the oldest available point stands in. Without a window, the
    /// most recent point strictly before `now` is used.
    #[must_use]
    pub fn baseline(
        &self,
        metric: MetricKind,
        window_minutes: Option<u32>,
        now: DateTime<Utc>,
        policy: BaselinePolicy,
    ) -> Option<Baseline> {
        let points = self.history(metric);
        if points.is_empty() {
            return None;
        }

        let Some(window) = window_minutes else {
            return points
                .iter()
                .filter(|p| p.timestamp < now)
                .max_by_key(|p| p.timestamp)
                .map(|p| Baseline::from_point(*p, BaselineSource::PreviousSample));
        };

        let cutoff = now
            .checked_sub_signed(Duration::minutes(i64::from(window)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let windowed = points
            .iter()
            .filter(|p| p.timestamp <= cutoff)
            .max_by_key(|p| p.timestamp);

        match (windowed, policy) {
            (Some(point), _) => Some(Baseline::from_point(*point, BaselineSource::Window)),
            (None, BaselinePolicy::OldestAvailable) => points
                .iter()
                .min_by_key(|p| p.timestamp)
                .map(|p| Baseline::from_point(*p, BaselineSource::OldestFallback)),
            (None, BaselinePolicy::Strict) => None,
        }
    }
}

/// What to do when no history point predates a condition's time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselinePolicy {
    /// Compare against the oldest point available.
    #[default]
    OldestAvailable,
    /// Treat the change as indeterminate; the condition does not trigger.
    Strict,
}

/// Where a baseline value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    /// A point at or before the start of the requested window.
    Window,
    /// The oldest point, standing in for a window the history doesn't reach.
    OldestFallback,
    /// The latest earlier sample, for conditions without a window.
    PreviousSample,
}

/// A historical value chosen as the comparison point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    /// The baseline value.
    pub value: f64,
    /// When the baseline was measured.
    pub timestamp: DateTime<Utc>,
    /// How the baseline was selected.
    pub source: BaselineSource,
}

impl Baseline {
    const fn from_point(point: MetricPoint, source: BaselineSource) -> Self {
        Self {
            value: point.value,
            timestamp: point.timestamp,
            source,
        }
    }
}

/// Metrics for every target known this tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsSnapshot {
    targets: BTreeMap<String, TargetMetrics>,
}

impl MetricsSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a target.
    pub fn insert(&mut self, target_id: impl Into<String>, metrics: TargetMetrics) {
        self.targets.insert(target_id.into(), metrics);
    }

    /// Adds or replaces a target, returning self for chaining.
    #[must_use]
    pub fn with_target(mut self, target_id: impl Into<String>, metrics: TargetMetrics) -> Self {
        self.insert(target_id, metrics);
        self
    }

    /// Looks up a target.
    #[must_use]
    pub fn get(&self, target_id: &str) -> Option<&TargetMetrics> {
        self.targets.get(target_id)
    }

    /// Iterates over all target ids in a stable order.
    pub fn target_ids(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    /// Returns the number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns true if no targets are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl FromIterator<(String, TargetMetrics)> for MetricsSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, TargetMetrics)>>(iter: I) -> Self {
        Self {
            targets: iter.into_iter().collect(),
        }
    }
}

/// Reads a metric's current value out of a target snapshot.
pub type MetricExtractor = fn(&TargetMetrics) -> Option<f64>;

/// Maps each metric kind to the function that extracts its current value.
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    extractors: HashMap<MetricKind, MetricExtractor>,
}

impl MetricRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in extractor of every metric kind.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for kind in MetricKind::ALL {
            registry.register(kind, standard_extractor(kind));
        }
        registry
    }

    /// Registers or replaces the extractor for a metric.
    pub fn register(&mut self, kind: MetricKind, extractor: MetricExtractor) {
        self.extractors.insert(kind, extractor);
    }

    /// Returns true if the metric has an extractor.
    #[must_use]
    pub fn contains(&self, kind: MetricKind) -> bool {
        self.extractors.contains_key(&kind)
    }

    /// Extracts the current value of a metric.
    ///
    /// Returns `None` if the metric is unregistered, absent from the target,
    /// or not a finite number.
    #[must_use]
    pub fn current(&self, kind: MetricKind, metrics: &TargetMetrics) -> Option<f64> {
        let extractor = self.extractors.get(&kind)?;
        extractor(metrics).filter(|v| v.is_finite())
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[allow(clippy::cast_precision_loss)]
fn standard_extractor(kind: MetricKind) -> MetricExtractor {
    match kind {
        MetricKind::ConcurrentUsers => |m: &TargetMetrics| m.concurrent_users.map(|v| v as f64),
        MetricKind::DailyReviewCount => |m: &TargetMetrics| m.daily_review_count.map(|v| v as f64),
        MetricKind::PositiveReviewRatio => |m: &TargetMetrics| m.positive_review_ratio,
        MetricKind::Price => |m: &TargetMetrics| m.price,
        MetricKind::HasUpdate => |m: &TargetMetrics| m.has_update.map(flag),
        MetricKind::SaleActive => |m: &TargetMetrics| m.sale_active.map(flag),
    }
}

const fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}
