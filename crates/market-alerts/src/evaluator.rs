//! Rule evaluation across targets.
//!
//! The [`RuleEvaluator`] resolves a rule's targets, applies the cooldown gate,
//! runs every condition per target and combines the results with the rule's
//! AND/OR logic. It never mutates the rule: a firing is reported through
//! [`RuleEvaluation::fired_at`] for the rule store to persist.
//!
//! Per rule the cycle is Armed -> Fired -> Quiescent (cooling down) -> Armed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::condition::ConditionEvaluator;
use crate::metrics::{BaselineSource, MetricsSnapshot};
use crate::types::{AlertCondition, AlertRule, TargetType};

/// A condition that held for a target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggeredCondition {
    /// Position of the condition in the rule.
    pub index: usize,
    /// The condition itself.
    pub condition: AlertCondition,
    /// Current metric value.
    pub current: f64,
    /// Baseline value, for change-style operators.
    pub previous: Option<f64>,
    /// Signed percentage change from the baseline.
    pub change_percent: Option<f64>,
    /// How the baseline was chosen.
    pub baseline_source: Option<BaselineSource>,
}

/// A target for which a rule's combined logic was satisfied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetTrigger {
    /// The rule that triggered.
    pub rule_id: String,
    /// Name of the rule that triggered.
    pub rule_name: String,
    /// The target that satisfied the rule.
    pub target_id: String,
    /// Display name of the target, when the snapshot has one.
    pub target_name: Option<String>,
    /// Every condition that held, in rule order.
    pub triggered: Vec<TriggeredCondition>,
    /// Number of conditions in the rule.
    pub total_conditions: usize,
    /// When the rule was evaluated.
    pub evaluated_at: DateTime<Utc>,
}

/// Why a rule produced no results without looking at any target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum SkipReason {
    /// The rule is disabled.
    Disabled,
    /// The rule fired less than one cooldown ago.
    CoolingDown {
        /// Seconds until the rule is armed again.
        remaining_secs: i64,
    },
}

/// The outcome of evaluating one rule for one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleEvaluation {
    /// The evaluated rule.
    pub rule_id: String,
    /// Targets that satisfied the rule.
    pub triggers: Vec<TargetTrigger>,
    /// Set when the rule was not evaluated at all.
    pub skipped: Option<SkipReason>,
    /// Set when the rule fired; the rule store should record this as
    /// the rule's new `last_triggered_at`.
    pub fired_at: Option<DateTime<Utc>>,
}

impl RuleEvaluation {
    fn skipped(rule: &AlertRule, reason: SkipReason) -> Self {
        Self {
            rule_id: rule.id.clone(),
            triggers: Vec::new(),
            skipped: Some(reason),
            fired_at: None,
        }
    }

    /// Returns true if at least one target triggered.
    #[must_use]
    pub fn fired(&self) -> bool {
        self.fired_at.is_some()
    }
}

/// Evaluates rules against a metrics snapshot.
#[derive(Debug, Clone, Default)]
pub struct RuleEvaluator {
    conditions: ConditionEvaluator,
}

impl RuleEvaluator {
    /// Creates a rule evaluator with default condition evaluation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a rule evaluator around a configured condition evaluator.
    #[must_use]
    pub const fn with_condition_evaluator(conditions: ConditionEvaluator) -> Self {
        Self { conditions }
    }

    /// Evaluates one rule at `now`.
    ///
    /// The cooldown gate applies to the whole rule: while it is cooling down
    /// no target is evaluated.
    #[must_use]
    pub fn evaluate_rule(
        &self,
        rule: &AlertRule,
        snapshot: &MetricsSnapshot,
        now: DateTime<Utc>,
    ) -> RuleEvaluation {
        if !rule.enabled {
            debug!(rule_id = %rule.id, "rule disabled");
            return RuleEvaluation::skipped(rule, SkipReason::Disabled);
        }

        if let Some(remaining) = rule.cooldown_remaining(now) {
            debug!(
                rule_id = %rule.id,
                remaining_secs = remaining.num_seconds(),
                "rule cooling down"
            );
            return RuleEvaluation::skipped(
                rule,
                SkipReason::CoolingDown {
                    remaining_secs: remaining.num_seconds(),
                },
            );
        }

        let triggers: Vec<TargetTrigger> = resolve_targets(rule, snapshot)
            .into_iter()
            .filter_map(|target_id| self.evaluate_target(rule, target_id, snapshot, now))
            .collect();

        let fired_at = (!triggers.is_empty()).then_some(now);
        if fired_at.is_some() {
            info!(
                rule_id = %rule.id,
                rule_name = %rule.name,
                targets = triggers.len(),
                "rule fired"
            );
        }

        RuleEvaluation {
            rule_id: rule.id.clone(),
            triggers,
            skipped: None,
            fired_at,
        }
    }

    /// Evaluates every rule at `now`, in the given order.
    #[must_use]
    pub fn evaluate_all(
        &self,
        rules: &[AlertRule],
        snapshot: &MetricsSnapshot,
        now: DateTime<Utc>,
    ) -> Vec<RuleEvaluation> {
        rules
            .iter()
            .map(|rule| self.evaluate_rule(rule, snapshot, now))
            .collect()
    }

    fn evaluate_target(
        &self,
        rule: &AlertRule,
        target_id: &str,
        snapshot: &MetricsSnapshot,
        now: DateTime<Utc>,
    ) -> Option<TargetTrigger> {
        let metrics = snapshot.get(target_id);
        if metrics.is_none() {
            debug!(rule_id = %rule.id, target_id, "target missing from snapshot");
        }

        let triggered: Vec<TriggeredCondition> = rule
            .conditions
            .iter()
            .enumerate()
            .filter_map(|(index, condition)| {
                let outcome = self.conditions.evaluate(condition, metrics, now);
                match (outcome.triggered, outcome.current) {
                    (true, Some(current)) => Some(TriggeredCondition {
                        index,
                        condition: condition.clone(),
                        current,
                        previous: outcome.previous,
                        change_percent: outcome.change_percent,
                        baseline_source: outcome.baseline_source,
                    }),
                    _ => None,
                }
            })
            .collect();

        let total = rule.conditions.len();
        if !rule.condition_logic.is_satisfied(triggered.len(), total) {
            debug!(
                rule_id = %rule.id,
                target_id,
                triggered = triggered.len(),
                total,
                "conditions not satisfied"
            );
            return None;
        }

        Some(TargetTrigger {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            target_id: target_id.to_string(),
            target_name: metrics
                .map(|m| m.name.clone())
                .filter(|name| !name.is_empty()),
            triggered,
            total_conditions: total,
            evaluated_at: now,
        })
    }
}

/// Returns the target ids a rule applies to, without duplicates.
fn resolve_targets<'a>(rule: &'a AlertRule, snapshot: &'a MetricsSnapshot) -> Vec<&'a str> {
    match rule.target_type {
        TargetType::Global => snapshot.target_ids().collect(),
        TargetType::Single | TargetType::Group => {
            let mut seen = Vec::with_capacity(rule.target_ids.len());
            for id in &rule.target_ids {
                if !seen.contains(&id.as_str()) {
                    seen.push(id.as_str());
                }
            }
            seen
        }
    }
}

/// Returns when a rule will be armed again, if it is cooling down at `now`.
#[must_use]
pub fn rearm_at(rule: &AlertRule, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    rule.cooldown_until().filter(|until| now < *until)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricPoint, TargetMetrics};
    use crate::types::{ConditionLogic, ConditionOperator, MetricKind};
    use chrono::Duration;

    fn ccu_at_least(threshold: f64) -> AlertCondition {
        AlertCondition::new(
            MetricKind::ConcurrentUsers,
            ConditionOperator::GreaterThanOrEqual,
            threshold,
        )
        .unwrap()
    }

    fn on_sale() -> AlertCondition {
        AlertCondition::new(MetricKind::SaleActive, ConditionOperator::Equal, 1.0).unwrap()
    }

    fn snapshot() -> MetricsSnapshot {
        MetricsSnapshot::new()
            .with_target(
                "570",
                TargetMetrics::new("Dota 2")
                    .with_concurrent_users(650_000)
                    .with_sale_active(false),
            )
            .with_target(
                "1145360",
                TargetMetrics::new("Hades")
                    .with_concurrent_users(12_000)
                    .with_sale_active(true),
            )
            .with_target(
                "413150",
                TargetMetrics::new("Stardew Valley")
                    .with_concurrent_users(4_000)
                    .with_sale_active(true),
            )
    }

    mod gate_tests {
        use super::*;

        #[test]
        fn disabled_rule_yields_nothing() {
            let rule = AlertRule::builder("off", ccu_at_least(0.0))
                .enabled(false)
                .build()
                .unwrap();

            let eval = RuleEvaluator::new().evaluate_rule(&rule, &snapshot(), Utc::now());
            assert!(eval.triggers.is_empty());
            assert_eq!(eval.skipped, Some(SkipReason::Disabled));
            assert!(!eval.fired());
        }

        #[test]
        fn cooldown_skips_every_target() {
            let now = Utc::now();
            let rule = AlertRule::builder("hot", ccu_at_least(0.0))
                .cooldown_minutes(60)
                .last_triggered_at(now - Duration::seconds(1))
                .build()
                .unwrap();

            let eval = RuleEvaluator::new().evaluate_rule(&rule, &snapshot(), now);
            assert!(eval.triggers.is_empty());
            assert!(matches!(eval.skipped, Some(SkipReason::CoolingDown { .. })));
            assert!(eval.fired_at.is_none());
        }

        #[test]
        fn elapsed_cooldown_rearms() {
            let now = Utc::now();
            let rule = AlertRule::builder("hot", ccu_at_least(0.0))
                .cooldown_minutes(60)
                .last_triggered_at(now - Duration::minutes(60))
                .build()
                .unwrap();

            let eval = RuleEvaluator::new().evaluate_rule(&rule, &snapshot(), now);
            assert_eq!(eval.triggers.len(), 3);
            assert_eq!(eval.fired_at, Some(now));
        }

        #[test]
        fn rule_is_not_mutated() {
            let now = Utc::now();
            let rule = AlertRule::builder("hot", ccu_at_least(0.0)).build().unwrap();
            let before = rule.clone();

            let eval = RuleEvaluator::new().evaluate_rule(&rule, &snapshot(), now);
            assert!(eval.fired());
            assert_eq!(rule, before);
        }

        #[test]
        fn rearm_time() {
            let now = Utc::now();
            let rule = AlertRule::builder("hot", ccu_at_least(0.0))
                .cooldown_minutes(30)
                .last_triggered_at(now - Duration::minutes(10))
                .build()
                .unwrap();

            assert_eq!(rearm_at(&rule, now), Some(now + Duration::minutes(20)));
            assert_eq!(
                rearm_at(&rule, now + Duration::minutes(5)),
                Some(now + Duration::minutes(20))
            );
            assert_eq!(rearm_at(&rule, now + Duration::minutes(30)), None);
        }
    }

    mod target_tests {
        use super::*;

        #[test]
        fn global_rule_covers_every_target() {
            let rule = AlertRule::builder("big", ccu_at_least(10_000.0))
                .global()
                .build()
                .unwrap();

            let eval = RuleEvaluator::new().evaluate_rule(&rule, &snapshot(), Utc::now());
            let ids: Vec<&str> = eval.triggers.iter().map(|t| t.target_id.as_str()).collect();
            assert_eq!(ids, vec!["1145360", "570"]);
        }

        #[test]
        fn scoped_rule_only_covers_its_targets() {
            let rule = AlertRule::builder("big", ccu_at_least(0.0))
                .targets(["413150", "413150", "unknown"])
                .build()
                .unwrap();

            let eval = RuleEvaluator::new().evaluate_rule(&rule, &snapshot(), Utc::now());
            assert_eq!(eval.triggers.len(), 1);
            assert_eq!(eval.triggers[0].target_id, "413150");
            assert_eq!(eval.triggers[0].target_name.as_deref(), Some("Stardew Valley"));
        }

        #[test]
        fn missing_target_never_triggers() {
            let rule = AlertRule::builder("ghost", ccu_at_least(0.0))
                .target("999")
                .build()
                .unwrap();

            let eval = RuleEvaluator::new().evaluate_rule(&rule, &snapshot(), Utc::now());
            assert!(eval.triggers.is_empty());
            assert!(eval.skipped.is_none());
            assert!(!eval.fired());
        }
    }

    mod logic_tests {
        use super::*;

        #[test]
        fn and_requires_every_condition() {
            // Dota 2 passes the player threshold but is not on sale.
            let rule = AlertRule::builder("both", ccu_at_least(100_000.0))
                .condition(on_sale())
                .logic(ConditionLogic::And)
                .target("570")
                .build()
                .unwrap();

            let eval = RuleEvaluator::new().evaluate_rule(&rule, &snapshot(), Utc::now());
            assert!(eval.triggers.is_empty());
        }

        #[test]
        fn or_requires_any_condition() {
            let rule = AlertRule::builder("either", ccu_at_least(100_000.0))
                .condition(on_sale())
                .logic(ConditionLogic::Or)
                .target("570")
                .build()
                .unwrap();

            let eval = RuleEvaluator::new().evaluate_rule(&rule, &snapshot(), Utc::now());
            assert_eq!(eval.triggers.len(), 1);
            let trigger = &eval.triggers[0];
            assert_eq!(trigger.triggered.len(), 1);
            assert_eq!(trigger.triggered[0].index, 0);
            assert_eq!(trigger.total_conditions, 2);
        }

        #[test]
        fn all_triggered_conditions_are_reported() {
            let rule = AlertRule::builder("either", ccu_at_least(1_000.0))
                .condition(on_sale())
                .logic(ConditionLogic::Or)
                .target("1145360")
                .build()
                .unwrap();

            let eval = RuleEvaluator::new().evaluate_rule(&rule, &snapshot(), Utc::now());
            let indices: Vec<usize> = eval.triggers[0].triggered.iter().map(|c| c.index).collect();
            assert_eq!(indices, vec![0, 1]);
        }

        #[test]
        fn change_condition_carries_baseline() {
            let now = Utc::now();
            let snapshot = MetricsSnapshot::new().with_target(
                "570",
                TargetMetrics::new("Dota 2")
                    .with_concurrent_users(150)
                    .with_point(
                        MetricKind::ConcurrentUsers,
                        MetricPoint::new(100.0, now - Duration::hours(2)),
                    ),
            );
            let surge = AlertCondition::new(
                MetricKind::ConcurrentUsers,
                ConditionOperator::IncreasedBy,
                25.0,
            )
            .unwrap()
            .with_time_window(60);
            let rule = AlertRule::builder("surge", surge).target("570").build().unwrap();

            let eval = RuleEvaluator::new().evaluate_rule(&rule, &snapshot, now);
            let triggered = &eval.triggers[0].triggered[0];
            assert_eq!(triggered.previous, Some(100.0));
            assert_eq!(triggered.change_percent, Some(50.0));
            assert_eq!(triggered.baseline_source, Some(BaselineSource::Window));
        }
    }

    #[test]
    fn evaluate_all_keeps_rule_order() {
        let a = AlertRule::builder("a", ccu_at_least(0.0)).id("a").build().unwrap();
        let b = AlertRule::builder("b", ccu_at_least(0.0))
            .id("b")
            .enabled(false)
            .build()
            .unwrap();

        let evals = RuleEvaluator::new().evaluate_all(&[a, b], &snapshot(), Utc::now());
        assert_eq!(evals.len(), 2);
        assert_eq!(evals[0].rule_id, "a");
        assert!(evals[0].fired());
        assert_eq!(evals[1].rule_id, "b");
        assert!(!evals[1].fired());
    }
}
