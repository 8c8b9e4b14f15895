//! One evaluation tick, end to end.
//!
//! The [`Pipeline`] evaluates rules against a metrics snapshot, composes a
//! message per triggered target, collapses bursts and renders each surviving
//! message for its channels. It holds no state between ticks: firings are
//! reported in [`TickOutput::fired`] and the caller decides when to persist
//! them (see [`TickOutput::record_firings`]).

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::channels::{ChannelFormatter, FormattedMessage};
use crate::composer::MessageComposer;
use crate::condition::ConditionEvaluator;
use crate::config::EngineConfig;
use crate::evaluator::{RuleEvaluator, SkipReason, rearm_at};
use crate::grouper::AlertGrouper;
use crate::metrics::{MetricRegistry, MetricsSnapshot};
use crate::types::{AlertMessage, AlertRule, Channel};

/// A rule that fired during the tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFired {
    /// The rule that fired.
    pub rule_id: String,
    /// New value for the rule's `last_triggered_at`.
    pub fired_at: DateTime<Utc>,
    /// When the rule will be armed again.
    pub rearm_at: DateTime<Utc>,
}

/// A rule that was not evaluated during the tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSkipped {
    /// The skipped rule.
    pub rule_id: String,
    /// Why it was skipped.
    #[serde(flatten)]
    pub reason: SkipReason,
    /// When a cooling-down rule is armed again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rearm_at: Option<DateTime<Utc>>,
}

/// A message rendered for one of its channels, ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelDelivery {
    /// Id of the message being delivered.
    pub message_id: String,
    /// Destination channel.
    pub channel: Channel,
    /// Rendered payload.
    pub payload: FormattedMessage,
}

/// Counters for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickStats {
    /// Rules looked at, including skipped ones.
    pub rules_evaluated: usize,
    /// Rules skipped because they were disabled or cooling down.
    pub rules_skipped: usize,
    /// Triggered (rule, target) pairs before grouping.
    pub triggers: usize,
    /// Messages after grouping.
    pub messages: usize,
    /// Rendered channel payloads.
    pub deliveries: usize,
}

/// Everything a tick produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickOutput {
    /// Rules that fired.
    pub fired: Vec<RuleFired>,
    /// Rules that were skipped.
    pub skipped: Vec<RuleSkipped>,
    /// Grouped messages.
    pub messages: Vec<AlertMessage>,
    /// Rendered payloads, one per message and channel.
    pub deliveries: Vec<ChannelDelivery>,
    /// Counters.
    pub stats: TickStats,
}

impl TickOutput {
    /// Writes each firing into the matching rule's `last_triggered_at`.
    ///
    /// Returns the number of rules updated.
    pub fn record_firings(&self, rules: &mut [AlertRule]) -> usize {
        let mut updated = 0;
        for fired in &self.fired {
            for rule in rules.iter_mut().filter(|r| r.id == fired.rule_id) {
                rule.last_triggered_at = Some(fired.fired_at);
                updated += 1;
            }
        }
        updated
    }
}

/// Runs evaluation, composition, grouping and formatting for a tick.
#[derive(Debug, Clone)]
pub struct Pipeline {
    evaluator: RuleEvaluator,
    composer: MessageComposer,
    grouper: AlertGrouper,
    formatter: ChannelFormatter,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Pipeline {
    /// Builds a pipeline from configuration with the standard metrics.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_registry(config, MetricRegistry::standard())
    }

    /// Builds a pipeline from configuration with a custom metric registry.
    #[must_use]
    pub fn with_registry(config: &EngineConfig, registry: MetricRegistry) -> Self {
        let conditions = ConditionEvaluator::with_registry(registry, config.baseline_policy);
        let action_base = config.action_base().unwrap_or_else(|e| {
            warn!(error = %e, "action links disabled");
            None
        });
        Self {
            evaluator: RuleEvaluator::with_condition_evaluator(conditions),
            composer: MessageComposer::new()
                .dynamic_priority(config.dynamic_priority)
                .action_base_url(action_base),
            grouper: AlertGrouper::new(config.grouping_window_minutes),
            formatter: ChannelFormatter::new(config.timestamp_format.clone()),
        }
    }

    /// Runs one tick at `now`.
    #[must_use]
    pub fn run(
        &self,
        rules: &[AlertRule],
        snapshot: &MetricsSnapshot,
        now: DateTime<Utc>,
    ) -> TickOutput {
        let mut output = TickOutput::default();
        let mut composed = Vec::new();

        for (rule, evaluation) in rules
            .iter()
            .zip(self.evaluator.evaluate_all(rules, snapshot, now))
        {
            output.stats.rules_evaluated += 1;

            if let Some(reason) = evaluation.skipped {
                output.stats.rules_skipped += 1;
                output.skipped.push(RuleSkipped {
                    rule_id: evaluation.rule_id,
                    reason,
                    rearm_at: rearm_at(rule, now),
                });
                continue;
            }

            output.stats.triggers += evaluation.triggers.len();
            composed.extend(
                evaluation
                    .triggers
                    .iter()
                    .map(|trigger| self.composer.compose(rule, trigger)),
            );

            if let Some(fired_at) = evaluation.fired_at {
                output.fired.push(RuleFired {
                    rule_id: evaluation.rule_id,
                    fired_at,
                    rearm_at: rule.rearm_after(fired_at),
                });
            }
        }

        output.messages = self.grouper.group(composed);

        for message in &output.messages {
            for payload in self.formatter.format_all(message) {
                debug!(message_id = %message.id, channel = %payload.channel, "rendered payload");
                output.deliveries.push(ChannelDelivery {
                    message_id: message.id.clone(),
                    channel: payload.channel.clone(),
                    payload,
                });
            }
        }

        output.stats.messages = output.messages.len();
        output.stats.deliveries = output.deliveries.len();

        info!(
            rules = output.stats.rules_evaluated,
            skipped = output.stats.rules_skipped,
            fired = output.fired.len(),
            triggers = output.stats.triggers,
            messages = output.stats.messages,
            deliveries = output.stats.deliveries,
            "tick complete"
        );

        output
    }
}
