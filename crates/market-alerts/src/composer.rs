//! Turns triggered evaluations into alert messages.

use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::evaluator::TargetTrigger;
use crate::metrics::BaselineSource;
use crate::priority::PriorityCalculator;
use crate::types::{AlertData, AlertMessage, AlertPriority, AlertRule};

/// Builds [`AlertMessage`]s from [`TargetTrigger`]s.
#[derive(Debug, Clone, Default)]
pub struct MessageComposer {
    dynamic_priority: bool,
    action_base_url: Option<Url>,
    priorities: PriorityCalculator,
}

impl MessageComposer {
    /// Creates a composer that keeps each rule's static priority.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives priority from the first triggered change when one exists.
    #[must_use]
    pub const fn dynamic_priority(mut self, enabled: bool) -> Self {
        self.dynamic_priority = enabled;
        self
    }

    /// Adds action links under the given dashboard URL.
    #[must_use]
    pub fn action_base_url(mut self, url: Option<Url>) -> Self {
        self.action_base_url = url;
        self
    }

    /// Composes the message for one triggered target of `rule`.
    #[must_use]
    pub fn compose(&self, rule: &AlertRule, trigger: &TargetTrigger) -> AlertMessage {
        let title = match &trigger.target_name {
            Some(name) => format!("[{name}] {}", rule.name),
            None => rule.name.clone(),
        };

        let first = trigger.triggered.first();
        let mut body = first.map_or_else(
            || "Rule conditions met.".to_string(),
            |c| {
                let metric = c.condition.metric;
                match (c.previous, c.change_percent) {
                    (Some(previous), Some(change)) => format!(
                        "{} {} by {:.1}%, {} → {}.",
                        metric.label(),
                        if change < 0.0 { "fell" } else { "rose" },
                        change.abs(),
                        metric.format_value(previous),
                        metric.format_value(c.current),
                    ),
                    _ => format!("{} reached {}.", metric.label(), metric.format_value(c.current)),
                }
            },
        );

        let others = trigger.triggered.len().saturating_sub(1);
        if others > 0 {
            let noun = if others == 1 { "condition" } else { "conditions" };
            body.push_str(&format!(" {others} more {noun} also met."));
        }

        let priority = self.priority_for(rule, trigger);

        let data = AlertData {
            metric: first.map(|c| c.condition.metric),
            previous_value: first.and_then(|c| c.previous),
            current_value: first.map(|c| c.current),
            change_percent: first.and_then(|c| c.change_percent),
            threshold: first.map(|c| c.condition.value),
            triggered_at: trigger.evaluated_at,
            baseline_fallback: first
                .is_some_and(|c| c.baseline_source == Some(BaselineSource::OldestFallback)),
            additional_info: None,
        };

        let action_url = self
            .action_base_url
            .as_ref()
            .and_then(|base| action_link(base, &trigger.target_id));

        debug!(
            rule_id = %rule.id,
            target_id = %trigger.target_id,
            priority = %priority,
            "composed alert message"
        );

        AlertMessage {
            id: Uuid::new_v4().to_string(),
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            target_id: Some(trigger.target_id.clone()),
            target_name: trigger.target_name.clone(),
            title,
            body,
            summary: None,
            data,
            priority,
            channels: rule.channels.clone(),
            created_at: trigger.evaluated_at,
            action_url,
        }
    }

    fn priority_for(&self, rule: &AlertRule, trigger: &TargetTrigger) -> AlertPriority {
        if !self.dynamic_priority {
            return rule.priority;
        }

        trigger
            .triggered
            .iter()
            .find_map(|c| c.change_percent.map(|change| (c.condition.metric, change)))
            .map_or(rule.priority, |(metric, change)| {
                self.priorities.from_signed(metric, change)
            })
    }
}

/// Builds `<base>/games/<target_id>` with the id as one encoded path segment.
fn action_link(base: &Url, target_id: &str) -> Option<String> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .push("games")
        .push(target_id);
    Some(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::TriggeredCondition;
    use crate::types::{AlertCondition, Channel, ConditionOperator, MetricKind};
    use chrono::Utc;

    fn rule() -> AlertRule {
        let condition = AlertCondition::new(
            MetricKind::ConcurrentUsers,
            ConditionOperator::GreaterThanOrEqual,
            10_000.0,
        )
        .unwrap();
        AlertRule::builder("Player surge", condition)
            .id("rule-1")
            .target("1145360")
            .channels([Channel::Slack, Channel::Email])
            .priority(AlertPriority::High)
            .build()
            .unwrap()
    }

    fn triggered(
        condition: AlertCondition,
        current: f64,
        previous: Option<f64>,
    ) -> TriggeredCondition {
        TriggeredCondition {
            index: 0,
            change_percent: previous.and_then(|p| crate::condition::percent_change(p, current)),
            condition,
            current,
            previous,
            baseline_source: previous.map(|_| BaselineSource::Window),
        }
    }

    fn trigger(conditions: Vec<TriggeredCondition>, target_name: Option<&str>) -> TargetTrigger {
        TargetTrigger {
            rule_id: "rule-1".to_string(),
            rule_name: "Player surge".to_string(),
            target_id: "1145360".to_string(),
            target_name: target_name.map(ToString::to_string),
            total_conditions: conditions.len(),
            triggered: conditions,
            evaluated_at: Utc::now(),
        }
    }

    fn above_threshold(target_name: Option<&str>) -> TargetTrigger {
        let condition = ccu(ConditionOperator::GreaterThan, 1.0);
        trigger(vec![triggered(condition, 12_000.0, None)], target_name)
    }

    fn base(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    fn ccu(op: ConditionOperator, value: f64) -> AlertCondition {
        AlertCondition::new(MetricKind::ConcurrentUsers, op, value).unwrap()
    }

    #[test]
    fn title_includes_target_name() {
        let rule = rule();
        let t = above_threshold(Some("Hades"));
        let msg = MessageComposer::new().compose(&rule, &t);
        assert_eq!(msg.title, "[Hades] Player surge");
    }

    #[test]
    fn title_without_target_name_is_rule_name() {
        let rule = rule();
        let t = above_threshold(None);
        let msg = MessageComposer::new().compose(&rule, &t);
        assert_eq!(msg.title, "Player surge");
    }

    #[test]
    fn direct_body_reports_value() {
        let rule = rule();
        let t = trigger(
            vec![triggered(ccu(ConditionOperator::GreaterThanOrEqual, 10_000.0), 12_000.0, None)],
            Some("Hades"),
        );
        let msg = MessageComposer::new().compose(&rule, &t);

        assert_eq!(msg.body, "Concurrent players reached 12,000.");
        assert_eq!(msg.data.metric, Some(MetricKind::ConcurrentUsers));
        assert_eq!(msg.data.current_value, Some(12_000.0));
        assert_eq!(msg.data.threshold, Some(10_000.0));
        assert!(msg.data.previous_value.is_none());
        assert_eq!(msg.data.triggered_at, t.evaluated_at);
        assert_eq!(msg.created_at, t.evaluated_at);
    }

    #[test]
    fn change_body_reports_direction() {
        let rule = rule();
        let rose = trigger(
            vec![triggered(ccu(ConditionOperator::IncreasedBy, 20.0), 15_000.0, Some(10_000.0))],
            Some("Hades"),
        );
        let msg = MessageComposer::new().compose(&rule, &rose);
        assert_eq!(msg.body, "Concurrent players rose by 50.0%, 10,000 → 15,000.");
        assert_eq!(msg.data.change_percent, Some(50.0));
        assert_eq!(msg.data.previous_value, Some(10_000.0));

        let fell = trigger(
            vec![triggered(ccu(ConditionOperator::DecreasedBy, 20.0), 5_000.0, Some(10_000.0))],
            Some("Hades"),
        );
        let msg = MessageComposer::new().compose(&rule, &fell);
        assert_eq!(msg.body, "Concurrent players fell by 50.0%, 10,000 → 5,000.");
    }

    #[test]
    fn extra_conditions_are_counted() {
        let rule = rule();
        let sale =
            AlertCondition::new(MetricKind::SaleActive, ConditionOperator::Equal, 1.0).unwrap();
        let mut second = triggered(sale, 1.0, None);
        second.index = 1;
        let t = trigger(
            vec![triggered(ccu(ConditionOperator::GreaterThan, 1.0), 12_000.0, None), second],
            Some("Hades"),
        );

        let msg = MessageComposer::new().compose(&rule, &t);
        assert_eq!(msg.body, "Concurrent players reached 12,000. 1 more condition also met.");
    }

    #[test]
    fn static_priority_and_channels_come_from_rule() {
        let rule = rule();
        let t = trigger(
            vec![triggered(ccu(ConditionOperator::IncreasedBy, 20.0), 30_000.0, Some(10_000.0))],
            Some("Hades"),
        );
        let msg = MessageComposer::new().compose(&rule, &t);
        assert_eq!(msg.priority, AlertPriority::High);
        assert_eq!(msg.channels, vec![Channel::Slack, Channel::Email]);
        assert_eq!(msg.rule_id, "rule-1");
        assert_eq!(msg.target_id.as_deref(), Some("1145360"));
    }

    #[test]
    fn dynamic_priority_follows_change() {
        let rule = rule();
        let t = trigger(
            vec![triggered(ccu(ConditionOperator::IncreasedBy, 20.0), 30_000.0, Some(10_000.0))],
            Some("Hades"),
        );
        let msg = MessageComposer::new().dynamic_priority(true).compose(&rule, &t);
        assert_eq!(msg.priority, AlertPriority::Critical);
    }

    #[test]
    fn dynamic_priority_without_change_keeps_rule_priority() {
        let rule = rule();
        let t = above_threshold(None);
        let msg = MessageComposer::new().dynamic_priority(true).compose(&rule, &t);
        assert_eq!(msg.priority, AlertPriority::High);
    }

    #[test]
    fn action_link_uses_target() {
        let rule = rule();
        let t = above_threshold(None);
        let msg = MessageComposer::new()
            .action_base_url(Some(base("https://dash.example.com/")))
            .compose(&rule, &t);
        assert_eq!(msg.action_url.as_deref(), Some("https://dash.example.com/games/1145360"));
    }

    #[test]
    fn action_link_keeps_base_path() {
        let rule = rule();
        let t = above_threshold(None);
        let msg = MessageComposer::new()
            .action_base_url(Some(base("https://dash.example.com/app?tab=1#top")))
            .compose(&rule, &t);
        assert_eq!(
            msg.action_url.as_deref(),
            Some("https://dash.example.com/app/games/1145360")
        );
    }

    #[test]
    fn action_link_encodes_target_id() {
        let rule = rule();
        let mut t = above_threshold(None);
        t.target_id = "a b/../admin?x=1#f".to_string();

        let msg = MessageComposer::new()
            .action_base_url(Some(base("https://dash.example.com")))
            .compose(&rule, &t);
        let link = msg.action_url.unwrap();
        assert_eq!(link, "https://dash.example.com/games/a%20b%2F..%2Fadmin%3Fx=1%23f");

        let parsed = Url::parse(&link).unwrap();
        assert_eq!(parsed.path_segments().unwrap().count(), 2);
        assert!(parsed.query().is_none());
        assert!(parsed.fragment().is_none());
    }

    #[test]
    fn fallback_baseline_is_flagged() {
        let rule = rule();
        let mut c = triggered(ccu(ConditionOperator::IncreasedBy, 20.0), 15_000.0, Some(10_000.0));
        c.baseline_source = Some(BaselineSource::OldestFallback);
        let msg = MessageComposer::new().compose(&rule, &trigger(vec![c], None));
        assert!(msg.data.baseline_fallback);
    }
}
