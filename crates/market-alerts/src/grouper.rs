//! Collapses bursts of repeated firings into single messages.
//!
//! Messages are partitioned by rule and target. Within a partition, a message
//! joins the current cluster when it was created no more than the grouping
//! window after the previous message of that cluster. Clusters of one pass
//! through untouched; larger clusters are merged and keep an audit trail of
//! every original firing in `data.additional_info.grouped_alerts`.

use std::collections::HashMap;

use chrono::Duration;
use tracing::debug;

use crate::config::DEFAULT_GROUPING_WINDOW_MINUTES;
use crate::types::{AdditionalInfo, AlertMessage, GroupedAlert};

/// Groups alert messages produced within one tick.
#[derive(Debug, Clone, Copy)]
pub struct AlertGrouper {
    window: Duration,
}

impl Default for AlertGrouper {
    fn default() -> Self {
        Self::new(DEFAULT_GROUPING_WINDOW_MINUTES)
    }
}

impl AlertGrouper {
    /// Creates a grouper with a window in minutes.
    #[must_use]
    pub fn new(window_minutes: u32) -> Self {
        Self {
            window: Duration::minutes(i64::from(window_minutes)),
        }
    }

    /// Returns the grouping window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Groups a batch of messages.
    ///
    /// Output follows the order in which each (rule, target) pair first
    /// appears in the input, and clusters within a pair are chronological.
    #[must_use]
    pub fn group(&self, messages: Vec<AlertMessage>) -> Vec<AlertMessage> {
        let input = messages.len();
        let mut partitions: Vec<Vec<AlertMessage>> = Vec::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        for message in messages {
            let slot = *index.entry(message.group_key()).or_insert_with(|| {
                partitions.push(Vec::new());
                partitions.len() - 1
            });
            partitions[slot].push(message);
        }

        let mut grouped = Vec::with_capacity(partitions.len());
        for mut partition in partitions {
            partition.sort_by_key(|m| m.created_at);

            let mut cluster: Vec<AlertMessage> = Vec::new();
            for message in partition {
                let starts_new = cluster
                    .last()
                    .is_some_and(|prev| message.created_at - prev.created_at > self.window);
                if starts_new {
                    grouped.extend(merge(std::mem::take(&mut cluster)));
                }
                cluster.push(message);
            }
            grouped.extend(merge(cluster));
        }

        debug!(input, output = grouped.len(), "grouped alert messages");
        grouped
    }
}

/// Merges a chronologically sorted cluster. Empty clusters yield nothing.
fn merge(mut cluster: Vec<AlertMessage>) -> Option<AlertMessage> {
    if cluster.len() <= 1 {
        return cluster.pop();
    }

    let count = cluster.len();
    let audit: Vec<GroupedAlert> = cluster
        .iter()
        .map(|m| GroupedAlert {
            id: m.id.clone(),
            triggered_at: m.data.triggered_at,
            value: m.data.current_value,
        })
        .collect();

    let priority = cluster.iter().map(|m| m.priority).max().unwrap_or_default();
    let mut channels = Vec::new();
    for channel in cluster.iter().flat_map(|m| m.channels.iter()) {
        if !channels.contains(channel) {
            channels.push(channel.clone());
        }
    }

    let first_at = cluster.first().map(|m| m.created_at);
    let mut merged = cluster.pop()?;

    let since = first_at.map_or_else(String::new, |at| format!(" since {}", at.format("%H:%M")));
    merged.title = format!("{} ({count} times)", merged.title);
    merged.body = format!("{}\n\nOccurred {count} times{since}.", merged.body);
    merged.priority = priority;
    merged.channels = channels;
    merged
        .data
        .additional_info
        .get_or_insert_with(AdditionalInfo::default)
        .grouped_alerts = audit;

    Some(merged)
}

/// Groups messages with a window in minutes.
#[must_use]
pub fn group(messages: Vec<AlertMessage>, window_minutes: u32) -> Vec<AlertMessage> {
    AlertGrouper::new(window_minutes).group(messages)
}
