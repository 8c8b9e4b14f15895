//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use chrono::{DateTime, Utc};
use market_alerts::pipeline::ChannelDelivery;
use market_alerts::{RichContent, SkipReason, TickOutput};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone, Default)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Result of an `evaluate` run.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    /// Evaluation time.
    pub evaluated_at: DateTime<Utc>,
    /// Everything the tick produced.
    #[serde(flatten)]
    pub output: TickOutput,
    /// Include rendered payloads in table output.
    #[serde(skip)]
    pub show_payloads: bool,
}

impl TableDisplay for EvaluationReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let stats = &self.output.stats;
        writeln!(writer, "Evaluation at {}", self.evaluated_at.to_rfc3339())?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(
            writer,
            "Rules:       {} ({} skipped)",
            stats.rules_evaluated, stats.rules_skipped
        )?;
        writeln!(writer, "Fired:       {}", self.output.fired.len())?;
        writeln!(writer, "Triggers:    {}", stats.triggers)?;
        writeln!(writer, "Messages:    {}", stats.messages)?;
        writeln!(writer, "Deliveries:  {}", stats.deliveries)?;

        if !self.output.skipped.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "{:<24}  {:<14}  {}", "SKIPPED RULE", "REASON", "RE-ARMS AT")?;
            writeln!(writer, "{}", "─".repeat(72))?;
            for skipped in &self.output.skipped {
                let reason = match skipped.reason {
                    SkipReason::Disabled => "disabled",
                    SkipReason::CoolingDown { .. } => "cooling down",
                };
                let rearm = skipped
                    .rearm_at
                    .map_or_else(|| "-".to_string(), |at| at.to_rfc3339());
                writeln!(
                    writer,
                    "{:<24}  {:<14}  {}",
                    truncate(&skipped.rule_id, 24),
                    reason,
                    rearm
                )?;
            }
        }

        if self.output.messages.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "No alerts fired")?;
            return Ok(());
        }

        writeln!(writer)?;
        writeln!(writer, "{:<8}  {:<12}  {:<40}  {}", "PRIORITY", "TARGET", "TITLE", "CHANNELS")?;
        writeln!(writer, "{}", "─".repeat(96))?;
        for message in &self.output.messages {
            let channels: Vec<&str> = message.channels.iter().map(|c| c.as_str()).collect();
            writeln!(
                writer,
                "{:<8}  {:<12}  {:<40}  {}",
                message.priority.as_str(),
                truncate(message.target_id.as_deref().unwrap_or("-"), 12),
                truncate(&message.title, 40),
                channels.join(",")
            )?;
            for line in message.body.lines().filter(|l| !l.is_empty()) {
                writeln!(writer, "          {line}")?;
            }
        }

        if self.show_payloads {
            for delivery in &self.output.deliveries {
                writeln!(writer)?;
                write_delivery(writer, delivery)?;
            }
        }

        Ok(())
    }
}

fn write_delivery<W: Write>(writer: &mut W, delivery: &ChannelDelivery) -> Result<(), CliError> {
    writeln!(writer, "── {} → {}", delivery.message_id, delivery.channel)?;
    if let Some(subject) = &delivery.payload.subject {
        writeln!(writer, "Subject: {subject}")?;
    }
    match &delivery.payload.rich_content {
        Some(RichContent::Html(html)) => writeln!(writer, "{html}")?,
        Some(RichContent::Slack(doc)) => {
            let json = serde_json::to_string_pretty(doc)
                .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
            writeln!(writer, "{json}")?;
        }
        Some(RichContent::Discord(doc)) => {
            let json = serde_json::to_string_pretty(doc)
                .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
            writeln!(writer, "{json}")?;
        }
        None => writeln!(writer, "{}", delivery.payload.content)?,
    }
    Ok(())
}

/// Validation outcome for one rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleCheck {
    /// Rule id.
    pub id: String,
    /// Rule name.
    pub name: String,
    /// One-line rendering of the rule.
    pub summary: String,
    /// Validation error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RuleCheck {
    /// Whether the rule passed validation.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a `validate` run.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// One entry per rule, in file order.
    pub rules: Vec<RuleCheck>,
}

impl ValidationReport {
    /// Number of rules that failed validation.
    #[must_use]
    pub fn invalid_count(&self) -> usize {
        self.rules.iter().filter(|r| !r.is_valid()).count()
    }
}

impl TableDisplay for ValidationReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.rules.is_empty() {
            writeln!(writer, "No rules defined")?;
            return Ok(());
        }

        writeln!(writer, "{:<24}  {:<7}  {}", "RULE", "STATUS", "DETAIL")?;
        writeln!(writer, "{}", "─".repeat(96))?;
        for rule in &self.rules {
            let (status, detail) = match &rule.error {
                None => ("ok", rule.summary.as_str()),
                Some(error) => ("invalid", error.as_str()),
            };
            writeln!(writer, "{:<24}  {:<7}  {}", truncate(&rule.id, 24), status, detail)?;
        }

        writeln!(writer)?;
        writeln!(
            writer,
            "Total: {} rule(s), {} invalid",
            self.rules.len(),
            self.invalid_count()
        )?;
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
