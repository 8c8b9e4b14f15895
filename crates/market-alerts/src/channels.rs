//! Channel-specific rendering of alert messages.
//!
//! [`ChannelFormatter`] shapes an [`AlertMessage`] into the document each
//! delivery channel expects. It performs no I/O; transport, retries and
//! failure reporting belong to the delivery collaborator.
//!
//! The Slack and Discord documents mirror the Block Kit and embed webhook
//! formats and are modelled as typed structs, so a malformed payload cannot
//! be built.

use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_TIMESTAMP_FORMAT;
use crate::types::{AlertMessage, AlertPriority, Channel};

/// Slack limits header blocks to 150 characters.
const SLACK_HEADER_MAX: usize = 150;
/// Slack limits section text to 3000 characters.
const SLACK_SECTION_MAX: usize = 3000;
/// Discord limits embed titles to 256 characters.
const DISCORD_TITLE_MAX: usize = 256;
/// Discord limits embed descriptions to 4096 characters.
const DISCORD_DESCRIPTION_MAX: usize = 4096;

/// A message rendered for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedMessage {
    /// The channel this rendering is for.
    pub channel: Channel,
    /// Subject line, for channels that have one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Plain-text content.
    pub content: String,
    /// Structured document, for channels that take one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_content: Option<RichContent>,
}

/// Channel-specific structured documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "document", rename_all = "snake_case")]
pub enum RichContent {
    /// An HTML email body.
    Html(String),
    /// A Slack Block Kit message.
    Slack(SlackMessage),
    /// A Discord webhook message.
    Discord(DiscordMessage),
}

/// A Slack Block Kit message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackMessage {
    /// Fallback text used in notifications.
    pub text: String,
    /// Layout blocks.
    pub blocks: Vec<SlackBlock>,
}

/// A Slack layout block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackBlock {
    /// Large bold header.
    Header {
        /// Header text, always plain text.
        text: SlackText,
    },
    /// Body text.
    Section {
        /// Section text.
        text: SlackText,
    },
    /// Small footer elements.
    Context {
        /// Footer texts.
        elements: Vec<SlackText>,
    },
}

/// A Slack text object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackText {
    /// Text flavour.
    #[serde(rename = "type")]
    pub kind: SlackTextKind,
    /// The text.
    pub text: String,
}

impl SlackText {
    /// Plain text.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: SlackTextKind::PlainText,
            text: text.into(),
        }
    }

    /// Slack-flavoured markdown.
    #[must_use]
    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            kind: SlackTextKind::Mrkdwn,
            text: text.into(),
        }
    }
}

/// Slack text flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlackTextKind {
    /// Rendered verbatim.
    PlainText,
    /// Slack markdown.
    Mrkdwn,
}

/// A Discord webhook message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscordMessage {
    /// Embeds in the message.
    pub embeds: Vec<DiscordEmbed>,
}

/// A Discord embed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscordEmbed {
    /// Embed title.
    pub title: String,
    /// Embed body.
    pub description: String,
    /// Sidebar color as `0xRRGGBB`.
    pub color: u32,
    /// ISO 8601 timestamp shown in the footer.
    pub timestamp: String,
    /// Link opened by clicking the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Inline fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<DiscordField>,
    /// Footer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<DiscordFooter>,
}

/// A Discord embed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscordField {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: String,
    /// Whether the field sits inline.
    pub inline: bool,
}

/// A Discord embed footer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscordFooter {
    /// Footer text.
    pub text: String,
}

/// Embed color for a priority.
#[must_use]
pub const fn priority_color(priority: AlertPriority) -> u32 {
    match priority {
        AlertPriority::Critical => 0x00E7_4C3C,
        AlertPriority::High => 0x00E6_7E22,
        AlertPriority::Medium => 0x0034_98DB,
        AlertPriority::Low => 0x0095_A5A6,
    }
}

/// Renders alert messages for delivery channels.
#[derive(Debug, Clone)]
pub struct ChannelFormatter {
    timestamp_format: String,
}

impl Default for ChannelFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_TIMESTAMP_FORMAT)
    }
}

impl ChannelFormatter {
    /// Creates a formatter with a strftime pattern for displayed timestamps.
    #[must_use]
    pub fn new(timestamp_format: impl Into<String>) -> Self {
        Self {
            timestamp_format: timestamp_format.into(),
        }
    }

    /// Renders `message` for `channel`.
    ///
    /// Unrecognized channels get the plain body.
    #[must_use]
    pub fn format(&self, message: &AlertMessage, channel: &Channel) -> FormattedMessage {
        match channel {
            Channel::Email => self.email(message),
            Channel::Slack => self.slack(message),
            Channel::Discord => Self::discord(message),
            Channel::Push | Channel::InApp | Channel::Other(_) => FormattedMessage {
                channel: channel.clone(),
                subject: None,
                content: message.body.clone(),
                rich_content: None,
            },
        }
    }

    /// Renders `message` for every channel it is addressed to.
    #[must_use]
    pub fn format_all(&self, message: &AlertMessage) -> Vec<FormattedMessage> {
        message
            .channels
            .iter()
            .map(|channel| self.format(message, channel))
            .collect()
    }

    fn email(&self, message: &AlertMessage) -> FormattedMessage {
        let triggered = self.display_time(message.data.triggered_at);

        let mut text = format!("{}\n\n{}", message.title, message.body);
        if let Some(summary) = &message.summary {
            let _ = write!(text, "\n\n{summary}");
        }
        let _ = write!(text, "\n\nTriggered at {triggered}");
        if let Some(url) = &message.action_url {
            let _ = write!(text, "\n\nView details: {url}");
        }

        let mut html = String::from(
            "<div style=\"font-family:sans-serif;max-width:600px\">",
        );
        let _ = write!(html, "<h2>{}</h2>", escape_html(&message.title));
        let _ = write!(html, "<p>{}</p>", escape_html(&message.body).replace('\n', "<br>"));
        if let Some(summary) = &message.summary {
            let _ = write!(
                html,
                "<blockquote style=\"color:#555\">{}</blockquote>",
                escape_html(summary)
            );
        }
        let _ = write!(
            html,
            "<p style=\"color:#888;font-size:12px\">Triggered at {}</p>",
            escape_html(&triggered)
        );
        if let Some(url) = &message.action_url {
            let _ = write!(
                html,
                "<p><a href=\"{}\" style=\"display:inline-block;padding:8px 16px;\
                 background:#1b2838;color:#fff;text-decoration:none;border-radius:4px\">\
                 View details</a></p>",
                escape_html(url)
            );
        }
        html.push_str("</div>");

        FormattedMessage {
            channel: Channel::Email,
            subject: Some(message.title.clone()),
            content: text,
            rich_content: Some(RichContent::Html(html)),
        }
    }

    fn slack(&self, message: &AlertMessage) -> FormattedMessage {
        let document = SlackMessage {
            text: message.title.clone(),
            blocks: vec![
                SlackBlock::Header {
                    text: SlackText::plain(truncate(&message.title, SLACK_HEADER_MAX)),
                },
                SlackBlock::Section {
                    text: SlackText::markdown(truncate(&message.body, SLACK_SECTION_MAX)),
                },
                SlackBlock::Context {
                    elements: vec![SlackText::markdown(format!(
                        "Triggered at {} · priority *{}*",
                        self.display_time(message.data.triggered_at),
                        message.priority
                    ))],
                },
            ],
        };

        FormattedMessage {
            channel: Channel::Slack,
            subject: None,
            content: message.body.clone(),
            rich_content: Some(RichContent::Slack(document)),
        }
    }

    fn discord(message: &AlertMessage) -> FormattedMessage {
        let mut fields = Vec::new();
        if let (Some(metric), Some(current)) = (message.data.metric, message.data.current_value) {
            fields.push(DiscordField {
                name: metric.label().to_string(),
                value: metric.format_value(current),
                inline: true,
            });
        }
        if let Some(change) = message.data.change_percent {
            fields.push(DiscordField {
                name: "Change".to_string(),
                value: format!("{change:+.1}%"),
                inline: true,
            });
        }

        let embed = DiscordEmbed {
            title: truncate(&message.title, DISCORD_TITLE_MAX),
            description: truncate(&message.body, DISCORD_DESCRIPTION_MAX),
            color: priority_color(message.priority),
            timestamp: message
                .data
                .triggered_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            url: message.action_url.clone(),
            fields,
            footer: Some(DiscordFooter {
                text: format!("Priority: {}", message.priority),
            }),
        };

        FormattedMessage {
            channel: Channel::Discord,
            subject: None,
            content: message.body.clone(),
            rich_content: Some(RichContent::Discord(DiscordMessage {
                embeds: vec![embed],
            })),
        }
    }

    /// Formats a timestamp with the configured pattern, falling back to
    /// RFC 3339 if the pattern cannot be rendered.
    fn display_time(&self, at: DateTime<Utc>) -> String {
        let mut out = String::new();
        if write!(out, "{}", at.format(&self.timestamp_format)).is_err() {
            return at.to_rfc3339_opts(SecondsFormat::Secs, true);
        }
        out
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertData, MetricKind};
    use chrono::TimeZone;

    fn message() -> AlertMessage {
        let at = Utc.with_ymd_and_hms(2026, 10, 17, 14, 30, 0).unwrap();
        AlertMessage {
            id: "m1".to_string(),
            rule_id: "r1".to_string(),
            rule_name: "Player surge".to_string(),
            target_id: Some("1145360".to_string()),
            target_name: Some("Hades".to_string()),
            title: "[Hades] Player surge".to_string(),
            body: "Concurrent players rose by 50.0%, 10,000 → 15,000.".to_string(),
            summary: None,
            data: AlertData {
                metric: Some(MetricKind::ConcurrentUsers),
                previous_value: Some(10_000.0),
                current_value: Some(15_000.0),
                change_percent: Some(50.0),
                threshold: Some(20.0),
                triggered_at: at,
                baseline_fallback: false,
                additional_info: None,
            },
            priority: AlertPriority::High,
            channels: vec![Channel::Email, Channel::Slack, Channel::Discord],
            created_at: at,
            action_url: Some("https://dash.example.com/games/1145360".to_string()),
        }
    }

    mod email_tests {
        use super::*;

        #[test]
        fn email_has_subject_and_html() {
            let out = ChannelFormatter::default().format(&message(), &Channel::Email);

            assert_eq!(out.subject.as_deref(), Some("[Hades] Player surge"));
            assert!(out.content.contains("Triggered at 2026-10-17 14:30 UTC"));
            assert!(out.content.contains("View details: https://dash.example.com/games/1145360"));

            let Some(RichContent::Html(html)) = out.rich_content else {
                panic!("expected html document");
            };
            assert!(html.contains("<h2>[Hades] Player surge</h2>"));
            assert!(html.contains("href=\"https://dash.example.com/games/1145360\""));
        }

        #[test]
        fn email_includes_summary_and_escapes() {
            let msg = message().with_summary("Launch <b>weekend</b> & sale");
            let out = ChannelFormatter::default().format(&msg, &Channel::Email);

            assert!(out.content.contains("Launch <b>weekend</b> & sale"));
            let Some(RichContent::Html(html)) = out.rich_content else {
                panic!("expected html document");
            };
            assert!(html.contains("Launch &lt;b&gt;weekend&lt;/b&gt; &amp; sale"));
        }

        #[test]
        fn email_without_action_has_no_button() {
            let mut msg = message();
            msg.action_url = None;
            let out = ChannelFormatter::default().format(&msg, &Channel::Email);
            let Some(RichContent::Html(html)) = out.rich_content else {
                panic!("expected html document");
            };
            assert!(!html.contains("<a "));
        }

        #[test]
        fn custom_timestamp_format() {
            let out = ChannelFormatter::new("%d/%m/%Y").format(&message(), &Channel::Email);
            assert!(out.content.contains("Triggered at 17/10/2026"));
        }
    }

    mod slack_tests {
        use super::*;

        #[test]
        fn slack_blocks_follow_message() {
            let out = ChannelFormatter::default().format(&message(), &Channel::Slack);
            let Some(RichContent::Slack(doc)) = out.rich_content else {
                panic!("expected slack document");
            };

            assert_eq!(doc.blocks.len(), 3);
            match &doc.blocks[0] {
                SlackBlock::Header { text } => {
                    assert_eq!(text.text, "[Hades] Player surge");
                    assert_eq!(text.kind, SlackTextKind::PlainText);
                }
                other => panic!("expected header, got {other:?}"),
            }
            assert!(matches!(
                &doc.blocks[1],
                SlackBlock::Section { text } if text.text == message().body
            ));
            assert!(matches!(
                &doc.blocks[2],
                SlackBlock::Context { elements }
                    if elements[0].text.contains("2026-10-17 14:30 UTC")
            ));
        }

        #[test]
        fn slack_json_shape() {
            let out = ChannelFormatter::default().format(&message(), &Channel::Slack);
            let Some(RichContent::Slack(doc)) = out.rich_content else {
                panic!("expected slack document");
            };
            let json = serde_json::to_value(&doc).unwrap();

            assert_eq!(json["blocks"][0]["type"], "header");
            assert_eq!(json["blocks"][0]["text"]["type"], "plain_text");
            assert_eq!(json["blocks"][0]["text"]["text"], "[Hades] Player surge");
            assert_eq!(json["blocks"][1]["text"]["type"], "mrkdwn");
            assert_eq!(json["blocks"][2]["type"], "context");
        }

        #[test]
        fn long_header_is_truncated() {
            let mut msg = message();
            msg.title = "x".repeat(400);
            let out = ChannelFormatter::default().format(&msg, &Channel::Slack);
            let Some(RichContent::Slack(doc)) = out.rich_content else {
                panic!("expected slack document");
            };
            let SlackBlock::Header { text } = &doc.blocks[0] else {
                panic!("expected header");
            };
            assert_eq!(text.text.chars().count(), SLACK_HEADER_MAX);
        }
    }

    mod discord_tests {
        use super::*;
        use test_case::test_case;

        #[test_case(AlertPriority::Critical, 0x00E7_4C3C ; "critical is red")]
        #[test_case(AlertPriority::High, 0x00E6_7E22 ; "high is orange")]
        #[test_case(AlertPriority::Medium, 0x0034_98DB ; "medium is blue")]
        #[test_case(AlertPriority::Low, 0x0095_A5A6 ; "low is gray")]
        fn embed_color_follows_priority(priority: AlertPriority, color: u32) {
            let mut msg = message();
            msg.priority = priority;
            let out = ChannelFormatter::default().format(&msg, &Channel::Discord);
            let Some(RichContent::Discord(doc)) = out.rich_content else {
                panic!("expected discord document");
            };
            assert_eq!(doc.embeds[0].color, color);
        }

        #[test]
        fn embed_carries_title_description_timestamp() {
            let out = ChannelFormatter::default().format(&message(), &Channel::Discord);
            let Some(RichContent::Discord(doc)) = out.rich_content else {
                panic!("expected discord document");
            };
            let embed = &doc.embeds[0];

            assert_eq!(embed.title, "[Hades] Player surge");
            assert_eq!(embed.description, message().body);
            assert_eq!(embed.timestamp, "2026-10-17T14:30:00Z");
            assert_eq!(embed.fields.len(), 2);
            assert_eq!(embed.fields[0].value, "15,000");
            assert_eq!(embed.fields[1].value, "+50.0%");
        }
    }

    mod plain_tests {
        use super::*;
        use test_case::test_case;

        #[test_case(Channel::Push ; "push")]
        #[test_case(Channel::InApp ; "in app")]
        #[test_case(Channel::Other("telegram".to_string()) ; "unknown")]
        fn body_only(channel: Channel) {
            let out = ChannelFormatter::default().format(&message(), &channel);
            assert_eq!(out.content, message().body);
            assert!(out.subject.is_none());
            assert!(out.rich_content.is_none());
            assert_eq!(out.channel, channel);
        }
    }

    #[test]
    fn format_all_covers_every_channel() {
        let out = ChannelFormatter::default().format_all(&message());
        let channels: Vec<Channel> = out.into_iter().map(|f| f.channel).collect();
        assert_eq!(channels, vec![Channel::Email, Channel::Slack, Channel::Discord]);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 10), "héllo");
        assert_eq!(truncate("héllo wörld", 5), "héll…");
    }
}
