// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! JSON parsing and normalization for Telegram chat exports.
//!
//! Telegram Desktop's "Export chat history" (JSON) produces a `result.json`
//! with the chat's display name and an ordered list of records. This module
//! validates that shape, deserializes it into typed raw records, and then
//! normalizes the conversational ones into [`Message`] values that the rest
//! of the pipeline consumes.
//!
//! # Format Overview
//!
//! An export contains:
//! - The chat's `name`, `type` and `id`
//! - A `messages` array mixing `"message"` and `"service"` records
//! - Message `text` that is either a plain string or an array of fragments
//!   (plain strings and `{type, text}` entities for links, bold, mentions...)
//!
//! # Example
//!
//! ```
//! use tg2md::parser::{normalize, parse_export};
//!
//! let json = r#"{
//!     "name": "Book Club",
//!     "type": "private_group",
//!     "id": 42,
//!     "messages": [{
//!         "id": 1,
//!         "type": "message",
//!         "date": "2020-02-14T12:34:56",
//!         "from": "Alice",
//!         "text": ["Read ", {"type": "bold", "text": "chapter 3"}]
//!     }]
//! }"#;
//!
//! let export = parse_export(json).unwrap();
//! let messages = normalize(&export).unwrap();
//! assert_eq!(messages[0].text, "Read chapter 3");
//! ```

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use snafu::prelude::*;

/// Author substituted when a record's `from` field is null, absent or empty.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Wall-clock layout Telegram Desktop writes into the `date` field.
const EXPORT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Error type for export parsing and normalization failures.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// The input is not JSON at all.
    #[snafu(display("file is corrupted or not valid JSON: {source}"))]
    Json {
        /// The underlying JSON parsing error.
        source: serde_json::Error,
    },

    /// The input is JSON but not shaped like a chat export.
    #[snafu(display("does not look like a recognized chat export"))]
    UnrecognizedExport,

    /// A retained message carries a date that cannot be parsed.
    #[snafu(display("message #{id} has an unparseable date `{value}`: {source}"))]
    InvalidDate {
        /// Identifier of the offending message.
        id: i64,
        /// The raw date string.
        value: String,
        /// The underlying chrono error.
        source: chrono::ParseError,
    },
}

/// The root structure of a Telegram chat export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatExport {
    /// Display name of the chat.
    pub name: String,

    /// Chat type tag (e.g. `personal_chat`, `private_supergroup`).
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,

    /// Telegram's identifier for the chat.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,

    /// Every record in export order, service entries included.
    ///
    /// A record that cannot be read is kept as [`RecordKind::Unknown`], so it
    /// still counts toward the totals without failing the whole export.
    #[serde(deserialize_with = "lenient_records")]
    pub messages: Vec<RawMessage>,
}

/// Discriminator of a raw record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Conversational content.
    Message,
    /// System notification (joins, pins, title changes...).
    Service,
    /// Missing or unrecognized discriminator.
    #[default]
    #[serde(other)]
    Unknown,
}

/// A single record exactly as it appears in the export.
///
/// Only the fields the converter understands are kept; everything else in
/// the record is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawMessage {
    /// Whether this is a message or a service entry.
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: RecordKind,

    /// Message identifier, unique within the chat.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,

    /// Local wall-clock date, e.g. `2020-02-14T12:34:56`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,

    /// Display name of the sender; `null` for deleted accounts.
    #[serde(default)]
    pub from: Option<String>,

    /// Message body in either of its two shapes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: TextPayload,

    /// Identifier of the message this one replies to.
    #[serde(default)]
    pub reply_to_message_id: Option<i64>,

    /// Origin label of a forwarded message.
    #[serde(default)]
    pub forwarded_from: Option<String>,

    /// Reaction tallies attached to the message.
    #[serde(default, deserialize_with = "null_as_default")]
    pub reactions: Vec<RawReaction>,

    /// Poll attached to the message.
    #[serde(default)]
    pub poll: Option<Poll>,

    /// Relative path of an attached photo.
    #[serde(default)]
    pub photo: Option<String>,

    /// Relative path of an attached file.
    #[serde(default)]
    pub file: Option<String>,

    /// Kind of media stored in `file` (`sticker`, `voice_message`...).
    #[serde(default)]
    pub media_type: Option<String>,
}

/// The `text` field of a record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TextPayload {
    /// A plain string.
    Plain(String),
    /// An ordered list of text fragments.
    Fragments(Vec<Fragment>),
    /// Any other JSON value; flattens to an empty string.
    Other(serde_json::Value),
}

impl Default for TextPayload {
    fn default() -> Self {
        Self::Plain(String::new())
    }
}

/// One element of a fragmented text payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Fragment {
    /// Unformatted run of text.
    Plain(String),
    /// Annotated run (`bold`, `link`, `mention`...).
    Entity {
        /// Entity type tag.
        #[serde(rename = "type", default)]
        kind: String,
        /// Text covered by the entity.
        #[serde(default)]
        text: Option<String>,
    },
    /// Unrecognized element; contributes nothing.
    Other(serde_json::Value),
}

/// A reaction tally as exported.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawReaction {
    /// Reaction type (`emoji`, `custom_emoji`, `paid`).
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,

    /// How many users reacted.
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,

    /// The emoji itself, when the reaction is a standard one.
    #[serde(default, alias = "symbol")]
    pub emoji: Option<String>,
}

impl RawReaction {
    /// Returns the symbol used to display this reaction.
    #[must_use]
    pub fn symbol(&self) -> String {
        if let Some(emoji) = self.emoji.as_deref().filter(|e| !e.is_empty()) {
            return emoji.to_owned();
        }
        match self.kind.as_str() {
            "paid" => "⭐".to_owned(),
            _ => "[custom]".to_owned(),
        }
    }
}

/// A poll attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Poll {
    /// The poll question.
    #[serde(default, deserialize_with = "null_as_default")]
    pub question: String,

    /// Whether voting has been closed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub closed: bool,

    /// Number of distinct voters.
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_voters: u64,

    /// Answer options in display order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub answers: Vec<PollAnswer>,
}

/// One answer option of a [`Poll`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PollAnswer {
    /// Answer text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,

    /// Votes cast for this answer.
    #[serde(default, deserialize_with = "null_as_default")]
    pub voters: u64,

    /// Whether the exporting user picked this answer.
    #[serde(default, deserialize_with = "null_as_default")]
    pub chosen: bool,
}

/// A reaction symbol and how many users used it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    /// Emoji or placeholder symbol.
    pub symbol: String,
    /// Number of users.
    pub count: u64,
}

/// Kind of media attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Media {
    /// A photo.
    Photo,
    /// A video file.
    Video,
    /// A voice note.
    Voice,
    /// A round video message.
    VideoMessage,
    /// A sticker.
    Sticker,
    /// A GIF-style animation.
    Animation,
    /// An audio track.
    Audio,
    /// Any other attached file.
    File,
}

impl Media {
    /// Human-readable label used in rendered output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Voice => "voice message",
            Self::VideoMessage => "video message",
            Self::Sticker => "sticker",
            Self::Animation => "animation",
            Self::Audio => "audio",
            Self::File => "file",
        }
    }
}

/// A conversational message ready for formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Identifier carried over from the export.
    pub id: i64,
    /// Sender name, or [`ANONYMOUS_AUTHOR`].
    pub author: String,
    /// Local wall-clock time the message was sent.
    pub timestamp: NaiveDateTime,
    /// Flattened, trimmed body. Empty only when a poll or reactions remain.
    pub text: String,
    /// Identifier of the replied-to message.
    pub reply_to: Option<i64>,
    /// Forward origin label.
    pub forwarded_from: Option<String>,
    /// Attached media, if any.
    pub media: Option<Media>,
    /// Reaction tallies; empty when the message has none.
    pub reactions: Vec<Reaction>,
    /// Attached poll.
    pub poll: Option<Poll>,
}

/// Record totals used for the conversion report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageCounts {
    /// Every record in the export, service entries included.
    pub total: usize,
    /// Records that do not become a [`Message`].
    pub skipped: usize,
}

impl RawMessage {
    /// Returns `true` if this record becomes a [`Message`].
    ///
    /// Only `message` records qualify, and only when they carry text, a
    /// poll, or at least one reaction. Media alone does not count.
    #[must_use]
    pub fn is_retained(&self) -> bool {
        self.kind == RecordKind::Message
            && (!flatten_text(&self.text).trim().is_empty()
                || self.poll.is_some()
                || !self.reactions.is_empty())
    }

    /// Classifies the attached media from `media_type`, `photo` and `file`.
    #[must_use]
    pub fn media(&self) -> Option<Media> {
        let from_type = self.media_type.as_deref().and_then(|kind| match kind {
            "video_file" => Some(Media::Video),
            "voice_message" => Some(Media::Voice),
            "video_message" => Some(Media::VideoMessage),
            "sticker" => Some(Media::Sticker),
            "animation" => Some(Media::Animation),
            "audio_file" => Some(Media::Audio),
            _ => None,
        });

        from_type
            .or_else(|| self.photo.as_ref().map(|_| Media::Photo))
            .or_else(|| {
                (self.file.is_some() || self.media_type.is_some()).then_some(Media::File)
            })
    }
}

/// Reads an explicit `null` the same way as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Deserializes records one at a time, turning unreadable ones into
/// [`RecordKind::Unknown`] placeholders.
fn lenient_records<'de, D>(deserializer: D) -> Result<Vec<RawMessage>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).unwrap_or_else(|err| {
                tracing::debug!(index, %err, "unreadable record, treating as unknown");
                RawMessage::default()
            })
        })
        .collect())
}

/// Checks that a parsed JSON value looks like a chat export.
///
/// A valid export is an object with a string `name` and a non-empty
/// `messages` array. Anything else is rejected.
#[must_use]
pub fn is_valid_export(value: &serde_json::Value) -> bool {
    value.get("name").is_some_and(serde_json::Value::is_string)
        && value
            .get("messages")
            .and_then(serde_json::Value::as_array)
            .is_some_and(|messages| !messages.is_empty())
}

/// Concatenates a text payload into a single string.
///
/// Fragments are joined in order with no separator. Entities without a
/// `text` field and payloads of any other shape contribute nothing.
#[must_use]
pub fn flatten_text(payload: &TextPayload) -> String {
    match payload {
        TextPayload::Plain(text) => text.clone(),
        TextPayload::Fragments(fragments) => fragments
            .iter()
            .map(|fragment| match fragment {
                Fragment::Plain(text) | Fragment::Entity { text: Some(text), .. } => {
                    text.as_str()
                }
                Fragment::Entity { text: None, .. } | Fragment::Other(_) => "",
            })
            .collect(),
        TextPayload::Other(_) => String::new(),
    }
}

/// Parses a date as written by Telegram Desktop.
///
/// Also accepts RFC 3339 timestamps, keeping their local wall-clock value.
///
/// # Errors
///
/// Returns the error from the export layout when neither form matches.
pub fn parse_date(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, EXPORT_DATE_FORMAT).or_else(|err| {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.naive_local())
            .map_err(|_| err)
    })
}

/// Parses a JSON string into a validated [`ChatExport`].
///
/// Records that cannot be read individually become
/// [`RecordKind::Unknown`] entries instead of failing the parse.
///
/// # Errors
///
/// Returns [`ParseError::Json`] if the input is not JSON, and
/// [`ParseError::UnrecognizedExport`] if it is JSON of the wrong shape.
pub fn parse_export(json_str: &str) -> Result<ChatExport, ParseError> {
    let value: serde_json::Value = serde_json::from_str(json_str).context(JsonSnafu)?;
    ensure!(is_valid_export(&value), UnrecognizedExportSnafu);

    serde_json::from_value(value).map_err(|err| {
        tracing::debug!(%err, "export passed validation but failed to deserialize");
        UnrecognizedExportSnafu.build()
    })
}

/// Counts all records and those that will not become messages.
#[must_use]
pub fn count_messages(export: &ChatExport) -> MessageCounts {
    MessageCounts {
        total: export.messages.len(),
        skipped: export
            .messages
            .iter()
            .filter(|raw| !raw.is_retained())
            .count(),
    }
}

/// Turns the export's records into ordered [`Message`] values.
///
/// Service entries and records without content are dropped; order is
/// otherwise preserved.
///
/// # Errors
///
/// Returns [`ParseError::InvalidDate`] for the first retained record whose
/// date cannot be parsed. No partial result is produced.
pub fn normalize(export: &ChatExport) -> Result<Vec<Message>, ParseError> {
    let mut messages = Vec::with_capacity(export.messages.len());

    for raw in &export.messages {
        if !raw.is_retained() {
            tracing::trace!(id = raw.id, kind = ?raw.kind, "skipping record");
            continue;
        }

        let timestamp = parse_date(&raw.date).context(InvalidDateSnafu {
            id: raw.id,
            value: raw.date.clone(),
        })?;

        let author = raw
            .from
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(ANONYMOUS_AUTHOR)
            .to_owned();

        messages.push(Message {
            id: raw.id,
            author,
            timestamp,
            text: flatten_text(&raw.text).trim().to_owned(),
            reply_to: raw.reply_to_message_id,
            forwarded_from: raw.forwarded_from.clone().filter(|from| !from.is_empty()),
            media: raw.media(),
            reactions: raw
                .reactions
                .iter()
                .map(|reaction| Reaction {
                    symbol: reaction.symbol(),
                    count: reaction.count,
                })
                .collect(),
            poll: raw.poll.clone(),
        });
    }

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export_json(messages_json: &str) -> String {
        format!(
            r#"{{
                "name": "Test Chat",
                "type": "private_group",
                "id": 100,
                "messages": [{messages_json}]
            }}"#
        )
    }

    fn message_json(id: i64, text: &str) -> String {
        format!(
            r#"{{
                "id": {id},
                "type": "message",
                "date": "2020-02-14T12:34:56",
                "from": "Alice",
                "text": {text}
            }}"#
        )
    }

    fn service_json(id: i64) -> String {
        format!(
            r#"{{
                "id": {id},
                "type": "service",
                "date": "2020-02-14T12:35:00",
                "actor": "Alice",
                "action": "pin_message",
                "text": ""
            }}"#
        )
    }

    #[test]
    fn parses_minimal_export() {
        let json = export_json(&message_json(1, r#""Hello""#));
        let export = parse_export(&json).unwrap();

        assert_eq!(export.name, "Test Chat");
        assert_eq!(export.kind, "private_group");
        assert_eq!(export.id, 100);
        assert_eq!(export.messages.len(), 1);
        assert_eq!(export.messages[0].kind, RecordKind::Message);
    }

    #[test]
    fn returns_json_error_for_invalid_json() {
        let result = parse_export("{ not json");
        assert!(matches!(result, Err(ParseError::Json { .. })));
    }

    #[test]
    fn json_error_message_mentions_corruption() {
        let err = parse_export("nope").unwrap_err();
        assert!(err.to_string().starts_with("file is corrupted or not valid JSON"));
    }

    #[test]
    fn rejects_missing_name() {
        let result = parse_export(r#"{"messages": [{"type": "message"}]}"#);
        assert!(matches!(result, Err(ParseError::UnrecognizedExport)));
    }

    #[test]
    fn rejects_empty_messages() {
        let result = parse_export(r#"{"name": "Chat", "messages": []}"#);
        assert!(matches!(result, Err(ParseError::UnrecognizedExport)));
    }

    #[test]
    fn rejects_non_object_root() {
        let result = parse_export("[1, 2, 3]");
        assert!(matches!(result, Err(ParseError::UnrecognizedExport)));
    }

    #[test]
    fn skips_records_that_are_not_objects() {
        let json = export_json(&format!(r#"{}, 5, "note", null"#, message_json(1, r#""Hi""#)));
        let export = parse_export(&json).unwrap();

        assert_eq!(export.messages.len(), 4);
        let kinds: Vec<RecordKind> = export.messages.iter().map(|raw| raw.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecordKind::Message,
                RecordKind::Unknown,
                RecordKind::Unknown,
                RecordKind::Unknown
            ]
        );
        assert_eq!(
            count_messages(&export),
            MessageCounts {
                total: 4,
                skipped: 3
            }
        );
        assert_eq!(normalize(&export).unwrap().len(), 1);
    }

    #[test]
    fn record_with_mistyped_field_is_skipped() {
        let broken = r#"{"id": "seven", "type": "message", "date": "2020-02-14T12:00:00",
                         "from": "Bob", "text": "lost"}"#;
        let json = export_json(&format!("{}, {broken}", message_json(1, r#""kept""#)));
        let export = parse_export(&json).unwrap();
        let counts = count_messages(&export);

        assert_eq!(counts.total, 2);
        assert_eq!(counts.skipped, 1);
        let messages = normalize(&export).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "kept");
    }

    #[test]
    fn null_fields_read_as_missing() {
        let service = r#"{"id": 2, "type": "service", "date": null, "text": null,
                          "reactions": null, "action": "pin_message"}"#;
        let message = r#"{"id": 3, "type": "message", "date": "2020-02-14T12:40:00",
                          "from": "Bob", "text": "", "reactions": null,
                          "poll": {"question": null, "closed": null, "total_voters": null,
                                   "answers": [{"text": "Yes", "voters": null, "chosen": null}]}}"#;
        let json = export_json(&format!("{service}, {message}"));
        let export = parse_export(&json).unwrap();

        assert_eq!(export.messages[0].kind, RecordKind::Service);
        assert!(export.messages[0].reactions.is_empty());
        assert_eq!(export.messages[0].date, "");

        let messages = normalize(&export).unwrap();
        assert_eq!(messages.len(), 1);
        let poll = messages[0].poll.as_ref().unwrap();
        assert_eq!(poll.question, "");
        assert!(!poll.closed);
        assert_eq!(poll.total_voters, 0);
        assert_eq!(
            poll.answers,
            vec![PollAnswer {
                text: "Yes".into(),
                voters: 0,
                chosen: false
            }]
        );
        assert!(messages[0].reactions.is_empty());
    }

    #[test]
    fn validates_shape_of_raw_values() {
        let valid: serde_json::Value =
            serde_json::from_str(r#"{"name": "x", "messages": [{}]}"#).unwrap();
        let numeric_name: serde_json::Value =
            serde_json::from_str(r#"{"name": 5, "messages": [{}]}"#).unwrap();
        let string_root = serde_json::Value::String("export".into());

        assert!(is_valid_export(&valid));
        assert!(!is_valid_export(&numeric_name));
        assert!(!is_valid_export(&string_root));
    }

    #[test]
    fn unknown_record_type_is_not_retained() {
        let json = export_json(r#"{"id": 1, "type": "sponsored", "text": "Buy now"}"#);
        let export = parse_export(&json).unwrap();

        assert_eq!(export.messages[0].kind, RecordKind::Unknown);
        assert!(!export.messages[0].is_retained());
    }

    #[test]
    fn flattens_plain_string() {
        let payload = TextPayload::Plain("  as is  ".into());
        assert_eq!(flatten_text(&payload), "  as is  ");
    }

    #[test]
    fn flattens_fragments_without_separators() {
        let json = export_json(&message_json(
            1,
            r#"["See ", {"type": "link", "text": "https://example.com"}, {"type": "bold", "text": "!"}]"#,
        ));
        let export = parse_export(&json).unwrap();

        assert_eq!(
            flatten_text(&export.messages[0].text),
            "See https://example.com!"
        );
    }

    #[test]
    fn fragment_without_text_contributes_nothing() {
        let json = export_json(&message_json(
            1,
            r#"[{"type": "bold"}, {"type": "plain", "text": "kept"}, 17]"#,
        ));
        let export = parse_export(&json).unwrap();

        assert_eq!(flatten_text(&export.messages[0].text), "kept");
    }

    #[test]
    fn flattens_unexpected_shape_to_empty() {
        let json = export_json(&message_json(1, "42"));
        let export = parse_export(&json).unwrap();

        assert!(matches!(export.messages[0].text, TextPayload::Other(_)));
        assert_eq!(flatten_text(&export.messages[0].text), "");
    }

    #[test]
    fn normalizes_and_trims_text() {
        let json = export_json(&message_json(7, r#""  padded  \n""#));
        let export = parse_export(&json).unwrap();
        let messages = normalize(&export).unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, 7);
        assert_eq!(messages[0].author, "Alice");
        assert_eq!(messages[0].text, "padded");
        assert_eq!(
            messages[0].timestamp,
            NaiveDateTime::parse_from_str("2020-02-14T12:34:56", EXPORT_DATE_FORMAT).unwrap()
        );
    }

    #[test]
    fn null_author_becomes_anonymous() {
        let json = export_json(
            r#"{"id": 1, "type": "message", "date": "2020-02-14T12:34:56", "from": null, "text": "hi"}"#,
        );
        let export = parse_export(&json).unwrap();
        let messages = normalize(&export).unwrap();

        assert_eq!(messages[0].author, ANONYMOUS_AUTHOR);
    }

    #[test]
    fn missing_author_becomes_anonymous() {
        let json = export_json(
            r#"{"id": 1, "type": "message", "date": "2020-02-14T12:34:56", "text": "hi"}"#,
        );
        let export = parse_export(&json).unwrap();
        let messages = normalize(&export).unwrap();

        assert_eq!(messages[0].author, ANONYMOUS_AUTHOR);
    }

    #[test]
    fn skips_service_entries_but_counts_them() {
        let json = export_json(&format!(
            "{}, {}, {}",
            message_json(1, r#""first""#),
            service_json(2),
            message_json(3, r#""second""#)
        ));
        let export = parse_export(&json).unwrap();
        let messages = normalize(&export).unwrap();
        let counts = count_messages(&export);

        let ids: Vec<i64> = messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(counts, MessageCounts { total: 3, skipped: 1 });
    }

    #[test]
    fn skips_media_only_messages() {
        let json = export_json(
            r#"{"id": 1, "type": "message", "date": "2020-02-14T12:34:56", "from": "Bob",
                "photo": "photos/photo_1.jpg", "text": ""}"#,
        );
        let export = parse_export(&json).unwrap();

        assert!(normalize(&export).unwrap().is_empty());
        assert_eq!(count_messages(&export).skipped, 1);
    }

    #[test]
    fn retains_poll_with_empty_text() {
        let json = export_json(
            r#"{"id": 5, "type": "message", "date": "2020-02-14T12:34:56", "from": "Bob", "text": "",
                "poll": {"question": "Lunch?", "closed": false, "total_voters": 3,
                         "answers": [{"text": "Yes", "voters": 2, "chosen": true},
                                     {"text": "No", "voters": 1, "chosen": false}]}}"#,
        );
        let export = parse_export(&json).unwrap();
        let messages = normalize(&export).unwrap();

        assert_eq!(messages.len(), 1);
        assert!(messages[0].text.is_empty());
        let poll = messages[0].poll.as_ref().unwrap();
        assert_eq!(poll.question, "Lunch?");
        assert_eq!(poll.total_voters, 3);
        assert_eq!(poll.answers.len(), 2);
        assert!(poll.answers[0].chosen);
        assert_eq!(count_messages(&export).skipped, 0);
    }

    #[test]
    fn retains_reaction_only_photo_with_media_label() {
        let json = export_json(
            r#"{"id": 9, "type": "message", "date": "2020-02-14T12:34:56", "from": "Bob", "text": "",
                "photo": "photos/photo_9.jpg",
                "reactions": [{"type": "emoji", "count": 4, "emoji": "🔥"}]}"#,
        );
        let export = parse_export(&json).unwrap();
        let messages = normalize(&export).unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].media, Some(Media::Photo));
        assert_eq!(
            messages[0].reactions,
            vec![Reaction {
                symbol: "🔥".into(),
                count: 4
            }]
        );
    }

    #[test]
    fn reads_reply_and_forward_fields() {
        let json = export_json(
            r#"{"id": 3, "type": "message", "date": "2020-02-14T12:34:56", "from": "Bob",
                "text": "agreed", "reply_to_message_id": 1, "forwarded_from": "News Channel"}"#,
        );
        let export = parse_export(&json).unwrap();
        let messages = normalize(&export).unwrap();

        assert_eq!(messages[0].reply_to, Some(1));
        assert_eq!(messages[0].forwarded_from.as_deref(), Some("News Channel"));
    }

    #[test]
    fn reaction_symbols_fall_back_by_type() {
        let custom = RawReaction {
            kind: "custom_emoji".into(),
            count: 1,
            emoji: None,
        };
        let paid = RawReaction {
            kind: "paid".into(),
            count: 2,
            emoji: None,
        };

        assert_eq!(custom.symbol(), "[custom]");
        assert_eq!(paid.symbol(), "⭐");
    }

    #[test]
    fn accepts_symbol_alias_for_reactions() {
        let reaction: RawReaction = serde_json::from_str(r#"{"symbol": "👍", "count": 2}"#).unwrap();
        assert_eq!(reaction.symbol(), "👍");
    }

    #[test]
    fn classifies_media() {
        let mut raw: RawMessage = serde_json::from_str(r#"{"type": "message"}"#).unwrap();
        assert_eq!(raw.media(), None);

        raw.file = Some("files/doc.pdf".into());
        assert_eq!(raw.media(), Some(Media::File));

        raw.media_type = Some("voice_message".into());
        assert_eq!(raw.media(), Some(Media::Voice));

        raw.media_type = None;
        raw.file = None;
        raw.photo = Some("photos/p.jpg".into());
        assert_eq!(raw.media(), Some(Media::Photo));
    }

    #[test]
    fn invalid_date_is_fatal() {
        let json = export_json(&format!(
            r#"{}, {{"id": 2, "type": "message", "date": "yesterday", "text": "late"}}"#,
            message_json(1, r#""ok""#)
        ));
        let export = parse_export(&json).unwrap();

        match normalize(&export) {
            Err(ParseError::InvalidDate { id, value, .. }) => {
                assert_eq!(id, 2);
                assert_eq!(value, "yesterday");
            }
            other => panic!("Expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn invalid_date_on_skipped_record_is_ignored() {
        let json = export_json(&format!(
            r#"{}, {{"id": 2, "type": "service", "date": "garbage"}}"#,
            message_json(1, r#""ok""#)
        ));
        let export = parse_export(&json).unwrap();

        assert_eq!(normalize(&export).unwrap().len(), 1);
    }

    #[test]
    fn parses_rfc3339_dates_as_wall_clock() {
        let parsed = parse_date("2021-06-01T08:05:00+03:00").unwrap();
        assert_eq!(parsed.to_string(), "2021-06-01 08:05:00");
    }
}
