// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Markdown rendering for normalized messages.
//!
//! Each [`Message`] becomes a self-contained block of lines. Which lines
//! appear is controlled by [`ConversionSettings`]; the order is fixed:
//!
//! 1. `#<id>` header, optionally followed by the bolded author and the date
//! 2. Reply reference
//! 3. Forward origin
//! 4. Media label
//! 5. Message text
//! 6. Poll summary
//! 7. Reaction summary
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use tg2md::parser::Message;
//! use tg2md::renderer::{format_message, ConversionSettings};
//!
//! let msg = Message {
//!     id: 12,
//!     author: "Alice".into(),
//!     timestamp: NaiveDate::from_ymd_opt(2020, 2, 14)
//!         .unwrap()
//!         .and_hms_opt(9, 5, 0)
//!         .unwrap(),
//!     text: "Hello!".into(),
//!     reply_to: None,
//!     forwarded_from: None,
//!     media: None,
//!     reactions: vec![],
//!     poll: None,
//! };
//!
//! let block = format_message(&msg, &ConversionSettings::default());
//! assert_eq!(block, "#12 **Alice** 14.02.2020 09:05\nHello!\n");
//! ```

use crate::parser::{Message, Poll, Reaction};
use chrono::{Datelike, NaiveDateTime, Timelike};
use snafu::prelude::*;
use std::str::FromStr;

/// Word limit used when none is configured.
pub const DEFAULT_WORD_LIMIT: usize = 50_000;

/// How dates are written in message headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateStyle {
    /// `14.02.2020 09:05`
    #[default]
    DayMonthYear,
    /// `2020-02-14 09:05`
    YearMonthDay,
}

/// Error returned when a date style name is not recognized.
#[derive(Debug, Snafu)]
#[snafu(display("unknown date format `{input}` (expected dmy or ymd)"))]
pub struct UnknownDateStyle {
    input: String,
}

impl FromStr for DateStyle {
    type Err = UnknownDateStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dmy" | "DD.MM.YYYY" => Ok(Self::DayMonthYear),
            "ymd" | "YYYY-MM-DD" => Ok(Self::YearMonthDay),
            _ => UnknownDateStyleSnafu { input: s }.fail(),
        }
    }
}

/// Options for a single conversion run.
///
/// Each flag gates exactly one optional part of the rendered block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ConversionSettings {
    /// Maximum number of words per output document.
    ///
    /// A single message longer than this still gets a document of its own.
    pub word_limit: usize,

    /// Whether to append the send date to the header line.
    pub include_timestamp: bool,

    /// Whether to show the author in bold on the header line.
    pub include_author: bool,

    /// Whether to add a line referencing the replied-to message.
    pub include_reply: bool,

    /// Whether to add a line naming the forward origin.
    pub include_forwarded: bool,

    /// Whether to summarize attached polls.
    pub include_poll: bool,

    /// Whether to summarize reactions.
    pub include_reactions: bool,

    /// Whether to label attached media such as photos and voice notes.
    pub include_media_label: bool,

    /// Date layout for the header line.
    pub date_style: DateStyle,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            word_limit: DEFAULT_WORD_LIMIT,
            include_timestamp: true,
            include_author: true,
            include_reply: true,
            include_forwarded: true,
            include_poll: true,
            include_reactions: true,
            include_media_label: true,
            date_style: DateStyle::DayMonthYear,
        }
    }
}

/// Renders a timestamp as a date followed by `HH:MM`.
///
/// Day, month, hour and minute are zero-padded to two digits; the year is
/// written at its natural width.
#[must_use]
pub fn format_date(timestamp: &NaiveDateTime, style: DateStyle) -> String {
    let date = match style {
        DateStyle::DayMonthYear => format!(
            "{:02}.{:02}.{}",
            timestamp.day(),
            timestamp.month(),
            timestamp.year()
        ),
        DateStyle::YearMonthDay => format!(
            "{}-{:02}-{:02}",
            timestamp.year(),
            timestamp.month(),
            timestamp.day()
        ),
    };

    format!("{date} {:02}:{:02}", timestamp.hour(), timestamp.minute())
}

/// Counts whitespace-separated words.
#[must_use]
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Renders one message as a block of lines ending in a single newline.
#[must_use]
pub fn format_message(msg: &Message, settings: &ConversionSettings) -> String {
    let mut lines = vec![header_line(msg, settings)];

    if settings.include_reply
        && let Some(reply_to) = msg.reply_to
    {
        lines.push(format!("_In reply to #{reply_to}_"));
    }

    if settings.include_forwarded
        && let Some(from) = &msg.forwarded_from
    {
        lines.push(format!("_Forwarded from {from}_"));
    }

    if settings.include_media_label
        && let Some(media) = msg.media
    {
        lines.push(format!("[{}]", media.label()));
    }

    if !msg.text.is_empty() {
        lines.push(msg.text.clone());
    }

    if settings.include_poll
        && let Some(poll) = &msg.poll
    {
        render_poll(&mut lines, poll);
    }

    if settings.include_reactions && !msg.reactions.is_empty() {
        lines.push(render_reactions(&msg.reactions));
    }

    let mut block = lines.join("\n");
    block.push('\n');
    block
}

fn header_line(msg: &Message, settings: &ConversionSettings) -> String {
    let mut parts = vec![format!("#{}", msg.id)];

    if settings.include_author {
        parts.push(format!("**{}**", msg.author));
    }

    if settings.include_timestamp {
        parts.push(format_date(&msg.timestamp, settings.date_style));
    }

    parts.join(" ")
}

fn render_poll(lines: &mut Vec<String>, poll: &Poll) {
    let status = if poll.closed { " (closed)" } else { "" };
    lines.push(format!("📊 Poll: {}{status}", poll.question));

    for answer in &poll.answers {
        let chosen = if answer.chosen { " ✓" } else { "" };
        lines.push(format!(
            "- {}: {} {}{chosen}",
            answer.text,
            answer.voters,
            plural(answer.voters, "vote", "votes")
        ));
    }

    lines.push(format!("Total voters: {}", poll.total_voters));
}

/// Joins reactions as `👍 3, ❤ 1`.
fn render_reactions(reactions: &[Reaction]) -> String {
    let tallies: Vec<String> = reactions
        .iter()
        .map(|reaction| format!("{} {}", reaction.symbol, reaction.count))
        .collect();
    format!("Reactions: {}", tallies.join(", "))
}

const fn plural<'a>(count: u64, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}
