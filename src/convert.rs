// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! End-to-end conversion of an export into a packaged bundle.
//!
//! The pipeline runs in one pass: parse and validate, normalize, chunk,
//! package. Progress is announced through a callback at fixed milestones
//! and any failure aborts the whole run.
//!
//! # Example
//!
//! ```
//! use tg2md::archive::ZipPackager;
//! use tg2md::convert::convert_export;
//! use tg2md::renderer::ConversionSettings;
//!
//! let json = r#"{
//!     "name": "Test Chat",
//!     "messages": [
//!         {"id": 1, "type": "message", "date": "2020-02-14T12:00:00",
//!          "from": "Alice", "text": "Hello"}
//!     ]
//! }"#;
//!
//! let mut stages = Vec::new();
//! let result = convert_export(
//!     json,
//!     &ConversionSettings::default(),
//!     &ZipPackager::default(),
//!     |progress| stages.push(progress.stage),
//! )
//! .unwrap();
//!
//! assert_eq!(result.files_created, 1);
//! assert_eq!(result.archive_name, "Test_Chat.zip");
//! assert_eq!(stages.len(), 5);
//! ```

use crate::archive::{ArchiveEntry, ArchiveError, Bundle, Packager};
use crate::chunker::{FinalDocument, chunk_messages, finalize_chunks};
use crate::filename::{archive_file_name, part_file_name, sanitize_name};
use crate::parser::{self, ParseError};
use crate::renderer::ConversionSettings;
use snafu::prelude::*;

/// Error type for a conversion run.
#[derive(Debug, Snafu)]
pub enum ConvertError {
    /// The input could not be parsed or normalized.
    #[snafu(display("{source}"))]
    Parse {
        /// The underlying parse error.
        source: ParseError,
    },

    /// The export holds no usable messages.
    #[snafu(display("no messages found in file"))]
    NoMessages,

    /// The configured word limit is zero.
    #[snafu(display("word limit must be at least 1"))]
    InvalidWordLimit,

    /// The packager failed.
    #[snafu(display("{source}"))]
    Package {
        /// The underlying archive error.
        source: ArchiveError,
    },
}

/// Pipeline milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Reading the JSON document.
    Parsing,
    /// Normalizing records into messages.
    Formatting,
    /// Packing formatted messages into parts.
    Chunking,
    /// Building the archive.
    Zipping,
    /// Finished.
    Done,
}

impl Stage {
    /// Stable lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Parsing => "parsing",
            Self::Formatting => "formatting",
            Self::Chunking => "chunking",
            Self::Zipping => "zipping",
            Self::Done => "done",
        }
    }

    /// Completion percentage reported when the stage starts.
    #[must_use]
    pub const fn percent(self) -> u8 {
        match self {
            Self::Parsing => 10,
            Self::Formatting => 30,
            Self::Chunking => 50,
            Self::Zipping => 70,
            Self::Done => 100,
        }
    }

    /// Human-readable status line.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Parsing => "Parsing JSON file...",
            Self::Formatting => "Processing messages...",
            Self::Chunking => "Splitting into files...",
            Self::Zipping => "Creating ZIP archive...",
            Self::Done => "Done!",
        }
    }
}

/// A progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Stage being entered.
    pub stage: Stage,
    /// Overall completion, 0-100, strictly increasing across a run.
    pub percent: u8,
    /// Human-readable status line.
    pub message: &'static str,
}

impl From<Stage> for Progress {
    fn from(stage: Stage) -> Self {
        Self {
            stage,
            percent: stage.percent(),
            message: stage.message(),
        }
    }
}

/// Chunked, headed documents for one export, before packaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedExport {
    /// Display name of the chat.
    pub chat_name: String,
    /// Every record in the export, service entries included.
    pub total_messages: usize,
    /// Records that did not become messages.
    pub skipped_messages: usize,
    /// Words across every formatted message.
    pub total_words: usize,
    /// Documents in part order.
    pub documents: Vec<FinalDocument>,
}

impl RenderedExport {
    /// Filesystem-safe stem derived from the chat name.
    #[must_use]
    pub fn file_stem(&self) -> String {
        sanitize_name(&self.chat_name)
    }

    /// Suggested name for the packaged bundle.
    #[must_use]
    pub fn archive_name(&self) -> String {
        archive_file_name(&self.file_stem())
    }

    /// Documents paired with their file names, in part order.
    #[must_use]
    pub fn entries(&self) -> Vec<ArchiveEntry> {
        let stem = self.file_stem();
        self.documents
            .iter()
            .map(|doc| ArchiveEntry {
                name: part_file_name(&stem, doc.index),
                content: doc.content.clone(),
            })
            .collect()
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    /// Display name of the chat.
    pub chat_name: String,
    /// Every record in the export, service entries included.
    pub total_messages: usize,
    /// Records that did not become messages.
    pub skipped_messages: usize,
    /// Number of documents in the bundle.
    pub files_created: usize,
    /// Words across every formatted message.
    pub total_words: usize,
    /// Suggested file name for the bundle.
    pub archive_name: String,
    /// The packaged documents.
    pub bundle: Bundle,
}

/// Parses, normalizes and chunks an export without packaging it.
///
/// Reports the parsing, formatting and chunking stages.
///
/// # Errors
///
/// Fails on a zero word limit, unparseable or unrecognized input, an export
/// without usable messages, or an unparseable message date.
pub fn render_export(
    content: &str,
    settings: &ConversionSettings,
    mut on_progress: impl FnMut(Progress),
) -> Result<RenderedExport, ConvertError> {
    ensure!(settings.word_limit >= 1, InvalidWordLimitSnafu);

    on_progress(Stage::Parsing.into());
    let export = parser::parse_export(content).context(ParseSnafu)?;

    let counts = parser::count_messages(&export);
    tracing::debug!(
        chat = %export.name,
        total = counts.total,
        skipped = counts.skipped,
        "counted records"
    );
    ensure!(
        counts.total > 0 && counts.total != counts.skipped,
        NoMessagesSnafu
    );

    on_progress(Stage::Formatting.into());
    let messages = parser::normalize(&export).context(ParseSnafu)?;

    on_progress(Stage::Chunking.into());
    let chunked = chunk_messages(&messages, settings);
    let documents = finalize_chunks(&chunked.chunks, &export.name);

    Ok(RenderedExport {
        chat_name: export.name,
        total_messages: counts.total,
        skipped_messages: counts.skipped,
        total_words: chunked.total_words,
        documents,
    })
}

/// Converts an export into a packaged bundle.
///
/// Reports all five stages through `on_progress`; a failing run stops
/// reporting at the stage where it failed.
///
/// # Errors
///
/// Fails for any reason [`render_export`] does, or if packaging fails.
pub fn convert_export<P>(
    content: &str,
    settings: &ConversionSettings,
    packager: &P,
    mut on_progress: impl FnMut(Progress),
) -> Result<ConversionResult, ConvertError>
where
    P: Packager + ?Sized,
{
    let rendered = render_export(content, settings, &mut on_progress)?;

    on_progress(Stage::Zipping.into());
    let bundle = packager
        .package(&rendered.entries())
        .context(PackageSnafu)?;

    on_progress(Stage::Done.into());

    Ok(ConversionResult {
        archive_name: rendered.archive_name(),
        files_created: rendered.documents.len(),
        chat_name: rendered.chat_name,
        total_messages: rendered.total_messages,
        skipped_messages: rendered.skipped_messages,
        total_words: rendered.total_words,
        bundle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ZipPackager;

    fn export_json(messages_json: &str) -> String {
        format!(
            r#"{{"name": "Test Chat", "type": "private_group", "id": 1, "messages": [{messages_json}]}}"#
        )
    }

    fn message_json(id: i64, text: &str) -> String {
        format!(
            r#"{{"id": {id}, "type": "message", "date": "2020-02-14T12:34:56", "from": "Alice", "text": "{text}"}}"#
        )
    }

    fn run(
        json: &str,
        settings: &ConversionSettings,
    ) -> (Result<ConversionResult, ConvertError>, Vec<Progress>) {
        let mut events = Vec::new();
        let result = convert_export(json, settings, &ZipPackager::default(), |p| {
            events.push(p);
        });
        (result, events)
    }

    struct FailingPackager;

    impl Packager for FailingPackager {
        fn package(&self, _entries: &[ArchiveEntry]) -> Result<Bundle, ArchiveError> {
            Err(ArchiveError::Zip {
                source: zip::result::ZipError::FileNotFound,
            })
        }
    }

    #[test]
    fn reports_all_stages_in_increasing_order() {
        let json = export_json(&message_json(1, "hello"));
        let (result, events) = run(&json, &ConversionSettings::default());

        assert!(result.is_ok());
        let stages: Vec<Stage> = events.iter().map(|p| p.stage).collect();
        assert_eq!(
            stages,
            vec![
                Stage::Parsing,
                Stage::Formatting,
                Stage::Chunking,
                Stage::Zipping,
                Stage::Done
            ]
        );
        assert!(events.windows(2).all(|w| w[0].percent < w[1].percent));
        assert_eq!(events.last().unwrap().percent, 100);
    }

    #[test]
    fn stage_names_are_lowercase() {
        let names: Vec<&str> = [
            Stage::Parsing,
            Stage::Formatting,
            Stage::Chunking,
            Stage::Zipping,
            Stage::Done,
        ]
        .into_iter()
        .map(Stage::name)
        .collect();

        assert_eq!(names, ["parsing", "formatting", "chunking", "zipping", "done"]);
    }

    #[test]
    fn malformed_json_stops_after_parsing() {
        let (result, events) = run("{ definitely not json", &ConversionSettings::default());

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Parse {
                source: ParseError::Json { .. }
            }
        ));
        assert!(err.to_string().starts_with("file is corrupted or not valid JSON"));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].stage, Stage::Parsing);
    }

    #[test]
    fn unrecognized_shape_is_reported() {
        let (result, _) = run(r#"{"title": "nope"}"#, &ConversionSettings::default());

        assert_eq!(
            result.unwrap_err().to_string(),
            "does not look like a recognized chat export"
        );
    }

    #[test]
    fn only_service_entries_means_no_messages() {
        let json = export_json(
            r#"{"id": 1, "type": "service", "date": "2020-02-14T12:00:00", "text": ""},
               {"id": 2, "type": "message", "date": "2020-02-14T12:01:00", "text": "   "}"#,
        );
        let (result, events) = run(&json, &ConversionSettings::default());

        assert!(matches!(result, Err(ConvertError::NoMessages)));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn zero_word_limit_is_rejected_before_parsing() {
        let settings = ConversionSettings {
            word_limit: 0,
            ..Default::default()
        };
        let (result, events) = run(&export_json(&message_json(1, "hi")), &settings);

        assert!(matches!(result, Err(ConvertError::InvalidWordLimit)));
        assert!(events.is_empty());
    }

    #[test]
    fn bad_date_aborts_run() {
        let json = export_json(
            r#"{"id": 1, "type": "message", "date": "not a date", "from": "Alice", "text": "hi"}"#,
        );
        let (result, events) = run(&json, &ConversionSettings::default());

        assert!(matches!(
            result,
            Err(ConvertError::Parse {
                source: ParseError::InvalidDate { id: 1, .. }
            })
        ));
        assert_eq!(events.last().unwrap().stage, Stage::Formatting);
    }

    #[test]
    fn counts_service_entries_as_skipped() {
        let json = export_json(&format!(
            r#"{}, {{"id": 2, "type": "service", "date": "2020-02-14T12:35:00", "action": "invite_members"}}, {}"#,
            message_json(1, "first"),
            message_json(3, "second")
        ));
        let (result, _) = run(&json, &ConversionSettings::default());
        let result = result.unwrap();

        assert_eq!(result.total_messages, 3);
        assert_eq!(result.skipped_messages, 1);
        assert_eq!(result.files_created, 1);
    }

    #[test]
    fn render_export_names_entries() {
        let json = export_json(&format!(
            "{}, {}",
            message_json(1, "one two three"),
            message_json(2, "four five six")
        ));
        let settings = ConversionSettings {
            word_limit: 8,
            ..Default::default()
        };
        let rendered = render_export(&json, &settings, |_| {}).unwrap();
        let entries = rendered.entries();

        assert_eq!(rendered.documents.len(), 2);
        assert_eq!(rendered.total_words, 14);
        assert_eq!(entries[0].name, "Test_Chat_part_001.md");
        assert_eq!(entries[1].name, "Test_Chat_part_002.md");
        assert!(entries[1].content.starts_with("# Test Chat\nPart 2 of 2\n"));
        assert_eq!(rendered.archive_name(), "Test_Chat.zip");
    }

    #[test]
    fn packaging_failure_is_surfaced() {
        let json = export_json(&message_json(1, "hello"));
        let mut events = Vec::new();
        let result = convert_export(
            &json,
            &ConversionSettings::default(),
            &FailingPackager,
            |p| events.push(p.stage),
        );

        assert!(matches!(result, Err(ConvertError::Package { .. })));
        assert_eq!(events.last(), Some(&Stage::Zipping));
    }
}
