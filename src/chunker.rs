// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Word-budget packing of rendered messages into documents.
//!
//! Messages are formatted one at a time and appended to the chunk in
//! progress until the next one would push it past the word limit. A message
//! that is over the limit by itself is never split; it becomes a chunk of
//! its own. Once all chunks are known, [`finalize_chunks`] prepends the
//! numbered part header to each.

use crate::parser::Message;
use crate::renderer::{ConversionSettings, count_words, format_message};

/// Consecutive formatted messages destined for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextChunk {
    /// Formatted blocks, each followed by a blank line.
    pub body: String,
    /// Words across all blocks in the chunk.
    pub word_count: usize,
    /// Identifiers of the messages in the chunk, in order.
    pub message_ids: Vec<i64>,
}

/// Result of [`chunk_messages`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedText {
    /// Chunks in message order.
    pub chunks: Vec<TextChunk>,
    /// Words across every formatted message, regardless of chunk.
    pub total_words: usize,
}

/// A chunk with its part header, ready to be packaged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalDocument {
    /// 1-based part number.
    pub index: usize,
    /// Number of parts in the run.
    pub total: usize,
    /// Header followed by the chunk body.
    pub content: String,
}

impl TextChunk {
    fn push(&mut self, formatted: &str, words: usize, id: i64) {
        self.body.push_str(formatted);
        self.body.push('\n');
        self.word_count += words;
        self.message_ids.push(id);
    }

    const fn is_empty(&self) -> bool {
        self.message_ids.is_empty()
    }
}

/// Formats messages and packs them into chunks of at most `word_limit` words.
///
/// The limit is checked before each message is added, so every chunk stays
/// within it except one holding a single oversized message.
#[must_use]
pub fn chunk_messages(messages: &[Message], settings: &ConversionSettings) -> ChunkedText {
    let mut chunks = Vec::new();
    let mut current = TextChunk::default();
    let mut total_words = 0;

    for msg in messages {
        let formatted = format_message(msg, settings);
        let words = count_words(&formatted);
        total_words += words;

        if words > settings.word_limit {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            tracing::debug!(
                id = msg.id,
                words,
                limit = settings.word_limit,
                "message exceeds word limit, giving it its own chunk"
            );
            let mut oversized = TextChunk::default();
            oversized.push(&formatted, words, msg.id);
            chunks.push(oversized);
            continue;
        }

        if current.word_count + words > settings.word_limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        current.push(&formatted, words, msg.id);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    tracing::debug!(chunks = chunks.len(), total_words, "chunked messages");

    ChunkedText {
        chunks,
        total_words,
    }
}

/// Returns the header placed at the top of part `index` of `total`.
#[must_use]
pub fn part_header(chat_name: &str, index: usize, total: usize) -> String {
    format!("# {chat_name}\nPart {index} of {total}\n\n---\n\n")
}

/// Prepends the numbered part header to every chunk.
#[must_use]
pub fn finalize_chunks(chunks: &[TextChunk], chat_name: &str) -> Vec<FinalDocument> {
    let total = chunks.len();

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let index = i + 1;
            FinalDocument {
                index,
                total,
                content: part_header(chat_name, index, total) + &chunk.body,
            }
        })
        .collect()
}
