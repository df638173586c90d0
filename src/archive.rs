// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Packaging of finished documents into a single downloadable bundle.
//!
//! The conversion pipeline only knows the [`Packager`] trait: it hands over
//! named text entries in order and gets back an opaque [`Bundle`] of bytes.
//! [`ZipPackager`] is the implementation used by the command-line tool.

use snafu::prelude::*;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Deflate level used unless configured otherwise.
pub const DEFAULT_COMPRESSION_LEVEL: i64 = 6;

/// Error type for packaging failures.
#[derive(Debug, Snafu)]
pub enum ArchiveError {
    /// The zip writer rejected an entry or failed to finish.
    #[snafu(display("failed to build archive: {source}"))]
    Zip {
        /// The underlying zip error.
        source: zip::result::ZipError,
    },

    /// Writing entry data failed.
    #[snafu(display("failed to write {name} into archive: {source}"))]
    WriteEntry {
        /// Name of the entry being written.
        name: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// A named text file to place in the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// File name inside the bundle.
    pub name: String,
    /// File contents.
    pub content: String,
}

/// Serialized bundle produced by a [`Packager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    bytes: Vec<u8>,
}

impl Bundle {
    /// Wraps already-serialized bundle bytes.
    #[must_use]
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The serialized bundle.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the bundle, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Size of the serialized bundle in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the bundle holds no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Bundles ordered text entries into one downloadable blob.
pub trait Packager {
    /// Packages `entries`, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle cannot be built.
    fn package(&self, entries: &[ArchiveEntry]) -> Result<Bundle, ArchiveError>;
}

/// Writes entries into an in-memory zip file using Deflate.
///
/// Level 0 stores entries uncompressed. Entry timestamps are fixed, so identical input yields identical bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZipPackager {
    level: i64,
}

impl Default for ZipPackager {
    fn default() -> Self {
        Self {
            level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ZipPackager {
    /// Creates a packager with the given Deflate level (clamped to 0-9,
    /// where 0 means stored without compression).
    #[must_use]
    pub fn with_level(level: i64) -> Self {
        Self {
            level: level.clamp(0, 9),
        }
    }
}

impl Packager for ZipPackager {
    fn package(&self, entries: &[ArchiveEntry]) -> Result<Bundle, ArchiveError> {
        let options = SimpleFileOptions::default().last_modified_time(zip::DateTime::default());
        // Deflate rejects level 0.
        let options = if self.level == 0 {
            options.compression_method(CompressionMethod::Stored)
        } else {
            options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(self.level))
        };

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in entries {
            writer
                .start_file(entry.name.as_str(), options)
                .context(ZipSnafu)?;
            writer
                .write_all(entry.content.as_bytes())
                .context(WriteEntrySnafu { name: &entry.name })?;
        }

        let cursor = writer.finish().context(ZipSnafu)?;
        let bundle = Bundle::from_bytes(cursor.into_inner());
        tracing::debug!(entries = entries.len(), bytes = bundle.len(), "built zip archive");
        Ok(bundle)
    }
}
