// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Loading export files with a size gate.

use snafu::prelude::*;
use std::path::{Path, PathBuf};

/// Largest export accepted, in bytes (500 MiB).
pub const MAX_INPUT_BYTES: u64 = 500 * 1024 * 1024;

/// Error type for reading an export from disk.
#[derive(Debug, Snafu)]
pub enum InputError {
    /// The file's metadata or contents could not be read.
    #[snafu(display("failed to read {}: {source}", path.display()))]
    Read {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is larger than the configured maximum.
    #[snafu(display(
        "{} is too large ({size} bytes, maximum is {max})",
        path.display()
    ))]
    TooLarge {
        /// The file being read.
        path: PathBuf,
        /// Its size in bytes.
        size: u64,
        /// The limit that was exceeded.
        max: u64,
    },
}

/// Reads an export into memory, refusing files above `max_bytes`.
///
/// The size is checked before any content is read.
///
/// # Errors
///
/// Returns [`InputError::TooLarge`] for oversized files and
/// [`InputError::Read`] for I/O failures, including non-UTF-8 content.
pub fn read_export_file(path: &Path, max_bytes: u64) -> Result<String, InputError> {
    let size = std::fs::metadata(path).context(ReadSnafu { path })?.len();
    ensure!(
        size <= max_bytes,
        TooLargeSnafu {
            path,
            size,
            max: max_bytes
        }
    );

    std::fs::read_to_string(path).context(ReadSnafu { path })
}
