// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Split Telegram chat exports into word-bounded Markdown parts.
//!
//! Summarization tools cap how much text a single source document may hold.
//! This crate turns a Telegram Desktop JSON export into a series of
//! Markdown documents that each stay under a word budget, and bundles them
//! into one zip archive.
//!
//! # Overview
//!
//! 1. Parse and validate the export, then normalize its records into
//!    messages
//! 2. Render each message as a Markdown block according to the settings
//! 3. Pack the blocks into word-bounded parts with numbered headers
//! 4. Bundle the parts into an archive
//!
//! # Example
//!
//! ```no_run
//! use tg2md::archive::ZipPackager;
//! use tg2md::convert::convert_export;
//! use tg2md::renderer::ConversionSettings;
//!
//! let json = std::fs::read_to_string("result.json").unwrap();
//! let settings = ConversionSettings {
//!     word_limit: 20_000,
//!     ..Default::default()
//! };
//!
//! let result = convert_export(&json, &settings, &ZipPackager::default(), |p| {
//!     eprintln!("[{:>3}%] {}", p.percent, p.message);
//! })
//! .unwrap();
//!
//! std::fs::write(&result.archive_name, result.bundle.as_bytes()).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`parser`]: export types, validation and message normalization
//! - [`renderer`]: per-message Markdown formatting and settings
//! - [`chunker`]: word-budget packing and part headers
//! - [`filename`]: safe file names derived from chat titles
//! - [`archive`]: the packaging seam and its zip implementation
//! - [`input`]: size-gated loading of export files
//! - [`convert`]: the end-to-end pipeline with progress reporting

#![deny(missing_docs)]

pub mod archive;
pub mod chunker;
pub mod convert;
pub mod filename;
pub mod input;
pub mod parser;
pub mod renderer;
