// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for tg2md.
//!
//! This binary provides the `tg2md` command for splitting Telegram chat
//! exports into word-bounded Markdown parts, packaged as a zip archive.

use lexopt::prelude::*;
use snafu::prelude::*;
use std::path::{Path, PathBuf};
use tg2md::archive::ZipPackager;
use tg2md::convert::{self, ConvertError, Progress};
use tg2md::input::{self, InputError, MAX_INPUT_BYTES};
use tg2md::renderer::{ConversionSettings, DateStyle};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[allow(clippy::struct_excessive_bools)]
struct Cli {
    input: Vec<PathBuf>,
    output: PathBuf,
    settings: ConversionSettings,
    unpacked: bool,
    quiet: bool,
    dry_run: bool,
    force: bool,
    verbose: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("at least one input file or directory is required"))]
    NoInputFiles,

    #[snafu(display("no JSON exports found in the given inputs"))]
    NoExportsFound,

    #[snafu(display("failed to create output directory {}: {source}", path.display()))]
    CreateOutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("{source}"))]
    ReadInput { source: InputError },

    #[snafu(display("failed to convert {}: {source}", path.display()))]
    Convert {
        path: PathBuf,
        source: ConvertError,
    },

    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn print_help() {
    println!(
        "\
{name} {version}
Split Telegram chat exports into word-bounded Markdown parts

Usage: {name} [OPTIONS] <INPUT>...

Arguments:
  <INPUT>...  Exported result.json files or directories containing them

Options:
  -o, --output <DIR>        Output directory (default: .)
  -w, --words <N>           Maximum words per part (default: 50000)
      --date-format <FMT>   dmy (14.02.2020) or ymd (2020-02-14), default: dmy
      --unpacked            Write the parts as .md files instead of a zip archive

Message details (use --show-* or --hide-*, all shown by default):
      --show-timestamps     Include send date and time
      --hide-timestamps     Hide send date and time
      --show-author         Include author names
      --hide-author         Hide author names
      --show-replies        Include reply references
      --hide-replies        Hide reply references
      --show-forwarded      Include forward origins
      --hide-forwarded      Hide forward origins
      --show-polls          Include poll summaries
      --hide-polls          Hide poll summaries
      --show-reactions      Include reaction counts
      --hide-reactions      Hide reaction counts
      --show-media          Include media labels such as [photo]
      --hide-media          Hide media labels

Other options:
  -q, --quiet               Suppress progress messages
  -v, --verbose             Print debug logging (RUST_LOG overrides)
  -n, --dry-run             Convert without writing any files
  -f, --force               Overwrite existing output files
  -h, --help                Print help
  -V, --version             Print version

Inputs larger than 500 MiB are rejected.",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    // Show help if no arguments provided
    if std::env::args().len() == 1 {
        print_help();
        std::process::exit(0);
    }

    let mut input = Vec::new();
    let mut output = PathBuf::from(".");
    let mut settings = ConversionSettings::default();
    let mut unpacked = false;
    let mut quiet = false;
    let mut dry_run = false;
    let mut force = false;
    let mut verbose = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("output") => output = parser.value()?.parse()?,
            Short('w') | Long("words") => {
                let val: usize = parser
                    .value()?
                    .parse()
                    .map_err(|_| "words must be a positive number")?;
                if val == 0 {
                    return Err("words must be at least 1".into());
                }
                settings.word_limit = val;
            }
            Long("date-format") => {
                let val = parser.value()?.string()?;
                settings.date_style = val
                    .parse::<DateStyle>()
                    .map_err(|err| err.to_string())?;
            }
            Long("unpacked") => unpacked = true,
            // Show/hide flags - last one wins
            Long("show-timestamps") => settings.include_timestamp = true,
            Long("hide-timestamps") => settings.include_timestamp = false,
            Long("show-author") => settings.include_author = true,
            Long("hide-author") => settings.include_author = false,
            Long("show-replies") => settings.include_reply = true,
            Long("hide-replies") => settings.include_reply = false,
            Long("show-forwarded") => settings.include_forwarded = true,
            Long("hide-forwarded") => settings.include_forwarded = false,
            Long("show-polls") => settings.include_poll = true,
            Long("hide-polls") => settings.include_poll = false,
            Long("show-reactions") => settings.include_reactions = true,
            Long("hide-reactions") => settings.include_reactions = false,
            Long("show-media") => settings.include_media_label = true,
            Long("hide-media") => settings.include_media_label = false,
            Short('q') | Long("quiet") => quiet = true,
            Short('v') | Long("verbose") => verbose = true,
            Short('n') | Long("dry-run") => dry_run = true,
            Short('f') | Long("force") => force = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) => input.push(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        input,
        output,
        settings,
        unpacked,
        quiet,
        dry_run,
        force,
        verbose,
    })
}

/// Installs a stderr log subscriber. `RUST_LOG` takes precedence.
fn init_logging(verbose: bool) {
    let default = if verbose {
        concat!(env!("CARGO_CRATE_NAME"), "=debug")
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[snafu::report]
fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;
    init_logging(cli.verbose);

    ensure!(!cli.input.is_empty(), NoInputFilesSnafu);

    let files = collect_input_files(&cli.input);
    ensure!(!files.is_empty(), NoExportsFoundSnafu);
    tracing::debug!(count = files.len(), "collected input files");

    if !cli.dry_run {
        std::fs::create_dir_all(&cli.output).context(CreateOutputDirSnafu { path: &cli.output })?;
    }

    for file in &files {
        process_file(file, &cli)?;
    }

    Ok(())
}

/// Collects all JSON files from the given inputs (files and directories).
fn collect_input_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            {
                files.push(entry.path().to_path_buf());
            }
        } else {
            files.push(input.clone());
        }
    }
    files
}

/// Converts one export and writes either the archive or the loose parts.
fn process_file(input: &Path, cli: &Cli) -> Result<(), Error> {
    if !cli.quiet {
        eprintln!("Converting {}", input.display());
    }

    let content = input::read_export_file(input, MAX_INPUT_BYTES).context(ReadInputSnafu)?;
    let report = |progress: Progress| {
        tracing::debug!(stage = progress.stage.name(), percent = progress.percent, "progress");
        if !cli.quiet {
            eprintln!("[{:>3}%] {}", progress.percent, progress.message);
        }
    };

    let (chat_name, total, skipped, files, words) = if cli.unpacked {
        let rendered = convert::render_export(&content, &cli.settings, report)
            .context(ConvertSnafu { path: input })?;
        for entry in rendered.entries() {
            let path = cli.output.join(&entry.name);
            write_output(&path, entry.content.as_bytes(), cli)?;
        }
        (
            rendered.chat_name,
            rendered.total_messages,
            rendered.skipped_messages,
            rendered.documents.len(),
            rendered.total_words,
        )
    } else {
        let result =
            convert::convert_export(&content, &cli.settings, &ZipPackager::default(), report)
                .context(ConvertSnafu { path: input })?;
        let path = cli.output.join(&result.archive_name);
        write_output(&path, result.bundle.as_bytes(), cli)?;
        (
            result.chat_name,
            result.total_messages,
            result.skipped_messages,
            result.files_created,
            result.total_words,
        )
    };

    if !cli.quiet {
        eprintln!(
            "{chat_name}: {total} messages ({skipped} skipped), {files} files, {words} words"
        );
    }
    Ok(())
}

/// Writes `bytes` to `path`, honoring `--dry-run` and `--force`.
fn write_output(path: &Path, bytes: &[u8], cli: &Cli) -> Result<(), Error> {
    if cli.dry_run {
        eprintln!("Would write {}", path.display());
        return Ok(());
    }

    if path.exists() && !cli.force {
        eprintln!(
            "Skipping {} (already exists, use --force to overwrite)",
            path.display()
        );
        return Ok(());
    }

    std::fs::write(path, bytes).context(WriteFileSnafu { path })?;

    if !cli.quiet {
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}
