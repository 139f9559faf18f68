//! Thumbflow - Incremental Directory Thumbnail Streamer
//!
//! A cross-platform Rust CLI application that streams lightweight preview
//! records (name, type, last-touched time, embedded preview image) for the
//! immediate entries of a directory, persisting results to an on-disk JSON
//! cache so unchanged entries are never recomputed.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod stream;
pub mod thumbs;

use std::io::Write;

use anyhow::Result;

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::ExitCode;
use crate::stream::StreamError;
use crate::thumbs::ThumbRecord;

/// Run the application logic for the parsed CLI.
///
/// Returns the exit code for successful runs; errors bubble up to `main`
/// where they are mapped to exit codes and optionally rendered as JSON.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load();

    match cli.command {
        Commands::Files(args) => {
            let cache_name = args
                .cache_name
                .unwrap_or_else(|| config.cache_filename.clone());
            log::info!(
                "Listing file thumbnails for {} (preserve: {})",
                args.path.display(),
                args.preserve
            );
            let records = stream::file_thumbs(&args.path, &cache_name, args.preserve)?;
            emit_records(records, args.limit, &mut std::io::stdout().lock())
        }
        Commands::Dirs(args) => {
            log::info!("Listing directory thumbnails for {}", args.path.display());
            let records = stream::dir_thumbs(&args.path)?;
            emit_records(records, args.limit, &mut std::io::stdout().lock())
        }
    }
}

/// Pull records from a thumbnail stream and write one JSON object per line.
///
/// The limit is checked before each pull, so a limit of zero consumes and
/// emits nothing. Dropping the stream with records still pending triggers
/// its cancellation path, which leaves any previously persisted cache file
/// untouched.
fn emit_records<I, W>(mut records: I, limit: Option<usize>, out: &mut W) -> Result<ExitCode>
where
    I: Iterator<Item = Result<ThumbRecord, StreamError>>,
    W: Write,
{
    let mut emitted = 0usize;
    while !limit.is_some_and(|n| emitted >= n) {
        let Some(record) = records.next() else {
            break;
        };
        let record = record?;
        writeln!(out, "{}", serde_json::to_string(&record)?)?;
        emitted += 1;
    }

    if limit.is_some_and(|n| emitted >= n) {
        log::debug!("Record limit {} reached, stopping early", emitted);
    }
    log::debug!("Emitted {} records", emitted);
    Ok(ExitCode::Success)
}
