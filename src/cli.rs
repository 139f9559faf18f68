//! Command-line interface definitions for thumbflow.
//!
//! This module defines all CLI arguments, subcommands, and options using the
//! clap derive API.
//!
//! # Example
//!
//! ```bash
//! # Stream file thumbnail records for a directory
//! thumbflow files ~/Pictures
//!
//! # Stream and persist results to the cache file inside the directory
//! thumbflow files ~/Pictures --preserve
//!
//! # Stream subdirectory records
//! thumbflow dirs ~/Pictures
//!
//! # Verbose mode for debugging
//! thumbflow -v files ~/Pictures
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Incremental directory thumbnail streamer.
///
/// Thumbflow streams one JSON preview record per directory entry to stdout,
/// and can persist them to a cache file so unchanged entries are never
/// recomputed on the next run.
#[derive(Debug, Parser)]
#[command(name = "thumbflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report errors as structured JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for thumbflow.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Stream thumbnail records for the files in a directory
    Files(FilesArgs),
    /// Stream thumbnail records for the subdirectories of a directory
    Dirs(DirsArgs),
}

/// Arguments for the files subcommand.
#[derive(Debug, Args)]
pub struct FilesArgs {
    /// Directory whose files are listed
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Persist the records to the cache file inside PATH
    ///
    /// The cache file is only replaced when at least one entry changed,
    /// and always atomically.
    #[arg(short, long)]
    pub preserve: bool,

    /// Override the cache filename
    ///
    /// Defaults to the configured name (.thumbs.json out of the box).
    #[arg(long, value_name = "NAME")]
    pub cache_name: Option<String>,

    /// Stop after emitting N records
    ///
    /// Stopping early never touches a previously persisted cache file.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

/// Arguments for the dirs subcommand.
#[derive(Debug, Args)]
pub struct DirsArgs {
    /// Directory whose subdirectories are listed
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Stop after emitting N records
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}
