//! CLI interface definitions for the `dupfind` application.
//!
//! This module defines command-line arguments using [`clap`] and exposes:
//!
//! - [`Args`]: the main struct parsed from CLI inputs
//! - [`CsvEntry`]: one row of the `--output` CSV export
//!
//! # Example
//!
//! ```bash
//! dupfind --dir ~/photos --skip-dirs .git,node_modules --no-empty --output dups.csv
//! ```

use crate::pool::PoolStrategy;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the `dupfind` duplicate finder.
#[derive(Parser, Debug)]
#[command(name = "dupfind", author = "Sam Green", version, about)]
pub struct Args {
    /// Directory to scan
    #[arg(long, value_name = "PATH")]
    pub dir: PathBuf,

    /// Skip directories whose path contains any of these substrings
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub skip_dirs: Vec<String>,

    /// Exclude directories matching glob patterns (e.g., 'target', '**/cache/**')
    #[arg(long, value_name = "PATTERN", num_args = 1.., action = clap::ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Skip zero-length files
    #[arg(long, default_value_t = false)]
    pub no_empty: bool,

    /// Enable memory profiling and suppress interactive output
    #[arg(long, default_value_t = false)]
    pub profile: bool,

    /// Number of hashing workers (default: derived from the worker strategy)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Worker count strategy (hidden experimental flag)
    #[arg(long = "threads-strategy", value_enum, default_value_t = PoolStrategy::Default, hide = true)]
    pub threads_strategy: PoolStrategy,

    /// Also write duplicates to a CSV file
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}

/// A single duplicate record (used for CSV serialization).
///
/// # Fields
/// * `hash` - Hex content digest
/// * `size_bytes` - Size in bytes
/// * `size_human` - Human-readable size (e.g., "1.2 MB")
/// * `path` - Full path to the file
#[derive(Debug, serde::Serialize)]
pub struct CsvEntry {
    pub hash: String,
    pub size_bytes: u64,
    pub size_human: String,
    pub path: String,
}
