//! Logging setup.
//!
//! `dupfind` logs through the `log` facade with an `env_logger` backend.
//! Stdout carries only the duplicate listing, so every log line goes to
//! stderr. The level is chosen by, in priority order:
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. `--quiet` (errors only)
//! 3. `--verbose` count: 1 = debug, 2+ = trace
//! 4. Default: warn

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;

/// Maps CLI flags to a level filter (ignores `RUST_LOG`).
pub fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initialise the global logger. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = if env::var("RUST_LOG").is_ok() {
        Builder::from_default_env()
    } else {
        let mut builder = Builder::new();
        builder.filter_level(level_for(verbose, quiet));
        builder
    };

    builder
        .target(Target::Stderr)
        .format_timestamp(None)
        .format_module_path(cfg!(debug_assertions));

    let _ = builder.try_init();
}
