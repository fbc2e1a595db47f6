//! Main entry point for the `dupfind` CLI application.
//!
//! `dupfind` lists files whose content is duplicated somewhere under a
//! directory. Only files sharing a size with another file are hashed.
//!
//! # Responsibilities
//! - Parses CLI arguments via [`clap`] using the [`Args`] struct
//! - Builds and validates the [`ScanConfig`]
//! - Installs a Ctrl-C handler that cancels the run
//! - Drives the [`DedupEngine`] and prints duplicates as they are found
//! - With `--profile`, reports phase timings and memory on stderr
//!
//! # Flags of Interest
//! - `--dir PATH`: directory to scan
//! - `--skip-dirs a,b`: skip directories containing these substrings
//! - `--no-empty`: ignore zero-length files
//! - `--output FILE`: also write a CSV export

use anyhow::{Context, Result};
use clap::Parser;
use dupfind::hasher::Sha1Hasher;
use dupfind::metrics::{ProfileData, print_profile_summary, rss_after_phase, save_stats_json};
use dupfind::output::{render_csv, terminal};
use dupfind::progress::{NoopObserver, Observer, SpinnerObserver};
use dupfind::{Args, CancelToken, DedupEngine, Error, FileRecord, ScanConfig, time_phase};
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

/// Exit status used when the run is interrupted.
const EXIT_INTERRUPTED: u8 = 130;

fn run(args: &Args, cancel: CancelToken) -> Result<()> {
    let config = ScanConfig::from_args(args).context("Invalid configuration")?;

    let observer: Arc<dyn Observer> = if config.profile {
        Arc::new(NoopObserver)
    } else {
        Arc::new(SpinnerObserver::new())
    };
    let profile_enabled = config.profile;
    let engine = DedupEngine::new(config, Arc::new(Sha1Hasher), observer)?
        .with_cancel_token(cancel);

    let mut profile = ProfileData::new();

    let (collected, timing) = time_phase!("Collect", { engine.collect() });
    let (heap, mut stats) = collected?;
    profile.add_phase(timing);
    profile.record_memory(rss_after_phase());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let keep = args.output.is_some();
    let mut duplicates: Vec<FileRecord> = Vec::new();
    let (scanned, timing) = time_phase!("Duplicate scan", {
        engine.emit_duplicates(&heap, &mut stats, |record| {
            writeln!(out, "{}", terminal::format_line(record))
                .map_err(|e| Error::io("<stdout>", e))?;
            if keep {
                duplicates.push(record.clone());
            }
            Ok(())
        })
    });
    scanned?;
    out.flush()?;
    profile.add_phase(timing);
    profile.record_memory(rss_after_phase());

    if let Some(path) = &args.output {
        render_csv(&duplicates, path)?;
    }

    if profile_enabled {
        let (hits, lookups) = engine.cache().stats();
        profile.set_cache_stats(hits, lookups);
        profile.add_scan_stats(&stats);
        print_profile_summary(&profile);
        if let Some(path) = &args.output {
            let written = save_stats_json(path, &profile)?;
            eprintln!("Performance stats saved to: {}", written.display());
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    dupfind::logging::init_logging(args.verbose, args.quiet);

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
            log::warn!("Ctrl-C handler not installed: {e}");
        }
    }

    match run(&args, cancel) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if matches!(err.downcast_ref::<Error>(), Some(Error::Cancelled)) {
                eprintln!("Interrupted");
                return ExitCode::from(EXIT_INTERRUPTED);
            }
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
