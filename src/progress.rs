//! Progress reporting.
//!
//! The engine never touches the terminal itself; it reports through an
//! [`Observer`] passed in at construction. [`SpinnerObserver`] draws an
//! `indicatif` spinner on stderr, [`NoopObserver`] discards everything (used
//! with `--profile` and in tests).

use crate::engine::ScanStats;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Pipeline stage being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discovery,
    Hashing,
    Sorting,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Discovery => "Discovering",
            Stage::Hashing => "Hashing",
            Stage::Sorting => "Sorting",
        }
    }
}

/// Receives progress and statistics updates from the engine.
///
/// `Discovery` reports the share of known directories listed so far after
/// every directory. `Hashing` has no total known in advance: its running
/// counts arrive through [`on_stats`](Observer::on_stats) and its only
/// progress report is `100.0` once collection ends. `Sorting` reports the
/// share of the heap drained.
pub trait Observer: Send + Sync {
    /// `percent` is in `0.0..=100.0`.
    fn on_progress(&self, stage: Stage, percent: f64);

    fn on_stats(&self, stats: &ScanStats);

    /// Called once after the last update.
    fn finish(&self) {}
}

/// Observer that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_progress(&self, _stage: Stage, _percent: f64) {}

    fn on_stats(&self, _stats: &ScanStats) {}
}

/// Spinner on stderr showing the current stage and counters.
pub struct SpinnerObserver {
    bar: ProgressBar,
}

impl SpinnerObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        let style = ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner} {prefix} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl Default for SpinnerObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for SpinnerObserver {
    fn on_progress(&self, stage: Stage, percent: f64) {
        self.bar
            .set_prefix(format!("{:<11} {percent:>5.1}%", stage.as_str()));
    }

    fn on_stats(&self, stats: &ScanStats) {
        self.bar.set_message(format!(
            "{} dirs, {} files, {} hashed",
            stats.dirs, stats.files, stats.hashed
        ));
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
