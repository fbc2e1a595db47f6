//! Performance metrics and profiling utilities for `dupfind`.
//!
//! This module provides:
//! - [`PhaseTimer`] - A wrapper around `Instant` for timing different phases
//! - [`rss_after_phase`] - Optional memory usage tracking using `sysinfo`
//! - [`ProfileData`] - Structured data for performance metrics
//! - [`print_profile_summary`] - Profile report on stderr
//! - [`save_stats_json`] - JSON output for scripting integration
//!
//! # Usage
//!
//! ```rust
//! use dupfind::metrics::{PhaseTimer, rss_after_phase, ProfileData};
//!
//! let mut profile = ProfileData::new();
//! let timer = PhaseTimer::new("Discovery");
//!
//! // ... do work ...
//!
//! profile.add_phase(timer.finish());
//! profile.record_memory(rss_after_phase());
//! ```

use crate::engine::ScanStats;
use humansize::{DECIMAL, format_size};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use sysinfo::System;

/// A timer for measuring the duration of a specific phase or operation.
#[derive(Debug, Clone)]
pub struct PhaseTimer {
    /// The name of the phase being timed
    pub name: String,
    /// The start time of the phase
    pub start: Instant,
}

impl PhaseTimer {
    /// Creates a new timer and starts timing the specified phase.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    /// Finishes timing the phase and returns the elapsed duration.
    pub fn finish(self) -> PhaseResult {
        PhaseResult {
            name: self.name,
            duration: self.start.elapsed(),
        }
    }
}

/// The result of a completed phase timing operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    /// The name of the phase that was timed
    pub name: String,
    /// The duration of the phase
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

/// Custom serialization for Duration to make it human-readable in JSON
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Profiling data for a complete run.
///
/// Collects timing information for each phase, the highest RSS sampled
/// between phases, and hash-cache hit counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileData {
    /// Timing results for each phase of the run
    pub phases: Vec<PhaseResult>,
    /// Peak memory usage in bytes (if available)
    pub memory_peak: Option<u64>,
    /// Hash-cache lookups that found an existing entry
    pub cache_hits: u64,
    /// Total hash-cache lookups
    pub cache_total: u64,
    /// Additional metadata about the run
    pub metadata: BTreeMap<String, String>,
}

impl ProfileData {
    /// Creates a new empty profile data structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a completed phase result to the profile.
    pub fn add_phase(&mut self, phase: PhaseResult) {
        self.phases.push(phase);
    }

    /// Keeps the larger of the stored peak and `sample`.
    pub fn record_memory(&mut self, sample: Option<u64>) {
        if let Some(bytes) = sample {
            self.memory_peak = Some(self.memory_peak.map_or(bytes, |peak| peak.max(bytes)));
        }
    }

    pub fn set_cache_stats(&mut self, hits: u64, total: u64) {
        self.cache_hits = hits;
        self.cache_total = total;
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    /// Copies run counters into the metadata section.
    pub fn add_scan_stats(&mut self, stats: &ScanStats) {
        self.add_metadata("directories", &stats.dirs.to_string());
        self.add_metadata("files", &stats.files.to_string());
        self.add_metadata("bytes", &format_size(stats.bytes, DECIMAL));
        self.add_metadata("hashed", &stats.hashed.to_string());
        self.add_metadata("hash failures", &stats.hash_failures.to_string());
        self.add_metadata("skipped dirs", &stats.skipped_dirs.to_string());
        self.add_metadata("duplicates", &stats.duplicates.to_string());
    }

    /// The cache hit rate as a percentage, or 0.0 if no lookups occurred.
    pub fn cache_hit_rate(&self) -> f64 {
        if self.cache_total == 0 {
            0.0
        } else {
            (self.cache_hits as f64 / self.cache_total as f64) * 100.0
        }
    }

    /// The sum of all phase durations.
    pub fn total_duration(&self) -> Duration {
        self.phases.iter().map(|p| p.duration).sum()
    }
}

/// Measures the current process's RSS (Resident Set Size) in bytes.
///
/// Returns `None` when the platform does not expose process memory.
pub fn rss_after_phase() -> Option<u64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new();
    system.refresh_process(pid);
    system.process(pid).map(|process| process.memory())
}

/// Prints a formatted profile summary to stderr.
///
/// # Example Output
/// ```text
/// Phase timings
///   Collect             150 ms
///   Duplicate scan       30 ms
/// Memory peak:      42.0 MB
/// Cache hits:       8123 / 9000 (90.3%)
/// ```
pub fn print_profile_summary(profile: &ProfileData) {
    eprintln!("\nPhase timings");

    for phase in &profile.phases {
        eprintln!("  {:<18} {:>7} ms", phase.name, phase.duration.as_millis());
    }

    if let Some(memory_peak) = profile.memory_peak {
        let memory_mb = memory_peak as f64 / (1024.0 * 1024.0);
        eprintln!("Memory peak:      {:.1} MB", memory_mb);
    }

    if profile.cache_total > 0 {
        eprintln!(
            "Cache hits:       {} / {} ({:.1}%)",
            profile.cache_hits,
            profile.cache_total,
            profile.cache_hit_rate()
        );
    }

    if !profile.metadata.is_empty() {
        eprintln!("\nRun counters:");
        for (key, value) in &profile.metadata {
            eprintln!("  {:<15} {}", key, value);
        }
    }

    eprintln!();
}

/// Saves profiling statistics as `stats.json` next to `output_path`.
///
/// Returns the path written.
pub fn save_stats_json(output_path: &Path, profile: &ProfileData) -> anyhow::Result<PathBuf> {
    let stats_path = output_path.with_file_name("stats.json");

    let stats = serde_json::json!({
        "phases": profile.phases,
        "total_duration_ms": profile.total_duration().as_millis(),
        "memory_peak_bytes": profile.memory_peak,
        "memory_peak_mb": profile.memory_peak.map(|b| b as f64 / (1024.0 * 1024.0)),
        "cache_hits": profile.cache_hits,
        "cache_total": profile.cache_total,
        "cache_hit_rate": profile.cache_hit_rate(),
        "metadata": profile.metadata,
        "timestamp": chrono::Utc::now().to_rfc3339()
    });

    std::fs::write(&stats_path, serde_json::to_string_pretty(&stats)?)?;
    Ok(stats_path)
}

/// A convenience macro for timing a block of code.
///
/// Returns a tuple `(result, PhaseResult)`.
///
/// # Example
/// ```rust
/// use dupfind::time_phase;
///
/// let (result, timing) = time_phase!("Collect", {
///     // ... some expensive operation ...
///     42
/// });
/// assert_eq!(result, 42);
/// ```
#[macro_export]
macro_rules! time_phase {
    ($name:expr, $code:block) => {{
        let timer = $crate::metrics::PhaseTimer::new($name);
        let result = $code;
        let timing = timer.finish();
        (result, timing)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_phase_timer() {
        let timer = PhaseTimer::new("test_phase");
        thread::sleep(Duration::from_millis(10));
        let result = timer.finish();

        assert_eq!(result.name, "test_phase");
        assert!(result.duration.as_millis() >= 10);
    }

    #[test]
    fn test_profile_data() {
        let mut profile = ProfileData::new();
        profile.add_phase(PhaseResult {
            name: "Phase 1".to_string(),
            duration: Duration::from_millis(100),
        });
        profile.add_phase(PhaseResult {
            name: "Phase 2".to_string(),
            duration: Duration::from_millis(200),
        });
        profile.set_cache_stats(80, 100);

        assert_eq!(profile.phases.len(), 2);
        assert_eq!(profile.cache_hit_rate(), 80.0);
        assert_eq!(profile.total_duration(), Duration::from_millis(300));
    }

    #[test]
    fn test_record_memory_keeps_peak() {
        let mut profile = ProfileData::new();
        profile.record_memory(None);
        assert_eq!(profile.memory_peak, None);
        profile.record_memory(Some(500));
        profile.record_memory(Some(200));
        assert_eq!(profile.memory_peak, Some(500));
    }

    #[test]
    fn test_memory_tracking() {
        // may be unavailable in restricted containers
        if let Some(bytes) = rss_after_phase() {
            assert!(bytes > 0);
        }
    }

    #[test]
    fn test_save_stats_json() {
        let dir = TempDir::new().unwrap();
        let mut profile = ProfileData::new();
        profile.add_scan_stats(&ScanStats {
            files: 3,
            duplicates: 2,
            ..ScanStats::default()
        });

        let written = save_stats_json(&dir.path().join("dups.csv"), &profile).unwrap();
        assert_eq!(written, dir.path().join("stats.json"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&written).unwrap()).unwrap();
        assert_eq!(json["metadata"]["files"], "3");
        assert_eq!(json["metadata"]["duplicates"], "2");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_time_phase_macro() {
        let (result, timing) = time_phase!("test_macro", {
            thread::sleep(Duration::from_millis(5));
            42
        });

        assert_eq!(result, 42);
        assert_eq!(timing.name, "test_macro");
        assert!(timing.duration.as_millis() >= 5);
    }
}
