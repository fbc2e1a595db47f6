//! Run configuration.
//!
//! [`ScanConfig`] is built once from the parsed [`Args`] plus environment
//! overrides and validated before any work starts:
//!
//! 1. `--threads N` wins, then `DUPFIND_THREADS`, then the worker strategy
//! 2. `DUPFIND_SKIP_DIRS` (comma-separated) is appended to `--skip-dirs`
//!
//! [`DirFilter`] is the default directory predicate handed to the walker.

use crate::cli::Args;
use crate::error::{Error, Result};
use crate::pool::PoolStrategy;
use crate::utils::{
    build_exclude_matcher, expand_exclude_patterns, is_pseudo_filesystem, matches_blacklist,
};
use globset::GlobSet;
use log::debug;
use std::path::{Path, PathBuf};

pub const ENV_THREADS: &str = "DUPFIND_THREADS";
pub const ENV_SKIP_DIRS: &str = "DUPFIND_SKIP_DIRS";

/// Validated configuration for one deduplication run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub root: PathBuf,
    pub skip_dirs: Vec<String>,
    /// Exclude globs, already expanded
    pub exclude: Vec<String>,
    pub skip_empty: bool,
    pub workers: usize,
    pub profile: bool,
}

impl ScanConfig {
    /// Configuration with defaults for everything but the root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            skip_dirs: Vec::new(),
            exclude: Vec::new(),
            skip_empty: false,
            workers: num_cpus::get() * 2,
            profile: false,
        }
    }

    /// Builds the configuration from CLI arguments and the process environment.
    pub fn from_args(args: &Args) -> Result<Self> {
        Self::from_args_with_env(args, |key| std::env::var(key).ok())
    }

    /// Same as [`from_args`](Self::from_args) with an explicit environment lookup.
    pub fn from_args_with_env<F>(args: &Args, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut skip_dirs: Vec<String> = args
            .skip_dirs
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(extra) = env(ENV_SKIP_DIRS) {
            skip_dirs.extend(
                extra
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
            );
        }

        let (strategy, fixed) = match args.threads {
            Some(n) => (PoolStrategy::Fixed, n),
            None => match env(ENV_THREADS) {
                Some(raw) => {
                    let n = raw.trim().parse::<usize>().map_err(|_| {
                        Error::Configuration(format!("{ENV_THREADS} must be a number, got '{raw}'"))
                    })?;
                    (PoolStrategy::Fixed, n)
                }
                None => (args.threads_strategy, 0),
            },
        };
        let workers = strategy.workers(fixed)?;
        debug!("{} strategy: {} hashing workers", strategy.as_str(), workers);

        let config = Self {
            root: args.dir.clone(),
            skip_dirs,
            exclude: expand_exclude_patterns(&args.exclude),
            skip_empty: args.no_empty,
            workers,
            profile: args.profile,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration before a run.
    ///
    /// # Errors
    /// [`Error::Configuration`] for an empty root, a root that is not a
    /// directory, a zero worker count or an invalid exclude pattern.
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(Error::Configuration("scan root must not be empty".to_string()));
        }
        if !self.root.is_dir() {
            return Err(Error::Configuration(format!(
                "scan root {} is not a directory",
                self.root.display()
            )));
        }
        if self.workers == 0 {
            return Err(Error::Configuration(
                "worker count must be greater than zero".to_string(),
            ));
        }
        build_exclude_matcher(&self.exclude)?;
        Ok(())
    }

    /// The directory predicate described by this configuration.
    pub fn dir_filter(&self) -> Result<DirFilter> {
        DirFilter::new(self.skip_dirs.clone(), &self.exclude)
    }
}

/// Default directory filter: rejects pseudo-filesystem roots, blacklisted
/// substrings and excluded globs.
#[derive(Debug, Clone)]
pub struct DirFilter {
    skip_dirs: Vec<String>,
    exclude: GlobSet,
}

impl DirFilter {
    pub fn new(skip_dirs: Vec<String>, exclude: &[String]) -> Result<Self> {
        Ok(Self {
            skip_dirs,
            exclude: build_exclude_matcher(exclude)?,
        })
    }

    pub fn accepts(&self, dir: &Path) -> bool {
        !is_pseudo_filesystem(dir)
            && !matches_blacklist(dir, &self.skip_dirs)
            && !self.exclude.is_match(dir)
    }
}
