//! Library crate for dupfind
//!
//! Finds duplicate files by content across a directory tree, hashing only
//! files whose size collides with another file's.
//!
//! # Modules
//!
//! - [`heap`]: thread-safe comparator-driven binary heap
//! - [`hash_cache`]: interning cache giving identity-comparable hash handles
//! - [`pool`]: fixed-size worker pool with rendezvous backpressure
//! - [`walker`]: breadth-first discovery of candidate files
//! - [`engine`]: size pre-filter, selective hashing and the duplicate-run scan
//! - [`hasher`]: SHA-1 content hashing behind a trait
//! - [`data`]: core types (`FileRecord`, `FormattedSize`, `FileKind`)
//! - [`config`]: validated run configuration
//! - [`output`]: terminal and CSV formatters
//! - [`metrics`]: `--profile` timing and memory reporting

pub mod cli;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod hash_cache;
pub mod hasher;
pub mod heap;
pub mod logging;
pub mod metrics;
pub mod output;
pub mod pool;
pub mod progress;
pub mod utils;
pub mod walker;

pub use cli::Args;
pub use config::ScanConfig;
pub use data::{FileKind, FileRecord, FormattedSize};
pub use engine::{CancelToken, DedupEngine, DedupReport, ScanStats};
pub use error::{Error, Result};
pub use hash_cache::{HashCache, HashHandle};
pub use heap::Heap;
pub use pool::WorkerPool;
