//! Duplicate detection engine.
//!
//! A run has two phases:
//!
//! 1. **Collect.** The walker feeds candidates to a [`WorkerPool`]. Each worker
//!    runs the candidate through the [`SizeIndex`]: the first file of a size
//!    is parked unhashed, the second file of that size releases the parked one
//!    and both get hashed, and later files of that size are hashed directly.
//!    Hashes are interned through the [`HashCache`]. Hashed records go over a
//!    channel to a single aggregator thread that pushes them into the
//!    [`Heap`]. After the walk, records still parked (globally unique sizes)
//!    are pushed with the cache's empty handle.
//! 2. **Scan.** The heap is drained in (hash desc, size asc, path asc) order.
//!    Equal hashes are contiguous, so one pass comparing each record with the
//!    previous one finds every run of two or more records sharing a non-empty
//!    hash.
//!
//! A file that fails to hash is dropped from the run with a warning.

use crate::config::ScanConfig;
use crate::data::FileRecord;
use crate::error::{Error, Result};
use crate::hash_cache::HashCache;
use crate::hasher::ContentHasher;
use crate::heap::Heap;
use crate::pool::WorkerPool;
use crate::progress::{Observer, Stage};
use crate::walker::{FileCandidate, WalkStats, Walker};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

/// Records between two progress reports while draining the heap.
const DRAIN_REPORT_INTERVAL: usize = 4096;

/// Cooperative cancellation flag shared by every stage of a run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters describing one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub dirs: u64,
    pub files: u64,
    pub bytes: u64,
    pub skipped_dirs: u64,
    pub hashed: u64,
    pub hash_failures: u64,
    pub unique_hashes: u64,
    pub duplicates: u64,
}

impl ScanStats {
    fn from_walk(walk: &WalkStats, hashing: &HashCounters) -> Self {
        Self {
            dirs: walk.dirs,
            files: walk.files,
            bytes: walk.bytes,
            skipped_dirs: walk.skipped_dirs,
            hashed: hashing.hashed.load(Ordering::Relaxed),
            hash_failures: hashing.failures.load(Ordering::Relaxed),
            ..Self::default()
        }
    }
}

#[derive(Default)]
struct HashCounters {
    hashed: AtomicU64,
    failures: AtomicU64,
}

enum SizeSlot {
    Parked(FileCandidate),
    Collided,
}

/// Concurrent record of which file sizes have been seen.
///
/// The first candidate of each size is parked rather than hashed; a file
/// whose size stays unique can never be a duplicate.
#[derive(Default)]
pub struct SizeIndex {
    slots: DashMap<u64, SizeSlot>,
}

impl SizeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test-and-mark for `candidate.size`. Returns the candidates that now
    /// need hashing: none on first sight, the parked file plus this one on
    /// the first collision, and just this one afterwards.
    pub fn admit(&self, candidate: FileCandidate) -> Vec<FileCandidate> {
        match self.slots.entry(candidate.size) {
            Entry::Vacant(vacant) => {
                vacant.insert(SizeSlot::Parked(candidate));
                Vec::new()
            }
            Entry::Occupied(mut occupied) => {
                match std::mem::replace(occupied.get_mut(), SizeSlot::Collided) {
                    SizeSlot::Parked(first) => vec![first, candidate],
                    SizeSlot::Collided => vec![candidate],
                }
            }
        }
    }

    /// Removes and returns every candidate whose size was seen only once.
    pub fn take_parked(&self) -> Vec<FileCandidate> {
        let mut parked = Vec::new();
        self.slots
            .retain(|_, slot| match std::mem::replace(slot, SizeSlot::Collided) {
                SizeSlot::Parked(candidate) => {
                    parked.push(candidate);
                    false
                }
                SizeSlot::Collided => true,
            });
        parked
    }

    /// Number of distinct sizes seen.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct DedupReport {
    pub duplicates: Vec<FileRecord>,
    pub stats: ScanStats,
}

/// Orchestrates discovery, selective hashing and the duplicate scan.
pub struct DedupEngine {
    config: ScanConfig,
    hasher: Arc<dyn ContentHasher>,
    observer: Arc<dyn Observer>,
    cache: Arc<HashCache>,
    cancel: CancelToken,
}

impl DedupEngine {
    /// # Errors
    /// [`Error::Configuration`] if `config` does not validate.
    pub fn new(
        config: ScanConfig,
        hasher: Arc<dyn ContentHasher>,
        observer: Arc<dyn Observer>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            hasher,
            observer,
            cache: Arc::new(HashCache::new()),
            cancel: CancelToken::new(),
        })
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cache(&self) -> &HashCache {
        &self.cache
    }

    /// Runs both phases and collects the duplicates in output order.
    pub fn run(&self) -> Result<DedupReport> {
        let mut duplicates = Vec::new();
        let stats = self.run_streaming(|record| {
            duplicates.push(record.clone());
            Ok(())
        })?;
        Ok(DedupReport { duplicates, stats })
    }

    /// Runs both phases, handing each duplicate to `emit` as it is found.
    pub fn run_streaming<E>(&self, emit: E) -> Result<ScanStats>
    where
        E: FnMut(&FileRecord) -> Result<()>,
    {
        let (heap, mut stats) = self.collect()?;
        self.emit_duplicates(&heap, &mut stats, emit)?;
        Ok(stats)
    }

    /// Phase 1: walks the tree and returns every surviving record in a heap.
    pub fn collect(&self) -> Result<(Heap<FileRecord>, ScanStats)> {
        info!("scanning {}", self.config.root.display());
        let heap = Arc::new(Heap::with_comparator(FileRecord::heap_less));
        let sizes = Arc::new(SizeIndex::new());
        let counters = Arc::new(HashCounters::default());
        let (record_tx, record_rx) = crossbeam_channel::unbounded::<FileRecord>();

        let aggregator = {
            let heap = Arc::clone(&heap);
            thread::Builder::new()
                .name("dupfind-aggregator".to_string())
                .spawn(move || {
                    for record in record_rx {
                        heap.push(record);
                    }
                })
                .map_err(|e| Error::Configuration(format!("failed to spawn aggregator: {e}")))?
        };

        let mut pool = {
            let sizes = Arc::clone(&sizes);
            let hasher = Arc::clone(&self.hasher);
            let cache = Arc::clone(&self.cache);
            let counters = Arc::clone(&counters);
            let cancel = self.cancel.clone();
            WorkerPool::new(self.config.workers, move |candidate: FileCandidate| {
                for candidate in sizes.admit(candidate) {
                    if cancel.is_cancelled() {
                        return;
                    }
                    match hash_candidate(hasher.as_ref(), &cache, candidate) {
                        Ok(record) => {
                            counters.hashed.fetch_add(1, Ordering::Relaxed);
                            // the aggregator only stops after every sender is gone
                            let _ = record_tx.send(record);
                        }
                        Err(err) => {
                            counters.failures.fetch_add(1, Ordering::Relaxed);
                            warn!("{err}");
                        }
                    }
                }
            })?
        };
        let workers = pool.size();

        let filter = self.config.dir_filter()?;
        let walker = Walker::new(&self.config.root)?
            .dir_filter(|dir| filter.accepts(dir))
            .skip_empty(self.config.skip_empty)
            .cancel_token(self.cancel.clone());

        self.observer.on_progress(Stage::Discovery, 0.0);
        let walked = walker.walk(
            |candidate| pool.submit(candidate),
            |dir, walk_stats| {
                // bound memory: hashing catches up before the next directory
                pool.wait();
                debug!("finished {}", dir.display());
                self.observer
                    .on_progress(Stage::Discovery, walk_stats.discovery_percent());
                self.observer
                    .on_stats(&ScanStats::from_walk(walk_stats, &counters));
                Ok(())
            },
        );
        let released = pool.release();
        drop(pool);
        let joined = aggregator.join().map_err(|_| Error::WorkerPanicked);

        let walk_stats = walked?;
        released?;
        joined?;
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let heap = Arc::try_unwrap(heap).map_err(|_| Error::WorkerPanicked)?;
        let empty = self.cache.empty();
        for candidate in sizes.take_parked() {
            heap.push(FileRecord::new(candidate.path, candidate.size, empty.clone()));
        }

        let mut stats = ScanStats::from_walk(&walk_stats, &counters);
        stats.unique_hashes = self.cache.len().saturating_sub(1) as u64;
        self.observer.on_progress(Stage::Hashing, 100.0);
        self.observer.on_stats(&stats);
        info!(
            "collected {} files in {} dirs, hashed {} on {} workers",
            stats.files, stats.dirs, stats.hashed, workers
        );
        Ok((heap, stats))
    }

    /// Phase 2: drains `heap` and emits every member of a duplicate run.
    pub fn emit_duplicates<E>(
        &self,
        heap: &Heap<FileRecord>,
        stats: &mut ScanStats,
        emit: E,
    ) -> Result<()>
    where
        E: FnMut(&FileRecord) -> Result<()>,
    {
        stats.duplicates =
            scan_duplicate_runs(heap, &self.cache, &self.cancel, self.observer.as_ref(), emit)?;
        self.observer.on_stats(stats);
        self.observer.finish();
        info!("found {} duplicate files", stats.duplicates);
        Ok(())
    }
}

fn hash_candidate(
    hasher: &dyn ContentHasher,
    cache: &HashCache,
    candidate: FileCandidate,
) -> Result<FileRecord> {
    match hasher.hash_file(&candidate.path) {
        Ok(digest) => Ok(FileRecord::new(
            candidate.path,
            candidate.size,
            cache.instance(&digest),
        )),
        Err(source) => Err(Error::Hash {
            path: candidate.path,
            source,
        }),
    }
}

/// Drains `heap` in comparator order and emits every record whose interned
/// hash is shared with at least one other record. Records carrying the
/// cache's empty handle are never emitted.
///
/// Returns the number of records emitted.
pub fn scan_duplicate_runs<E>(
    heap: &Heap<FileRecord>,
    cache: &HashCache,
    cancel: &CancelToken,
    observer: &dyn Observer,
    mut emit: E,
) -> Result<u64>
where
    E: FnMut(&FileRecord) -> Result<()>,
{
    let total = heap.len();
    let mut drained = 0usize;
    let mut emitted = 0u64;
    let mut previous: Option<FileRecord> = None;
    let mut run_open = false;

    while !heap.is_empty() {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let current = heap.pop()?;
        drained += 1;
        if drained % DRAIN_REPORT_INTERVAL == 0 {
            observer.on_progress(Stage::Sorting, drained as f64 * 100.0 / total as f64);
        }

        if let Some(prev) = previous.take() {
            if current.hash == prev.hash && !cache.is_empty_handle(&prev.hash) {
                emit(&prev)?;
                emitted += 1;
                run_open = true;
            } else if run_open {
                // closing member of the run that just ended
                emit(&prev)?;
                emitted += 1;
                run_open = false;
            }
        }
        previous = Some(current);
    }

    if run_open {
        if let Some(last) = previous {
            emit(&last)?;
            emitted += 1;
        }
    }
    observer.on_progress(Stage::Sorting, 100.0);
    Ok(emitted)
}
