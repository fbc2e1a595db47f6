//! Fixed-size worker pool with rendezvous backpressure.
//!
//! Workers share a single zero-capacity channel, so [`WorkerPool::submit`]
//! blocks until an idle worker takes the task. A fast producer (the walker)
//! can therefore never be more than one task per worker ahead of hashing.
//!
//! # Strategies
//! Worker counts are derived from [`PoolStrategy`]:
//! - `Default`: 2x CPU count
//! - `Fixed`: an explicit number of workers
//! - `NumCpusMinus1`: number of CPUs minus 1 (leaves one CPU free)
//! - `IOHeavy`: 4x CPU count, for slow or networked storage

use crate::error::{Error, Result};
use clap::ValueEnum;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Worker-count strategies.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum PoolStrategy {
    /// Two workers per CPU
    Default,
    /// Use a fixed number of workers
    Fixed,
    /// Use number of CPUs minus 1 (leaves one CPU free)
    NumCpusMinus1,
    /// Optimized for I/O-heavy workloads (4x CPU count)
    IOHeavy,
}

impl PoolStrategy {
    /// Returns a string representation of the strategy for display purposes.
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolStrategy::Default => "Default",
            PoolStrategy::Fixed => "Fixed",
            PoolStrategy::NumCpusMinus1 => "NumCpusMinus1",
            PoolStrategy::IOHeavy => "IOHeavy",
        }
    }

    /// Resolves the number of workers for this strategy.
    ///
    /// # Arguments
    /// * `n_workers` - Worker count for `Fixed`, ignored by other strategies
    ///
    /// # Errors
    /// `Fixed` with `n_workers == 0` is a configuration error.
    pub fn workers(&self, n_workers: usize) -> Result<usize> {
        let cpus = num_cpus::get();
        match self {
            PoolStrategy::Default => Ok(cpus * 2),
            PoolStrategy::Fixed => {
                if n_workers == 0 {
                    return Err(Error::Configuration(
                        "Fixed strategy requires a worker count > 0".to_string(),
                    ));
                }
                Ok(n_workers)
            }
            PoolStrategy::NumCpusMinus1 => Ok(std::cmp::max(1, cpus.saturating_sub(1))),
            PoolStrategy::IOHeavy => Ok(cpus * 4),
        }
    }
}

/// Count of tasks submitted but not yet finished.
struct Pending {
    count: Mutex<usize>,
    idle: Condvar,
}

impl Pending {
    fn add(&self) {
        *self.count.lock() += 1;
    }

    fn done(&self) {
        let mut count = self.count.lock();
        *count -= 1;
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn wait_idle(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.idle.wait(&mut count);
        }
    }
}

/// Decrements the pending counter even if the handler unwinds.
struct DoneGuard<'a>(&'a Pending);

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.0.done();
    }
}

/// Pool of worker threads running one handler over submitted tasks.
pub struct WorkerPool<T: Send + 'static> {
    sender: Option<Sender<T>>,
    workers: Vec<JoinHandle<()>>,
    pending: Arc<Pending>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Starts `size` workers, each looping over the shared task channel.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] when `size` is zero or a worker thread
    /// cannot be spawned.
    pub fn new<F>(size: usize, handler: F) -> Result<Self>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        if size == 0 {
            return Err(Error::Configuration(
                "worker pool needs at least one worker".to_string(),
            ));
        }

        let (sender, receiver) = crossbeam_channel::bounded::<T>(0);
        let handler = Arc::new(handler);
        let pending = Arc::new(Pending {
            count: Mutex::new(0),
            idle: Condvar::new(),
        });

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let receiver: Receiver<T> = receiver.clone();
            let handler = Arc::clone(&handler);
            let pending = Arc::clone(&pending);
            let worker = thread::Builder::new()
                .name(format!("dupfind-worker-{id}"))
                .spawn(move || {
                    for task in receiver.iter() {
                        let _guard = DoneGuard(&pending);
                        handler(task);
                    }
                })
                .map_err(|e| Error::Configuration(format!("failed to spawn worker: {e}")))?;
            workers.push(worker);
        }
        log::debug!("worker pool started with {size} workers");

        Ok(Self {
            sender: Some(sender),
            workers,
            pending,
        })
    }

    /// Hands a task to an idle worker, blocking until one accepts it.
    ///
    /// # Errors
    /// [`Error::PoolReleased`] after [`release`](Self::release), and
    /// [`Error::WorkerPanicked`] if every worker has died.
    pub fn submit(&self, task: T) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(Error::PoolReleased)?;
        self.pending.add();
        if sender.send(task).is_err() {
            self.pending.done();
            return Err(Error::WorkerPanicked);
        }
        Ok(())
    }

    /// Blocks until every task submitted so far has finished.
    pub fn wait(&self) {
        self.pending.wait_idle();
    }

    /// Tasks submitted but not yet completed.
    pub fn in_flight(&self) -> usize {
        *self.pending.count.lock()
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Stops accepting tasks, lets in-flight tasks finish and joins all
    /// workers. Calling it again is a no-op.
    ///
    /// # Errors
    /// [`Error::WorkerPanicked`] if any worker panicked.
    pub fn release(&mut self) -> Result<()> {
        // closing the channel ends every worker's receive loop
        self.sender.take();
        let mut panicked = false;
        for worker in self.workers.drain(..) {
            panicked |= worker.join().is_err();
        }
        if panicked {
            return Err(Error::WorkerPanicked);
        }
        Ok(())
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::error!("worker pool shutdown: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_pool_strategy_as_str() {
        assert_eq!(PoolStrategy::Default.as_str(), "Default");
        assert_eq!(PoolStrategy::Fixed.as_str(), "Fixed");
        assert_eq!(PoolStrategy::NumCpusMinus1.as_str(), "NumCpusMinus1");
        assert_eq!(PoolStrategy::IOHeavy.as_str(), "IOHeavy");
    }

    #[test]
    fn test_strategy_worker_counts() {
        let cpus = num_cpus::get();
        assert_eq!(PoolStrategy::Default.workers(0).unwrap(), cpus * 2);
        assert_eq!(PoolStrategy::IOHeavy.workers(0).unwrap(), cpus * 4);
        assert_eq!(PoolStrategy::Fixed.workers(3).unwrap(), 3);
        assert_eq!(
            PoolStrategy::NumCpusMinus1.workers(0).unwrap(),
            std::cmp::max(1, cpus - 1)
        );
        assert!(matches!(
            PoolStrategy::Fixed.workers(0),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(
            WorkerPool::new(0, |_: u32| {}),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_every_task_runs_exactly_once() {
        let seen = Arc::new(Mutex::new(vec![0u32; 200]));
        let sink = Arc::clone(&seen);
        let mut pool = WorkerPool::new(4, move |i: usize| {
            sink.lock()[i] += 1;
        })
        .unwrap();

        for i in 0..200 {
            pool.submit(i).unwrap();
        }
        pool.release().unwrap();

        assert!(seen.lock().iter().all(|&count| count == 1));
    }

    #[test]
    fn test_wait_is_a_barrier() {
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        let pool = WorkerPool::new(3, move |_: ()| {
            thread::sleep(Duration::from_millis(5));
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        assert_eq!(pool.size(), 3);

        for _ in 0..12 {
            pool.submit(()).unwrap();
        }
        pool.wait();
        assert_eq!(done.load(Ordering::SeqCst), 12);
        assert_eq!(pool.in_flight(), 0);
    }

    #[test]
    fn test_submit_after_release_fails() {
        let mut pool = WorkerPool::new(1, |_: u8| {}).unwrap();
        pool.release().unwrap();
        assert!(matches!(pool.submit(1), Err(Error::PoolReleased)));
        // second release is harmless
        pool.release().unwrap();
    }

    #[test]
    fn test_submit_blocks_when_all_workers_busy() {
        const WORKERS: usize = 2;
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded::<()>();
        let pool = Arc::new(
            WorkerPool::new(WORKERS, move |_: usize| {
                gate_rx.recv().ok();
            })
            .unwrap(),
        );

        let accepted = Arc::new(AtomicUsize::new(0));
        let producer = {
            let pool = Arc::clone(&pool);
            let accepted = Arc::clone(&accepted);
            thread::spawn(move || {
                for i in 0..WORKERS + 3 {
                    pool.submit(i).unwrap();
                    accepted.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        thread::sleep(Duration::from_millis(200));
        // every worker holds one task; the next submit is parked
        assert_eq!(accepted.load(Ordering::SeqCst), WORKERS);

        for _ in 0..WORKERS + 3 {
            gate_tx.send(()).unwrap();
        }
        producer.join().unwrap();
        pool.wait();
        assert_eq!(accepted.load(Ordering::SeqCst), WORKERS + 3);
    }

    #[test]
    fn test_panicking_worker_reported_on_release() {
        let mut pool = WorkerPool::new(1, |fail: bool| {
            if fail {
                panic!("task failure");
            }
        })
        .unwrap();
        pool.submit(true).unwrap();
        pool.wait();
        assert!(matches!(pool.release(), Err(Error::WorkerPanicked)));
    }
}
