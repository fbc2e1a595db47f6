//! Breadth-first discovery of duplicate candidates.
//!
//! This module handles:
//! - Level-by-level traversal from a FIFO queue of pending directories
//! - Directory filtering (pseudo-filesystems, blacklist, exclude globs)
//! - File classification: only plain, readable, regular files pass
//! - Optional skipping of zero-length files
//! - A per-directory completion callback the engine uses as a barrier
//!
//! Each directory is listed with `WalkDir` limited to depth 1 and sorted by
//! file name, so directories enter the queue in deterministic order. Symbolic
//! links are never followed.
//!
//! A permission failure while listing a directory skips that directory. Any
//! other listing or stat failure is returned to the caller.

use crate::data::FileKind;
use crate::engine::CancelToken;
use crate::error::{Error, Result};
use crate::utils::classify;
use log::{debug, info};
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A regular file that passed every filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub size: u64,
}

/// Counters maintained while walking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Directories accepted into the queue (the root is not counted)
    pub dirs: u64,
    pub files: u64,
    pub bytes: u64,
    /// Directories skipped because they could not be listed
    pub skipped_dirs: u64,
    /// Directories taken off the queue so far, the root included
    pub visited: u64,
}

impl WalkStats {
    /// Share of the directories known so far that have been listed.
    ///
    /// The total grows as subdirectories are found, so this is an estimate
    /// that reaches 100 only once the queue is drained.
    pub fn discovery_percent(&self) -> f64 {
        self.visited as f64 * 100.0 / (self.dirs + 1) as f64
    }
}

type DirPredicate<'a> = Box<dyn Fn(&Path) -> bool + 'a>;

/// Breadth-first directory walker.
pub struct Walker<'a> {
    root: PathBuf,
    dir_filter: DirPredicate<'a>,
    skip_empty: bool,
    cancel: CancelToken,
}

impl<'a> Walker<'a> {
    /// Creates a walker that accepts every directory.
    ///
    /// # Errors
    /// [`Error::Configuration`] if `root` is empty.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(Error::Configuration("walk root must not be empty".to_string()));
        }
        Ok(Self {
            root,
            dir_filter: Box::new(|_| true),
            skip_empty: false,
            cancel: CancelToken::new(),
        })
    }

    pub fn dir_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Path) -> bool + 'a,
    {
        self.dir_filter = Box::new(filter);
        self
    }

    pub fn skip_empty(mut self, skip: bool) -> Self {
        self.skip_empty = skip;
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Walks the tree, handing every candidate to `on_file` and calling
    /// `on_dir_done` after each directory's entries have been dispatched.
    ///
    /// Errors returned by either callback stop the walk and are propagated.
    pub fn walk<F, D>(&self, mut on_file: F, mut on_dir_done: D) -> Result<WalkStats>
    where
        F: FnMut(FileCandidate) -> Result<()>,
        D: FnMut(&Path, &WalkStats) -> Result<()>,
    {
        let mut stats = WalkStats::default();
        let mut queue = VecDeque::from([self.root.clone()]);

        while let Some(dir) = queue.pop_front() {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            self.visit(&dir, &mut queue, &mut stats, &mut on_file)?;
            stats.visited += 1;
            on_dir_done(&dir, &stats)?;
        }

        Ok(stats)
    }

    fn visit<F>(
        &self,
        dir: &Path,
        queue: &mut VecDeque<PathBuf>,
        stats: &mut WalkStats,
        on_file: &mut F,
    ) -> Result<()>
    where
        F: FnMut(FileCandidate) -> Result<()>,
    {
        let listing = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in listing {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let at_root = err.depth() == 0;
                    let path = err.path().unwrap_or(dir).to_path_buf();
                    let err = Error::io(path, io::Error::from(err));
                    if !err.is_skippable() {
                        return Err(err);
                    }
                    info!("skipping: {err}");
                    if at_root {
                        stats.skipped_dirs += 1;
                    }
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                if (self.dir_filter)(entry.path()) {
                    stats.dirs += 1;
                    queue.push_back(entry.into_path());
                } else {
                    debug!("filtered directory {}", entry.path().display());
                }
                continue;
            }

            let kind = classify(entry.path(), file_type);
            if kind != FileKind::Regular {
                debug!("ignoring {} {}", kind.as_str(), entry.path().display());
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(err) => {
                    let err = Error::io(entry.path(), io::Error::from(err));
                    if !err.is_skippable() {
                        return Err(err);
                    }
                    info!("skipping: {err}");
                    continue;
                }
            };
            if self.skip_empty && size == 0 {
                continue;
            }

            stats.files += 1;
            stats.bytes += size;
            on_file(FileCandidate {
                path: entry.into_path(),
                size,
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn collect(walker: &Walker) -> (Vec<FileCandidate>, Vec<PathBuf>, WalkStats) {
        let mut files = Vec::new();
        let mut dirs = Vec::new();
        let stats = walker
            .walk(
                |c| {
                    files.push(c);
                    Ok(())
                },
                |d, _| {
                    dirs.push(d.to_path_buf());
                    Ok(())
                },
            )
            .unwrap();
        (files, dirs, stats)
    }

    #[test]
    fn test_empty_root_rejected() {
        assert!(matches!(Walker::new(""), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_breadth_first_order_and_counters() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("b/deep")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("top.txt"), "12345").unwrap();
        fs::write(root.join("a/one.txt"), "1").unwrap();
        fs::write(root.join("b/deep/two.txt"), "22").unwrap();

        let walker = Walker::new(root).unwrap();
        let (files, dirs, stats) = collect(&walker);

        assert_eq!(
            dirs,
            vec![
                root.to_path_buf(),
                root.join("a"),
                root.join("b"),
                root.join("b/deep")
            ]
        );
        assert_eq!(stats.dirs, 3);
        assert_eq!(stats.visited, 4);
        assert_eq!(stats.discovery_percent(), 100.0);
        assert_eq!(stats.files, 3);
        assert_eq!(stats.bytes, 8);
        assert_eq!(files[0].path, root.join("top.txt"));
        assert_eq!(files[0].size, 5);
    }

    #[test]
    fn test_filters_dirs_symlinks_and_empty_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("skipme")).unwrap();
        fs::write(root.join("skipme/hidden.txt"), "x").unwrap();
        fs::write(root.join("keep.txt"), "x").unwrap();
        fs::write(root.join("empty.txt"), "").unwrap();
        std::os::unix::fs::symlink(root.join("keep.txt"), root.join("link.txt")).unwrap();

        let walker = Walker::new(root)
            .unwrap()
            .dir_filter(|p: &Path| !p.ends_with("skipme"))
            .skip_empty(true);
        let (files, _, stats) = collect(&walker);

        let names: Vec<_> = files
            .iter()
            .map(|c| c.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["keep.txt"]);
        assert_eq!(stats.dirs, 0);
    }

    #[test]
    fn test_pipes_and_sockets_are_not_candidates() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("plain.txt"), "data").unwrap();
        for name in ["fifo_a", "fifo_b"] {
            let path = std::ffi::CString::new(root.join(name).to_str().unwrap()).unwrap();
            assert_eq!(unsafe { libc::mkfifo(path.as_ptr(), 0o644) }, 0);
        }
        let _sock_a = std::os::unix::net::UnixListener::bind(root.join("sock_a")).unwrap();
        let _sock_b = std::os::unix::net::UnixListener::bind(root.join("sock_b")).unwrap();

        let walker = Walker::new(root).unwrap();
        let (files, _, stats) = collect(&walker);

        assert_eq!(stats.files, 1);
        assert_eq!(stats.bytes, 4);
        assert_eq!(files[0].path, root.join("plain.txt"));
    }

    #[test]
    fn test_cancelled_walk() {
        let temp = TempDir::new().unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let walker = Walker::new(temp.path()).unwrap().cancel_token(cancel);
        let result = walker.walk(|_| Ok(()), |_, _| Ok(()));
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_callback_error_stops_walk() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("f"), "x").unwrap();
        let walker = Walker::new(temp.path()).unwrap();
        let result = walker.walk(|_| Err(Error::PoolReleased), |_, _| Ok(()));
        assert!(matches!(result, Err(Error::PoolReleased)));
    }
}
