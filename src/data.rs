//! Data structures for representing files under consideration.
//!
//! This module defines the core data structures used throughout `dupfind`
//! for representing files discovered during traversal and their derived
//! display values.

use crate::hash_cache::HashHandle;
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

/// Decimal size units used by the duplicate listing.
const SIZE_UNITS: [&str; 7] = ["b", "Kb", "Mb", "Gb", "Tb", "Pb", "Eb"];

/// One filesystem file under consideration.
///
/// # Fields
/// * `path` - Walk path of the file, unique per record
/// * `size` - Size in bytes
/// * `hash` - Interned content hash, or the cache's empty handle when the file
///   was never hashed
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size: u64,
    pub hash: HashHandle,
}

impl FileRecord {
    pub fn new(path: PathBuf, size: u64, hash: HashHandle) -> Self {
        Self { path, size, hash }
    }

    /// Display-only size split into magnitude and unit.
    pub fn formatted_size(&self) -> FormattedSize {
        FormattedSize::from_bytes(self.size)
    }

    /// Ordering used by the duplicate heap: hash descending, then size
    /// ascending, then path ascending.
    pub fn heap_order(a: &FileRecord, b: &FileRecord) -> Ordering {
        b.hash
            .as_str()
            .cmp(a.hash.as_str())
            .then_with(|| a.size.cmp(&b.size))
            .then_with(|| a.path.cmp(&b.path))
    }

    /// `less` comparator form of [`FileRecord::heap_order`].
    pub fn heap_less(a: &FileRecord, b: &FileRecord) -> bool {
        Self::heap_order(a, b) == Ordering::Less
    }
}

/// A size reduced to an integer magnitude and a decimal unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormattedSize {
    pub magnitude: u64,
    pub unit: &'static str,
}

impl FormattedSize {
    pub fn from_bytes(bytes: u64) -> Self {
        let mut magnitude = bytes;
        let mut unit = 0;
        while magnitude >= 1000 && unit < SIZE_UNITS.len() - 1 {
            magnitude /= 1000;
            unit += 1;
        }
        Self {
            magnitude,
            unit: SIZE_UNITS[unit],
        }
    }
}

impl fmt::Display for FormattedSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>4} {:>2}", self.magnitude, self.unit)
    }
}

/// Classification of a directory entry.
///
/// # Variants
/// * `Regular` - A plain file
/// * `Directory` - A directory
/// * `Symlink` - A symbolic link (never followed)
/// * `Device` - A block or character device
/// * `Socket` - A Unix domain socket
/// * `Pipe` - A named pipe
/// * `Unreadable` - A regular file the current user cannot read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
    Device,
    Socket,
    Pipe,
    Unreadable,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Regular => "FILE",
            FileKind::Directory => "DIR",
            FileKind::Symlink => "SYMLINK",
            FileKind::Device => "DEVICE",
            FileKind::Socket => "SOCKET",
            FileKind::Pipe => "PIPE",
            FileKind::Unreadable => "UNREADABLE",
        }
    }
}
