//! Utility functions for `dupfind`.
//!
//! This module provides:
//! - File kind classification (regular, symlink, device, socket, pipe)
//! - Readability checks via `libc::access`
//! - Pseudo-filesystem and blacklist directory predicates
//! - Glob-based exclusion pattern parsing
//!
//! All functions are platform-aware and safe to use with Unix filesystems.

use crate::data::FileKind;
use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use libc::{R_OK, access};
use std::ffi::CString;
use std::fs::FileType;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;

/// Mount points of kernel pseudo-filesystems that never hold user files.
pub const PSEUDO_FILESYSTEM_ROOTS: [&str; 4] = ["/proc", "/sys", "/dev", "/run"];

/// Classifies a directory entry from its (non-followed) file type.
///
/// Regular files the current user cannot read are reported as
/// [`FileKind::Unreadable`].
pub fn classify(path: &Path, file_type: FileType) -> FileKind {
    if file_type.is_symlink() {
        FileKind::Symlink
    } else if file_type.is_dir() {
        FileKind::Directory
    } else if file_type.is_block_device() || file_type.is_char_device() {
        FileKind::Device
    } else if file_type.is_socket() {
        FileKind::Socket
    } else if file_type.is_fifo() {
        FileKind::Pipe
    } else if is_readable(path) {
        FileKind::Regular
    } else {
        FileKind::Unreadable
    }
}

/// Returns true if the current process may open `path` for reading.
pub fn is_readable(path: &Path) -> bool {
    let c_path = match CString::new(path.as_os_str().as_bytes()) {
        Ok(p) => p,
        Err(_) => return false,
    };
    unsafe { access(c_path.as_ptr(), R_OK) == 0 }
}

/// Returns true for a pseudo-filesystem root such as `/proc`.
pub fn is_pseudo_filesystem(path: &Path) -> bool {
    PSEUDO_FILESYSTEM_ROOTS
        .iter()
        .any(|root| path == Path::new(root))
}

/// Returns true if any blacklist entry occurs as a substring of `path`.
pub fn matches_blacklist(path: &Path, blacklist: &[String]) -> bool {
    let path = path.to_string_lossy();
    blacklist
        .iter()
        .filter(|s| !s.is_empty())
        .any(|s| path.contains(s.as_str()))
}

/// Expands exclude patterns into common glob forms:
/// For example, "node_modules" becomes:
///   - `**/node_modules`
///   - `**/node_modules/**`
///     unless the pattern already includes glob symbols or extensions.
pub fn expand_exclude_patterns(patterns: &[String]) -> Vec<String> {
    let mut expanded = Vec::new();

    for pat in patterns {
        let pat = pat.trim();
        if pat.is_empty() {
            continue;
        }
        if pat.contains('*') || pat.ends_with('/') || pat.contains('.') {
            expanded.push(pat.to_string());
        } else {
            expanded.push(format!("**/{}", pat));
            expanded.push(format!("**/{}/**", pat));
        }
    }

    expanded
}

/// Compiles a list of glob patterns into a `GlobSet` matcher,
/// which can be used to test paths efficiently.
///
/// # Errors
/// An invalid pattern is reported as [`Error::Configuration`].
pub fn build_exclude_matcher(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            Error::Configuration(format!("Invalid glob pattern: '{}': {}", pattern, e))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::Configuration(format!("Failed to build glob set: {}", e)))
}
