//! Content hashing.
//!
//! The engine only needs a pure function from a path to a digest string; the
//! [`ContentHasher`] trait is that seam. [`Sha1Hasher`] streams the file
//! through SHA-1 and returns the lowercase hex digest.

use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Computes a content digest for a file.
pub trait ContentHasher: Send + Sync {
    fn hash_file(&self, path: &Path) -> io::Result<String>;
}

/// Streaming SHA-1 hasher.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha1Hasher;

impl ContentHasher for Sha1Hasher {
    fn hash_file(&self, path: &Path) -> io::Result<String> {
        let mut file = File::open(path)?;
        let mut hasher = Sha1::new();
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..read]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sha1_known_digests() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty");
        let abc = dir.path().join("abc");
        fs::write(&empty, b"").unwrap();
        fs::write(&abc, b"abc").unwrap();

        assert_eq!(
            Sha1Hasher.hash_file(&empty).unwrap(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            Sha1Hasher.hash_file(&abc).unwrap(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_large_file_spans_buffers() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        let content = vec![7u8; READ_BUFFER_SIZE * 3 + 11];
        fs::write(&first, &content).unwrap();
        fs::write(&second, &content).unwrap();

        let a = Sha1Hasher.hash_file(&first).unwrap();
        assert_eq!(a.len(), 40);
        assert_eq!(a, Sha1Hasher.hash_file(&second).unwrap());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(Sha1Hasher.hash_file(&dir.path().join("missing")).is_err());
    }
}
