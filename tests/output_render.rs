use dupfind::output::{csv, terminal};
use dupfind::{FileRecord, HashCache};
use std::path::PathBuf;
use tempfile::TempDir;

fn sample(cache: &HashCache) -> Vec<FileRecord> {
    let hash = cache.instance("f7ff9e8b7bb2e09b70935a5d785e0cc5d9d0abf0");
    vec![
        FileRecord::new(PathBuf::from("/mnt/data/a.txt"), 1234, hash.clone()),
        FileRecord::new(PathBuf::from("/mnt/data/b.txt"), 1234, hash),
    ]
}

#[test]
fn test_terminal_rendering() {
    let cache = HashCache::new();
    let mut out = Vec::new();
    terminal::render(&sample(&cache), &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "f7ff9e8b7bb2e09b70935a5d785e0cc5d9d0abf0    1 Kb /mnt/data/a.txt",
            "f7ff9e8b7bb2e09b70935a5d785e0cc5d9d0abf0    1 Kb /mnt/data/b.txt",
        ]
    );
}

#[test]
fn test_terminal_rendering_empty() {
    let mut out = Vec::new();
    terminal::render(&[], &mut out).unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_csv_rendering() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dups.csv");
    let cache = HashCache::new();

    csv::render(&sample(&cache), &path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("hash,size_bytes,size_human,path"));
    assert_eq!(
        lines.next(),
        Some("f7ff9e8b7bb2e09b70935a5d785e0cc5d9d0abf0,1234,1.23 kB,/mnt/data/a.txt")
    );
    assert_eq!(lines.count(), 1);
}

#[test]
fn test_csv_rendering_bad_destination() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("dups.csv");
    assert!(csv::render(&[], &path).is_err());
}
