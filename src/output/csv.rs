//! CSV output formatter for duplicate listings.
//!
//! This module exports the duplicate set to CSV for further processing or
//! analysis.

use crate::cli::CsvEntry;
use crate::data::FileRecord;
use anyhow::{Context, Result};
use csv::Writer;
use humansize::{DECIMAL, format_size};
use std::fs::File;
use std::io;
use std::path::Path;

/// Serializes duplicates to `writer`, one row per record.
pub fn write_records<W: io::Write>(records: &[FileRecord], writer: W) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);

    for record in records {
        csv_writer.serialize(CsvEntry {
            hash: record.hash.to_string(),
            size_bytes: record.size,
            size_human: format_size(record.size, DECIMAL),
            path: record.path.display().to_string(),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Renders duplicates to the CSV file at `output`.
///
/// # Arguments
/// * `records` - Duplicates in engine output order
/// * `output` - Destination file, created or truncated
pub fn render(records: &[FileRecord], output: &Path) -> Result<()> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    write_records(records, file)?;
    log::info!("CSV output written to: {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_cache::HashCache;
    use std::path::PathBuf;

    #[test]
    fn test_csv_rows() {
        let cache = HashCache::new();
        let records = vec![FileRecord::new(
            PathBuf::from("/mnt/data/file.txt"),
            1024,
            cache.instance("abc123"),
        )];

        let mut buffer = Vec::new();
        write_records(&records, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("hash,size_bytes,size_human,path"));
        assert_eq!(lines.next(), Some("abc123,1024,1.02 kB,/mnt/data/file.txt"));
        assert_eq!(lines.next(), None);
    }
}
