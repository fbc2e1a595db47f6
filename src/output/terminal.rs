//! Terminal output formatter for duplicate listings.
//!
//! Each duplicate is one line:
//!
//! ```text
//! <hash padded/truncated to 40> <size right-aligned in 4> <unit right-aligned in 2> <path>
//! ```

use crate::data::FileRecord;
use anyhow::Result;
use std::io::Write;

/// Formats a single duplicate line (without trailing newline).
pub fn format_line(record: &FileRecord) -> String {
    let size = record.formatted_size();
    format!(
        "{:<40.40} {:>4} {:>2} {}",
        record.hash.as_str(),
        size.magnitude,
        size.unit,
        record.path.display()
    )
}

/// Writes one line per record to `out`.
///
/// # Arguments
/// * `records` - Duplicates in engine output order
/// * `out` - Destination, usually a locked stdout
pub fn render<W: Write>(records: &[FileRecord], out: &mut W) -> Result<()> {
    for record in records {
        writeln!(out, "{}", format_line(record))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_cache::HashCache;
    use std::path::PathBuf;

    #[test]
    fn test_format_line_layout() {
        let cache = HashCache::new();
        let record = FileRecord::new(
            PathBuf::from("my/path/test"),
            1000,
            cache.instance("1234567890123"),
        );
        assert_eq!(
            format_line(&record),
            "1234567890123                               1 Kb my/path/test"
        );
    }

    #[test]
    fn test_long_hash_truncated() {
        let cache = HashCache::new();
        let record = FileRecord::new(PathBuf::from("/f"), 5, cache.instance(&"a".repeat(64)));
        let line = format_line(&record);
        assert_eq!(line, format!("{}    5  b /f", "a".repeat(40)));
    }
}
