//! Apply journal backends.
//!
//! The file backend stores one JSON object per line:
//!
//! ```text
//! {"symbol":"TST.TWO","prev_cat":null,"prev_subcat":null,"new_cat":"ai","new_subcat":"architecture.hybrid","score":1.0,"recorded_at":"2025-01-01T00:00:00Z"}
//! ```

use crate::models::ApplyRecord;
use crate::storage::sqlite::{acquire_lock, record_operation_metrics};
use crate::storage::traits::ApplyJournal;
use crate::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing::instrument;

/// JSON-lines journal on disk.
///
/// Appends never rewrite earlier lines. Lines that fail to parse are skipped
/// with a warning rather than failing the read.
pub struct FileApplyJournal {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileApplyJournal {
    /// Creates a journal backed by `path`. The file is created on first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the journal path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ApplyJournal for FileApplyJournal {
    #[instrument(skip(self, record), fields(operation = "append", backend = "journal", symbol = %record.symbol))]
    fn append(&self, record: &ApplyRecord) -> Result<()> {
        let start = Instant::now();
        let result: Result<()> = (|| {
            let line = serde_json::to_string(record)
                .map_err(|e| Error::operation("serialize_apply_record", e))?;

            let _guard = acquire_lock(&self.write_lock);
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::operation("create_journal_dir", e))?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(|e| Error::operation("open_journal", e))?;
            writeln!(file, "{line}").map_err(|e| Error::operation("append_journal", e))
        })();

        let status = if result.is_ok() { "success" } else { "error" };
        record_operation_metrics("journal", "append", start, status);
        result
    }

    fn records(&self) -> Result<Vec<ApplyRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::operation("read_journal", e)),
        };

        let mut records = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ApplyRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = index + 1,
                        error = %e,
                        "Skipping malformed apply journal line"
                    );
                },
            }
        }

        Ok(records)
    }
}

/// In-process journal, used by tests and single-shot sessions.
#[derive(Default)]
pub struct MemoryApplyJournal {
    records: Mutex<Vec<ApplyRecord>>,
}

impl MemoryApplyJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ApplyJournal for MemoryApplyJournal {
    fn append(&self, record: &ApplyRecord) -> Result<()> {
        acquire_lock(&self.records).push(record.clone());
        Ok(())
    }

    fn records(&self) -> Result<Vec<ApplyRecord>> {
        Ok(acquire_lock(&self.records).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(symbol: &str, new_cat: &str) -> ApplyRecord {
        ApplyRecord {
            symbol: symbol.to_string(),
            previous_category: None,
            previous_subcategory: None,
            new_category: Some(new_cat.to_string()),
            new_subcategory: None,
            score: 0.8,
            recorded_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_file_journal_empty_when_missing() {
        let dir = TempDir::new().unwrap();
        let journal = FileApplyJournal::new(dir.path().join("journal.jsonl"));

        assert!(journal.records().unwrap().is_empty());
        assert!(journal.latest().unwrap().is_none());
    }

    #[test]
    fn test_file_journal_append_and_latest() {
        let dir = TempDir::new().unwrap();
        let journal = FileApplyJournal::new(dir.path().join("state").join("journal.jsonl"));

        journal.append(&record("A", "x")).unwrap();
        journal.append(&record("B", "y")).unwrap();
        journal.append(&record("A", "z")).unwrap();

        assert_eq!(journal.records().unwrap().len(), 3);
        assert_eq!(journal.latest().unwrap().unwrap().symbol, "A");
        assert_eq!(
            journal.latest_for("B").unwrap().unwrap().new_category.as_deref(),
            Some("y")
        );
        assert_eq!(
            journal.latest_for("A").unwrap().unwrap().new_category.as_deref(),
            Some("z")
        );
        assert!(journal.latest_for("C").unwrap().is_none());
    }

    #[test]
    fn test_file_journal_skips_malformed_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");
        let journal = FileApplyJournal::new(&path);

        journal.append(&record("A", "x")).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();
        writeln!(file).unwrap();

        let records = journal.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].symbol, "A");
    }

    #[test]
    fn test_file_journal_reads_legacy_record_without_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");
        fs::write(
            &path,
            r#"{"symbol":"S","prev_cat":null,"prev_subcat":null,"new_cat":"ai","new_subcat":"x","score":0.7}"#,
        )
        .unwrap();

        let latest = FileApplyJournal::new(&path).latest().unwrap().unwrap();
        assert_eq!(latest.symbol, "S");
        assert!(latest.recorded_at.is_empty());
    }

    #[test]
    fn test_memory_journal() {
        let journal = MemoryApplyJournal::new();
        assert!(journal.latest().unwrap().is_none());

        journal.append(&record("A", "x")).unwrap();
        journal.append(&record("B", "y")).unwrap();

        assert_eq!(journal.records().unwrap().len(), 2);
        assert_eq!(journal.latest().unwrap().unwrap().symbol, "B");
    }
}
