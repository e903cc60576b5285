//! Apply journal trait.

use crate::models::ApplyRecord;
use crate::Result;

/// Ordered, append-only log of accepted taxonomy changes.
///
/// The most recent record is the one an undo reverses. Undo reads the
/// journal but never appends to or truncates it, so repeating an undo
/// repeats the same reversal.
///
/// There is no locking across processes: two workflows sharing a journal
/// file both append, and the later append becomes [`ApplyJournal::latest`].
pub trait ApplyJournal: Send + Sync {
    /// Appends a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted.
    fn append(&self, record: &ApplyRecord) -> Result<()>;

    /// Returns every record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal cannot be read.
    fn records(&self) -> Result<Vec<ApplyRecord>>;

    /// Returns the most recent record, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal cannot be read.
    fn latest(&self) -> Result<Option<ApplyRecord>> {
        Ok(self.records()?.pop())
    }

    /// Returns the most recent record for `symbol`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal cannot be read.
    fn latest_for(&self, symbol: &str) -> Result<Option<ApplyRecord>> {
        Ok(self
            .records()?
            .into_iter()
            .rev()
            .find(|record| record.symbol == symbol))
    }
}
