//! Symbol store trait.
//!
//! The symbol store is the authoritative source of truth for text entries
//! and their aliases.
//!
//! # Resolution
//!
//! Lookups try the exact symbol first and fall back to the alias table.
//! Resolution is one hop only: an alias maps to a symbol, never to another
//! alias.
//!
//! # Scan Order
//!
//! [`SymbolStore::scan_classified`] returns entries in insertion order.
//! Re-saving an existing symbol keeps its original position. Suggestion
//! rankings break ties by this order, so implementations must honour it.
//!
//! # Concurrency
//!
//! Each call is its own unit of work. If two callers save the same symbol
//! concurrently, the last commit wins and each caller's `prev` reflects the
//! state at its own read point.

use crate::models::{SaveOutcome, SaveRequest, Symbol, Taxonomy, TextEntry};
use crate::Result;

/// Durable table of text entries keyed by symbol, plus an alias index.
pub trait SymbolStore: Send + Sync {
    /// Creates or replaces an entry and upserts the supplied aliases.
    ///
    /// The previous taxonomy is read before the write and returned as
    /// [`SaveOutcome::prev`] (both `None` for a new symbol).
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if the request fails validation,
    /// or [`crate::Error::OperationFailed`] if the write fails.
    fn save(&self, request: &SaveRequest) -> Result<SaveOutcome>;

    /// Resolves a symbol or alias to the primary symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn resolve(&self, symbol_or_alias: &str) -> Result<Option<Symbol>>;

    /// Fetches an entry by symbol or alias.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn get(&self, symbol_or_alias: &str) -> Result<Option<TextEntry>>;

    /// Returns the current taxonomy of an exact symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn taxonomy(&self, symbol: &str) -> Result<Option<Taxonomy>>;

    /// Returns up to `limit` entries that carry a category or subcategory,
    /// in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan fails.
    fn scan_classified(&self, limit: usize) -> Result<Vec<TextEntry>>;

    /// Returns the total count of entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the count fails.
    fn count(&self) -> Result<usize>;

    /// Fetches only the body of an entry by symbol or alias.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn get_body(&self, symbol_or_alias: &str) -> Result<Option<String>> {
        Ok(self.get(symbol_or_alias)?.map(|entry| entry.body))
    }

    /// Checks if a symbol or alias resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn exists(&self, symbol_or_alias: &str) -> Result<bool> {
        Ok(self.resolve(symbol_or_alias)?.is_some())
    }
}
