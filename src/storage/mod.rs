//! Storage layer.
//!
//! - **Persistence**: the authoritative symbol store ([`SqliteSymbolStore`])
//! - **Journal**: the append-only log of applied taxonomy changes
//!   ([`FileApplyJournal`], [`MemoryApplyJournal`])

// Allow significant_drop_tightening - dropping database connections slightly early
// provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

pub mod journal;
pub mod persistence;
pub mod sqlite;
pub mod traits;

pub use journal::{FileApplyJournal, MemoryApplyJournal};
pub use persistence::SqliteSymbolStore;
pub use traits::{ApplyJournal, SymbolStore};
