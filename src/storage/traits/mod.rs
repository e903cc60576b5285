//! Storage backend traits.

mod journal;
mod symbols;

pub use journal::ApplyJournal;
pub use symbols::SymbolStore;
