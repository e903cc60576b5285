//! Data models for symmem.
//!
//! This module contains the core data structures shared by the store, the
//! suggester, the apply workflow and the gateway.

mod apply;
mod entry;
mod save;
mod suggestion;

pub use apply::{ApplyOutcome, ApplyRecord, Decision, Selection};
pub use entry::{Symbol, TextEntry};
pub use save::{
    MAX_ALIAS_LEN, MAX_CATEGORY_LEN, MAX_SUBCATEGORY_LEN, MAX_SYMBOL_LEN, SaveOutcome,
    SaveRequest, SaveResponse, SaveStatus, Taxonomy,
};
pub use suggestion::{CategorySuggestion, Neighbor, PairSuggestion, TaxonomySuggestions};
