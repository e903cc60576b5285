//! Business logic services.
//!
//! Services orchestrate the symbol store and provide high-level operations:
//!
//! - [`SymbolService`]: save with taxonomy suggestions, read by symbol or alias
//! - [`TaxonomySuggester`]: similarity-weighted category/subcategory ranking
//! - [`ApplyWorkflow`]: accept, edit, reject or undo a suggested taxonomy
//! - [`DefineBlock`]: markdown DEFINE block parsing for the CLI

mod apply;
mod define_block;
mod gateway;
mod hasher;
mod suggester;
mod symbols;

pub use apply::{ACCEPT_THRESHOLD, ApplyWorkflow, PendingDecision, pick_top};
pub use define_block::{DEFAULT_PROJECT, DefineBlock};
pub use gateway::SymbolGateway;
pub use hasher::ContentHasher;
pub use suggester::{
    SuggestionConfig, TOP_CATEGORIES, TOP_NEIGHBORS, TOP_PAIRS, TaxonomySuggester,
};
pub use symbols::SymbolService;
