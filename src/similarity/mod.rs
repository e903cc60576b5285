//! Lightweight text similarity.
//!
//! Text is reduced to an ordered, deduplicated sequence of lowercase
//! alphanumeric/underscore tokens, and two token sets are compared with the
//! Jaccard index. Everything here is deterministic and allocation-light so
//! the suggester can scan thousands of entries per save.

mod jaccard;
mod tokenizer;

pub use jaccard::{TokenSet, jaccard, similarity};
pub use tokenizer::{DEFAULT_MAX_TOKENS, tokenize};
