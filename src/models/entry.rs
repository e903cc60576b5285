//! Stored text entries and their identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary identifier of a stored text entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A stored text entry.
///
/// `content_hash` is recomputed on every write and always matches `body`.
/// `category` and `subcategory` are independent: either may be set alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEntry {
    /// Unique identifier.
    pub symbol: Symbol,
    /// The stored text.
    pub body: String,
    /// Optional category.
    pub category: Option<String>,
    /// Optional subcategory (dot-path).
    pub subcategory: Option<String>,
    /// Lowercase hex SHA-256 of `body`.
    pub content_hash: String,
    /// Creation timestamp (ISO-8601, UTC).
    pub created_at: String,
    /// Last write timestamp (ISO-8601, UTC).
    pub updated_at: String,
}

impl TextEntry {
    /// Returns true if the entry carries any taxonomy.
    #[must_use]
    pub const fn is_classified(&self) -> bool {
        self.category.is_some() || self.subcategory.is_some()
    }
}
