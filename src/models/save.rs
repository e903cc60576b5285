//! Save request and result types.

use super::{Symbol, TaxonomySuggestions};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Maximum symbol length in characters.
pub const MAX_SYMBOL_LEN: usize = 128;
/// Maximum category length in characters.
pub const MAX_CATEGORY_LEN: usize = 64;
/// Maximum subcategory length in characters.
pub const MAX_SUBCATEGORY_LEN: usize = 128;
/// Maximum alias length in characters.
pub const MAX_ALIAS_LEN: usize = 128;

/// A (category, subcategory) pair where either side may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    /// Category.
    #[serde(rename = "cat")]
    pub category: Option<String>,
    /// Subcategory.
    #[serde(rename = "subcat")]
    pub subcategory: Option<String>,
}

impl Taxonomy {
    /// Creates a taxonomy from optional parts.
    #[must_use]
    pub const fn new(category: Option<String>, subcategory: Option<String>) -> Self {
        Self {
            category,
            subcategory,
        }
    }

    /// Returns true if both sides are set.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.category.is_some() && self.subcategory.is_some()
    }
}

/// Request to save (create or fully replace) a text entry.
///
/// Serializes to the `sm.texts.save` argument shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveRequest {
    /// Target symbol.
    pub symbol: String,
    /// Entry body.
    pub text: String,
    /// Category to store (replaces the previous one, `None` clears it).
    #[serde(rename = "cat")]
    pub category: Option<String>,
    /// Subcategory to store (replaces the previous one, `None` clears it).
    #[serde(rename = "subcat")]
    pub subcategory: Option<String>,
    /// Aliases that should resolve to `symbol`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl SaveRequest {
    /// Creates a request without taxonomy or aliases.
    #[must_use]
    pub fn new(symbol: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the subcategory.
    #[must_use]
    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    /// Replaces both taxonomy fields.
    #[must_use]
    pub fn with_taxonomy(mut self, taxonomy: Taxonomy) -> Self {
        self.category = taxonomy.category;
        self.subcategory = taxonomy.subcategory;
        self
    }

    /// Adds an alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Returns the requested taxonomy.
    #[must_use]
    pub fn taxonomy(&self) -> Taxonomy {
        Taxonomy::new(self.category.clone(), self.subcategory.clone())
    }

    /// Returns true if the request leaves category or subcategory unset.
    ///
    /// A blank value counts as unset.
    #[must_use]
    pub fn needs_suggestion(&self) -> bool {
        is_unset(self.category.as_deref()) || is_unset(self.subcategory.as_deref())
    }

    /// Validates bounds and normalizes optional fields.
    ///
    /// Blank category/subcategory become `None`; aliases are trimmed and
    /// blank aliases dropped. `symbol` and `text` are stored as given, so a
    /// whitespace-only body is legal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `symbol` or `text` is empty, a
    /// symbol or alias contains `/`, or any field exceeds its length bound.
    pub fn validate(mut self) -> Result<Self> {
        if self.symbol.is_empty() {
            return Err(Error::InvalidInput("symbol must not be empty".to_string()));
        }
        check_len("symbol", &self.symbol, MAX_SYMBOL_LEN)?;
        check_addressable("symbol", &self.symbol)?;
        if self.text.is_empty() {
            return Err(Error::InvalidInput("text must not be empty".to_string()));
        }

        self.category = non_blank(self.category);
        self.subcategory = non_blank(self.subcategory);
        if let Some(category) = &self.category {
            check_len("cat", category, MAX_CATEGORY_LEN)?;
        }
        if let Some(subcategory) = &self.subcategory {
            check_len("subcat", subcategory, MAX_SUBCATEGORY_LEN)?;
        }

        let mut aliases = Vec::with_capacity(self.aliases.len());
        for alias in &self.aliases {
            let alias = alias.trim();
            if alias.is_empty() {
                continue;
            }
            check_len("alias", alias, MAX_ALIAS_LEN)?;
            check_addressable("alias", alias)?;
            aliases.push(alias.to_string());
        }
        self.aliases = aliases;

        Ok(self)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_unset(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Names become the last segment of a resource URI, so they cannot nest.
fn check_addressable(field: &str, value: &str) -> Result<()> {
    if value.contains('/') {
        return Err(Error::InvalidInput(format!(
            "{field} must not contain '/': {value}"
        )));
    }
    Ok(())
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(Error::InvalidInput(format!(
            "{field} too long: {len} characters (max {max})"
        )));
    }
    Ok(())
}

/// Whether a save created a new entry or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    /// First save of the symbol.
    Created,
    /// The symbol already existed.
    Updated,
}

impl SaveStatus {
    /// Returns the status as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

/// Result of a store-level save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    /// Created or updated.
    pub status: SaveStatus,
    /// The saved symbol.
    pub symbol: Symbol,
    /// Content hash of the new body.
    pub hash: String,
    /// Creation timestamp of the entry.
    pub ts_created: String,
    /// Timestamp of this write.
    pub ts_updated: String,
    /// Taxonomy as it was before this write (`None`/`None` for new entries).
    pub prev: Taxonomy,
}

/// Result of a gateway save: the store outcome plus optional suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    /// Store-level result.
    #[serde(flatten)]
    pub outcome: SaveOutcome,
    /// Taxonomy suggestions, present only when the request lacked taxonomy
    /// and a qualifying neighbor exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<TaxonomySuggestions>,
}
