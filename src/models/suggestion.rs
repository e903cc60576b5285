//! Taxonomy suggestion result types.
//!
//! Suggestions are transient. An absent suggestion is represented as
//! `Option::<TaxonomySuggestions>::None`; a present one always carries at
//! least one category or pair entry.

use serde::{Deserialize, Serialize};

/// A ranked category suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySuggestion {
    /// Suggested category.
    #[serde(rename = "value")]
    pub category: String,
    /// Score normalized within the category group.
    pub score: f64,
}

/// A ranked (category, subcategory) pair suggestion.
///
/// Pair scores are aggregated per (category, subcategory) key, never across
/// parent categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSuggestion {
    /// Parent category of the pair.
    #[serde(rename = "cat")]
    pub category: String,
    /// Suggested subcategory.
    #[serde(rename = "value")]
    pub subcategory: String,
    /// Score normalized within the pair group.
    pub score: f64,
}

/// A neighbor entry that contributed to the suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Neighbor symbol.
    pub symbol: String,
    /// Raw Jaccard similarity with the input.
    #[serde(rename = "sim")]
    pub similarity: f64,
}

/// Ranked taxonomy suggestions for an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxonomySuggestions {
    /// Top categories (at most 3), best first.
    #[serde(rename = "cat", default)]
    pub categories: Vec<CategorySuggestion>,
    /// Top (category, subcategory) pairs (at most 3), best first.
    #[serde(rename = "subcat", default)]
    pub pairs: Vec<PairSuggestion>,
    /// Most similar neighbors (at most 5), best first.
    #[serde(default)]
    pub neighbors: Vec<Neighbor>,
}

impl TaxonomySuggestions {
    /// Returns the best category suggestion.
    #[must_use]
    pub fn top_category(&self) -> Option<&CategorySuggestion> {
        self.categories.first()
    }

    /// Returns the best pair suggestion.
    #[must_use]
    pub fn top_pair(&self) -> Option<&PairSuggestion> {
        self.pairs.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let suggestions = TaxonomySuggestions {
            categories: vec![CategorySuggestion {
                category: "ai".to_string(),
                score: 1.0,
            }],
            pairs: vec![PairSuggestion {
                category: "ai".to_string(),
                subcategory: "architecture.hybrid".to_string(),
                score: 1.0,
            }],
            neighbors: vec![Neighbor {
                symbol: "TST.NEIGHBOR".to_string(),
                similarity: 0.625,
            }],
        };

        let value = serde_json::to_value(&suggestions).unwrap();
        assert_eq!(value["cat"][0]["value"], "ai");
        assert_eq!(value["subcat"][0]["cat"], "ai");
        assert_eq!(value["subcat"][0]["value"], "architecture.hybrid");
        assert_eq!(value["neighbors"][0]["sim"], 0.625);
        assert_eq!(
            suggestions.top_pair().map(|p| p.subcategory.as_str()),
            Some("architecture.hybrid")
        );
    }
}
