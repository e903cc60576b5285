//! Similarity-based taxonomy suggestions.
//!
//! The suggester compares an entry's tokens with every classified entry in
//! the store (up to a row limit) and turns the similarity of each qualifying
//! neighbor into a vote for its category and its (category, subcategory)
//! pair.
//!
//! # Algorithm
//!
//! 1. Tokenize `"{symbol} {body}"` for the input and for each neighbor.
//! 2. Drop neighbors with similarity below `min_similarity` (a neighbor at
//!    exactly `min_similarity` is kept).
//! 3. Add the similarity of each kept neighbor to its category score, and to
//!    its pair score when both category and subcategory are set.
//! 4. Rank each group, keep the top entries, and divide each score by the
//!    sum of its group.
//!
//! Neighbors are scanned in insertion order and every ranking is a stable
//! sort, so ties resolve to the entry encountered first.

use crate::models::{
    CategorySuggestion, Neighbor, PairSuggestion, TaxonomySuggestions, TextEntry,
};
use crate::similarity::{DEFAULT_MAX_TOKENS, TokenSet, jaccard, tokenize};
use crate::storage::SymbolStore;
use crate::Result;
use std::collections::HashMap;
use tracing::instrument;

/// Number of category suggestions returned.
pub const TOP_CATEGORIES: usize = 3;
/// Number of pair suggestions returned.
pub const TOP_PAIRS: usize = 3;
/// Number of neighbors returned.
pub const TOP_NEIGHBORS: usize = 5;

/// Configuration for [`TaxonomySuggester`].
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionConfig {
    /// Maximum number of classified entries to scan.
    pub limit_rows: usize,
    /// Minimum similarity for a neighbor to vote (inclusive).
    pub min_similarity: f64,
    /// Token cap applied to the input and to each neighbor.
    pub max_tokens: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            limit_rows: 2000,
            min_similarity: 0.10,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Deterministic, similarity-weighted taxonomy suggester.
#[derive(Debug, Clone, Default)]
pub struct TaxonomySuggester {
    config: SuggestionConfig,
}

/// Scores accumulated in first-encounter order.
struct Tally<K> {
    order: Vec<(K, f64)>,
    index: HashMap<K, usize>,
}

impl<K: Clone + Eq + std::hash::Hash> Tally<K> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn add(&mut self, key: K, score: f64) {
        if let Some(&i) = self.index.get(&key) {
            self.order[i].1 += score;
        } else {
            self.index.insert(key.clone(), self.order.len());
            self.order.push((key, score));
        }
    }

    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the top `n` keys with scores divided by the group total.
    fn top_normalized(mut self, n: usize) -> Vec<(K, f64)> {
        let total: f64 = self.order.iter().map(|(_, score)| score).sum();
        let total = if total > 0.0 { total } else { 1.0 };
        self.order.sort_by(|a, b| b.1.total_cmp(&a.1));
        self.order
            .into_iter()
            .take(n)
            .map(|(key, score)| (key, round4(score / total)))
            .collect()
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl TaxonomySuggester {
    /// Creates a suggester with the given configuration.
    #[must_use]
    pub const fn new(config: SuggestionConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    /// Scans the store and ranks suggestions for `(symbol, body)`.
    ///
    /// Returns `Ok(None)` when the input has no tokens or no neighbor
    /// qualifies.
    ///
    /// # Errors
    ///
    /// Returns an error if the store scan fails.
    #[instrument(skip(self, store, body), fields(operation = "suggest"))]
    pub fn suggest(
        &self,
        store: &dyn SymbolStore,
        symbol: &str,
        body: &str,
    ) -> Result<Option<TaxonomySuggestions>> {
        let input = self.token_set(symbol, body);
        if input.is_empty() {
            return Ok(None);
        }

        let candidates = store.scan_classified(self.config.limit_rows)?;
        let suggestions = self.rank(&input, &candidates);

        let outcome = if suggestions.is_some() { "present" } else { "absent" };
        metrics::counter!("suggestions_total", "outcome" => outcome).increment(1);
        tracing::debug!(
            scanned = candidates.len(),
            outcome,
            "Computed taxonomy suggestions"
        );

        Ok(suggestions)
    }

    /// Ranks suggestions for `(symbol, body)` against the given candidates.
    ///
    /// Candidates without category and subcategory are ignored.
    #[must_use]
    pub fn suggest_from(
        &self,
        symbol: &str,
        body: &str,
        candidates: &[TextEntry],
    ) -> Option<TaxonomySuggestions> {
        let input = self.token_set(symbol, body);
        if input.is_empty() {
            return None;
        }
        self.rank(&input, candidates)
    }

    fn token_set(&self, symbol: &str, body: &str) -> TokenSet {
        TokenSet::from_tokens(tokenize(&format!("{symbol} {body}"), self.config.max_tokens))
    }

    fn rank(&self, input: &TokenSet, candidates: &[TextEntry]) -> Option<TaxonomySuggestions> {
        let mut categories: Tally<String> = Tally::new();
        let mut pairs: Tally<(String, String)> = Tally::new();
        let mut neighbors: Vec<Neighbor> = Vec::new();

        for entry in candidates {
            let category = present(entry.category.as_deref());
            let subcategory = present(entry.subcategory.as_deref());
            if category.is_none() && subcategory.is_none() {
                continue;
            }

            let similarity = jaccard(input, &self.token_set(entry.symbol.as_str(), &entry.body));
            if similarity < self.config.min_similarity {
                continue;
            }

            neighbors.push(Neighbor {
                symbol: entry.symbol.to_string(),
                similarity,
            });
            if let Some(category) = category {
                categories.add(category.to_string(), similarity);
                if let Some(subcategory) = subcategory {
                    pairs.add((category.to_string(), subcategory.to_string()), similarity);
                }
            }
        }

        if categories.is_empty() && pairs.is_empty() {
            return None;
        }

        neighbors.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        neighbors.truncate(TOP_NEIGHBORS);
        for neighbor in &mut neighbors {
            neighbor.similarity = round4(neighbor.similarity);
        }

        Some(TaxonomySuggestions {
            categories: categories
                .top_normalized(TOP_CATEGORIES)
                .into_iter()
                .map(|(category, score)| CategorySuggestion { category, score })
                .collect(),
            pairs: pairs
                .top_normalized(TOP_PAIRS)
                .into_iter()
                .map(|((category, subcategory), score)| PairSuggestion {
                    category,
                    subcategory,
                    score,
                })
                .collect(),
            neighbors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SaveRequest, Symbol};
    use crate::storage::SqliteSymbolStore;

    fn entry(symbol: &str, body: &str, category: Option<&str>, subcategory: Option<&str>) -> TextEntry {
        TextEntry {
            symbol: Symbol::new(symbol),
            body: body.to_string(),
            category: category.map(str::to_string),
            subcategory: subcategory.map(str::to_string),
            content_hash: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_no_candidates_is_absent() {
        let suggester = TaxonomySuggester::default();
        assert!(suggester.suggest_from("TST.ONE", "anything", &[]).is_none());
    }

    #[test]
    fn test_empty_input_tokens_is_absent() {
        let suggester = TaxonomySuggester::default();
        let candidates = [entry("A", "x", Some("ai"), None)];
        assert!(suggester.suggest_from("", "!!! ???", &candidates).is_none());
    }

    #[test]
    fn test_full_overlap_scores_one() {
        let suggester = TaxonomySuggester::default();
        let candidates = [entry(
            "X",
            "hybrid intelligence",
            Some("ai"),
            Some("architecture.hybrid"),
        )];

        let result = suggester
            .suggest_from("X", "hybrid intelligence", &candidates)
            .unwrap();
        assert_eq!(result.categories[0].category, "ai");
        assert!((result.categories[0].score - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.pairs[0].subcategory, "architecture.hybrid");
        assert!((result.pairs[0].score - 1.0).abs() < f64::EPSILON);
        assert!((result.neighbors[0].similarity - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_min_similarity_is_inclusive() {
        let suggester = TaxonomySuggester::default();
        // Input tokens: a b c d e f g h i j (10). Neighbor: a only.
        // Similarity = 1 / 10 = 0.10 exactly.
        let kept = [entry("a", "", Some("kept"), None)];
        let result = suggester
            .suggest_from("b", "c d e f g h i j a", &kept)
            .unwrap();
        assert_eq!(result.categories[0].category, "kept");

        // Input tokens: 11 distinct, neighbor shares one: 1 / 11 < 0.10.
        let dropped = [entry("a", "", Some("dropped"), None)];
        assert!(suggester
            .suggest_from("b", "c d e f g h i j k a", &dropped)
            .is_none());
    }

    #[test]
    fn test_pairs_are_keyed_by_parent_category() {
        let suggester = TaxonomySuggester::default();
        let candidates = [
            entry("N1", "shared words here", Some("a"), Some("common")),
            entry("N2", "shared words here", Some("b"), Some("common")),
        ];

        let result = suggester
            .suggest_from("NEW", "shared words here", &candidates)
            .unwrap();
        assert_eq!(result.pairs.len(), 2);
        assert_eq!(result.pairs[0].category, "a");
        assert_eq!(result.pairs[1].category, "b");
        assert!((result.pairs[0].score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_subcategory_without_category_votes_nowhere() {
        let suggester = TaxonomySuggester::default();
        let candidates = [entry("N1", "orphan subcategory text", None, Some("loose.sub"))];

        // The neighbor qualifies but contributes to neither group.
        assert!(suggester
            .suggest_from("NEW", "orphan subcategory text", &candidates)
            .is_none());
    }

    #[test]
    fn test_normalization_and_truncation() {
        let suggester = TaxonomySuggester::default();
        let candidates = [
            entry("N1", "alpha beta", Some("c1"), None),
            entry("N2", "alpha beta", Some("c2"), None),
            entry("N3", "alpha beta", Some("c3"), None),
            entry("N4", "alpha beta", Some("c4"), None),
            entry("N5", "alpha beta", Some("c1"), None),
            entry("N6", "alpha beta", Some("c2"), None),
        ];

        let result = suggester.suggest_from("Q", "alpha beta", &candidates).unwrap();
        let names: Vec<&str> = result
            .categories
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(names, vec!["c1", "c2", "c3"]);
        // Every neighbor has similarity 1/2; c1 holds 2 of 6 equal votes.
        assert!((result.categories[0].score - 0.3333).abs() < 1e-9);
        assert!((result.categories[2].score - 0.1667).abs() < 1e-9);
        assert!(result.pairs.is_empty());

        let neighbors: Vec<&str> = result.neighbors.iter().map(|n| n.symbol.as_str()).collect();
        assert_eq!(neighbors, vec!["N1", "N2", "N3", "N4", "N5"]);
    }

    #[test]
    fn test_suggest_from_store_end_to_end() {
        let store = SqliteSymbolStore::in_memory().unwrap();
        store
            .save(
                &SaveRequest::new("TST.NEIGHBOR", "hybrid intelligence symbolic memory")
                    .with_category("ai")
                    .with_subcategory("architecture.hybrid"),
            )
            .unwrap();
        store
            .save(&SaveRequest::new("TST.TWO", "hybrid intelligence and symbolic memory"))
            .unwrap();

        let result = TaxonomySuggester::default()
            .suggest(&store, "TST.TWO", "hybrid intelligence and symbolic memory")
            .unwrap()
            .unwrap();
        assert_eq!(result.categories[0].category, "ai");
        assert!((result.categories[0].score - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.pairs[0].category, "ai");
        assert_eq!(result.pairs[0].subcategory, "architecture.hybrid");
        assert_eq!(result.neighbors[0].symbol, "TST.NEIGHBOR");
    }

    #[test]
    fn test_row_limit_bounds_scan() {
        let store = SqliteSymbolStore::in_memory().unwrap();
        store
            .save(&SaveRequest::new("FIRST", "unrelated").with_category("other"))
            .unwrap();
        store
            .save(&SaveRequest::new("SECOND", "target words").with_category("match"))
            .unwrap();

        let suggester = TaxonomySuggester::new(SuggestionConfig {
            limit_rows: 1,
            ..SuggestionConfig::default()
        });
        assert!(suggester
            .suggest(&store, "NEW", "target words")
            .unwrap()
            .is_none());
    }
}
