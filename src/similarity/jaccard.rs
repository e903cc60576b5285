//! Jaccard similarity over token sets.

use std::collections::HashSet;

/// A set of tokens prepared for repeated similarity checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    tokens: HashSet<String>,
}

impl TokenSet {
    /// Builds a set from a token sequence.
    #[must_use]
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of distinct tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the set has no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Jaccard index `|A ∩ B| / |A ∪ B|`.
///
/// Defined as `0.0` when both sets are empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn jaccard(a: &TokenSet, b: &TokenSet) -> f64 {
    let (small, large) = if a.len() <= b.len() {
        (&a.tokens, &b.tokens)
    } else {
        (&b.tokens, &a.tokens)
    };
    let intersection = small.iter().filter(|t| large.contains(*t)).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Jaccard index of two token sequences.
///
/// ```rust
/// use symmem::similarity::similarity;
///
/// let a = ["hybrid", "memory"];
/// let b = ["hybrid", "intelligence"];
/// assert!((similarity(&a, &b) - 1.0 / 3.0).abs() < f64::EPSILON);
/// ```
#[must_use]
pub fn similarity<S: AsRef<str>>(a: &[S], b: &[S]) -> f64 {
    let a = TokenSet::from_tokens(a.iter().map(AsRef::as_ref));
    let b = TokenSet::from_tokens(b.iter().map(AsRef::as_ref));
    jaccard(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(&[], &[], 0.0 ; "both empty")]
    #[test_case(&["a"], &[], 0.0 ; "one empty")]
    #[test_case(&["a", "b"], &["b", "a"], 1.0 ; "identical")]
    #[test_case(&["a", "b"], &["c", "d"], 0.0 ; "disjoint")]
    #[test_case(&["a", "b", "c"], &["b", "c", "d"], 0.5 ; "half overlap")]
    fn test_similarity(a: &[&str], b: &[&str], expected: f64) {
        assert!((similarity(a, b) - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn test_duplicates_collapse() {
        let a = ["x", "x", "y"];
        let b = ["x", "y"];
        assert!((similarity(&a, &b) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_symmetric() {
        let a = TokenSet::from_tokens(["a", "b", "c", "d"]);
        let b = TokenSet::from_tokens(["c", "d", "e"]);
        assert!((jaccard(&a, &b) - jaccard(&b, &a)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_one_in_ten_is_exactly_threshold() {
        let a = TokenSet::from_tokens(["s", "a1", "a2", "a3", "a4"]);
        let b = TokenSet::from_tokens(["s", "b1", "b2", "b3", "b4", "b5"]);
        assert_eq!(jaccard(&a, &b), 0.10);
    }
}
