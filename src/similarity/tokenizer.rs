//! Tokenizer for similarity scoring.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Default cap on distinct tokens taken from one text.
pub const DEFAULT_MAX_TOKENS: usize = 80;

#[allow(clippy::expect_used)]
static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z0-9_]+").expect("static token regex must compile"));

/// Splits text into lowercase `[a-z0-9_]+` tokens.
///
/// Tokens are deduplicated keeping first-occurrence order, and scanning
/// stops once `max_tokens` distinct tokens have been collected.
///
/// # Examples
///
/// ```rust
/// use symmem::similarity::tokenize;
///
/// let tokens = tokenize("Hybrid intelligence, HYBRID memory!", 80);
/// assert_eq!(tokens, vec!["hybrid", "intelligence", "memory"]);
/// ```
#[must_use]
pub fn tokenize(text: &str, max_tokens: usize) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    if max_tokens == 0 {
        return out;
    }

    for token in TOKEN_RE.find_iter(&lowered).map(|m| m.as_str()) {
        if !seen.insert(token) {
            continue;
        }
        out.push(token.to_string());
        if out.len() >= max_tokens {
            break;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("", &[] ; "empty text")]
    #[test_case("!!! ---", &[] ; "punctuation only")]
    #[test_case("TST.ONE hello", &["tst", "one", "hello"] ; "dots split tokens")]
    #[test_case("snake_case stays", &["snake_case", "stays"] ; "underscore is a token char")]
    #[test_case("a b a c b", &["a", "b", "c"] ; "dedup keeps first occurrence")]
    #[test_case("HGI = AI:n ja ihmisen", &["hgi", "ai", "n", "ja", "ihmisen"] ; "mixed case")]
    #[test_case("symbioosi äly", &["symbioosi", "ly"] ; "non ascii letters split tokens")]
    fn test_tokenize(text: &str, expected: &[&str]) {
        assert_eq!(tokenize(text, DEFAULT_MAX_TOKENS), expected);
    }

    #[test]
    fn test_truncates_to_first_distinct_tokens() {
        let text = "one two one three four";
        assert_eq!(tokenize(text, 3), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_zero_cap_yields_nothing() {
        assert!(tokenize("anything here", 0).is_empty());
    }

    #[test]
    fn test_cap_counts_distinct_tokens() {
        let text = (0..200).map(|i| format!("t{i} t{i}")).collect::<Vec<_>>().join(" ");
        let tokens = tokenize(&text, DEFAULT_MAX_TOKENS);
        assert_eq!(tokens.len(), DEFAULT_MAX_TOKENS);
        assert_eq!(tokens.last().map(String::as_str), Some("t79"));
    }
}
