//! Content hashing for stored bodies.
//!
//! Bodies are hashed byte-for-byte; no normalization is applied, so two
//! bodies that differ only in whitespace or case hash differently.

use sha2::{Digest, Sha256};

/// SHA-256 content hasher.
///
/// # Example
///
/// ```rust
/// use symmem::services::ContentHasher;
///
/// let hash = ContentHasher::hash("hybrid intelligence");
/// assert_eq!(hash.len(), 64);
/// assert_ne!(hash, ContentHasher::hash("Hybrid intelligence"));
/// ```
pub struct ContentHasher;

impl ContentHasher {
    /// Computes the lowercase hex SHA-256 of the UTF-8 bytes of `content`.
    #[must_use]
    pub fn hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Returns true if `hash` is the digest of `content`.
    #[must_use]
    pub fn matches(content: &str, hash: &str) -> bool {
        Self::hash(content) == hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_known_vector() {
        assert_eq!(
            ContentHasher::hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_is_exact_bytes() {
        assert_ne!(ContentHasher::hash("memory"), ContentHasher::hash("memory "));
        assert_ne!(ContentHasher::hash("memory"), ContentHasher::hash("Memory"));
    }

    #[test]
    fn test_hash_is_lowercase_hex() {
        let hash = ContentHasher::hash("symbolic memory");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_matches() {
        let hash = ContentHasher::hash("body");
        assert!(ContentHasher::matches("body", &hash));
        assert!(!ContentHasher::matches("other", &hash));
    }
}
