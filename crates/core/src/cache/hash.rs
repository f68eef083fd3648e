//! Cache key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a `(query, model)` pair.
///
/// SHA-256 over `query:model`, hex encoded.
pub fn cache_key(query: &str, model: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    hasher.update(b":");
    hasher.update(model.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = cache_key("rust async traits", "gemini-2.5-flash");
        let hash2 = cache_key("rust async traits", "gemini-2.5-flash");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_model() {
        let flash = cache_key("rust async traits", "gemini-2.5-flash");
        let pro = cache_key("rust async traits", "gemini-2.5-pro");
        assert_ne!(flash, pro);
    }

    #[test]
    fn test_hash_different_query() {
        let hash1 = cache_key("rust", "gemini-2.5-flash");
        let hash2 = cache_key("Rust", "gemini-2.5-flash");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_hash_format() {
        let hash = cache_key("rust", "gemini-2.5-flash");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
