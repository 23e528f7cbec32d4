// Session token generation and one-way hashing

use rand::Rng;
use sha2::{Digest, Sha256};

/// Number of random bytes in a generated session token.
const TOKEN_BYTES: usize = 32;

/// Generate a fresh random session token, hex-encoded.
pub fn generate_token() -> String {
    let bytes: Vec<u8> = rand::thread_rng()
        .sample_iter(rand::distributions::Standard)
        .take(TOKEN_BYTES)
        .collect();

    hex::encode(bytes)
}

/// One-way hash of a session token for storage. Only the digest is ever
/// persisted; lookups hash the presented token and compare.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique() {
        let a = generate_token();
        let b = generate_token();

        assert_ne!(a, b);
        assert_eq!(a.len(), TOKEN_BYTES * 2);
    }

    #[test]
    fn test_hash_is_deterministic_and_one_way() {
        let token = generate_token();
        let hash = hash_token(&token);

        assert_eq!(hash, hash_token(&token));
        assert_ne!(hash, token);
        assert_eq!(hash.len(), 64); // SHA-256 hex digest
    }
}
