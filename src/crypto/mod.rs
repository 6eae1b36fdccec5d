//! API key and webhook secret generation.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64, Engine};

/// Prefix carried by every salond API key
pub const API_KEY_PREFIX: &str = "sk_salon_";

/// Generate a random API key
pub fn generate_api_key() -> String {
    let random_bytes: [u8; 24] = rand::random();
    format!("{}{}", API_KEY_PREFIX, BASE64.encode(random_bytes))
}

/// Generate a random webhook secret
pub fn generate_webhook_secret() -> String {
    let random_bytes: [u8; 32] = rand::random();
    hex::encode(random_bytes)
}

/// Hash an API key for storage
pub fn hash_api_key(api_key: &str) -> Result<String> {
    bcrypt::hash(api_key, 10).context("Failed to hash API key")
}

/// Verify an API key against a hash
pub fn verify_api_key(api_key: &str, hash: &str) -> bool {
    bcrypt::verify(api_key, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_generation() {
        let key = generate_api_key();
        assert!(key.starts_with(API_KEY_PREFIX));
        assert_eq!(key.len(), API_KEY_PREFIX.len() + 32);
        assert!(key[API_KEY_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(key, generate_api_key());
    }

    #[test]
    fn test_api_key_hashing() {
        let key = generate_api_key();
        let hash = hash_api_key(&key).unwrap();

        assert!(verify_api_key(&key, &hash));
        assert!(!verify_api_key("wrong_key", &hash));
        assert!(!verify_api_key(&key, "not a bcrypt hash"));
    }

    #[test]
    fn test_webhook_secret_is_hex() {
        let secret = generate_webhook_secret();
        assert_eq!(secret.len(), 64);
        assert!(hex::decode(&secret).is_ok());
    }
}
