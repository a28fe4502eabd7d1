use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::FromRow;

/// Login credential. A user has at most one token row at any time.
///
/// Only the SHA-256 of the key is stored; the raw key is handed out once.
#[derive(Debug, Clone, FromRow)]
pub struct Token {
    pub id: i64,
    pub user_id: i64,
    pub key_hash: String,
    pub created_utc: DateTime<Utc>,
}

impl Token {
    /// 40 hex characters from 20 random bytes.
    pub fn generate_key() -> String {
        let mut bytes = [0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    pub fn hash_key(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_40_hex_chars_and_unique() {
        let a = Token::generate_key();
        let b = Token::generate_key();
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn hash_is_stable_and_differs_from_key() {
        let key = "0123456789abcdef0123456789abcdef01234567";
        assert_eq!(Token::hash_key(key), Token::hash_key(key));
        assert_ne!(Token::hash_key(key), key);
        assert_eq!(Token::hash_key(key).len(), 64);
    }
}
