use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

/// Persisted reference to an issued refresh token.
///
/// Only the SHA-256 hash of the signed token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    /// Hex-encoded SHA-256 of the token string
    pub token_hash: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Create a record for `token` that expires `ttl_seconds` from now.
    pub fn new(user_id: i64, token: &str, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            token_hash: Self::hash_token(token),
            user_id,
            expires_at: now + Duration::seconds(ttl_seconds),
            created_at: now,
        }
    }

    /// Hash a token using SHA-256
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}
