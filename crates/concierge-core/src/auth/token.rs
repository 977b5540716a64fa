//! Bearer tokens handed out at login.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::time::{Duration, SystemTime};

use crate::error::{Error, Result};

const TOKEN_LEN: usize = 32;

/// Login session token bound to one account
#[derive(Debug, Clone)]
pub struct SessionToken {
    /// Random 256-bit token
    pub token: [u8; TOKEN_LEN],
    /// Owning username
    pub username: String,
    /// Token ID for logging/revocation
    pub token_id: uuid::Uuid,
    pub created_at: SystemTime,
    pub expires_at: Option<SystemTime>,
}

impl SessionToken {
    /// Generate a new token for a user
    pub fn generate(username: impl Into<String>, ttl: Option<Duration>) -> Self {
        let mut token = [0u8; TOKEN_LEN];
        for byte in &mut token {
            *byte = rand::random();
        }

        let created_at = SystemTime::now();
        Self {
            token,
            username: username.into(),
            token_id: uuid::Uuid::new_v4(),
            created_at,
            expires_at: ttl.map(|ttl| created_at + ttl),
        }
    }

    /// Base64 form sent to clients
    pub fn encode(&self) -> String {
        STANDARD.encode(self.token)
    }

    /// Parse the base64 form back into raw bytes
    pub fn decode(encoded: &str) -> Result<[u8; TOKEN_LEN]> {
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::Other(format!("Invalid token encoding: {}", e)))?;

        decoded
            .try_into()
            .map_err(|_| Error::Other("Invalid token length".to_string()))
    }

    /// Verify a token matches
    pub fn verify(&self, candidate: &[u8]) -> bool {
        candidate == self.token
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => SystemTime::now() > expires_at,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let token = SessionToken::generate("alice", None);
        let bytes = SessionToken::decode(&token.encode()).unwrap();
        assert!(token.verify(&bytes));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = SessionToken::generate("alice", None);
        let b = SessionToken::generate("alice", None);
        assert_ne!(a.token, b.token);
        assert_ne!(a.token_id, b.token_id);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(SessionToken::decode("not base64!").is_err());
        assert!(SessionToken::decode(&STANDARD.encode([1u8; 8])).is_err());
    }

    #[test]
    fn test_expired_token() {
        let mut token = SessionToken::generate("alice", Some(Duration::from_secs(60)));
        assert!(!token.is_expired());
        token.expires_at = Some(SystemTime::now() - Duration::from_secs(1));
        assert!(token.is_expired());
    }
}
