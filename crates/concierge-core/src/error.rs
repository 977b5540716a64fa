//! Error types for concierge-core.

use thiserror::Error;

/// Result type alias using concierge-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for concierge operations
#[derive(Error, Debug)]
pub enum Error {
    // Storage errors
    #[error("State document for '{user_id}' is corrupt: {reason}")]
    StorageCorruption { user_id: String, reason: String },

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    // Account errors
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already exists: {0}")]
    UserExists(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // Pricing errors
    #[cfg(feature = "pricing")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Pricing API error: {0}")]
    Pricing(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a storage corruption error for a user document
    pub fn corrupt(user_id: impl Into<String>, reason: impl ToString) -> Self {
        Self::StorageCorruption {
            user_id: user_id.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_error_display() {
        let err = Error::corrupt("alice", "expected value at line 1");
        assert_eq!(
            err.to_string(),
            "State document for 'alice' is corrupt: expected value at line 1"
        );
    }

    #[test]
    fn test_json_error_converts_to_serialization() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
