//! Error types for the caching core
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the object cache, resource cache and offline queue.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key rejected before it reached the store
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Durable store rejected a read or write
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Filesystem failure underneath a durable store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failed before a response was received
    #[error("Network error: {0}")]
    Network(String),

    /// Cache-only lookup found nothing
    #[error("Not cached: {0}")]
    NotCached(String),

    /// Malformed request descriptor
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CacheError {
    /// True when the failure came from the network rather than local state.
    pub fn is_network(&self) -> bool {
        matches!(self, CacheError::Network(_))
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        CacheError::Network(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching core.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CacheError::NotCached("https://app.test/a".to_string());
        assert_eq!(err.to_string(), "Not cached: https://app.test/a");

        let err = CacheError::Persistence("quota exceeded".to_string());
        assert_eq!(err.to_string(), "Persistence error: quota exceeded");
    }

    #[test]
    fn test_serialization_error_conversion() {
        let parse = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: CacheError = parse.into();
        assert!(matches!(err, CacheError::Serialization(_)));
        assert!(!err.is_network());
    }

    #[test]
    fn test_is_network() {
        assert!(CacheError::Network("offline".to_string()).is_network());
        assert!(!CacheError::InvalidKey("".to_string()).is_network());
    }
}
