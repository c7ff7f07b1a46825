//! Error types for athena

use thiserror::Error;

/// Result type alias for athena operations
pub type AthenaResult<T> = Result<T, AthenaError>;

/// Errors raised locally by the client.
///
/// Gateway and network failures are never returned through this type: they are
/// reported inside [`crate::QueryResult`] so awaited chains can branch on
/// `result.error` instead of matching on `Err`.
#[derive(Debug, Error)]
pub enum AthenaError {
    /// Request rejected before any network call was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// Row value could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl AthenaError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }
}

impl From<serde_json::Error> for AthenaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
