//! Stock provider error types.

use thiserror::Error;

/// Result type for stock provider operations.
pub type StockResult<T> = Result<T, StockError>;

/// Errors that can occur while searching a stock footage provider.
#[derive(Debug, Error)]
pub enum StockError {
    #[error("{0} is not set. Set it in the environment or the .env file.")]
    MissingCredential(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StockError {
    pub fn missing_credential(var: impl Into<String>) -> Self {
        Self::MissingCredential(var.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => Self::Unauthorized(body),
            429 => Self::RateLimited(body),
            500..=599 => Self::ServerError(status, body),
            _ => Self::RequestFailed(format!("HTTP {}: {}", status, body)),
        }
    }

    /// Configuration errors abort a resolution run; everything else only
    /// empties the result for one search.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StockError::MissingCredential(_) | StockError::InvalidConfig(_)
        )
    }

    /// Transient failures a later run may not hit again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StockError::Network(_) | StockError::RateLimited(_) | StockError::ServerError(..)
        )
    }

    /// HTTP status associated with the error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            StockError::Unauthorized(_) => Some(401),
            StockError::RateLimited(_) => Some(429),
            StockError::ServerError(status, _) => Some(*status),
            _ => None,
        }
    }
}
