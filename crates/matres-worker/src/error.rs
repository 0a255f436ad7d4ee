//! Worker error types.

use thiserror::Error;

use matres_stock::StockError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("AI matching failed: {0}")]
    AiFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Stock provider error: {0}")]
    Stock(StockError),

    #[error("Media error: {0}")]
    Media(#[from] matres_media::MediaError),
}

impl From<StockError> for WorkerError {
    fn from(err: StockError) -> Self {
        if err.is_fatal() {
            Self::ConfigError(err.to_string())
        } else {
            Self::Stock(err)
        }
    }
}

impl WorkerError {
    pub fn ai_failed(msg: impl Into<String>) -> Self {
        Self::AiFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Configuration errors abort a run; nothing else does.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WorkerError::ConfigError(_) | WorkerError::InvalidRequest(_)
        )
    }
}
