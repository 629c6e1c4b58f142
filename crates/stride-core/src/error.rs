//! Error types for Stride.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrideError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Contention: update retries exhausted for account {0}")]
    Contention(String),

    #[error("Timeout: no commit occurred")]
    Timeout,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StrideError {
    pub fn code(&self) -> i32 {
        match self {
            StrideError::AccountNotFound(_) => -32000,
            StrideError::Contention(_) => -32001,
            StrideError::Timeout => -32002,
            StrideError::StoreUnavailable(_) => -32003,
            StrideError::Io(_) => -32004,
            StrideError::InvalidInput(_) => -32602,
            StrideError::Json(_) => -32700,
        }
    }

    /// Transient failures may be retried by the caller; permanent ones
    /// must not be.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StrideError::Contention(_)
                | StrideError::Timeout
                | StrideError::StoreUnavailable(_)
        )
    }
}
