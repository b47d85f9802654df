// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Injected fault raised before dispatch; nothing was mutated.
    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Caller-facing classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    DuplicateKey,
    Validation,
    Transient,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::DuplicateKey(_) => ErrorKind::DuplicateKey,
            AppError::Domain(_) | AppError::Validation(_) | AppError::Serialization(_) => {
                ErrorKind::Validation
            }
            AppError::Transient(_) => ErrorKind::Transient,
            AppError::Database(_) | AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Only injected faults are safe to retry; every other kind is deterministic.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// HTTP-style status used by the request-shaped boundary.
    pub fn status(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::DuplicateKey => 409,
            ErrorKind::Validation => 400,
            ErrorKind::Transient => 503,
            ErrorKind::Internal => 500,
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
