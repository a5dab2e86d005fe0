//! Error types for the store module.

use gumstamp_core::ValidationError;
use thiserror::Error;

/// Errors that can occur during registry and cache file operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document id failed validation.
    #[error("invalid document id: {0}")]
    InvalidDocumentId(#[from] ValidationError),

    /// Source bytes exceed the size limit.
    #[error("source is {size} bytes, limit is {max}")]
    TooLarge { size: usize, max: usize },

    /// Source bytes do not start with the PDF header.
    #[error("source is not a PDF document")]
    NotPdf,

    /// Template serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A path had no parent directory to write into.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether the error was caused by the caller's input rather than
    /// by storage.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidDocumentId(_) | StoreError::TooLarge { .. } | StoreError::NotPdf
        )
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
