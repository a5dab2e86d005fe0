//! Error types for the stamping engine.

use thiserror::Error;

/// Errors that can occur while stamping a document.
#[derive(Debug, Error)]
pub enum StampError {
    /// The source bytes could not be parsed as a PDF.
    #[error("failed to parse source document: {0}")]
    Parse(String),

    /// The document parsed but its page tree is unusable.
    #[error("malformed document structure: {0}")]
    Structure(String),

    /// The stamped document could not be serialized.
    #[error("failed to encode stamped document: {0}")]
    Encode(String),
}

/// Result type for stamping operations.
pub type Result<T> = std::result::Result<T, StampError>;
