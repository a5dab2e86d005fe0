//! Error types for the Gumstamp facade.

use gumstamp_core::{DocumentId, TokenError, ValidationError};
use gumstamp_stamp::StampError;
use gumstamp_store::StoreError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::entitlement::EntitlementError;

/// Errors surfaced to callers of the facade and the materializer.
#[derive(Debug, Error)]
pub enum GumstampError {
    /// The token is malformed, tampered with, expired or from the future.
    ///
    /// The specific reason is logged, never returned.
    #[error("invalid or expired token")]
    Unauthorized,

    /// No source document is stored under this id.
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// Caller-supplied data failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The stamping engine could not process the source.
    #[error("transform failed: {0}")]
    TransformFailure(String),

    /// Reading or writing storage failed.
    #[error("storage failure: {0}")]
    StorageFailure(#[source] StoreError),

    /// The operation is gated and no license key was supplied.
    #[error("license required")]
    LicenseRequired,

    /// The entitlement check rejected the license key.
    #[error("invalid license")]
    LicenseDenied,

    /// The entitlement check could not complete.
    #[error("{0}")]
    EntitlementUnavailable(#[from] EntitlementError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl GumstampError {
    /// Whether this error is an ordinary outcome of bad or unauthorized
    /// requests, as opposed to a fault worth alerting on.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            GumstampError::Unauthorized
                | GumstampError::NotFound(_)
                | GumstampError::InvalidInput(_)
                | GumstampError::LicenseRequired
                | GumstampError::LicenseDenied
        )
    }
}

impl From<TokenError> for GumstampError {
    fn from(_: TokenError) -> Self {
        GumstampError::Unauthorized
    }
}

impl From<ValidationError> for GumstampError {
    fn from(e: ValidationError) -> Self {
        GumstampError::InvalidInput(e.to_string())
    }
}

impl From<StampError> for GumstampError {
    fn from(e: StampError) -> Self {
        GumstampError::TransformFailure(e.to_string())
    }
}

impl From<StoreError> for GumstampError {
    fn from(e: StoreError) -> Self {
        if e.is_invalid_input() {
            GumstampError::InvalidInput(e.to_string())
        } else {
            GumstampError::StorageFailure(e)
        }
    }
}

impl From<std::io::Error> for GumstampError {
    fn from(e: std::io::Error) -> Self {
        GumstampError::StorageFailure(StoreError::Io(e))
    }
}

/// Result type for Gumstamp operations.
pub type Result<T> = std::result::Result<T, GumstampError>;
