//! Error types for Gumstamp Core.

use thiserror::Error;

/// Core errors raised while building keys and payloads.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("secret key must not be empty")]
    EmptySecret,

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Reasons a capability token is rejected.
///
/// The variants exist for logging. Callers that only need an
/// authorize/deny answer should treat every variant the same way.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature does not match")]
    BadSignature,

    #[error("token expired: age {age_secs}s exceeds {max_age_secs}s")]
    Expired { age_secs: u64, max_age_secs: u64 },

    #[error("token issued in the future: issued_at {issued_at}, now {now}")]
    IssuedInFuture { issued_at: u64, now: u64 },

    #[error("unsupported token version: {0}")]
    UnsupportedVersion(u8),
}

impl TokenError {
    /// Short label for structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Malformed(_) => "malformed",
            TokenError::BadSignature => "bad_signature",
            TokenError::Expired { .. } => "expired",
            TokenError::IssuedInFuture { .. } => "issued_in_future",
            TokenError::UnsupportedVersion(_) => "unsupported_version",
        }
    }
}

/// Shape errors for identifiers and claim fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("document id must not be empty")]
    EmptyDocumentId,

    #[error("document id exceeds {max} characters (got {len})")]
    DocumentIdTooLong { len: usize, max: usize },

    #[error("document id contains invalid character {0:?}")]
    DocumentIdInvalidChar(char),

    #[error("buyer email must contain '@'")]
    EmailMissingAt,

    #[error("buyer email exceeds {max} characters (got {len})")]
    EmailTooLong { len: usize, max: usize },

    #[error("buyer email contains whitespace or control characters")]
    EmailInvalidChar,
}

impl From<CoreError> for TokenError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::EmptySecret => TokenError::Malformed("empty secret".into()),
            CoreError::DecodingError(msg) => TokenError::Malformed(msg),
        }
    }
}
