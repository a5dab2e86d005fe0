//! Shape checks for document identifiers and claim fields.

use crate::claims::Claims;
use crate::error::ValidationError;

/// Maximum length of a document identifier.
pub const MAX_DOCUMENT_ID_LEN: usize = 120;

/// Maximum length of a buyer email address.
pub const MAX_EMAIL_LEN: usize = 254;

/// Check a document identifier against the safe charset `[A-Za-z0-9_-]`.
///
/// Identifiers become file names under the storage root, so anything
/// that could name a parent directory or carry a separator is refused.
pub fn validate_document_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::EmptyDocumentId);
    }

    let len = id.chars().count();
    if len > MAX_DOCUMENT_ID_LEN {
        return Err(ValidationError::DocumentIdTooLong {
            len,
            max: MAX_DOCUMENT_ID_LEN,
        });
    }

    if let Some(c) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(ValidationError::DocumentIdInvalidChar(c));
    }

    Ok(())
}

/// Basic shape check for a buyer email.
///
/// This is not RFC 5322 validation; the address only has to be
/// plausible enough to print in a footer.
pub fn validate_buyer_email(email: &str) -> Result<(), ValidationError> {
    let len = email.chars().count();
    if len > MAX_EMAIL_LEN {
        return Err(ValidationError::EmailTooLong {
            len,
            max: MAX_EMAIL_LEN,
        });
    }

    if !email.contains('@') {
        return Err(ValidationError::EmailMissingAt);
    }

    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::EmailInvalidChar);
    }

    Ok(())
}

/// Validate every field of a claim set.
pub fn validate_claims(claims: &Claims) -> Result<(), ValidationError> {
    validate_document_id(&claims.document_id)?;
    validate_buyer_email(&claims.buyer_email)?;
    Ok(())
}
