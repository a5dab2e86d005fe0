//! Claims: what a capability token authorizes.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::types::DocumentId;
use crate::validation::validate_claims;

/// The logical content of a capability token.
///
/// One buyer, one document. The optional `sale_id` groups every token
/// issued for the same purchase onto a single artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claims {
    /// The document the holder may download.
    pub document_id: String,

    /// The buyer the copy is stamped for.
    pub buyer_email: String,

    /// The commerce platform's sale identifier. Never `Some("")`.
    #[serde(
        default,
        deserialize_with = "non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) sale_id: Option<String>,
}

fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

impl Claims {
    /// Claims without a sale identifier.
    pub fn new(document_id: impl Into<String>, buyer_email: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            buyer_email: buyer_email.into(),
            sale_id: None,
        }
    }

    /// Attach a sale identifier. Empty strings are stored as absent.
    pub fn with_sale_id(mut self, sale_id: impl Into<String>) -> Self {
        let sale_id = sale_id.into();
        self.sale_id = if sale_id.is_empty() {
            None
        } else {
            Some(sale_id)
        };
        self
    }

    /// The sale identifier, if any.
    pub fn sale_id(&self) -> Option<&str> {
        self.sale_id.as_deref()
    }

    /// The value that identifies the buyer's artifact: the sale id when
    /// present, else the email.
    pub fn discriminator(&self) -> &str {
        self.sale_id().unwrap_or(&self.buyer_email)
    }

    /// Validate shape and return the typed document id.
    pub fn checked_document_id(&self) -> Result<DocumentId, ValidationError> {
        validate_claims(self)?;
        DocumentId::parse(self.document_id.clone())
    }
}
