//! SourceRegistry trait: the abstract interface for document sources.
//!
//! This trait lets the materializer stay storage-agnostic. Implementations
//! include the filesystem (primary) and in-memory (for tests).

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use gumstamp_core::DocumentId;

use crate::error::{Result, StoreError};

/// Largest accepted source document (10 MiB).
pub const MAX_SOURCE_BYTES: usize = 10 * 1024 * 1024;

/// Every accepted source must begin with this header.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Per-document stamping template.
///
/// Persisted as JSON next to the source. Both fields are optional and may
/// contain `{email}` and `{date}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampTemplate {
    /// Footer line drawn bottom-right on every page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_text: Option<String>,

    /// Diagonal watermark drawn across every page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagonal_text: Option<String>,
}

impl StampTemplate {
    /// Template with only a footer.
    pub fn footer(text: impl Into<String>) -> Self {
        Self {
            footer_text: Some(text.into()),
            diagonal_text: None,
        }
    }

    /// Add a diagonal watermark.
    pub fn with_diagonal(mut self, text: impl Into<String>) -> Self {
        self.diagonal_text = Some(text.into());
        self
    }
}

/// A stored document: immutable source bytes plus an optional template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub source: Bytes,
    pub template: Option<StampTemplate>,
}

/// Check size and content sniff before accepting source bytes.
pub fn check_source(source: &[u8], max_bytes: usize) -> Result<()> {
    if source.len() > max_bytes {
        return Err(StoreError::TooLarge {
            size: source.len(),
            max: max_bytes,
        });
    }
    if !source.starts_with(PDF_MAGIC) {
        return Err(StoreError::NotPdf);
    }
    Ok(())
}

/// The SourceRegistry trait: async interface for document sources.
///
/// # Design Notes
///
/// - **Typed ids**: every method takes a [`DocumentId`], so malformed
///   identifiers are rejected before any storage access.
/// - **Overwrite on store**: storing an existing id replaces source and
///   template. There is no versioning.
/// - **Soft templates**: a template that cannot be read or parsed is
///   reported as absent, never as an error.
#[async_trait]
pub trait SourceRegistry: Send + Sync {
    /// Whether a source exists for `id`. Does not read the source.
    async fn contains(&self, id: &DocumentId) -> Result<bool>;

    /// Load the source bytes and template for `id`.
    ///
    /// Returns `None` if no source exists.
    async fn resolve(&self, id: &DocumentId) -> Result<Option<DocumentRecord>>;

    /// Validate and store a document, replacing any previous record.
    async fn store(
        &self,
        id: &DocumentId,
        source: Bytes,
        template: Option<StampTemplate>,
    ) -> Result<()>;
}
