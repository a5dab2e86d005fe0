//! Filesystem implementation of the SourceRegistry trait.
//!
//! Sources and templates live side by side under `source/`. Writes go
//! through [`write_atomic`](crate::atomic::write_atomic) so a crashed upload
//! never leaves a half-written PDF behind.

use std::io::ErrorKind;

use async_trait::async_trait;
use bytes::Bytes;

use gumstamp_core::DocumentId;

use crate::atomic::write_atomic;
use crate::error::{Result, StoreError};
use crate::layout::StorageLayout;
use crate::traits::{check_source, DocumentRecord, SourceRegistry, StampTemplate, MAX_SOURCE_BYTES};

/// Filesystem-backed source registry.
pub struct FsRegistry {
    layout: StorageLayout,
    max_source_bytes: usize,
}

impl FsRegistry {
    /// Registry over an existing layout.
    pub fn new(layout: StorageLayout) -> Self {
        Self {
            layout,
            max_source_bytes: MAX_SOURCE_BYTES,
        }
    }

    /// Create the storage directories under `root` and open a registry.
    pub async fn open(root: impl Into<std::path::PathBuf>) -> Result<Self> {
        let layout = StorageLayout::new(root);
        layout.ensure().await?;
        Ok(Self::new(layout))
    }

    /// Override the source size limit.
    pub fn with_max_source_bytes(mut self, max: usize) -> Self {
        self.max_source_bytes = max;
        self
    }

    /// The layout this registry reads from.
    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    async fn load_template(&self, id: &DocumentId) -> Option<StampTemplate> {
        let path = self.layout.template_path(id);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(document_id = %id, error = %e, "template unreadable, ignoring");
                return None;
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(template) => Some(template),
            Err(e) => {
                tracing::warn!(document_id = %id, error = %e, "template malformed, ignoring");
                None
            }
        }
    }
}

#[async_trait]
impl SourceRegistry for FsRegistry {
    async fn contains(&self, id: &DocumentId) -> Result<bool> {
        match tokio::fs::metadata(self.layout.source_path(id)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(document_id = %id))]
    async fn resolve(&self, id: &DocumentId) -> Result<Option<DocumentRecord>> {
        let source = match tokio::fs::read(self.layout.source_path(id)).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let template = self.load_template(id).await;

        Ok(Some(DocumentRecord {
            id: id.clone(),
            source,
            template,
        }))
    }

    #[tracing::instrument(level = "debug", skip_all, fields(document_id = %id))]
    async fn store(
        &self,
        id: &DocumentId,
        source: Bytes,
        template: Option<StampTemplate>,
    ) -> Result<()> {
        check_source(&source, self.max_source_bytes)?;

        let size = source.len();
        write_atomic(&self.layout.source_path(id), source).await?;

        let template_path = self.layout.template_path(id);
        match template {
            Some(template) => {
                let json = serde_json::to_vec(&template)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                // The source is already in place; a lost template only
                // means default stamping text.
                if let Err(e) = write_atomic(&template_path, Bytes::from(json)).await {
                    tracing::warn!(document_id = %id, error = %e, "failed to write template");
                }
            }
            None => match tokio::fs::remove_file(&template_path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }

        tracing::debug!(document_id = %id, size, "stored source");
        Ok(())
    }
}
