//! In-memory implementation of the SourceRegistry trait.
//!
//! This is primarily for testing. It applies the same validation as the
//! filesystem registry but keeps everything in memory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use gumstamp_core::DocumentId;

use crate::error::Result;
use crate::traits::{check_source, DocumentRecord, SourceRegistry, StampTemplate, MAX_SOURCE_BYTES};

/// In-memory registry. Thread-safe via RwLock.
pub struct MemoryRegistry {
    records: RwLock<HashMap<DocumentId, DocumentRecord>>,
    resolves: AtomicUsize,
}

impl MemoryRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            resolves: AtomicUsize::new(0),
        }
    }

    /// How many times [`SourceRegistry::resolve`] has been called.
    pub fn resolve_count(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether no documents are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceRegistry for MemoryRegistry {
    async fn contains(&self, id: &DocumentId) -> Result<bool> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.contains_key(id))
    }

    async fn resolve(&self, id: &DocumentId) -> Result<Option<DocumentRecord>> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(id).cloned())
    }

    async fn store(
        &self,
        id: &DocumentId,
        source: Bytes,
        template: Option<StampTemplate>,
    ) -> Result<()> {
        check_source(&source, MAX_SOURCE_BYTES)?;

        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.insert(
            id.clone(),
            DocumentRecord {
                id: id.clone(),
                source,
                template,
            },
        );
        Ok(())
    }
}
