//! The Materializer: from a capability token to a stamped artifact.
//!
//! Each request moves through
//! `verify token → identify artifact → check source → cache hit | (lock →
//! re-check → stamp → write) → serve`.
//!
//! # Concurrency
//!
//! At most one stamping operation runs per cache path. Callers racing on
//! a cold key serialize on a [`KeyedLocks`] entry; the first stamps and
//! writes atomically, the rest find the finished file when they get the
//! lock. Distinct keys never contend.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use gumstamp_core::{unix_now, ArtifactId, CacheKey, TokenCodec};
use gumstamp_stamp::Stamper;
use gumstamp_store::{write_atomic, SourceRegistry, StorageLayout};

use crate::error::{GumstampError, Result};
use crate::locks::KeyedLocks;
use crate::stamp_text::resolve_stamp;

/// Content type of every artifact.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Whether an artifact was served from cache or stamped for this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Generated,
}

/// A stamped document ready to serve.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Bytes,
    pub content_type: &'static str,
    pub filename: String,
    pub cache_key: CacheKey,
    pub outcome: CacheOutcome,
}

impl Artifact {
    fn new(id: ArtifactId, bytes: Bytes, outcome: CacheOutcome) -> Self {
        Self {
            bytes,
            content_type: PDF_CONTENT_TYPE,
            filename: id.cache_key.file_name("pdf"),
            cache_key: id.cache_key,
            outcome,
        }
    }
}

/// Serves stamped artifacts for valid tokens, stamping each cache key at
/// most once.
pub struct Materializer<R, S> {
    codec: TokenCodec,
    max_age: Duration,
    registry: Arc<R>,
    stamper: Arc<S>,
    layout: StorageLayout,
    locks: KeyedLocks<PathBuf>,
}

impl<R, S> Materializer<R, S>
where
    R: SourceRegistry,
    S: Stamper + 'static,
{
    pub fn new(
        codec: TokenCodec,
        max_age: Duration,
        registry: Arc<R>,
        stamper: Arc<S>,
        layout: StorageLayout,
    ) -> Self {
        Self {
            codec,
            max_age,
            registry,
            stamper,
            layout,
            locks: KeyedLocks::new(),
        }
    }

    /// The storage layout artifacts are written under.
    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Materialize the artifact a token grants, verifying against the
    /// current time.
    pub async fn materialize(&self, token: &str) -> Result<Artifact> {
        self.materialize_at(token, unix_now()).await
    }

    /// Materialize with an explicit verification time (Unix seconds).
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn materialize_at(&self, token: &str, now: u64) -> Result<Artifact> {
        let result = self.run(token, now).await;
        if let Err(e) = &result {
            if e.is_expected() {
                tracing::debug!(error = %e, "request rejected");
            } else {
                tracing::error!(error = %e, "materialization failed");
            }
        }
        result
    }

    async fn run(&self, token: &str, now: u64) -> Result<Artifact> {
        let payload = self.codec.open_at(token, self.max_age, now).map_err(|e| {
            tracing::debug!(reason = e.reason(), detail = %e, "token rejected");
            GumstampError::Unauthorized
        })?;
        let claims = payload.claims;
        let id = ArtifactId::for_claims(&claims)?;

        if !self.registry.contains(&id.document_id).await? {
            return Err(GumstampError::NotFound(id.document_id));
        }

        let path = self.layout.artifact_path(&id);
        if let Some(bytes) = read_existing(&path).await? {
            tracing::debug!(artifact = %id, "cache hit");
            return Ok(Artifact::new(id, bytes, CacheOutcome::Hit));
        }

        let _guard = self.locks.lock(&path).await;

        // Another caller may have finished while we waited.
        if let Some(bytes) = read_existing(&path).await? {
            tracing::debug!(artifact = %id, "cache hit after wait");
            return Ok(Artifact::new(id, bytes, CacheOutcome::Hit));
        }

        let record = self
            .registry
            .resolve(&id.document_id)
            .await?
            .ok_or_else(|| GumstampError::NotFound(id.document_id.clone()))?;
        let params = resolve_stamp(record.template.as_ref(), &claims.buyer_email, payload.issued_at);

        let stamper = Arc::clone(&self.stamper);
        let source = record.source;
        let stamped = tokio::task::spawn_blocking(move || stamper.stamp(&source, &params))
            .await
            .map_err(|e| GumstampError::TransformFailure(format!("stamping task aborted: {}", e)))??;

        let bytes = Bytes::from(stamped);
        write_atomic(&path, bytes.clone()).await?;

        tracing::info!(artifact = %id, size = bytes.len(), "generated artifact");
        Ok(Artifact::new(id, bytes, CacheOutcome::Generated))
    }
}

async fn read_existing(path: &Path) -> Result<Option<Bytes>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(Bytes::from(bytes))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
