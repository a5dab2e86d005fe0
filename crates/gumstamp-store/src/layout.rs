//! On-disk layout under the storage root.
//!
//! Every path the registry and the artifact cache touch is built here, from
//! validated identifiers only.

use std::path::{Path, PathBuf};

use gumstamp_core::{ArtifactId, DocumentId};

use crate::error::Result;

const SOURCE_DIR: &str = "source";
const STAMPED_DIR: &str = "stamped";
const PDF_EXT: &str = "pdf";
const TEMPLATE_EXT: &str = "json";

/// Paths for sources, templates and stamped artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    /// Layout rooted at `root`. Nothing is created until [`ensure`](Self::ensure).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding uploaded sources and templates.
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(SOURCE_DIR)
    }

    /// Directory holding all stamped artifacts.
    pub fn stamped_dir(&self) -> PathBuf {
        self.root.join(STAMPED_DIR)
    }

    /// `source/{document_id}.pdf`
    pub fn source_path(&self, id: &DocumentId) -> PathBuf {
        self.source_dir().join(format!("{}.{}", id, PDF_EXT))
    }

    /// `source/{document_id}.json`
    pub fn template_path(&self, id: &DocumentId) -> PathBuf {
        self.source_dir().join(format!("{}.{}", id, TEMPLATE_EXT))
    }

    /// `stamped/{document_id}/`
    pub fn artifact_dir(&self, id: &DocumentId) -> PathBuf {
        self.stamped_dir().join(id.as_str())
    }

    /// `stamped/{document_id}/{cache_key}.pdf`
    pub fn artifact_path(&self, artifact: &ArtifactId) -> PathBuf {
        self.artifact_dir(&artifact.document_id)
            .join(artifact.cache_key.file_name(PDF_EXT))
    }

    /// Create the `source/` and `stamped/` directories if missing.
    pub async fn ensure(&self) -> Result<()> {
        tokio::fs::create_dir_all(self.source_dir()).await?;
        tokio::fs::create_dir_all(self.stamped_dir()).await?;
        tracing::debug!(root = %self.root.display(), "storage layout ready");
        Ok(())
    }
}
