//! # Gumstamp Store
//!
//! The source registry: where uploaded documents and their stamp
//! templates live, plus the on-disk layout shared with the artifact cache.
//!
//! ## Overview
//!
//! The registry is abstracted behind the [`SourceRegistry`] trait, so the
//! materializer does not care where source bytes come from. The primary
//! implementation is [`FsRegistry`], with [`MemoryRegistry`] for testing.
//!
//! ## Key Types
//!
//! - [`SourceRegistry`] - The async trait for source lookup and upload
//! - [`FsRegistry`] - Filesystem-backed registry under a storage root
//! - [`MemoryRegistry`] - In-memory registry for tests
//! - [`StorageLayout`] - Paths for sources, templates and stamped artifacts
//! - [`DocumentRecord`] - Source bytes plus an optional [`StampTemplate`]
//!
//! ## Layout
//!
//! ```text
//! root/
//! ├── source/
//! │   ├── {document_id}.pdf      ← canonical source bytes
//! │   └── {document_id}.json     ← optional stamp template
//! └── stamped/
//!     └── {document_id}/
//!         └── {cache_key}.pdf    ← one stamped artifact per buyer
//! ```
//!
//! ## Design Notes
//!
//! - **Overwrite on upload**: storing an id again replaces the record
//! - **Atomic writes**: files are written to a temp file and renamed in place
//! - **Soft templates**: an unreadable template is treated as absent

pub mod atomic;
pub mod error;
pub mod fs;
pub mod layout;
pub mod memory;
pub mod traits;

pub use atomic::{write_atomic, write_atomic_blocking};
pub use error::{Result, StoreError};
pub use fs::FsRegistry;
pub use layout::StorageLayout;
pub use memory::MemoryRegistry;
pub use traits::{
    check_source, DocumentRecord, SourceRegistry, StampTemplate, MAX_SOURCE_BYTES, PDF_MAGIC,
};
