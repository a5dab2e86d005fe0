//! # Gumstamp
//!
//! Per-buyer provenance stamping for digital documents, delivered through
//! signed, expiring download links.
//!
//! ## Overview
//!
//! - **Capability tokens**: self-contained, tamper-evident credentials
//!   naming a document and a buyer. Verified without any session lookup.
//! - **Stamping**: every page of the source PDF gets a footer naming the
//!   buyer, and optionally a diagonal watermark.
//! - **Artifact cache**: each buyer's copy is stamped once, then served
//!   from disk. Concurrent requests for the same copy stamp it only once.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use gumstamp::{Gumstamp, GumstampConfig};
//! use gumstamp::core::Claims;
//!
//! async fn example(pdf: Bytes) -> gumstamp::Result<()> {
//!     let config = GumstampConfig::from_env()?;
//!     let service = Gumstamp::open(config).await?;
//!
//!     service.upload("ebook_2024", pdf, None, None).await?;
//!     let issued = service
//!         .issue_token(Claims::new("ebook_2024", "reader@example.com"), None)
//!         .await?;
//!
//!     let artifact = service.materialize(&issued.token).await?;
//!     println!("{} ({} bytes)", artifact.filename, artifact.bytes.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `gumstamp::core` - Tokens, claims, identifiers, cache keys
//! - `gumstamp::store` - Source registry and storage layout
//! - `gumstamp::stamp` - The PDF stamping engine

pub mod config;
pub mod entitlement;
pub mod error;
pub mod locks;
pub mod materializer;
pub mod service;
pub mod stamp_text;

// Re-export component crates
pub use gumstamp_core as core;
pub use gumstamp_stamp as stamp;
pub use gumstamp_store as store;

// Re-export main types for convenience
pub use config::{ConfigError, GumstampConfig};
pub use entitlement::{AllowAll, DenyAll, EntitlementCheck, EntitlementDecision, EntitlementError};
pub use error::{GumstampError, Result};
pub use locks::KeyedLocks;
pub use materializer::{Artifact, CacheOutcome, Materializer};
pub use service::{Gumstamp, IssuedToken, SaleNotification, UploadReceipt};
pub use stamp_text::{resolve_stamp, DEFAULT_FOOTER};

pub use gumstamp_core::{CacheKey, Claims, DocumentId, SecretKey, TokenCodec};
pub use gumstamp_stamp::{PdfStamper, StampParams, Stamper};
pub use gumstamp_store::{FsRegistry, MemoryRegistry, SourceRegistry, StampTemplate};
