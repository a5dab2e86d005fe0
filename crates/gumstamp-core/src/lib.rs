//! # Gumstamp Core
//!
//! Pure primitives for Gumstamp: capability tokens, document identifiers,
//! and cache keys.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over claims, keys and identifiers.
//!
//! ## Key Types
//!
//! - [`TokenCodec`] - Signs and verifies capability tokens
//! - [`Claims`] - What a token authorizes: one buyer, one document
//! - [`DocumentId`] - Validated document identifier
//! - [`CacheKey`] - Filesystem-safe identity of one stamped artifact
//!
//! ## Canonicalization
//!
//! Token payloads are encoded using deterministic CBOR. See [`canonical`] module.

pub mod cache_key;
pub mod canonical;
pub mod claims;
pub mod crypto;
pub mod error;
pub mod token;
pub mod types;
pub mod validation;

pub use cache_key::{ArtifactId, CacheKey};
pub use canonical::{decode_payload, encode_payload, TokenPayload};
pub use claims::Claims;
pub use crypto::{Blake3Hash, MacKey, SecretKey, Tag};
pub use error::{CoreError, TokenError, ValidationError};
pub use token::{unix_now, TokenCodec, DEFAULT_MAX_AGE, TOKEN_VERSION};
pub use types::DocumentId;
pub use validation::{validate_buyer_email, validate_claims, validate_document_id};
