//! # Gumstamp Testkit
//!
//! Testing utilities for Gumstamp.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Pinned cache keys, so artifact file names never drift
//! - **Generators**: Proptest strategies for claims and discriminators
//! - **Fixtures**: A service over a temporary root, an instrumented stamper,
//!   and sample PDF builders
//!
//! ## Golden Vectors
//!
//! ```rust
//! use gumstamp_testkit::vectors::verify_all_vectors;
//!
//! assert!(verify_all_vectors().is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use gumstamp_testkit::generators::{claims_from_params, ClaimsParams};
//!
//! proptest! {
//!     #[test]
//!     fn claims_are_valid(params: ClaimsParams) {
//!         let claims = claims_from_params(&params);
//!         prop_assert!(claims.checked_document_id().is_ok());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use gumstamp_testkit::fixtures::{sample_pdf, CountingStamper, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let service = fixture.service(CountingStamper::new()).await;
//! service.upload("p_1", sample_pdf(2).into(), None, None).await?;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    contains_text, init_tracing, page_contents, sample_pdf, sample_pdf_with_sizes,
    CountingStamper, TestFixture, FIXTURE_NOW, FIXTURE_SECRET,
};
pub use generators::{claims_from_params, ClaimsParams};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
