//! # Gumstamp Stamp
//!
//! The stamping engine: draws a provenance footer, and optionally a
//! diagonal watermark, onto every page of a PDF.
//!
//! ## Key Types
//!
//! - [`Stamper`] - Bytes-to-bytes stamping interface
//! - [`PdfStamper`] - lopdf-backed implementation
//! - [`StampParams`] - Footer and watermark text
//!
//! ## Example
//!
//! ```ignore
//! use gumstamp_stamp::{PdfStamper, StampParams, Stamper};
//!
//! let params = StampParams::footer("Purchased by a@b.com");
//! let stamped = PdfStamper.stamp(&source, &params)?;
//! ```
//!
//! ## Guarantees
//!
//! - Page count and order are preserved
//! - Output is deterministic for identical inputs
//! - Each page's original drawing state is isolated from the overlay

pub mod engine;
pub mod error;
pub mod font;
pub mod overlay;

pub use engine::{PdfStamper, StampParams, Stamper};
pub use error::{Result, StampError};
pub use overlay::PageBox;
