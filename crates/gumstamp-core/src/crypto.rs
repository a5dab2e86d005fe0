//! Keyed integrity primitives for capability tokens.
//!
//! Wraps BLAKE3 keyed hashing and key derivation with strong types.

use rand::RngCore;
use std::fmt;

use crate::error::CoreError;

/// Context string for deriving the token MAC key from the server secret.
///
/// Changing it invalidates every outstanding token.
const TOKEN_KEY_CONTEXT: &str = "gumstamp 2024-06-01 capability token mac v1";

/// Length of a token tag in bytes.
pub const TAG_LEN: usize = 32;

/// A 32-byte Blake3 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blake3Hash(pub [u8; 32]);

impl Blake3Hash {
    /// Compute the Blake3 hash of the given data.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 16 hex characters, used where a short stable suffix is enough.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Debug for Blake3Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blake3({})", self.short_hex())
    }
}

/// The server-held secret every token is signed with.
///
/// Loaded once at startup and never mutated.
#[derive(Clone)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    /// Wrap raw secret material. Empty secrets are rejected.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, CoreError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(CoreError::EmptySecret);
        }
        Ok(Self(bytes))
    }

    /// Generate a random 32-byte secret.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Get the raw secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Derive the key used to tag token payloads.
    pub fn mac_key(&self) -> MacKey {
        MacKey(blake3::derive_key(TOKEN_KEY_CONTEXT, &self.0))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(<{} bytes>)", self.0.len())
    }
}

/// A derived 32-byte MAC key.
#[derive(Clone)]
pub struct MacKey([u8; 32]);

impl MacKey {
    /// Compute the tag for a message.
    pub fn tag(&self, message: &[u8]) -> Tag {
        Tag(*blake3::keyed_hash(&self.0, message).as_bytes())
    }

    /// Check a tag in constant time.
    pub fn verify(&self, message: &[u8], tag: &Tag) -> bool {
        blake3::keyed_hash(&self.0, message) == blake3::Hash::from(tag.0)
    }
}

impl fmt::Debug for MacKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MacKey(<redacted>)")
    }
}

/// A 32-byte keyed BLAKE3 tag over a token payload.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Tag(pub [u8; TAG_LEN]);

impl Tag {
    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; TAG_LEN] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({}...)", &self.to_hex()[..16])
    }
}

impl TryFrom<&[u8]> for Tag {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; TAG_LEN] = slice.try_into()?;
        Ok(Self(arr))
    }
}
