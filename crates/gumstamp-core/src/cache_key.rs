//! Cache keys: the filesystem-safe identity of one stamped artifact.
//!
//! A key is derived from the buyer discriminator alone (the sale id, or
//! the email when there is no sale). Stamp text never feeds into it, so
//! two buyers always land on distinct keys by construction.

use std::fmt;

use crate::claims::Claims;
use crate::crypto::Blake3Hash;
use crate::error::ValidationError;
use crate::types::DocumentId;

/// Longest sanitized prefix kept before the hash suffix.
pub const MAX_KEY_PREFIX: usize = 160;

/// The deterministic storage key for one (document, buyer) artifact.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a raw buyer discriminator.
    ///
    /// Characters outside `[A-Za-z0-9@._+-]` become `_`, and a leading `.`
    /// becomes `_` so no key is hidden or names a directory. When anything
    /// had to change, a short digest of the raw value is appended so two
    /// different inputs can never share a key. Empty input maps to the
    /// digest alone.
    ///
    /// A raw value already shaped like a derived key (ending in `-` and a
    /// digest, or a bare digest) is also suffixed, so no literal input can
    /// claim another input's key.
    pub fn from_discriminator(raw: &str) -> Self {
        if raw.is_empty() {
            return Self(Blake3Hash::hash(raw.as_bytes()).short_hex());
        }

        let mut altered = looks_derived(raw);
        let mut key = String::with_capacity(raw.len().min(MAX_KEY_PREFIX));
        for (i, c) in raw.chars().enumerate() {
            if i == MAX_KEY_PREFIX {
                altered = true;
                break;
            }
            let safe = is_safe_char(c) && !(i == 0 && c == '.');
            if safe {
                key.push(c);
            } else {
                key.push('_');
                altered = true;
            }
        }

        if altered {
            key.push('-');
            key.push_str(&Blake3Hash::hash(raw.as_bytes()).short_hex());
        }

        Self(key)
    }

    /// Derive the key for a claim set (sale id preferred over email).
    pub fn for_claims(claims: &Claims) -> Self {
        Self::from_discriminator(claims.discriminator())
    }

    /// Borrow as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the artifact stored under this key.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.0, extension)
    }
}

/// Hex characters in a key's digest suffix.
const DIGEST_LEN: usize = 16;

fn is_digest(s: &str) -> bool {
    s.len() == DIGEST_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn looks_derived(raw: &str) -> bool {
    if is_digest(raw) {
        return true;
    }
    match raw.len().checked_sub(DIGEST_LEN + 1) {
        Some(split) if raw.is_char_boundary(split) => {
            let (head, tail) = raw.split_at(split);
            !head.is_empty() && tail.starts_with('-') && is_digest(&tail[1..])
        }
        _ => false,
    }
}

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '+' | '-')
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A (document, cache key) pair: where one artifact lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactId {
    pub document_id: DocumentId,
    pub cache_key: CacheKey,
}

impl ArtifactId {
    /// Validate claims and derive the artifact they address.
    pub fn for_claims(claims: &Claims) -> Result<Self, ValidationError> {
        Ok(Self {
            document_id: claims.checked_document_id()?,
            cache_key: CacheKey::for_claims(claims),
        })
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.document_id, self.cache_key)
    }
}
