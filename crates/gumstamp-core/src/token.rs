//! Capability tokens: signed, expiring, URL-safe credentials.
//!
//! A token is `base64url(payload) "." base64url(tag)` with no padding,
//! where `payload` is the canonical CBOR of the claims plus the issuance
//! time and `tag` is a keyed BLAKE3 MAC over those bytes.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::canonical::{decode_payload, encode_payload, TokenPayload};
use crate::claims::Claims;
use crate::crypto::{MacKey, SecretKey, Tag};
use crate::error::TokenError;

/// The current token payload version.
pub const TOKEN_VERSION: u8 = 1;

/// Tokens are valid for 14 days from issuance.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 14);

const SEPARATOR: char = '.';

/// Signs and verifies capability tokens with one server-held secret.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    key: MacKey,
}

impl TokenCodec {
    /// Create a codec bound to a secret.
    pub fn new(secret: &SecretKey) -> Self {
        Self {
            key: secret.mac_key(),
        }
    }

    /// Sign claims, stamping the current time as the issuance time.
    pub fn sign(&self, claims: &Claims) -> String {
        self.sign_at(claims, unix_now())
    }

    /// Sign claims with an explicit issuance time (Unix seconds).
    pub fn sign_at(&self, claims: &Claims, issued_at: u64) -> String {
        let payload = TokenPayload {
            version: TOKEN_VERSION,
            claims: claims.clone(),
            issued_at,
        };
        let bytes = encode_payload(&payload);
        let tag = self.key.tag(&bytes);

        let mut token = URL_SAFE_NO_PAD.encode(&bytes);
        token.push(SEPARATOR);
        token.push_str(&URL_SAFE_NO_PAD.encode(tag.as_bytes()));
        token
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str, max_age: Duration) -> Result<Claims, TokenError> {
        self.verify_at(token, max_age, unix_now())
    }

    /// Verify a token at an explicit time (Unix seconds).
    ///
    /// The tag is checked before the payload is parsed, so nothing an
    /// attacker controls reaches the CBOR decoder unauthenticated.
    pub fn verify_at(&self, token: &str, max_age: Duration, now: u64) -> Result<Claims, TokenError> {
        Ok(self.open_at(token, max_age, now)?.claims)
    }

    /// Like [`verify_at`](Self::verify_at), but returns the whole payload
    /// including the issuance time.
    pub fn open_at(
        &self,
        token: &str,
        max_age: Duration,
        now: u64,
    ) -> Result<TokenPayload, TokenError> {
        let (payload_b64, tag_b64) = token
            .split_once(SEPARATOR)
            .ok_or_else(|| TokenError::Malformed("missing separator".into()))?;

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|e| TokenError::Malformed(format!("payload: {}", e)))?;
        let tag_bytes = URL_SAFE_NO_PAD
            .decode(tag_b64)
            .map_err(|e| TokenError::Malformed(format!("tag: {}", e)))?;
        let tag = Tag::try_from(tag_bytes.as_slice())
            .map_err(|_| TokenError::Malformed("tag length".into()))?;

        if !self.key.verify(&payload_bytes, &tag) {
            return Err(TokenError::BadSignature);
        }

        let payload = decode_payload(&payload_bytes)?;
        if payload.version != TOKEN_VERSION {
            return Err(TokenError::UnsupportedVersion(payload.version));
        }

        if payload.issued_at > now {
            return Err(TokenError::IssuedInFuture {
                issued_at: payload.issued_at,
                now,
            });
        }

        let age_secs = now - payload.issued_at;
        let max_age_secs = max_age.as_secs();
        if age_secs > max_age_secs {
            return Err(TokenError::Expired {
                age_secs,
                max_age_secs,
            });
        }

        Ok(payload)
    }
}

/// Current time in Unix seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
