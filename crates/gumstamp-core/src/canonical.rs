//! Canonical CBOR encoding for token payloads.
//!
//! This module implements the subset of RFC 8949 Core Deterministic
//! Encoding that token payloads need:
//! - Integer map keys, emitted in ascending order
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are u64 seconds)
//!
//! The tag covers these exact bytes, so decoding rejects any payload
//! that does not re-encode to itself.

use ciborium::value::Value;

use crate::claims::Claims;
use crate::error::CoreError;

/// Payload field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const VERSION: u64 = 0;
    pub const DOCUMENT_ID: u64 = 1;
    pub const BUYER_EMAIL: u64 = 2;
    pub const SALE_ID: u64 = 3;
    pub const ISSUED_AT: u64 = 4;
}

/// Everything a token signs over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    /// Payload schema version.
    pub version: u8,
    /// The authorized claims.
    pub claims: Claims,
    /// Issuance time, Unix seconds.
    pub issued_at: u64,
}

/// Encode a payload to canonical CBOR bytes.
pub fn encode_payload(payload: &TokenPayload) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64 + payload.claims.buyer_email.len());

    // Map header (5 entries), then keys 0..=4 in order
    encode_uint(&mut buf, 5, 5);

    encode_uint(&mut buf, 0, keys::VERSION);
    encode_uint(&mut buf, 0, u64::from(payload.version));

    encode_uint(&mut buf, 0, keys::DOCUMENT_ID);
    encode_text(&mut buf, &payload.claims.document_id);

    encode_uint(&mut buf, 0, keys::BUYER_EMAIL);
    encode_text(&mut buf, &payload.claims.buyer_email);

    // 3: sale_id (null or text)
    encode_uint(&mut buf, 0, keys::SALE_ID);
    match payload.claims.sale_id() {
        Some(sale_id) => encode_text(&mut buf, sale_id),
        None => buf.push(0xf6),
    }

    encode_uint(&mut buf, 0, keys::ISSUED_AT);
    encode_uint(&mut buf, 0, payload.issued_at);

    buf
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Decode a payload from canonical bytes.
pub fn decode_payload(bytes: &[u8]) -> Result<TokenPayload, CoreError> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let payload = cbor_value_to_payload(&value)?;

    if encode_payload(&payload) != bytes {
        return Err(CoreError::DecodingError("non-canonical payload".into()));
    }

    Ok(payload)
}

/// Convert a CBOR Value (map) back to a payload.
fn cbor_value_to_payload(value: &Value) -> Result<TokenPayload, CoreError> {
    let map = match value {
        Value::Map(m) => m,
        _ => return Err(CoreError::DecodingError("expected map".into())),
    };

    let get = |key: u64| -> Option<&Value> {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == i128::from(key)))
            .map(|(_, v)| v)
    };

    let version = match get(keys::VERSION) {
        Some(Value::Integer(i)) => u8::try_from(i128::from(*i))
            .map_err(|_| CoreError::DecodingError("version out of range".into()))?,
        _ => return Err(CoreError::DecodingError("missing version".into())),
    };

    let document_id = match get(keys::DOCUMENT_ID) {
        Some(Value::Text(s)) => s.clone(),
        _ => return Err(CoreError::DecodingError("missing document_id".into())),
    };

    let buyer_email = match get(keys::BUYER_EMAIL) {
        Some(Value::Text(s)) => s.clone(),
        _ => return Err(CoreError::DecodingError("missing buyer_email".into())),
    };

    let sale_id = match get(keys::SALE_ID) {
        Some(Value::Text(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Null) | None => None,
        _ => return Err(CoreError::DecodingError("invalid sale_id".into())),
    };

    let issued_at = match get(keys::ISSUED_AT) {
        Some(Value::Integer(i)) => u64::try_from(i128::from(*i))
            .map_err(|_| CoreError::DecodingError("issued_at out of range".into()))?,
        _ => return Err(CoreError::DecodingError("missing issued_at".into())),
    };

    Ok(TokenPayload {
        version,
        claims: Claims {
            document_id,
            buyer_email,
            sale_id,
        },
        issued_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TokenPayload {
        TokenPayload {
            version: 1,
            claims: Claims::new("p_1", "a@b.com").with_sale_id("sale-1"),
            issued_at: 1_736_870_400,
        }
    }

    #[test]
    fn test_canonical_encoding_deterministic() {
        assert_eq!(encode_payload(&sample()), encode_payload(&sample()));
    }

    #[test]
    fn test_payload_roundtrip() {
        let payload = sample();
        let decoded = decode_payload(&encode_payload(&payload)).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_missing_sale_id_encodes_null() {
        let payload = TokenPayload {
            claims: Claims::new("p_1", "a@b.com"),
            ..sample()
        };
        let bytes = encode_payload(&payload);
        assert!(bytes.contains(&0xf6));
        assert_eq!(decode_payload(&bytes).unwrap().claims.sale_id(), None);
    }

    #[test]
    fn test_empty_sale_id_text_rejected() {
        let payload = TokenPayload {
            claims: Claims::new("p_1", "a@b.com"),
            ..sample()
        };
        let mut bytes = encode_payload(&payload);
        let null = bytes.iter().position(|b| *b == 0xf6).unwrap();
        // Zero-length text string in place of null
        bytes[null] = 0x60;
        assert!(decode_payload(&bytes).is_err());
    }

    #[test]
    fn test_integer_encoding() {
        let mut buf = Vec::new();

        // 0-23: single byte
        encode_uint(&mut buf, 0, 23);
        assert_eq!(buf, vec![0x17]);

        // 24-255: two bytes
        buf.clear();
        encode_uint(&mut buf, 0, 24);
        assert_eq!(buf, vec![0x18, 24]);

        // 256-65535: three bytes
        buf.clear();
        encode_uint(&mut buf, 0, 256);
        assert_eq!(buf, vec![0x19, 0x01, 0x00]);

        // Unix timestamps land in the four-byte form
        buf.clear();
        encode_uint(&mut buf, 0, 1_736_870_400);
        assert_eq!(buf[0], 0x1a);
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn test_map_header_and_key_order() {
        let bytes = encode_payload(&sample());
        // Map header (5 entries)
        assert_eq!(bytes[0], 0xa5);
        // Key 0, version 1
        assert_eq!(bytes[1], 0x00);
        assert_eq!(bytes[2], 0x01);
        // Key 1, then text header for "p_1"
        assert_eq!(bytes[3], 0x01);
        assert_eq!(bytes[4], 0x63);
    }

    #[test]
    fn test_non_canonical_rejected() {
        // Same map, but version encoded in the two-byte form
        let mut bytes = encode_payload(&sample());
        bytes.splice(2..3, [0x18, 0x01]);
        assert!(matches!(
            decode_payload(&bytes),
            Err(CoreError::DecodingError(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decode_payload(b"\xff\x00garbage").is_err());
        assert!(decode_payload(&[]).is_err());
    }
}
