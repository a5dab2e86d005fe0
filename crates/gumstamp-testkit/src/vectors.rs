//! Golden cache-key vectors.
//!
//! Cache keys name files that outlive any one release, so the derivation
//! must never drift. Each vector pins the key for one raw discriminator.

use gumstamp_core::CacheKey;

/// A golden cache-key vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// The raw discriminator (sale id or email).
    pub raw: &'static str,
    /// Expected cache key.
    pub expected_key: &'static str,
}

/// Get all golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "plain email is kept verbatim",
            raw: "a@b.com",
            expected_key: "a@b.com",
        },
        GoldenVector {
            name: "plus-addressed mixed-case email is kept verbatim",
            raw: "Buyer+Tag@Example.COM",
            expected_key: "Buyer+Tag@Example.COM",
        },
        GoldenVector {
            name: "plain sale id is kept verbatim",
            raw: "sale-123",
            expected_key: "sale-123",
        },
        GoldenVector {
            name: "empty discriminator is the digest alone",
            raw: "",
            expected_key: "af1349b9f5f9a1a6",
        },
        GoldenVector {
            name: "space is replaced and suffixed",
            raw: "John Doe@example.com",
            expected_key: "John_Doe@example.com-c9eac233b6135446",
        },
        GoldenVector {
            name: "leading dot is neutralized",
            raw: ".hidden@x.com",
            expected_key: "_hidden@x.com-8519d0bf297b5f39",
        },
        GoldenVector {
            name: "path traversal is flattened",
            raw: "../../etc/passwd",
            expected_key: "_._.._etc_passwd-58374639e1651454",
        },
        GoldenVector {
            name: "slash is replaced",
            raw: "a/b",
            expected_key: "a_b-0da3cfa5f8b7fae9",
        },
        GoldenVector {
            name: "non-ascii is replaced",
            raw: "Jos\u{e9}@example.com",
            expected_key: "Jos_@example.com-539b4aebc1b986c8",
        },
        GoldenVector {
            name: "a derived key used as raw input is suffixed again",
            raw: "o_brien@x.com-ea60bde8f4e5e7c7",
            expected_key: "o_brien@x.com-ea60bde8f4e5e7c7-0aa42ff37ebf1b76",
        },
        GoldenVector {
            name: "a bare digest does not alias the empty key",
            raw: "af1349b9f5f9a1a6",
            expected_key: "af1349b9f5f9a1a6-049e780dd9cfe3a7",
        },
    ]
}

/// Long discriminators are truncated to 160 characters plus the digest.
pub fn truncation_vector() -> (String, String) {
    let raw = "x".repeat(200);
    let expected = format!("{}-41f27fa4b0ad4767", "x".repeat(160));
    (raw, expected)
}

/// Check every vector, returning the names of those that fail.
pub fn verify_all_vectors() -> Vec<&'static str> {
    let mut failures: Vec<&'static str> = all_vectors()
        .into_iter()
        .filter(|v| CacheKey::from_discriminator(v.raw).as_str() != v.expected_key)
        .map(|v| v.name)
        .collect();

    let (raw, expected) = truncation_vector();
    if CacheKey::from_discriminator(&raw).as_str() != expected {
        failures.push("long discriminator is truncated");
    }
    failures
}
