//! Proptest generators for property-based testing.

use proptest::prelude::*;

use gumstamp_core::Claims;

/// Generate a valid document id.
pub fn document_id() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,40}".prop_map(String::from)
}

/// Generate a plausible buyer email.
pub fn buyer_email() -> impl Strategy<Value = String> {
    ("[a-z0-9._+-]{1,24}", "[a-z0-9-]{1,16}\\.[a-z]{2,6}")
        .prop_map(|(local, domain)| format!("{}@{}", local, domain))
}

/// Generate a sale id, sometimes absent.
pub fn sale_id() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[A-Za-z0-9=_-]{1,32}".prop_map(String::from))
}

/// Generate an arbitrary discriminator, including characters that need
/// sanitizing.
pub fn raw_discriminator() -> impl Strategy<Value = String> {
    prop_oneof![
        buyer_email(),
        "\\PC{0,64}".prop_map(String::from),
        "[./ a-z]{0,8}".prop_map(String::from),
    ]
}

/// Generate a reasonable issuance time (2001..2286).
pub fn issued_at() -> impl Strategy<Value = u64> {
    1_000_000_000u64..10_000_000_000u64
}

/// Parameters for generating claims.
#[derive(Debug, Clone)]
pub struct ClaimsParams {
    pub document_id: String,
    pub buyer_email: String,
    pub sale_id: Option<String>,
}

impl Arbitrary for ClaimsParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (document_id(), buyer_email(), sale_id())
            .prop_map(|(document_id, buyer_email, sale_id)| ClaimsParams {
                document_id,
                buyer_email,
                sale_id,
            })
            .boxed()
    }
}

/// Build claims from generated parameters.
pub fn claims_from_params(params: &ClaimsParams) -> Claims {
    let claims = Claims::new(params.document_id.clone(), params.buyer_email.clone());
    match &params.sale_id {
        Some(sale_id) => claims.with_sale_id(sale_id.clone()),
        None => claims,
    }
}
