//! Turning a document's template into the text stamped for one buyer.

use chrono::{DateTime, Utc};
use gumstamp_stamp::StampParams;
use gumstamp_store::StampTemplate;

/// Footer used when a document has no usable footer template.
pub const DEFAULT_FOOTER: &str = "Purchased by {email}";

const EMAIL_PLACEHOLDER: &str = "{email}";
const DATE_PLACEHOLDER: &str = "{date}";

/// Resolve footer and watermark text for a buyer.
///
/// The footer always names the buyer: a template footer without
/// `{email}` is replaced by [`DEFAULT_FOOTER`]. The watermark is drawn only
/// when the template supplies one. `{date}` is the token's issuance date
/// in UTC.
pub fn resolve_stamp(template: Option<&StampTemplate>, email: &str, issued_at: u64) -> StampParams {
    let date = issuance_date(issued_at);
    let fill = |text: &str| {
        text.replace(EMAIL_PLACEHOLDER, email)
            .replace(DATE_PLACEHOLDER, &date)
    };

    let footer = template
        .and_then(|t| t.footer_text.as_deref())
        .filter(|text| text.contains(EMAIL_PLACEHOLDER))
        .unwrap_or(DEFAULT_FOOTER);

    let diagonal = template
        .and_then(|t| t.diagonal_text.as_deref())
        .filter(|text| !text.trim().is_empty())
        .map(fill);

    StampParams {
        footer_text: Some(fill(footer)),
        diagonal_text: diagonal,
    }
}

/// `YYYY-MM-DD` for a Unix timestamp. Out-of-range values render as the epoch.
pub fn issuance_date(issued_at: u64) -> String {
    i64::try_from(issued_at)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_default()
        .format("%Y-%m-%d")
        .to_string()
}
