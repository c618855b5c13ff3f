//! Webhook signature validation and event decoding.

mod event;
mod hmac;
mod parser;

pub use event::{
    format_duration, format_event_time, leave_reason_text, platform_name, EventType,
    WebhookEvent, UNKNOWN_EVENT, UNKNOWN_PLATFORM, UNKNOWN_REASON,
};
pub use hmac::{
    HmacWebhookValidator, GENERIC_SIGNATURE_HEADER, GENERIC_SIGNATURE_V2_HEADER, SIGNATURE_HEADER,
    SIGNATURE_V2_HEADER,
};
pub use parser::{EventParser, REQUIRED_FIELDS};

use std::collections::HashMap;

use crate::error::{webhook_error, Error, WebhookErrorKind};
use crate::signature::SignatureAlgorithm;

/// Trait for validating webhook signatures.
pub trait WebhookValidator: Send + Sync {
    /// Validate a webhook request.
    ///
    /// # Arguments
    ///
    /// * `headers` - HTTP headers from the webhook request, any key casing
    /// * `body` - Raw request body bytes, exactly as received
    ///
    /// # Returns
    ///
    /// The algorithm whose signature matched. A missing or mismatched signature is an error.
    fn validate(
        &self,
        headers: &HashMap<String, String>,
        body: &[u8],
    ) -> Result<SignatureAlgorithm, Error>;
}

/// Case-insensitive header lookup. Empty values count as absent.
///
/// Repeats of a header under different casings are accepted when they carry the
/// same value. Differing values fail with `AmbiguousHeader` instead of picking one.
pub(crate) fn find_header<'a>(
    headers: &'a HashMap<String, String>,
    name: &str,
) -> Result<Option<&'a str>, Error> {
    let mut found: Option<&'a str> = None;

    for (key, value) in headers {
        let value = value.trim();
        if value.is_empty() || !key.eq_ignore_ascii_case(name) {
            continue;
        }

        match found {
            Some(previous) if previous != value => {
                return Err(webhook_error(
                    WebhookErrorKind::AmbiguousHeader(name.to_string()),
                    &format!("Header {} was sent more than once with different values", name),
                ));
            }
            _ => found = Some(value),
        }
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_find_header_ignores_case_and_blank_values() {
        let headers = headers(&[("signature-v2", " abc "), ("Signature", "")]);

        assert_eq!(find_header(&headers, "Signature-V2").unwrap(), Some("abc"));
        assert_eq!(find_header(&headers, "Signature").unwrap(), None);
    }

    #[test]
    fn test_find_header_accepts_identical_repeats() {
        let headers = headers(&[("agora-signature-v2", "abc"), ("Agora-Signature-V2", "abc")]);

        assert_eq!(
            find_header(&headers, "Agora-Signature-V2").unwrap(),
            Some("abc")
        );
    }

    #[test]
    fn test_find_header_rejects_conflicting_repeats() {
        let headers = headers(&[("agora-signature-v2", "abc"), ("Agora-Signature-V2", "def")]);

        let err = find_header(&headers, "Agora-Signature-V2").unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Webhook(WebhookErrorKind::AmbiguousHeader(
                "Agora-Signature-V2".to_string()
            ))
        );
    }
}
