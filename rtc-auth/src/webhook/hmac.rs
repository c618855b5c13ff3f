//! HMAC webhook signature validation (SHA-256 preferred, SHA-1 fallback).

use std::collections::HashMap;

use log::*;
use secrecy::{ExposeSecret, SecretString};

use super::{find_header, WebhookValidator};
use crate::error::{webhook_error, Error, WebhookErrorKind};
use crate::signature::{constant_time_eq, SignatureAlgorithm};

/// Header carrying the hex HMAC-SHA1 of the body.
pub const SIGNATURE_HEADER: &str = "Agora-Signature";
/// Header carrying the hex HMAC-SHA256 of the body.
pub const SIGNATURE_V2_HEADER: &str = "Agora-Signature-V2";
/// Provider-neutral name for [`SIGNATURE_HEADER`].
pub const GENERIC_SIGNATURE_HEADER: &str = "Signature";
/// Provider-neutral name for [`SIGNATURE_V2_HEADER`].
pub const GENERIC_SIGNATURE_V2_HEADER: &str = "Signature-V2";

/// HMAC webhook validator.
///
/// Looks for a v2 (SHA-256) header first and only falls back to a v1 (SHA-1)
/// header when no v2 header is present. Within each version the names are tried
/// in order. Header names are matched case-insensitively.
pub struct HmacWebhookValidator {
    secret: SecretString,
    signature_headers: Vec<String>,
    signature_v2_headers: Vec<String>,
}

impl HmacWebhookValidator {
    /// Create a validator accepting the provider's header names and their generic
    /// equivalents, provider names first.
    ///
    /// # Arguments
    ///
    /// * `secret` - Webhook signing secret (the customer secret)
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            signature_headers: vec![
                SIGNATURE_HEADER.to_string(),
                GENERIC_SIGNATURE_HEADER.to_string(),
            ],
            signature_v2_headers: vec![
                SIGNATURE_V2_HEADER.to_string(),
                GENERIC_SIGNATURE_V2_HEADER.to_string(),
            ],
        }
    }

    /// Create a validator reading signatures from one custom header name per version.
    pub fn with_headers(secret: SecretString, v1_header: &str, v2_header: &str) -> Self {
        Self {
            secret,
            signature_headers: vec![v1_header.to_string()],
            signature_v2_headers: vec![v2_header.to_string()],
        }
    }

    fn check(
        &self,
        algorithm: SignatureAlgorithm,
        provided: &str,
        body: &[u8],
    ) -> Result<SignatureAlgorithm, Error> {
        let expected = algorithm.sign_hex(self.secret.expose_secret().as_bytes(), body)?;

        if constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
            Ok(algorithm)
        } else {
            warn!("Rejected webhook with invalid {} signature", algorithm.as_str());
            Err(webhook_error(
                WebhookErrorKind::InvalidSignature(algorithm),
                &format!("Invalid signature ({})", algorithm.as_str()),
            ))
        }
    }
}

impl WebhookValidator for HmacWebhookValidator {
    fn validate(
        &self,
        headers: &HashMap<String, String>,
        body: &[u8],
    ) -> Result<SignatureAlgorithm, Error> {
        if let Some(signature) = first_header(headers, &self.signature_v2_headers)? {
            return self.check(SignatureAlgorithm::Sha256, signature, body);
        }

        if let Some(signature) = first_header(headers, &self.signature_headers)? {
            return self.check(SignatureAlgorithm::Sha1, signature, body);
        }

        warn!("Rejected webhook without a signature header");
        Err(webhook_error(
            WebhookErrorKind::MissingSignature,
            &format!(
                "No signature found in headers (expected one of {}, {})",
                self.signature_v2_headers.join(", "),
                self.signature_headers.join(", ")
            ),
        ))
    }
}

fn first_header<'a>(
    headers: &'a HashMap<String, String>,
    names: &[String],
) -> Result<Option<&'a str>, Error> {
    for name in names {
        if let Some(value) = find_header(headers, name)? {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::signature::{hmac_sha1_hex, hmac_sha256_hex};

    const SECRET: &str = "test_secret";
    const BODY: &[u8] = br#"{"noticeId":"n1"}"#;

    fn validator() -> HmacWebhookValidator {
        HmacWebhookValidator::new(SecretString::new(SECRET.to_string()))
    }

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_valid_v2_signature() {
        let signature = hmac_sha256_hex(SECRET.as_bytes(), BODY).unwrap();
        let headers = headers(&[("Agora-Signature-V2", signature.as_str())]);

        assert_eq!(
            validator().validate(&headers, BODY).unwrap(),
            SignatureAlgorithm::Sha256
        );
    }

    #[test]
    fn test_valid_v1_signature_with_lowercase_header() {
        let signature = hmac_sha1_hex(SECRET.as_bytes(), BODY).unwrap();
        let headers = headers(&[("agora-signature", signature.as_str())]);

        assert_eq!(
            validator().validate(&headers, BODY).unwrap(),
            SignatureAlgorithm::Sha1
        );
    }

    #[test]
    fn test_v2_is_preferred_over_v1() {
        let v1 = hmac_sha1_hex(SECRET.as_bytes(), BODY).unwrap();
        let headers = headers(&[("Agora-Signature", v1.as_str()), ("AGORA-SIGNATURE-V2", "deadbeef")]);

        let err = validator().validate(&headers, BODY).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Webhook(WebhookErrorKind::InvalidSignature(SignatureAlgorithm::Sha256))
        );
    }

    #[test]
    fn test_invalid_v1_signature() {
        let headers = headers(&[("Agora-Signature", "invalid")]);

        let err = validator().validate(&headers, BODY).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Webhook(WebhookErrorKind::InvalidSignature(SignatureAlgorithm::Sha1))
        );
    }

    #[test]
    fn test_missing_signature() {
        let err = validator()
            .validate(&headers(&[("Content-Type", "application/json")]), BODY)
            .unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Webhook(WebhookErrorKind::MissingSignature)
        );
    }

    #[test]
    fn test_empty_v2_header_falls_back_to_v1() {
        let v1 = hmac_sha1_hex(SECRET.as_bytes(), BODY).unwrap();
        let headers = headers(&[("Agora-Signature-V2", ""), ("Agora-Signature", v1.as_str())]);

        assert_eq!(
            validator().validate(&headers, BODY).unwrap(),
            SignatureAlgorithm::Sha1
        );
    }

    #[test]
    fn test_generic_headers_accepted_by_default() {
        let v2 = hmac_sha256_hex(SECRET.as_bytes(), BODY).unwrap();
        assert_eq!(
            validator()
                .validate(&headers(&[("signature-v2", v2.as_str())]), BODY)
                .unwrap(),
            SignatureAlgorithm::Sha256
        );

        let v1 = hmac_sha1_hex(SECRET.as_bytes(), BODY).unwrap();
        assert_eq!(
            validator()
                .validate(&headers(&[("Signature", v1.as_str())]), BODY)
                .unwrap(),
            SignatureAlgorithm::Sha1
        );
    }

    #[test]
    fn test_provider_header_checked_before_generic() {
        let v2 = hmac_sha256_hex(SECRET.as_bytes(), BODY).unwrap();
        let headers = headers(&[("Signature-V2", v2.as_str()), ("Agora-Signature-V2", "deadbeef")]);

        let err = validator().validate(&headers, BODY).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Webhook(WebhookErrorKind::InvalidSignature(SignatureAlgorithm::Sha256))
        );
    }

    #[test]
    fn test_custom_header_names() {
        let validator = HmacWebhookValidator::with_headers(
            SecretString::new(SECRET.to_string()),
            "Signature",
            "Signature-V2",
        );
        let signature = hmac_sha256_hex(SECRET.as_bytes(), BODY).unwrap();
        let headers = headers(&[("signature-v2", signature.as_str())]);

        assert!(validator.validate(&headers, BODY).is_ok());
    }
}
