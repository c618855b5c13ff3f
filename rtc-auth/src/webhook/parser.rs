//! Webhook envelope decoding, verification and normalization.

use std::collections::HashMap;

use log::*;
use secrecy::SecretString;
use serde_json::{Map, Value};

use super::event::{enrich_payload, event_name, WebhookEvent};
use super::hmac::HmacWebhookValidator;
use super::WebhookValidator;
use crate::error::{webhook_error, Error, WebhookErrorKind};

/// Envelope fields every webhook body must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 5] = ["noticeId", "productId", "eventType", "notifyMs", "payload"];

/// Turns raw webhook requests into [`WebhookEvent`]s.
///
/// Checks run in a fixed order and stop at the first failure: body decoding,
/// required fields, field types, signature, then normalization. The signature is
/// always computed over the raw body bytes, never a re-serialization.
pub struct EventParser {
    validator: Box<dyn WebhookValidator>,
}

impl EventParser {
    /// Parser verifying HMAC signatures with the customer secret.
    pub fn new(secret: SecretString) -> Self {
        Self::with_validator(Box::new(HmacWebhookValidator::new(secret)))
    }

    pub fn with_validator(validator: Box<dyn WebhookValidator>) -> Self {
        Self { validator }
    }

    /// Decode, optionally verify, and normalize one webhook request.
    ///
    /// # Arguments
    ///
    /// * `raw_body` - Request body exactly as received
    /// * `headers` - Request headers, any key casing
    /// * `verify_signature` - Skip signature checks when false (trusted transports only)
    pub fn parse_event(
        &self,
        raw_body: &[u8],
        headers: &HashMap<String, String>,
        verify_signature: bool,
    ) -> Result<WebhookEvent, Error> {
        let mut envelope = decode_envelope(raw_body)?;
        check_required_fields(&envelope)?;

        let notice_id = string_field(&envelope, "noticeId")?;
        let product_id = integer_field(&envelope, "productId")?;
        let event_type = integer_field(&envelope, "eventType")?;
        let notify_timestamp = integer_field(&envelope, "notifyMs")?;
        let session_id = optional_string_field(&envelope, "sid")?;
        let payload = match envelope.remove("payload") {
            Some(Value::Object(payload)) => payload,
            _ => return Err(invalid_type("payload")),
        };

        if verify_signature {
            let algorithm = self.validator.validate(headers, raw_body)?;
            debug!(
                "Verified webhook {} with {} signature",
                notice_id,
                algorithm.as_str()
            );
        } else {
            debug!("Skipping signature verification for webhook {}", notice_id);
        }

        let event_name = event_name(event_type);
        if event_name == super::UNKNOWN_EVENT {
            info!("Received webhook with unknown event type {}", event_type);
        }

        Ok(WebhookEvent {
            notice_id,
            product_id,
            event_type,
            event_name: event_name.to_string(),
            notify_timestamp,
            session_id,
            payload: enrich_payload(payload),
        })
    }
}

fn decode_envelope(raw_body: &[u8]) -> Result<Map<String, Value>, Error> {
    match serde_json::from_slice::<Value>(raw_body) {
        Ok(Value::Object(envelope)) => Ok(envelope),
        Ok(_) => Err(webhook_error(
            WebhookErrorKind::MalformedPayload,
            "Webhook body must be a JSON object",
        )),
        Err(e) => Err(webhook_error(
            WebhookErrorKind::MalformedPayload,
            &format!("Invalid JSON payload: {}", e),
        )),
    }
}

fn check_required_fields(envelope: &Map<String, Value>) -> Result<(), Error> {
    for field in REQUIRED_FIELDS {
        if envelope.get(field).map_or(true, Value::is_null) {
            return Err(webhook_error(
                WebhookErrorKind::MissingField(field.to_string()),
                &format!("Missing required field: {}", field),
            ));
        }
    }
    Ok(())
}

fn string_field(envelope: &Map<String, Value>, field: &str) -> Result<String, Error> {
    envelope
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| invalid_type(field))
}

fn integer_field(envelope: &Map<String, Value>, field: &str) -> Result<i64, Error> {
    envelope
        .get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| invalid_type(field))
}

fn optional_string_field(
    envelope: &Map<String, Value>,
    field: &str,
) -> Result<Option<String>, Error> {
    match envelope.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(invalid_type(field)),
    }
}

fn invalid_type(field: &str) -> Error {
    webhook_error(
        WebhookErrorKind::InvalidFieldType(field.to_string()),
        &format!("Field {} has an invalid type", field),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::signature::{hmac_sha1_hex, hmac_sha256_hex, SignatureAlgorithm};
    use crate::webhook::{UNKNOWN_EVENT, UNKNOWN_PLATFORM};

    const SECRET: &str = "customer_secret";

    const BODY: &str = r#"{"noticeId":"abc-123","productId":1,"eventType":103,"notifyMs":1700000000123,"sid":"session-1","payload":{"channelName":"test_channel","uid":12345,"platform":1,"clientSeq":1,"ts":1700000000}}"#;

    fn parser() -> EventParser {
        EventParser::new(SecretString::new(SECRET.to_string()))
    }

    fn signed_v2(body: &[u8]) -> HashMap<String, String> {
        HashMap::from([(
            "Agora-Signature-V2".to_string(),
            hmac_sha256_hex(SECRET.as_bytes(), body).unwrap(),
        )])
    }

    fn webhook_kind(err: Error) -> WebhookErrorKind {
        match err.error_kind {
            ErrorKind::Webhook(kind) => kind,
            other => panic!("expected a webhook error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_valid_v2_event() {
        let body = BODY.as_bytes();
        let event = parser().parse_event(body, &signed_v2(body), true).unwrap();

        assert_eq!(event.notice_id, "abc-123");
        assert_eq!(event.product_id, 1);
        assert_eq!(event.event_type, 103);
        assert_eq!(event.event_name, "broadcaster_join_channel");
        assert_eq!(event.notify_timestamp, 1_700_000_000_123);
        assert_eq!(event.session_id.as_deref(), Some("session-1"));
        assert_eq!(event.payload["channelName"], "test_channel");
        assert_eq!(event.payload["uid"], 12345);
        assert_eq!(event.payload["platform_name"], "Android");
        assert_eq!(event.payload["event_time"], "2023-11-14 22:13:20");
    }

    #[test]
    fn test_parse_valid_v1_event() {
        let body = BODY.as_bytes();
        let headers = HashMap::from([(
            "agora-signature".to_string(),
            hmac_sha1_hex(SECRET.as_bytes(), body).unwrap(),
        )]);

        let event = parser().parse_event(body, &headers, true).unwrap();
        assert_eq!(event.notice_id, "abc-123");
    }

    #[test]
    fn test_parse_event_with_generic_v2_header() {
        let body = BODY.as_bytes();
        let headers = HashMap::from([(
            "signature-v2".to_string(),
            hmac_sha256_hex(SECRET.as_bytes(), body).unwrap(),
        )]);

        let event = parser().parse_event(body, &headers, true).unwrap();
        assert_eq!(event.event_name, "broadcaster_join_channel");
    }

    #[test]
    fn test_parse_event_with_generic_v1_header() {
        let body = BODY.as_bytes();
        let headers = HashMap::from([(
            "Signature".to_string(),
            hmac_sha1_hex(SECRET.as_bytes(), body).unwrap(),
        )]);

        let event = parser().parse_event(body, &headers, true).unwrap();
        assert_eq!(event.notice_id, "abc-123");
    }

    #[test]
    fn test_generic_v2_header_wins_over_v1() {
        let body = BODY.as_bytes();
        let mut headers = HashMap::from([(
            "Signature-V2".to_string(),
            hmac_sha256_hex(SECRET.as_bytes(), body).unwrap(),
        )]);
        headers.insert("Agora-Signature".to_string(), "not-a-signature".to_string());

        assert!(parser().parse_event(body, &headers, true).is_ok());

        headers.insert("Signature-V2".to_string(), "not-a-signature".to_string());
        headers.insert(
            "Agora-Signature".to_string(),
            hmac_sha1_hex(SECRET.as_bytes(), body).unwrap(),
        );

        let err = parser().parse_event(body, &headers, true).unwrap_err();
        assert_eq!(
            webhook_kind(err),
            WebhookErrorKind::InvalidSignature(SignatureAlgorithm::Sha256)
        );
    }

    #[test]
    fn test_conflicting_signature_headers_rejected() {
        let body = BODY.as_bytes();
        let mut headers = signed_v2(body);
        headers.insert("agora-signature-v2".to_string(), "0".repeat(64));

        let err = parser().parse_event(body, &headers, true).unwrap_err();
        assert_eq!(
            webhook_kind(err),
            WebhookErrorKind::AmbiguousHeader("Agora-Signature-V2".to_string())
        );
    }

    #[test]
    fn test_flipped_body_byte_fails_signature() {
        let headers = signed_v2(BODY.as_bytes());
        let tampered = BODY.replace("12345", "12346");

        let err = parser()
            .parse_event(tampered.as_bytes(), &headers, true)
            .unwrap_err();
        assert_eq!(
            webhook_kind(err),
            WebhookErrorKind::InvalidSignature(SignatureAlgorithm::Sha256)
        );
    }

    #[test]
    fn test_flipped_header_byte_fails_signature() {
        let body = BODY.as_bytes();
        let mut headers = signed_v2(body);
        let signature = headers.get_mut("Agora-Signature-V2").unwrap();
        let flipped = if signature.starts_with('0') { "1" } else { "0" };
        signature.replace_range(0..1, flipped);

        let err = parser().parse_event(body, &headers, true).unwrap_err();
        assert_eq!(
            webhook_kind(err),
            WebhookErrorKind::InvalidSignature(SignatureAlgorithm::Sha256)
        );
    }

    #[test]
    fn test_signature_covers_raw_bytes_not_reserialized_json() {
        let body = BODY.replace(",", ", ");
        let reserialized =
            serde_json::to_vec(&serde_json::from_str::<Value>(&body).unwrap()).unwrap();
        let headers = signed_v2(&reserialized);

        let err = parser()
            .parse_event(body.as_bytes(), &headers, true)
            .unwrap_err();
        assert!(matches!(
            webhook_kind(err),
            WebhookErrorKind::InvalidSignature(_)
        ));
    }

    #[test]
    fn test_missing_signature() {
        let err = parser()
            .parse_event(BODY.as_bytes(), &HashMap::new(), true)
            .unwrap_err();
        assert_eq!(webhook_kind(err), WebhookErrorKind::MissingSignature);
    }

    #[test]
    fn test_missing_event_type() {
        let body = r#"{"noticeId":"n","productId":1,"notifyMs":1,"payload":{}}"#.as_bytes();

        let err = parser().parse_event(body, &signed_v2(body), true).unwrap_err();
        assert_eq!(
            webhook_kind(err),
            WebhookErrorKind::MissingField("eventType".to_string())
        );
    }

    #[test]
    fn test_null_field_counts_as_missing() {
        let body = r#"{"noticeId":null,"productId":1,"eventType":101,"notifyMs":1,"payload":{}}"#;

        let err = parser()
            .parse_event(body.as_bytes(), &HashMap::new(), false)
            .unwrap_err();
        assert_eq!(
            webhook_kind(err),
            WebhookErrorKind::MissingField("noticeId".to_string())
        );
    }

    #[test]
    fn test_missing_field_reported_before_signature() {
        let body = r#"{"noticeId":"n","productId":1,"eventType":101,"notifyMs":1}"#;

        let err = parser()
            .parse_event(body.as_bytes(), &HashMap::new(), true)
            .unwrap_err();
        assert_eq!(
            webhook_kind(err),
            WebhookErrorKind::MissingField("payload".to_string())
        );
    }

    #[test]
    fn test_non_integer_event_type() {
        let body = r#"{"noticeId":"n","productId":1,"eventType":"103","notifyMs":1,"payload":{}}"#;

        let err = parser()
            .parse_event(body.as_bytes(), &HashMap::new(), false)
            .unwrap_err();
        assert_eq!(
            webhook_kind(err),
            WebhookErrorKind::InvalidFieldType("eventType".to_string())
        );
    }

    #[test]
    fn test_non_object_payload() {
        let body = r#"{"noticeId":"n","productId":1,"eventType":101,"notifyMs":1,"payload":[1]}"#;

        let err = parser()
            .parse_event(body.as_bytes(), &HashMap::new(), false)
            .unwrap_err();
        assert_eq!(
            webhook_kind(err),
            WebhookErrorKind::InvalidFieldType("payload".to_string())
        );
    }

    #[test]
    fn test_unknown_event_type_still_decodes() {
        let body = r#"{"noticeId":"n","productId":1,"eventType":9999,"notifyMs":1,"payload":{"platform":77}}"#
            .as_bytes();

        let event = parser().parse_event(body, &signed_v2(body), true).unwrap();
        assert_eq!(event.event_name, UNKNOWN_EVENT);
        assert!(!event.is_known());
        assert_eq!(event.payload["platform_name"], UNKNOWN_PLATFORM);
    }

    #[test]
    fn test_malformed_json() {
        for body in ["{not json", "[1,2,3]", ""] {
            let err = parser()
                .parse_event(body.as_bytes(), &HashMap::new(), true)
                .unwrap_err();
            assert_eq!(webhook_kind(err), WebhookErrorKind::MalformedPayload);
        }
    }

    #[test]
    fn test_verification_disabled_accepts_unsigned_body() {
        let event = parser()
            .parse_event(BODY.as_bytes(), &HashMap::new(), false)
            .unwrap();
        assert_eq!(event.event_name, "broadcaster_join_channel");
    }

    #[test]
    fn test_secret_never_appears_in_errors() {
        let err = parser()
            .parse_event(BODY.as_bytes(), &HashMap::from([("Agora-Signature".to_string(), "00".to_string())]), true)
            .unwrap_err();
        assert!(!err.to_string().contains(SECRET));
    }
}
