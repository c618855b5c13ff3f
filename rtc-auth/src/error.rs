//! Error types for the `rtc-auth` crate.
//!
//! Follows the same pattern as domain::error with a root Error struct and error kind enums.
//! Messages attached to errors never include secret material.

use std::error::Error as StdError;
use std::fmt;

use crate::signature::SignatureAlgorithm;

/// Top-level error type for rtc-auth crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in rtc-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Config(ConfigErrorKind),
    Token(TokenErrorKind),
    Webhook(WebhookErrorKind),
    Http(HttpErrorKind),
}

/// Missing or invalid identity or secret material.
#[derive(Debug, PartialEq)]
pub enum ConfigErrorKind {
    MissingAppId,
    MissingAppSecret,
    MissingCustomerId,
    MissingCustomerSecret,
    InvalidSecret,
}

/// Errors from token building, decoding and verification.
#[derive(Debug, PartialEq)]
pub enum TokenErrorKind {
    InvalidChannelName,
    InvalidRole,
    InvalidExpiry,
    Malformed,
    SignatureMismatch,
}

/// Errors from webhook validation and decoding.
#[derive(Debug, PartialEq)]
pub enum WebhookErrorKind {
    MalformedPayload,
    MissingField(String),
    InvalidFieldType(String),
    MissingSignature,
    /// The same signature header arrived more than once with different values.
    AmbiguousHeader(String),
    InvalidSignature(SignatureAlgorithm),
}

/// Errors from HTTP client operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Network,
    InvalidResponse,
    Status(u16),
}

impl Error {
    /// The message attached at construction, if the source is a plain message.
    pub fn message(&self) -> Option<String> {
        self.source.as_ref().map(|s| s.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let detail = self.message().unwrap_or_default();
        match &self.error_kind {
            ErrorKind::Config(kind) => write!(f, "Configuration error: {:?} {}", kind, detail),
            ErrorKind::Token(kind) => write!(f, "Token error: {:?} {}", kind, detail),
            ErrorKind::Webhook(kind) => write!(f, "Webhook error: {:?} {}", kind, detail),
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?} {}", kind, detail),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else if err.is_decode() {
            ErrorKind::Http(HttpErrorKind::InvalidResponse)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<reqwest_middleware::Error> for Error {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => err.into(),
            other => Error {
                source: Some(Box::new(other)),
                error_kind: ErrorKind::Http(HttpErrorKind::Network),
            },
        }
    }
}

/// Helper function to create configuration errors.
pub fn config_error(kind: ConfigErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Config(kind),
    }
}

/// Helper function to create token errors.
pub fn token_error(kind: TokenErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Token(kind),
    }
}

/// Helper function to create webhook errors.
pub fn webhook_error(kind: WebhookErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Webhook(kind),
    }
}

/// Helper function to create HTTP errors.
pub fn http_error(kind: HttpErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Http(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = webhook_error(
            WebhookErrorKind::MissingField("eventType".to_string()),
            "Missing required field: eventType",
        );
        let rendered = err.to_string();
        assert!(rendered.starts_with("Webhook error"));
        assert!(rendered.contains("eventType"));
    }

    #[test]
    fn test_source_is_message() {
        let err = token_error(TokenErrorKind::InvalidExpiry, "Token expire time must be greater than 0");
        assert_eq!(
            err.message().as_deref(),
            Some("Token expire time must be greater than 0")
        );
        assert!(StdError::source(&err).is_some());
    }
}
