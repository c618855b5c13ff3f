//! Error types for the `domain` layer.
use rtc_auth::error::{
    Error as AuthError, ErrorKind as AuthErrorKind, HttpErrorKind as AuthHttpErrorKind,
};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error, so callers that need the exact `rtc_auth` kind (for example which
/// webhook signature failed) can still reach it through [`Error::auth_error_kind`].
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    /// Missing or invalid identity or secret material.
    Config,
    /// A token could not be built or verified.
    Token,
    /// An inbound webhook was rejected.
    Webhook,
    /// Caller input failed validation before any request was made.
    Validation(String),
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    /// The provider answered with an HTTP error status.
    Status(u16),
    /// The provider answered with a body we could not use.
    InvalidResponse,
    Other(String),
}

impl Error {
    /// The `rtc_auth` error kind this error was translated from, if any.
    pub fn auth_error_kind(&self) -> Option<&AuthErrorKind> {
        self.source
            .as_ref()?
            .downcast_ref::<AuthError>()
            .map(|err| &err.error_kind)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Domain Error: {:?}: {}", self.error_kind, source),
            None => write!(f, "Domain Error: {:?}", self.error_kind),
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

// This is where we translate errors from the `rtc_auth` layer to the `domain` layer.
impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        let error_kind = match &err.error_kind {
            AuthErrorKind::Config(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
            AuthErrorKind::Token(_) => DomainErrorKind::Internal(InternalErrorKind::Token),
            AuthErrorKind::Webhook(_) => DomainErrorKind::Internal(InternalErrorKind::Webhook),
            AuthErrorKind::Http(AuthHttpErrorKind::BuilderFailed) => DomainErrorKind::Internal(
                InternalErrorKind::Other("Failed to build HTTP client".to_string()),
            ),
            AuthErrorKind::Http(AuthHttpErrorKind::Status(status)) => {
                DomainErrorKind::External(ExternalErrorKind::Status(*status))
            }
            AuthErrorKind::Http(AuthHttpErrorKind::InvalidResponse) => {
                DomainErrorKind::External(ExternalErrorKind::InvalidResponse)
            }
            AuthErrorKind::Http(AuthHttpErrorKind::RequestFailed)
            | AuthErrorKind::Http(AuthHttpErrorKind::Network) => {
                DomainErrorKind::External(ExternalErrorKind::Network)
            }
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

/// Helper function to create configuration errors.
pub(crate) fn config_error(message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
    }
}

/// Helper function to create validation errors.
pub(crate) fn validation_error(message: &str) -> Error {
    Error {
        source: None,
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Validation(message.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtc_auth::error::{http_error, webhook_error, WebhookErrorKind};
    use rtc_auth::signature::SignatureAlgorithm;

    #[test]
    fn test_webhook_error_keeps_auth_kind() {
        let err: Error = webhook_error(
            WebhookErrorKind::InvalidSignature(SignatureAlgorithm::Sha256),
            "Invalid signature (SHA256)",
        )
        .into();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Webhook)
        );
        assert_eq!(
            err.auth_error_kind(),
            Some(&AuthErrorKind::Webhook(WebhookErrorKind::InvalidSignature(
                SignatureAlgorithm::Sha256
            )))
        );
    }

    #[test]
    fn test_http_status_becomes_external() {
        let err: Error = http_error(AuthHttpErrorKind::Status(401), "invalid credentials").into();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Status(401))
        );
        assert!(err.to_string().contains("invalid credentials"));
    }

    #[test]
    fn test_validation_error_has_no_auth_kind() {
        let err = validation_error("Resource ID cannot be empty");
        assert!(err.auth_error_kind().is_none());
    }
}
