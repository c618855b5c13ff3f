//! Request authentication trait and the HTTP Basic implementation.

use reqwest_middleware::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{config_error, ConfigErrorKind, Error};

/// Authentication method for HTTP requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// Standard Bearer token
    BearerToken,
    /// HTTP Basic authentication
    BasicAuth { username: String },
}

/// Trait for authenticating outbound HTTP requests.
pub trait ProviderAuth: Send + Sync {
    /// Get the authentication method used.
    fn auth_method(&self) -> AuthMethod;

    /// Apply authentication to a request builder.
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder;
}

/// HTTP Basic authentication with the customer id and customer secret.
///
/// Produces `Authorization: Basic base64(customer_id:customer_secret)`.
pub struct BasicAuth {
    username: String,
    password: SecretString,
}

impl BasicAuth {
    /// Create a Basic authenticator.
    ///
    /// # Arguments
    ///
    /// * `username` - Customer id
    /// * `password` - Customer secret (stored securely)
    pub fn new(username: &str, password: SecretString) -> Result<Self, Error> {
        if username.is_empty() {
            return Err(config_error(
                ConfigErrorKind::MissingCustomerId,
                "Customer ID cannot be empty",
            ));
        }

        if password.expose_secret().is_empty() {
            return Err(config_error(
                ConfigErrorKind::MissingCustomerSecret,
                "Customer Secret cannot be empty",
            ));
        }

        Ok(Self {
            username: username.to_string(),
            password,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl ProviderAuth for BasicAuth {
    fn auth_method(&self) -> AuthMethod {
        AuthMethod::BasicAuth {
            username: self.username.clone(),
        }
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(self.password.expose_secret()))
    }
}
