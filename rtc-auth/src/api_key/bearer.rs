//! Standard Bearer token authentication.

use reqwest_middleware::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};

use super::{AuthMethod, ProviderAuth};

/// Standard Bearer token authentication.
///
/// Uses the standard `Authorization: Bearer <token>` header pattern.
pub struct BearerTokenAuth {
    token: SecretString,
}

impl BearerTokenAuth {
    /// Create a new Bearer token authenticator.
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }

    /// Get a reference to the token.
    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

impl ProviderAuth for BearerTokenAuth {
    fn auth_method(&self) -> AuthMethod {
        AuthMethod::BearerToken
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.token.expose_secret())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;

    #[test]
    fn test_bearer_token_header() {
        let auth = BearerTokenAuth::new(SecretString::new("test_token".to_string()));
        let client = reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build();

        let request = auth
            .authenticate(client.get("http://localhost"))
            .build()
            .unwrap();

        assert_eq!(auth.auth_method(), AuthMethod::BearerToken);
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer test_token");
    }
}
