//! JSON-over-HTTP transport.

use async_trait::async_trait;
use log::*;
use reqwest::StatusCode;
use serde_json::Value;

use super::AuthenticatedClient;
use crate::api_key::ProviderAuth;
use crate::error::{http_error, Error, HttpErrorKind};

/// Message used when a failed response carries no `message` field.
const UNKNOWN_ERROR: &str = "Unknown error";

/// Minimal JSON transport consumed by REST gateways.
///
/// Paths are relative to the transport's base URL.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value, Error>;

    async fn post(&self, path: &str, body: &Value) -> Result<Value, Error>;
}

/// [`Transport`] backed by an [`AuthenticatedClient`].
pub struct HttpTransport {
    client: AuthenticatedClient,
    base_url: String,
    auth: Option<Box<dyn ProviderAuth>>,
}

impl HttpTransport {
    pub fn new(
        client: AuthenticatedClient,
        base_url: &str,
        auth: Option<Box<dyn ProviderAuth>>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authenticate(
        &self,
        request: reqwest_middleware::RequestBuilder,
    ) -> reqwest_middleware::RequestBuilder {
        match &self.auth {
            Some(auth) => auth.authenticate(request),
            None => request,
        }
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        request: reqwest_middleware::RequestBuilder,
    ) -> Result<Value, Error> {
        debug!("{} {}", method, path);

        let response = self.authenticate(request).send().await.map_err(|e| {
            warn!("{} {} failed: {:?}", method, path, e);
            Error::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;
        let body = serde_json::from_str::<Value>(&text);

        if status.is_client_error() || status.is_server_error() {
            let message = body
                .ok()
                .as_ref()
                .and_then(|value| value.get("message"))
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_ERROR)
                .to_string();
            warn!("{} {} returned {}: {}", method, path, status, message);
            return Err(status_error(status, &message));
        }

        body.map_err(|e| {
            warn!("{} {} returned invalid JSON: {:?}", method, path, e);
            http_error(
                HttpErrorKind::InvalidResponse,
                &format!("Invalid JSON response: {}", e),
            )
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Value, Error> {
        let request = self.client.get(self.url(path));
        self.send("GET", path, request).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, Error> {
        let request = self.client.post(self.url(path)).json(body);
        self.send("POST", path, request).await
    }
}

fn status_error(status: StatusCode, message: &str) -> Error {
    http_error(HttpErrorKind::Status(status.as_u16()), message)
}
