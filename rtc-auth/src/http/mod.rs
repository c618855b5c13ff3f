//! HTTP client building and the JSON transport used by REST gateways.

mod client;
mod transport;

pub use client::{AuthenticatedClient, AuthenticatedClientBuilder, HttpClientConfig};
pub use transport::{HttpTransport, Transport};
