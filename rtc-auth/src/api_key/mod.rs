//! Credential injection for outbound REST requests.
//!
//! The recording API authenticates with HTTP Basic auth built from the customer
//! id and secret; bearer tokens are supported for gateways that front it.

mod auth;
mod bearer;

pub use auth::{AuthMethod, BasicAuth, ProviderAuth};
pub use bearer::BearerTokenAuth;
