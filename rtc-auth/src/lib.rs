//! # rtc-auth
//!
//! The trust boundary of the RTC platform:
//! - Token (credential) building for channel access with per-privilege expiries
//! - Token decoding and signature verification
//! - Webhook event authentication (HMAC-SHA256 / HMAC-SHA1) and normalization
//! - Basic / Bearer authentication for the provider REST API
//! - HTTP transport building with middleware
//!
//! ## Architecture
//!
//! `token` and `webhook` are pure and stateless. They never perform I/O and never
//! hold on to secret material beyond the call that receives it. The `http` and
//! `api_key` modules are only used by REST clients in the `domain` crate.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use secrecy::SecretString;
//! use rtc_auth::{
//!     token::{build_token, Role},
//!     webhook::EventParser,
//! };
//!
//! let token = build_token("app_id", "app_certificate", "room_1", 42, Role::Publisher, 3600, 0)?;
//! let parser = EventParser::new(SecretString::new("customer_secret".to_string()));
//! let event = parser.parse_event(body, &headers, true)?;
//! ```

pub mod api_key;
pub mod error;
pub mod http;
pub mod signature;
pub mod token;
pub mod webhook;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
