//! Channel access tokens.
//!
//! A token is `base64(json({"signature", "content"}))` where `signature` is the hex
//! HMAC-SHA256 of the serialized `content` keyed by the app certificate. Anyone can
//! read the content; only holders of the certificate can verify it.

mod builder;
mod channel;
mod codec;
mod privilege;

pub use builder::{build_token, build_token_with_privileges};
pub use channel::{is_valid_channel_name, MAX_CHANNEL_NAME_LEN};
pub use codec::{decode_token, verify_token, DecodedToken, TokenContent, TokenMessage};
pub use privilege::{Privilege, Privileges, Role};
