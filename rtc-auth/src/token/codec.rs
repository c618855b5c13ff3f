//! Token wire format.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::privilege::{Privilege, Privileges};
use crate::error::{token_error, Error, TokenErrorKind};
use crate::signature::{constant_time_eq, hmac_sha256_hex};

/// Inner message carried base64-encoded in [`TokenContent::msg`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMessage {
    /// Random value making otherwise identical tokens distinct.
    pub salt: u32,
    /// Issue time, unix seconds.
    pub ts: i64,
    /// Privilege wire code to expiry in seconds.
    pub privileges: BTreeMap<u16, u32>,
}

impl TokenMessage {
    pub(crate) fn new(salt: u32, issued_at: i64, privileges: &Privileges) -> Self {
        Self {
            salt,
            ts: issued_at,
            privileges: privileges
                .iter()
                .map(|(privilege, expire)| (privilege.code(), *expire))
                .collect(),
        }
    }

    fn encode(&self) -> Result<String, Error> {
        let json = serde_json::to_vec(self).map_err(malformed)?;
        Ok(STANDARD.encode(json))
    }
}

/// The signed part of a token. Field order here is the serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenContent {
    /// Issuer (app id).
    pub iss: String,
    /// Absolute expiry, unix seconds.
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
    /// base64 of the JSON-serialized [`TokenMessage`].
    pub msg: String,
}

impl TokenContent {
    pub(crate) fn new(
        app_id: &str,
        expire_at: i64,
        channel_name: &str,
        subject_id: u32,
        message: &TokenMessage,
    ) -> Result<Self, Error> {
        Ok(Self {
            iss: app_id.to_string(),
            exp: expire_at,
            channel: (!channel_name.is_empty()).then(|| channel_name.to_string()),
            uid: (subject_id > 0).then_some(subject_id),
            msg: message.encode()?,
        })
    }

    /// The exact bytes covered by the signature.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(malformed)
    }

    /// Decode the inner message.
    pub fn message(&self) -> Result<TokenMessage, Error> {
        let json = STANDARD.decode(&self.msg).map_err(malformed)?;
        serde_json::from_slice(&json).map_err(malformed)
    }

    pub(crate) fn sign(&self, app_secret: &str) -> Result<String, Error> {
        hmac_sha256_hex(app_secret.as_bytes(), &self.signing_bytes()?)
    }
}

#[derive(Serialize, Deserialize)]
struct SignedToken {
    signature: String,
    content: TokenContent,
}

/// Sign `content` and produce the opaque token string.
pub(crate) fn encode_token(content: TokenContent, app_secret: &str) -> Result<String, Error> {
    let signature = content.sign(app_secret)?;
    let json = serde_json::to_vec(&SignedToken { signature, content }).map_err(malformed)?;
    Ok(STANDARD.encode(json))
}

/// A token read back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    pub signature: String,
    pub content: TokenContent,
    pub message: TokenMessage,
}

impl DecodedToken {
    pub fn app_id(&self) -> &str {
        &self.content.iss
    }

    pub fn channel_name(&self) -> Option<&str> {
        self.content.channel.as_deref()
    }

    /// Subject id, 0 when the token is valid for any subject.
    pub fn subject_id(&self) -> u32 {
        self.content.uid.unwrap_or(0)
    }

    pub fn expire_at(&self) -> i64 {
        self.content.exp
    }

    pub fn issued_at(&self) -> i64 {
        self.message.ts
    }

    pub fn salt(&self) -> u32 {
        self.message.salt
    }

    /// Known privileges with their expiries. Unknown wire codes are skipped.
    pub fn privileges(&self) -> Privileges {
        self.message
            .privileges
            .iter()
            .filter_map(|(code, expire)| Privilege::from_code(*code).map(|p| (p, *expire)))
            .collect()
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.content.exp
    }
}

/// Read a token without verifying it.
pub fn decode_token(token: &str) -> Result<DecodedToken, Error> {
    let json = STANDARD.decode(token.trim()).map_err(malformed)?;
    let signed: SignedToken = serde_json::from_slice(&json).map_err(malformed)?;
    let message = signed.content.message()?;

    Ok(DecodedToken {
        signature: signed.signature,
        content: signed.content,
        message,
    })
}

/// Read a token and check its signature against `app_secret`.
///
/// Expiry is not checked here, see [`DecodedToken::is_expired_at`].
pub fn verify_token(token: &str, app_secret: &str) -> Result<DecodedToken, Error> {
    let decoded = decode_token(token)?;
    let expected = decoded.content.sign(app_secret)?;

    if !constant_time_eq(expected.as_bytes(), decoded.signature.as_bytes()) {
        return Err(token_error(
            TokenErrorKind::SignatureMismatch,
            "Token signature does not match its content",
        ));
    }

    Ok(decoded)
}

fn malformed<E: std::fmt::Display>(err: E) -> Error {
    token_error(
        TokenErrorKind::Malformed,
        &format!("Token could not be decoded: {}", err),
    )
}
