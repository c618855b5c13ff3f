//! HMAC signing and constant-time comparison shared by tokens and webhooks.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{config_error, ConfigErrorKind, Error};

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

/// HMAC digest used to sign a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// HMAC-SHA1, carried by the v1 webhook signature header.
    Sha1,
    /// HMAC-SHA256, used for tokens and the v2 webhook signature header.
    Sha256,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "SHA1",
            SignatureAlgorithm::Sha256 => "SHA256",
        }
    }

    /// Compute the lowercase hex HMAC of `payload` keyed by `secret`.
    pub fn sign_hex(&self, secret: &[u8], payload: &[u8]) -> Result<String, Error> {
        match self {
            SignatureAlgorithm::Sha1 => hmac_sha1_hex(secret, payload),
            SignatureAlgorithm::Sha256 => hmac_sha256_hex(secret, payload),
        }
    }
}

/// Lowercase hex HMAC-SHA256.
pub fn hmac_sha256_hex(secret: &[u8], payload: &[u8]) -> Result<String, Error> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| invalid_key())?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Lowercase hex HMAC-SHA1.
pub fn hmac_sha1_hex(secret: &[u8], payload: &[u8]) -> Result<String, Error> {
    let mut mac = HmacSha1::new_from_slice(secret).map_err(|_| invalid_key())?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn invalid_key() -> Error {
    config_error(ConfigErrorKind::InvalidSecret, "Invalid HMAC key")
}

/// Compare two byte strings without short-circuiting on the first difference.
///
/// Slices of different lengths compare unequal; the length itself is not secret.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_sha256_known_vector() {
        // RFC 4231 test case 2
        let digest = hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            digest,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_hmac_sha1_known_vector() {
        // RFC 2202 test case 2
        let digest = hmac_sha1_hex(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(digest, "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79");
    }

    #[test]
    fn test_sign_hex_dispatches_on_algorithm() {
        let sha1 = SignatureAlgorithm::Sha1.sign_hex(b"k", b"body").unwrap();
        let sha256 = SignatureAlgorithm::Sha256.sign_hex(b"k", b"body").unwrap();
        assert_eq!(sha1.len(), 40);
        assert_eq!(sha256.len(), 64);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abcdef", b"abcdef"));
        assert!(!constant_time_eq(b"abcdef", b"abcdeg"));
        assert!(!constant_time_eq(b"abc", b"abcdef"));
        assert!(constant_time_eq(b"", b""));
    }
}
