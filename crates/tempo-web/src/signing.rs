//! HMAC-SHA256 value signing with secret rotation.
//!
//! A signed value is `"{value}.{signature}"` where the signature is the
//! unpadded URL-safe base64 of `HMAC-SHA256(secret, value)`. A [`Signer`]
//! built from `"new,old"` signs with `new` and accepts signatures made
//! with either secret.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Errors raised when building a signer or computing a signature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    /// The secret list contained no usable secret.
    #[error("no signing secret configured")]
    NoSecrets,

    /// The MAC rejected the key.
    #[error("invalid signing key")]
    InvalidKey,
}

/// Signs and verifies short string values.
#[derive(Clone)]
pub struct Signer {
    secrets: Vec<Vec<u8>>,
}

impl core::fmt::Debug for Signer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Signer")
            .field("secrets", &self.secrets.len())
            .finish()
    }
}

impl Signer {
    /// Build a signer from a comma-separated list of secrets.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::NoSecrets`] if the list holds no non-empty
    /// entry.
    pub fn new(secrets: &str) -> Result<Self, SigningError> {
        let secrets: Vec<Vec<u8>> = secrets
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.as_bytes().to_vec())
            .collect();
        if secrets.is_empty() {
            return Err(SigningError::NoSecrets);
        }
        Ok(Self { secrets })
    }

    /// Append a signature made with the first secret.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidKey`] if the MAC cannot be keyed.
    pub fn sign(&self, value: &str) -> Result<String, SigningError> {
        let key = self.secrets.first().ok_or(SigningError::NoSecrets)?;
        let mac = keyed(key, value)?;
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{value}.{signature}"))
    }

    /// Verify a signed value against every secret and return the value.
    ///
    /// Returns `None` for a missing separator, malformed base64 or a
    /// signature no secret produces.
    pub fn unsign<'a>(&self, signed: &'a str) -> Option<&'a str> {
        let (value, signature) = signed.rsplit_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        self.secrets
            .iter()
            .filter_map(|key| keyed(key, value).ok())
            .any(|mac| mac.verify_slice(&signature).is_ok())
            .then_some(value)
    }
}

fn keyed(key: &[u8], value: &str) -> Result<HmacSha256, SigningError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SigningError::InvalidKey)?;
    mac.update(value.as_bytes());
    Ok(mac)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn signed_value_verifies() {
        let signer = Signer::new("s3cret").unwrap();
        let signed = signer.sign("hello").unwrap();
        assert!(signed.starts_with("hello."));
        assert_eq!(signer.unsign(&signed), Some("hello"));
    }

    #[test]
    fn tampering_is_detected() {
        let signer = Signer::new("s3cret").unwrap();
        let signed = signer.sign("hello").unwrap();
        let forged = signed.replacen("hello", "hellp", 1);
        assert_eq!(signer.unsign(&forged), None);
        assert_eq!(signer.unsign("hello"), None);
        assert_eq!(signer.unsign("hello.!!!"), None);
    }

    #[test]
    fn rotation_signs_with_first_and_accepts_all() {
        let old = Signer::new("old").unwrap();
        let rotated = Signer::new("new, old").unwrap();
        let legacy = old.sign("v").unwrap();
        assert_eq!(rotated.unsign(&legacy), Some("v"));

        let fresh = rotated.sign("v").unwrap();
        assert_eq!(old.unsign(&fresh), None);
    }

    #[test]
    fn values_may_contain_dots() {
        let signer = Signer::new("k").unwrap();
        let signed = signer.sign("a.b.c").unwrap();
        assert_eq!(signer.unsign(&signed), Some("a.b.c"));
    }

    #[test]
    fn empty_secret_list_is_rejected() {
        assert_eq!(Signer::new(" , ").err(), Some(SigningError::NoSecrets));
    }
}
