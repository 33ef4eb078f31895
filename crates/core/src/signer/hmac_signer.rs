//! HMAC-SHA256 request signer.

use std::fmt;

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

use super::{canonical_body, SignerError};

type HmacSha256 = Hmac<Sha256>;

/// Produces lowercase hex HMAC-SHA256 tags over `"<timestamp>:<body>"`.
///
/// The secret is the only state and is never mutated, so a single signer can
/// be shared across concurrent requests.
#[derive(Clone)]
pub struct Signer {
    secret: Vec<u8>,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Signer {
    /// Create a signer. An empty secret is a configuration error.
    pub fn new(secret: impl Into<String>) -> Result<Self, SignerError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(SignerError::MissingSecret);
        }
        Ok(Self {
            secret: secret.into_bytes(),
        })
    }

    /// Sign a JSON body, canonicalizing it first.
    pub fn sign(&self, timestamp: i64, body: &Value) -> Result<String, SignerError> {
        self.sign_canonical(timestamp, &canonical_body(body))
    }

    /// Sign an already canonical body string.
    pub fn sign_canonical(&self, timestamp: i64, canonical: &str) -> Result<String, SignerError> {
        let mut mac = self.mac()?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b":");
        mac.update(canonical.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check a signature in constant time.
    pub fn verify(&self, timestamp: i64, canonical: &str, signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = self.mac() else {
            return false;
        };
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b":");
        mac.update(canonical.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }

    fn mac(&self) -> Result<HmacSha256, SignerError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| SignerError::InvalidKey(e.to_string()))
    }
}

/// Seconds since the Unix epoch, taken fresh for every signed request.
pub fn current_unix_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}
