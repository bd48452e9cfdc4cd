//! Response signature verification
//!
//! The remote authority may sign each pull response with
//! `hex(HMAC-SHA256(api_key, timestamp + "." + body))` and send the result in
//! `X-Signature` next to `X-Timestamp`. Signing is optional: when either
//! header is missing the payload is accepted.

use crate::error::{AppError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Verifies pull responses against the shared API key
#[derive(Clone)]
pub struct SignatureVerifier {
    key: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(api_key: &str) -> Self {
        Self {
            key: api_key.as_bytes().to_vec(),
        }
    }

    fn digest(&self, timestamp: &str, body: &str) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Lowercase hex HMAC over `timestamp.body`
    pub fn sign(&self, timestamp: &str, body: &str) -> Result<String> {
        self.digest(timestamp, body).map(hex::encode)
    }

    /// Returns `true` when the signature matches, or when the response was not signed.
    ///
    /// Empty header values count as absent. The provided signature is hex-decoded
    /// (either case); malformed hex fails. Digests are compared in constant time.
    pub fn verify(&self, timestamp: Option<&str>, body: &str, signature: Option<&str>) -> bool {
        let (Some(timestamp), Some(signature)) = (
            timestamp.filter(|t| !t.is_empty()),
            signature.filter(|s| !s.is_empty()),
        ) else {
            return true;
        };

        let Ok(provided) = hex::decode(signature) else {
            return false;
        };
        let Ok(expected) = self.digest(timestamp, body) else {
            return false;
        };

        if expected.len() != provided.len() {
            return false;
        }
        expected.ct_eq(&provided).into()
    }
}
