//! Payload authentication
//!
//! Every envelope leaving the engine carries a base64 HMAC-SHA256 tag over
//! the canonical serialization of its payload, and every inbound envelope
//! must verify before its payload is trusted. The key is the signing key
//! shared with the remote service; its raw UTF-8 bytes key the mac directly.

use core::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::envelope::{Envelope, Payload};
use crate::errors::SignatureError;

type HmacSha256 = Hmac<Sha256>;

// ----------------------------------------------------------------------------
// Signing Key
// ----------------------------------------------------------------------------

/// Shared signing secret.
///
/// Debug output is redacted so the key cannot leak through logs.
#[derive(Clone)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<&str> for SigningKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SigningKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

// ----------------------------------------------------------------------------
// Signature Codec
// ----------------------------------------------------------------------------

/// Computes and verifies payload authentication tags.
#[derive(Debug, Clone)]
pub struct SignatureCodec {
    key: SigningKey,
}

impl SignatureCodec {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Compute the base64 tag over a payload's canonical serialization.
    pub fn sign(&self, payload: &Payload) -> Result<String, SignatureError> {
        let canonical = serde_json::to_string(payload)?;
        let mut mac = HmacSha256::new_from_slice(self.key.as_bytes())
            .map_err(|_| SignatureError::Key)?;
        mac.update(canonical.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// Check a tag against a payload.
    ///
    /// The mac comparison is constant-time. Any malformed input (tag that is
    /// not base64, payload that cannot serialize) verifies as false rather
    /// than erroring: a mismatch and a nonsense tag get the same treatment.
    pub fn verify(&self, payload: &Payload, tag: &str) -> bool {
        let canonical = match serde_json::to_string(payload) {
            Ok(canonical) => canonical,
            Err(_) => return false,
        };
        let claimed = match BASE64.decode(tag) {
            Ok(claimed) => claimed,
            Err(_) => return false,
        };
        let mut mac = match HmacSha256::new_from_slice(self.key.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(canonical.as_bytes());
        mac.verify_slice(&claimed).is_ok()
    }

    /// Sign an envelope in place, filling its signature object.
    pub fn seal(&self, envelope: &mut Envelope) -> Result<(), SignatureError> {
        envelope.signature.hmac = self.sign(&envelope.payload)?;
        Ok(())
    }

    /// Verify an envelope's attached signature.
    pub fn check(&self, envelope: &Envelope) -> bool {
        self.verify(&envelope.payload, &envelope.signature.hmac)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
