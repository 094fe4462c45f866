//! Signed envelope shared by certificates and application documents.
//!
//! An envelope pairs a serializable body with a detached signature:
//!
//! ```text
//! { "body": { ...fields... }, "signature": "<base64url DER ECDSA>" }
//! ```
//!
//! The signature covers the canonical JSON encoding of `body` and nothing
//! else. Canonical means serde's declaration-order struct encoding; bodies
//! that hold sets must use ordered collections so the bytes are stable.

use crate::chain::error::{BuildError, CodecError};
use crate::modules::crypto;
use crate::modules::secure_keys::KeyPair;
use p256::PublicKey;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A body together with the issuer's signature over its canonical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope<T> {
    /// The signed fields.
    pub body: T,

    /// Base64url DER ECDSA signature over `signing_bytes(body)`.
    pub signature: String,
}

/// Canonical byte encoding of an envelope body.
pub fn signing_bytes<T: Serialize>(body: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(body).map_err(|e| CodecError::Encode(e.to_string()))
}

impl<T: Serialize> SignedEnvelope<T> {
    /// Sign `body` with `key` and wrap it.
    pub fn seal(body: T, key: &KeyPair) -> Result<Self, BuildError> {
        let bytes = signing_bytes(&body)?;
        let signature = crypto::sign(key, &bytes)?;
        Ok(Self { body, signature })
    }

    /// Check the signature against `public_key`.
    ///
    /// Returns `false` when the body cannot be re-encoded.
    pub fn verify_signature(&self, public_key: &PublicKey) -> bool {
        match signing_bytes(&self.body) {
            Ok(bytes) => crypto::verify_signature(public_key, &bytes, &self.signature),
            Err(_) => false,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(|e| CodecError::Encode(e.to_string()))
    }
}

impl<T: DeserializeOwned> SignedEnvelope<T> {
    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        if json.trim().is_empty() {
            return Err(CodecError::Empty);
        }
        serde_json::from_str(json).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
