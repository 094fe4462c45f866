use crate::modules::secure_keys::{KeyError, KeyPair};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ecdsa::signature::{Signer, Verifier};
use elliptic_curve::sec1::ToEncodedPoint;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::PublicKey;
use sha2::{Digest, Sha256};

/// PEM tag used for public key files.
pub const PUBLIC_KEY_TAG: &str = "PUBLIC KEY";

/// Number of digest bytes shown in key identifiers.
const KEY_ID_BYTES: usize = 8;

/// Sign a message with ECDSA P-256 / SHA-256
///
/// # Returns
/// Base64url (unpadded) DER-encoded signature
pub fn sign(key: &KeyPair, message: &[u8]) -> Result<String, KeyError> {
    let signing_key = key.signing_key()?;
    let signature: Signature = signing_key.sign(message);
    Ok(base64url_encode(signature.to_der().as_bytes()))
}

/// Verify a base64url DER-encoded ECDSA signature over `message`
///
/// Undecodable signature text counts as a failed verification.
pub fn verify_signature(public_key: &PublicKey, message: &[u8], signature: &str) -> bool {
    let Ok(signature_bytes) = base64url_decode(signature) else {
        return false;
    };
    let Ok(signature) = Signature::from_der(&signature_bytes) else {
        return false;
    };
    VerifyingKey::from(public_key)
        .verify(message, &signature)
        .is_ok()
}

/// Short hex identifier for a public key: SHA-256 of the compressed point, truncated
pub fn key_id(public_key: &PublicKey) -> String {
    let digest = Sha256::digest(public_key.to_encoded_point(true).as_bytes());
    hex::encode(&digest[..KEY_ID_BYTES])
}

/// Encode a public key as base64url of its compressed SEC1 point
pub fn encode_public_key(public_key: &PublicKey) -> String {
    base64url_encode(public_key.to_encoded_point(true).as_bytes())
}

/// Decode a public key from base64url SEC1 bytes (compressed or uncompressed)
pub fn decode_public_key(encoded: &str) -> Result<PublicKey, KeyError> {
    let bytes = base64url_decode(encoded).map_err(|e| KeyError::InvalidFormat(e.to_string()))?;
    PublicKey::from_sec1_bytes(&bytes).map_err(|e| KeyError::InvalidFormat(e.to_string()))
}

// ==================== Utility Functions ====================

/// Parse a PEM-formatted P-256 public key
pub fn parse_pem_public_key(pem: &str) -> Result<PublicKey, KeyError> {
    let pem_parsed = pem::parse(pem).map_err(|e| KeyError::InvalidFormat(e.to_string()))?;
    public_key_from_pem(&pem_parsed)
}

/// Parse every `PUBLIC KEY` block in a PEM bundle
///
/// Blocks with other tags are skipped.
pub fn parse_pem_public_keys(bundle: &str) -> Result<Vec<PublicKey>, KeyError> {
    let blocks = pem::parse_many(bundle).map_err(|e| KeyError::InvalidFormat(e.to_string()))?;
    blocks
        .iter()
        .filter(|block| block.tag() == PUBLIC_KEY_TAG)
        .map(public_key_from_pem)
        .collect()
}

fn public_key_from_pem(block: &pem::Pem) -> Result<PublicKey, KeyError> {
    if block.tag() != PUBLIC_KEY_TAG {
        return Err(KeyError::InvalidFormat(format!(
            "Expected {}, got {}",
            PUBLIC_KEY_TAG,
            block.tag()
        )));
    }
    PublicKey::from_sec1_bytes(block.contents()).map_err(|e| KeyError::InvalidFormat(e.to_string()))
}

/// Convert a P-256 public key to PEM format
pub fn public_key_to_pem(public_key: &PublicKey) -> String {
    let encoded_point = public_key.to_encoded_point(false);
    let sec1_bytes = encoded_point.as_bytes();
    let pem_encoded = pem::Pem::new(PUBLIC_KEY_TAG, sec1_bytes.to_vec());
    pem::encode(&pem_encoded)
}

/// Base64url encode data without padding
pub fn base64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Base64url decode data without padding
pub fn base64url_decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(data)
}

/// Serde adapter storing a [`PublicKey`] as base64url compressed SEC1.
pub mod public_key_b64 {
    use super::{decode_public_key, encode_public_key};
    use p256::PublicKey;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(key: &PublicKey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_public_key(key))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PublicKey, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        decode_public_key(&encoded).map_err(serde::de::Error::custom)
    }
}
