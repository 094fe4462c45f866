//! Secure key handling with automatic zeroization.
//!
//! [`KeyPair`] owns a P-256 private scalar used to issue certificates and
//! sign documents. The scalar is held in a [`secrecy::Secret`] so it is
//! zeroized on drop and never shows up in `Debug` output.

use elliptic_curve::sec1::ToEncodedPoint;
use p256::ecdsa::SigningKey;
use p256::{PublicKey, SecretKey};
use rand_core::OsRng;
use secrecy::{ExposeSecret, Secret};
use std::fmt;

/// PEM tag used for private key files.
pub const EC_PRIVATE_KEY_TAG: &str = "EC PRIVATE KEY";

/// Error type for key operations.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Invalid key size: expected {expected}, got {got}")]
    InvalidKeySize { expected: usize, got: usize },

    #[error("Invalid key format: {0}")]
    InvalidFormat(String),

    #[error("Cryptographic operation failed: {0}")]
    CryptoError(String),
}

/// Anything that can name the subject of a certificate.
///
/// Implemented for full key pairs and bare public keys, so authority can be
/// delegated to a subject whose private key the issuer never sees.
pub trait HasPublicKey {
    fn public_key(&self) -> PublicKey;
}

impl HasPublicKey for PublicKey {
    fn public_key(&self) -> PublicKey {
        *self
    }
}

impl<T: HasPublicKey + ?Sized> HasPublicKey for &T {
    fn public_key(&self) -> PublicKey {
        (**self).public_key()
    }
}

/// P-256 signing key pair.
///
/// The key material is automatically zeroized when dropped.
pub struct KeyPair {
    /// The secret key bytes wrapped in secrecy.
    inner: Secret<[u8; 32]>,

    /// Public half, derived once at construction.
    public: PublicKey,
}

impl KeyPair {
    /// Generate a fresh random key pair.
    pub fn generate() -> Self {
        let secret_key = SecretKey::random(&mut OsRng);
        Self::from_secret_key(&secret_key)
    }

    /// Create from raw bytes.
    ///
    /// # Arguments
    /// * `bytes` - 32-byte P-256 private scalar
    ///
    /// # Security
    /// The input bytes are copied and the original should be zeroized by the caller.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != 32 {
            return Err(KeyError::InvalidKeySize {
                expected: 32,
                got: bytes.len(),
            });
        }

        let mut key_array = [0u8; 32];
        key_array.copy_from_slice(bytes);

        let secret_key = SecretKey::from_bytes((&key_array).into())
            .map_err(|e| KeyError::CryptoError(e.to_string()))?;
        let public = secret_key.public_key();

        Ok(Self {
            inner: Secret::new(key_array),
            public,
        })
    }

    /// Create from SEC1-encoded PEM.
    pub fn from_sec1_pem(pem_content: &str) -> Result<Self, KeyError> {
        let parsed = pem::parse(pem_content.as_bytes())
            .map_err(|e| KeyError::InvalidFormat(e.to_string()))?;

        if parsed.tag() != EC_PRIVATE_KEY_TAG {
            return Err(KeyError::InvalidFormat(format!(
                "Expected {}, got {}",
                EC_PRIVATE_KEY_TAG,
                parsed.tag()
            )));
        }

        let secret_key = SecretKey::from_sec1_der(parsed.contents())
            .map_err(|e| KeyError::InvalidFormat(e.to_string()))?;

        Ok(Self::from_secret_key(&secret_key))
    }

    /// Export the private key as SEC1 PEM.
    ///
    /// # Security
    /// The returned string contains the private key; write it with restrictive permissions.
    pub fn to_sec1_pem(&self) -> Result<String, KeyError> {
        let der = self
            .as_secret_key()?
            .to_sec1_der()
            .map_err(|e| KeyError::CryptoError(e.to_string()))?;
        let encoded = pem::Pem::new(EC_PRIVATE_KEY_TAG, der.to_vec());
        Ok(pem::encode(&encoded))
    }

    /// The public half of this key pair.
    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Compressed SEC1 encoding of the public key (33 bytes).
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.public.to_encoded_point(true).as_bytes().to_vec()
    }

    /// ECDSA signing key for this pair.
    ///
    /// # Security
    /// The private key is only exposed for the lifetime of the returned value.
    pub fn signing_key(&self) -> Result<SigningKey, KeyError> {
        Ok(SigningKey::from(self.as_secret_key()?))
    }

    fn as_secret_key(&self) -> Result<SecretKey, KeyError> {
        SecretKey::from_bytes(self.inner.expose_secret().into())
            .map_err(|e| KeyError::CryptoError(e.to_string()))
    }

    fn from_secret_key(secret_key: &SecretKey) -> Self {
        let mut key_array = [0u8; 32];
        key_array.copy_from_slice(&secret_key.to_bytes());
        Self {
            inner: Secret::new(key_array),
            public: secret_key.public_key(),
        }
    }
}

impl HasPublicKey for KeyPair {
    fn public_key(&self) -> PublicKey {
        self.public
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyPair([REDACTED])")
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        // Deep copy the secret bytes
        let mut new_bytes = [0u8; 32];
        new_bytes.copy_from_slice(self.inner.expose_secret());
        Self {
            inner: Secret::new(new_bytes),
            public: self.public,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_bytes() {
        let bytes = [0x42u8; 32];
        let key = KeyPair::from_bytes(&bytes).unwrap();

        // Public key should be 33 bytes (compressed)
        assert_eq!(key.public_key_bytes().len(), 33);
    }

    #[test]
    fn test_key_invalid_size() {
        let bytes = [0x42u8; 16]; // Too short
        let result = KeyPair::from_bytes(&bytes);
        assert!(matches!(result, Err(KeyError::InvalidKeySize { .. })));
    }

    #[test]
    fn test_key_zero_scalar_rejected() {
        let result = KeyPair::from_bytes(&[0u8; 32]);
        assert!(matches!(result, Err(KeyError::CryptoError(_))));
    }

    #[test]
    fn test_key_debug_redacted() {
        let bytes = [0x42u8; 32];
        let key = KeyPair::from_bytes(&bytes).unwrap();

        let debug_str = format!("{:?}", key);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("42"));
    }

    #[test]
    fn test_sec1_pem_roundtrip_keeps_public_key() {
        let key = KeyPair::generate();
        let pem = key.to_sec1_pem().unwrap();
        assert!(pem.contains(EC_PRIVATE_KEY_TAG));

        let restored = KeyPair::from_sec1_pem(&pem).unwrap();
        assert_eq!(restored.public_key(), key.public_key());
    }

    #[test]
    fn test_sec1_pem_roundtrip_keeps_secret_bytes() {
        let bytes = [0x42u8; 32];
        let key = KeyPair::from_bytes(&bytes).unwrap();

        let restored = KeyPair::from_sec1_pem(&key.to_sec1_pem().unwrap()).unwrap();
        assert_eq!(&restored.signing_key().unwrap().to_bytes()[..], &bytes[..]);
    }

    #[test]
    fn test_from_sec1_pem_rejects_wrong_tag() {
        let encoded = pem::encode(&pem::Pem::new("PUBLIC KEY", vec![1, 2, 3]));
        let result = KeyPair::from_sec1_pem(&encoded);
        assert!(matches!(result, Err(KeyError::InvalidFormat(_))));
    }

    #[test]
    fn test_public_key_is_subject() {
        let key = KeyPair::generate();
        let public = key.public_key();
        assert_eq!(HasPublicKey::public_key(&public), public);
        assert_eq!(HasPublicKey::public_key(&&key), public);
    }
}
