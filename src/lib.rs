//! Delegated-trust certificate chains over ECDSA P-256.
//!
//! - [`modules`]: key pairs and the signing primitive
//! - [`envelope`]: the signed envelope shared by certificates and documents
//! - [`chain`]: certificate issuance, encoding and chain validation
//! - [`document`]: documents carrying a terminal certificate
//! - [`config`]: verifier settings from the environment

pub mod chain;
pub mod config;
pub mod document;
pub mod envelope;
pub mod modules;

pub use chain::{
    create_certificate, verify_certificate, verify_document_with_chain, BuildError, Certificate,
    CertificateBuilder, ChainValidator, ChainVerdict, ChainVerifier, CodecError, VerifyError,
};
pub use config::{load_settings, IssuanceSettings, Settings, VerifierSettings};
pub use document::{BaseDocument, Document};
pub use envelope::SignedEnvelope;
pub use modules::secure_keys::{HasPublicKey, KeyError, KeyPair};
pub use p256::PublicKey;
