//! Error types for certificate construction, encoding and chain validation.

use crate::modules::secure_keys::KeyError;
use thiserror::Error;

/// Errors from encoding or decoding a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Certificate encoding is empty")]
    Empty,

    #[error("Failed to encode certificate: {0}")]
    Encode(String),

    #[error("Malformed certificate: {0}")]
    Decode(String),
}

/// Errors that can occur while issuing a certificate.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Certificate must permit at least one document kind")]
    EmptyPermissionSet,

    #[error("Signing failed: {0}")]
    Key(#[from] KeyError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors that can occur during certificate or chain verification.
///
/// Every variant is a hard deny.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("Invalid signature on certificate from issuer {issuer}")]
    BadSignature { issuer: String },

    #[error("Certificate expired at {not_after}, current time {now}")]
    Expired { not_after: i64, now: i64 },

    #[error("Certificate rank {rank} exceeds ceiling {ceiling}")]
    RankExceeded { rank: i64, ceiling: i64 },

    #[error("Document kind '{kind}' not permitted by certificate at depth {depth}")]
    KindNotPermitted { kind: String, depth: usize },

    #[error("Malformed certificate chain: {0}")]
    Malformed(String),

    #[error("Certificate chain exceeds {max} links")]
    ChainTooDeep { max: usize },

    #[error("Certificate at depth {depth} was not issued by its parent's subject")]
    IssuerMismatch { depth: usize },

    #[error("Root issuer {issuer} is not trusted")]
    UntrustedRoot { issuer: String },

    #[error("Document was not signed by the chain's terminal subject")]
    SignerMismatch,
}

impl From<CodecError> for VerifyError {
    fn from(e: CodecError) -> Self {
        VerifyError::Malformed(e.to_string())
    }
}
