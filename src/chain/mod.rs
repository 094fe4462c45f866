//! Delegated-trust certificate chains.
//!
//! An issuer key signs a certificate granting a subject key a rank and a
//! set of document kinds. The subject can in turn issue certificates that
//! embed the one it received, forming a chain by value. A document carries
//! only its terminal certificate; validation walks the embedded ancestors
//! back to the root.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐  encode   ┌───────────┐  decode   ┌─────────────────┐
//! │ CertificateBuilder │──────────▶│  Document │──────────▶│ ChainValidator  │
//! │  (sign, embed)     │           │ (kind +   │           │ (walk, per-link │
//! └────────────────────┘           │  chain)   │           │  verify + kind) │
//!                                  └───────────┘           └─────────────────┘
//!                                                                   │
//!                                                                   ▼
//!                                                          ┌─────────────────┐
//!                                                          │verify_certificate│
//!                                                          │ sig/expiry/rank │
//!                                                          └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use certchain::chain::{create_certificate, verify_document_with_chain};
//! use certchain::document::BaseDocument;
//! use certchain::KeyPair;
//!
//! let root = KeyPair::generate();
//! let delegate = KeyPair::generate();
//! let certificate = create_certificate(&root, &delegate, 1, ["base"], 3600, None)?;
//!
//! let document = BaseDocument::new().with_certificate(&certificate)?;
//! match verify_document_with_chain(&document, 10) {
//!     Ok(verdict) => { /* trust the document as verdict.signer at verdict.rank */ }
//!     Err(e) => { /* hard deny */ }
//! }
//! ```

pub mod builder;
pub mod codec;
pub mod error;
pub mod types;
pub mod validator;

// Re-export main types for convenience
pub use builder::{create_certificate, CertificateBuilder, DEFAULT_VALIDITY_SECONDS};
pub use error::{BuildError, CodecError, VerifyError};
pub use types::{Certificate, CertificateBody, ChainVerdict, Links, VerifiedCertificate};
pub use validator::{
    verify_certificate, verify_certificate_at, verify_document_with_chain,
    verify_encoded_certificate, ChainValidator, ChainVerifier,
};
