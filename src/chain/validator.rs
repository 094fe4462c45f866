//! Certificate and chain validation.
//!
//! [`verify_certificate`] validates exactly one link. [`ChainValidator`]
//! walks a document's embedded chain from the terminal certificate to the
//! root, validating every link and requiring the document's kind at every
//! link. The first failing link decides the outcome.

use crate::chain::codec;
use crate::chain::error::VerifyError;
use crate::chain::types::{Certificate, ChainVerdict, VerifiedCertificate};
use crate::config::VerifierSettings;
use crate::document::Document;
use crate::envelope::SignedEnvelope;
use crate::modules::crypto::{self, key_id};
use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;

/// Verify a single certificate's signature, expiry and rank.
///
/// Equality with the ceiling is accepted. The parent is not inspected.
pub fn verify_certificate(
    certificate: &Certificate,
    rank_ceiling: i64,
) -> Result<VerifiedCertificate, VerifyError> {
    verify_certificate_at(certificate, rank_ceiling, Utc::now().timestamp())
}

/// [`verify_certificate`] against an explicit clock reading (unix seconds).
pub fn verify_certificate_at(
    certificate: &Certificate,
    rank_ceiling: i64,
    now: i64,
) -> Result<VerifiedCertificate, VerifyError> {
    let body = &certificate.body;

    // 1. Signature
    let bytes = codec::canonical_bytes(body)?;
    if !crypto::verify_signature(&body.issuer, &bytes, &certificate.signature) {
        warn!(
            "Signature verification failed for certificate from issuer {}",
            key_id(&body.issuer)
        );
        return Err(VerifyError::BadSignature {
            issuer: key_id(&body.issuer),
        });
    }

    // 2. Expiry
    if now >= body.not_after {
        warn!(
            "Certificate for {} expired at {} (now: {})",
            key_id(&body.subject),
            body.not_after,
            now
        );
        return Err(VerifyError::Expired {
            not_after: body.not_after,
            now,
        });
    }

    // 3. Rank
    if body.rank > rank_ceiling {
        warn!(
            "Certificate for {} has rank {} above ceiling {}",
            key_id(&body.subject),
            body.rank,
            rank_ceiling
        );
        return Err(VerifyError::RankExceeded {
            rank: body.rank,
            ceiling: rank_ceiling,
        });
    }

    Ok(VerifiedCertificate {
        subject: body.subject,
        rank: body.rank,
        permitted_kinds: body.permitted_kinds.clone(),
        not_after: body.not_after,
    })
}

/// Decode then verify a single certificate. Undecodable input is `Malformed`.
pub fn verify_encoded_certificate(
    encoded: &str,
    rank_ceiling: i64,
) -> Result<VerifiedCertificate, VerifyError> {
    let certificate = codec::decode(encoded.as_bytes())?;
    verify_certificate(&certificate, rank_ceiling)
}

/// Verify the certificate chain a document carries at `rank_ceiling`.
///
/// Uses default settings otherwise: no trusted-root or linkage requirements.
pub fn verify_document_with_chain(
    document: &dyn Document,
    rank_ceiling: i64,
) -> Result<ChainVerdict, VerifyError> {
    ChainValidator::with_rank_ceiling(rank_ceiling).verify(document)
}

/// Trait for document chain verification.
///
/// This trait abstracts the validation logic to enable testing with mock implementations.
pub trait ChainVerifier: Send + Sync {
    /// Verify that `document` is authorized by its certificate chain.
    ///
    /// Performs all validation checks on every link, terminal first:
    /// 1. Signature is valid
    /// 2. Certificate not expired
    /// 3. Rank within ceiling
    /// 4. Document kind permitted
    fn verify(&self, document: &dyn Document) -> Result<ChainVerdict, VerifyError>;
}

/// Settings-driven chain validator.
#[derive(Debug, Clone, Default)]
pub struct ChainValidator {
    settings: VerifierSettings,
}

impl ChainValidator {
    pub fn new(settings: VerifierSettings) -> Self {
        Self { settings }
    }

    /// Default settings with the given rank ceiling.
    pub fn with_rank_ceiling(rank_ceiling: i64) -> Self {
        Self::new(VerifierSettings {
            rank_ceiling,
            ..VerifierSettings::default()
        })
    }

    pub fn settings(&self) -> &VerifierSettings {
        &self.settings
    }

    /// Verify against an explicit clock reading. One reading is used for every link.
    pub fn verify_at(
        &self,
        document: &dyn Document,
        now: i64,
    ) -> Result<ChainVerdict, VerifyError> {
        let encoded = document
            .certificate_chain()
            .filter(|chain| !chain.trim().is_empty())
            .ok_or_else(|| {
                warn!("Document of kind '{}' carries no certificate chain", document.kind());
                VerifyError::Malformed("document has no certificate chain".to_string())
            })?;

        let terminal = codec::decode(encoded.as_bytes()).map_err(|e| {
            warn!("Failed to decode certificate chain: {}", e);
            VerifyError::from(e)
        })?;

        self.verify_certificate_chain_at(&terminal, document.kind(), now)
    }

    /// Verify an already-decoded chain for a document of `kind`.
    pub fn verify_certificate_chain(
        &self,
        terminal: &Certificate,
        kind: &str,
    ) -> Result<ChainVerdict, VerifyError> {
        self.verify_certificate_chain_at(terminal, kind, Utc::now().timestamp())
    }

    fn verify_certificate_chain_at(
        &self,
        terminal: &Certificate,
        kind: &str,
        now: i64,
    ) -> Result<ChainVerdict, VerifyError> {
        let ceiling = self.settings.rank_ceiling;
        let mut leaf: Option<VerifiedCertificate> = None;
        let mut child: Option<&Certificate> = None;
        let mut depth = 0usize;

        debug!(
            "Verifying chain for kind '{}' from subject {} at ceiling {}",
            kind,
            key_id(terminal.subject()),
            ceiling
        );

        for certificate in terminal.links() {
            if let Some(max) = self.settings.max_chain_depth {
                if depth >= max {
                    warn!("Certificate chain exceeds {} links", max);
                    return Err(VerifyError::ChainTooDeep { max });
                }
            }

            let verified = verify_certificate_at(certificate, ceiling, now)?;

            if !verified.permits(kind) {
                warn!(
                    "Kind '{}' not permitted by certificate for {} at depth {}",
                    kind,
                    key_id(&verified.subject),
                    depth
                );
                return Err(VerifyError::KindNotPermitted {
                    kind: kind.to_string(),
                    depth,
                });
            }

            if self.settings.require_issuer_linkage {
                if let Some(child) = child {
                    if child.issuer() != certificate.subject() {
                        warn!(
                            "Issuer {} at depth {} is not the subject of its parent",
                            key_id(child.issuer()),
                            depth - 1
                        );
                        return Err(VerifyError::IssuerMismatch { depth: depth - 1 });
                    }
                }
            }

            if certificate.is_root()
                && !self.settings.trusted_roots.is_empty()
                && !self.settings.trusted_roots.contains(certificate.issuer())
            {
                warn!("Root issuer {} is not trusted", key_id(certificate.issuer()));
                return Err(VerifyError::UntrustedRoot {
                    issuer: key_id(certificate.issuer()),
                });
            }

            if leaf.is_none() {
                leaf = Some(verified);
            }
            child = Some(certificate);
            depth += 1;
        }

        // links() always yields the terminal certificate first
        let leaf = leaf.ok_or_else(|| VerifyError::Malformed("empty chain".to_string()))?;

        info!(
            "Chain of {} certificate(s) authorizes kind '{}' for {} at rank {}",
            depth,
            kind,
            key_id(&leaf.subject),
            leaf.rank
        );

        Ok(ChainVerdict {
            authorized: true,
            signer: leaf.subject,
            rank: leaf.rank,
            depth,
        })
    }

    /// Verify a signed document: its chain, then that the chain's terminal
    /// subject produced the document's signature.
    pub fn verify_signed_document<D>(
        &self,
        document: &SignedEnvelope<D>,
    ) -> Result<ChainVerdict, VerifyError>
    where
        D: Document + Serialize,
    {
        let verdict = self.verify(document)?;
        if !document.verify_signature(&verdict.signer) {
            warn!(
                "Document of kind '{}' not signed by chain subject {}",
                document.body.kind(),
                key_id(&verdict.signer)
            );
            return Err(VerifyError::SignerMismatch);
        }
        Ok(verdict)
    }
}

impl ChainVerifier for ChainValidator {
    fn verify(&self, document: &dyn Document) -> Result<ChainVerdict, VerifyError> {
        self.verify_at(document, Utc::now().timestamp())
    }
}
