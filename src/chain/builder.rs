//! Certificate issuance.
//!
//! The builder signs exactly what it is given. It never validates the
//! parent: an expired or otherwise unusable parent is caught when the
//! chain is verified, not here.

use crate::chain::error::BuildError;
use crate::chain::types::{Certificate, CertificateBody};
use crate::envelope::SignedEnvelope;
use crate::modules::crypto::key_id;
use crate::modules::secure_keys::{HasPublicKey, KeyPair};
use chrono::Utc;
use log::debug;
use p256::PublicKey;
use std::collections::BTreeSet;

/// Validity used when the caller does not pick one (one hour).
pub const DEFAULT_VALIDITY_SECONDS: i64 = 3600;

/// Fluent construction of a single certificate.
///
/// ```ignore
/// let certificate = CertificateBuilder::new(&issuer, &subject)
///     .rank(10)
///     .permit("base")
///     .validity_seconds(600)
///     .parent(parent_certificate)
///     .build()?;
/// ```
#[derive(Debug)]
pub struct CertificateBuilder<'a> {
    issuer: &'a KeyPair,
    subject: PublicKey,
    rank: i64,
    permitted_kinds: BTreeSet<String>,
    validity_seconds: i64,
    parent: Option<Certificate>,
}

impl<'a> CertificateBuilder<'a> {
    pub fn new(issuer: &'a KeyPair, subject: impl HasPublicKey) -> Self {
        Self {
            issuer,
            subject: subject.public_key(),
            rank: 0,
            permitted_kinds: BTreeSet::new(),
            validity_seconds: DEFAULT_VALIDITY_SECONDS,
            parent: None,
        }
    }

    pub fn rank(mut self, rank: i64) -> Self {
        self.rank = rank;
        self
    }

    /// Add one permitted document kind.
    pub fn permit(mut self, kind: impl Into<String>) -> Self {
        self.permitted_kinds.insert(kind.into());
        self
    }

    /// Add several permitted document kinds.
    pub fn permit_all<I, K>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.permitted_kinds
            .extend(kinds.into_iter().map(Into::into));
        self
    }

    /// Validity window from now. Zero or negative yields an already-expired certificate.
    pub fn validity_seconds(mut self, seconds: i64) -> Self {
        self.validity_seconds = seconds;
        self
    }

    /// Embed `parent` by value.
    pub fn parent(mut self, parent: Certificate) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn build(self) -> Result<Certificate, BuildError> {
        if self.permitted_kinds.is_empty() {
            return Err(BuildError::EmptyPermissionSet);
        }

        let issued_at = Utc::now().timestamp();
        let body = CertificateBody {
            issuer: self.issuer.public_key(),
            subject: self.subject,
            rank: self.rank,
            permitted_kinds: self.permitted_kinds,
            issued_at,
            not_after: issued_at.saturating_add(self.validity_seconds),
            parent: self.parent.map(Box::new),
        };

        debug!(
            "Issuing certificate {} -> {} rank={} kinds={:?} not_after={}",
            key_id(&body.issuer),
            key_id(&body.subject),
            body.rank,
            body.permitted_kinds,
            body.not_after
        );

        SignedEnvelope::seal(body, self.issuer)
    }
}

/// Issue a certificate from `issuer` to `subject`.
///
/// # Arguments
/// * `issuer` - Key pair that signs the certificate
/// * `subject` - Key pair or bare public key receiving authority
/// * `rank` - Privilege rank granted to the subject
/// * `permitted_kinds` - Document kinds the subject may act on; must be non-empty
/// * `validity_seconds` - Lifetime from now
/// * `parent` - Certificate that authorized `issuer`, copied into the new certificate
pub fn create_certificate<S, I, K>(
    issuer: &KeyPair,
    subject: S,
    rank: i64,
    permitted_kinds: I,
    validity_seconds: i64,
    parent: Option<&Certificate>,
) -> Result<Certificate, BuildError>
where
    S: HasPublicKey,
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    let mut builder = CertificateBuilder::new(issuer, subject)
        .rank(rank)
        .permit_all(permitted_kinds)
        .validity_seconds(validity_seconds);
    if let Some(parent) = parent {
        builder = builder.parent(parent.clone());
    }
    builder.build()
}
