//! Types for delegated-trust certificate chains.

use crate::envelope::SignedEnvelope;
use crate::modules::crypto::public_key_b64;
use p256::PublicKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A signed delegation from an issuer key to a subject key.
pub type Certificate = SignedEnvelope<CertificateBody>;

/// The signed fields of a certificate.
///
/// Field order is part of the wire format: the signature covers the JSON
/// encoding of this struct in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertificateBody {
    /// Key whose private half signed this certificate.
    #[serde(with = "public_key_b64")]
    pub issuer: PublicKey,

    /// Key being granted authority.
    #[serde(with = "public_key_b64")]
    pub subject: PublicKey,

    /// Privilege level of the subject. Smaller values are broader.
    pub rank: i64,

    /// Document kinds the subject may act on, directly or by further delegation.
    pub permitted_kinds: BTreeSet<String>,

    /// Creation time (unix seconds).
    pub issued_at: i64,

    /// Expiry (unix seconds). The certificate is valid strictly before this instant.
    pub not_after: i64,

    /// The certificate that authorized `issuer`, embedded by value. Absent for roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<Certificate>>,
}

impl SignedEnvelope<CertificateBody> {
    pub fn issuer(&self) -> &PublicKey {
        &self.body.issuer
    }

    pub fn subject(&self) -> &PublicKey {
        &self.body.subject
    }

    pub fn rank(&self) -> i64 {
        self.body.rank
    }

    pub fn permitted_kinds(&self) -> &BTreeSet<String> {
        &self.body.permitted_kinds
    }

    pub fn not_after(&self) -> i64 {
        self.body.not_after
    }

    pub fn parent(&self) -> Option<&Certificate> {
        self.body.parent.as_deref()
    }

    /// True when this certificate has no embedded parent.
    pub fn is_root(&self) -> bool {
        self.body.parent.is_none()
    }

    /// Whether this certificate alone lists `kind`.
    pub fn permits(&self, kind: &str) -> bool {
        self.body.permitted_kinds.contains(kind)
    }

    /// Iterate from this certificate up to the root.
    pub fn links(&self) -> Links<'_> {
        Links {
            next: Some(self),
        }
    }

    /// Number of certificates in the embedded chain, including this one.
    pub fn chain_len(&self) -> usize {
        self.links().count()
    }
}

/// Iterator over a certificate and its embedded ancestors, terminal first.
#[derive(Debug, Clone)]
pub struct Links<'a> {
    next: Option<&'a Certificate>,
}

impl<'a> Iterator for Links<'a> {
    type Item = &'a Certificate;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

/// What a single verified certificate grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCertificate {
    pub subject: PublicKey,
    pub rank: i64,
    pub permitted_kinds: BTreeSet<String>,
    pub not_after: i64,
}

impl VerifiedCertificate {
    pub fn permits(&self, kind: &str) -> bool {
        self.permitted_kinds.contains(kind)
    }
}

/// Outcome of a successful chain verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerdict {
    /// Always `true`; any failure is reported as an error instead.
    pub authorized: bool,

    /// Subject of the terminal certificate: the identity the document is trusted under.
    pub signer: PublicKey,

    /// Rank of the terminal certificate.
    pub rank: i64,

    /// Number of certificates walked, terminal to root.
    pub depth: usize,
}
