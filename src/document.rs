//! Documents that carry a certificate chain.

use crate::chain::codec;
use crate::chain::error::CodecError;
use crate::chain::types::Certificate;
use crate::envelope::SignedEnvelope;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Kind label of [`BaseDocument::new`].
pub const BASE_KIND: &str = "base";

/// What the chain validator reads from a document.
pub trait Document {
    /// Kind label checked against every certificate's permitted kinds.
    fn kind(&self) -> &str;

    /// Encoded terminal certificate, if any.
    fn certificate_chain(&self) -> Option<&str>;
}

/// Minimal document: a kind, a timestamp and an optional chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseDocument {
    pub kind: String,
    pub issued_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_chain: Option<String>,
}

impl BaseDocument {
    pub fn new() -> Self {
        Self::with_kind(BASE_KIND)
    }

    pub fn with_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            issued_at: Utc::now().timestamp(),
            certificate_chain: None,
        }
    }

    /// Attach `certificate` (and its embedded ancestors) as this document's chain.
    pub fn with_certificate(mut self, certificate: &Certificate) -> Result<Self, CodecError> {
        self.certificate_chain = Some(codec::encode(certificate)?);
        Ok(self)
    }
}

impl Default for BaseDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for BaseDocument {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn certificate_chain(&self) -> Option<&str> {
        self.certificate_chain.as_deref()
    }
}

impl<T: Document> Document for SignedEnvelope<T> {
    fn kind(&self) -> &str {
        self.body.kind()
    }

    fn certificate_chain(&self) -> Option<&str> {
        self.body.certificate_chain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::builder::create_certificate;
    use crate::modules::secure_keys::KeyPair;

    #[test]
    fn test_base_document() {
        let document = BaseDocument::new();
        assert_eq!(document.kind(), BASE_KIND);
        assert_eq!(document.certificate_chain(), None);
    }

    #[test]
    fn test_attach_certificate() {
        let key = KeyPair::generate();
        let certificate = create_certificate(&key, &key, 0, ["note"], 60, None).unwrap();
        let document = BaseDocument::with_kind("note")
            .with_certificate(&certificate)
            .unwrap();

        let decoded = codec::decode(document.certificate_chain().unwrap().as_bytes()).unwrap();
        assert_eq!(decoded, certificate);
    }

    #[test]
    fn test_serialized_without_chain() {
        let json = serde_json::to_string(&BaseDocument::with_kind("note")).unwrap();
        assert!(json.contains(r#""kind":"note""#));
        assert!(!json.contains("certificate_chain"));
    }

    #[test]
    fn test_signed_envelope_delegates() {
        let key = KeyPair::generate();
        let signed = SignedEnvelope::seal(BaseDocument::with_kind("note"), &key).unwrap();
        assert_eq!(Document::kind(&signed), "note");
        assert_eq!(signed.certificate_chain(), None);
    }
}
