//! Certificate wire encoding.
//!
//! Certificates travel as the JSON form of their [`SignedEnvelope`]:
//!
//! ```text
//! {"body":{"issuer":"<b64url>","subject":"<b64url>","rank":1,
//!          "permitted_kinds":["base"],"issued_at":..,"not_after":..,
//!          "parent":{"body":{..},"signature":".."}},
//!  "signature":"<b64url DER>"}
//! ```
//!
//! [`SignedEnvelope`]: crate::envelope::SignedEnvelope

use crate::chain::error::CodecError;
use crate::chain::types::{Certificate, CertificateBody};
use crate::envelope;
use serde::Deserialize;

/// Bytes covered by a certificate's signature.
pub fn canonical_bytes(body: &CertificateBody) -> Result<Vec<u8>, CodecError> {
    envelope::signing_bytes(body)
}

/// Encode a certificate, including its signature and embedded ancestors.
pub fn encode(certificate: &Certificate) -> Result<String, CodecError> {
    certificate.to_json()
}

/// Decode a certificate and, recursively, its embedded parents.
///
/// Each link nests two JSON levels, so serde_json's recursion limit is
/// lifted and the stack grows on the heap instead.
pub fn decode(bytes: &[u8]) -> Result<Certificate, CodecError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(CodecError::Empty);
    }

    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    deserializer.disable_recursion_limit();
    let certificate = Certificate::deserialize(serde_stacker::Deserializer::new(&mut deserializer))
        .map_err(|e| CodecError::Decode(e.to_string()))?;
    deserializer
        .end()
        .map_err(|e| CodecError::Decode(e.to_string()))?;
    Ok(certificate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::builder::create_certificate;
    use crate::modules::crypto::encode_public_key;
    use crate::modules::secure_keys::KeyPair;

    fn sample_chain() -> Certificate {
        let root = KeyPair::generate();
        let middle = KeyPair::generate();
        let leaf = KeyPair::generate();

        let parent = create_certificate(&root, &middle, 1, ["base", "certificate"], 3600, None)
            .unwrap();
        create_certificate(&middle, &leaf, 2, ["base"], 3600, Some(&parent)).unwrap()
    }

    #[test]
    fn test_decode_restores_chain() {
        let certificate = sample_chain();
        let encoded = encode(&certificate).unwrap();
        let decoded = decode(encoded.as_bytes()).unwrap();

        assert_eq!(decoded, certificate);
        assert_eq!(decoded.chain_len(), 2);
    }

    #[test]
    fn test_decode_restores_deep_chain() {
        let mut issuer = KeyPair::generate();
        let mut previous: Option<Certificate> = None;
        for rank in 0..80 {
            let subject = KeyPair::generate();
            let certificate =
                create_certificate(&issuer, &subject, rank, ["base"], 3600, previous.as_ref())
                    .unwrap();
            issuer = subject;
            previous = Some(certificate);
        }
        let certificate = previous.unwrap();

        let decoded = decode(encode(&certificate).unwrap().as_bytes()).unwrap();
        assert_eq!(decoded.chain_len(), 80);
        assert_eq!(decoded, certificate);
    }

    #[test]
    fn test_decode_rejects_trailing_data() {
        let mut encoded = encode(&sample_chain()).unwrap();
        assert!(decode(format!("{encoded}\n").as_bytes()).is_ok());

        encoded.push_str("{}");
        assert!(matches!(decode(encoded.as_bytes()), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_canonical_bytes_stable() {
        let certificate = sample_chain();
        let decoded = decode(encode(&certificate).unwrap().as_bytes()).unwrap();

        assert_eq!(
            canonical_bytes(&certificate.body).unwrap(),
            canonical_bytes(&decoded.body).unwrap()
        );
    }

    #[test]
    fn test_kinds_encoded_sorted() {
        let issuer = KeyPair::generate();
        let certificate =
            create_certificate(&issuer, &issuer, 0, ["zeta", "alpha", "mid"], 60, None).unwrap();

        let bytes = canonical_bytes(&certificate.body).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains(r#""permitted_kinds":["alpha","mid","zeta"]"#));
        assert!(!text.contains("parent"));
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode(b""), Err(CodecError::Empty));
        assert_eq!(decode(b" \n"), Err(CodecError::Empty));
    }

    #[test]
    fn test_decode_truncated() {
        let encoded = encode(&sample_chain()).unwrap();
        let truncated = &encoded.as_bytes()[..encoded.len() / 2];
        assert!(matches!(decode(truncated), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_non_string_kinds() {
        let key = encode_public_key(&KeyPair::generate().public_key());
        let json = format!(
            r#"{{"body":{{"issuer":"{key}","subject":"{key}","rank":0,"permitted_kinds":[1,2],"issued_at":0,"not_after":10}},"signature":"AA"}}"#
        );
        assert!(matches!(decode(json.as_bytes()), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        let key = encode_public_key(&KeyPair::generate().public_key());
        let json = format!(
            r#"{{"body":{{"issuer":"{key}","subject":"{key}","permitted_kinds":["base"],"issued_at":0,"not_after":10}},"signature":"AA"}}"#
        );
        assert!(matches!(decode(json.as_bytes()), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_bad_public_key() {
        let key = encode_public_key(&KeyPair::generate().public_key());
        let json = format!(
            r#"{{"body":{{"issuer":"not-a-key","subject":"{key}","rank":0,"permitted_kinds":["base"],"issued_at":0,"not_after":10}},"signature":"AA"}}"#
        );
        assert!(matches!(decode(json.as_bytes()), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_unknown_fields() {
        let key = encode_public_key(&KeyPair::generate().public_key());
        let json = format!(
            r#"{{"body":{{"issuer":"{key}","subject":"{key}","rank":0,"permitted_kinds":["base"],"issued_at":0,"not_after":10,"extra":true}},"signature":"AA"}}"#
        );
        assert!(matches!(decode(json.as_bytes()), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_decode_malformed_parent() {
        let key = encode_public_key(&KeyPair::generate().public_key());
        let json = format!(
            r#"{{"body":{{"issuer":"{key}","subject":"{key}","rank":0,"permitted_kinds":["base"],"issued_at":0,"not_after":10,"parent":{{"body":{{}},"signature":"AA"}}}},"signature":"AA"}}"#
        );
        assert!(matches!(decode(json.as_bytes()), Err(CodecError::Decode(_))));
    }
}
