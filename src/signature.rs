//! Dual-source signature artifact handling
//!
//! A submitter signs either by drawing on the signature surface (exported as
//! a base64 data URL) or by uploading a photographed/scanned signature
//! image. Both may be present in a session; the drawn artifact takes
//! precedence and the payload carries exactly one `signature` slot.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::debug;

use crate::evidence::EvidenceFile;

/// Where the normalized signature came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureOrigin {
    Drawn,
    Uploaded,
}

/// The single signature artifact that enters the transport payload
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureArtifact {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    pub origin: SignatureOrigin,
}

/// Parse a `data:<mime>;base64,<payload>` URL into mime and bytes
pub fn parse_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    if mime.is_empty() {
        return None;
    }
    let bytes = BASE64.decode(payload.trim()).ok()?;
    Some((mime.to_string(), bytes))
}

/// Normalize the dual signature source into one artifact.
///
/// Drawn wins when both are present. A malformed drawn data URL is treated
/// as absent rather than an error, so an uploaded image can still carry the
/// submission.
pub fn normalize(
    drawn_data_url: Option<&str>,
    uploaded: Option<&EvidenceFile>,
) -> Option<SignatureArtifact> {
    if let Some(url) = drawn_data_url {
        match parse_data_url(url) {
            Some((mime, bytes)) => {
                let ext = match mime.as_str() {
                    "image/jpeg" => "jpg",
                    "image/webp" => "webp",
                    _ => "png",
                };
                return Some(SignatureArtifact {
                    name: format!("signature.{}", ext),
                    mime,
                    bytes,
                    origin: SignatureOrigin::Drawn,
                });
            }
            None => {
                debug!("Ignoring malformed drawn signature data URL");
            }
        }
    }

    uploaded.map(|file| SignatureArtifact {
        name: file.name.clone(),
        mime: file.mime.clone(),
        bytes: file.bytes.clone(),
        origin: SignatureOrigin::Uploaded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::EvidenceCategory;

    fn drawn_url(bytes: &[u8]) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(bytes))
    }

    fn uploaded_signature() -> EvidenceFile {
        EvidenceFile::new(
            EvidenceCategory::Signature,
            "sig-photo.jpg",
            "image/jpeg",
            vec![0xFF, 0xD8, 0xFF],
        )
    }

    #[test]
    fn test_parse_data_url() {
        let (mime, bytes) = parse_data_url(&drawn_url(b"ink")).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"ink");

        assert!(parse_data_url("data:;base64,aaaa").is_none());
        assert!(parse_data_url("http://example.com/sig.png").is_none());
        assert!(parse_data_url("data:image/png;base64,@@@").is_none());
    }

    #[test]
    fn test_drawn_takes_precedence() {
        let url = drawn_url(b"ink");
        let upload = uploaded_signature();
        let artifact = normalize(Some(&url), Some(&upload)).unwrap();

        assert_eq!(artifact.origin, SignatureOrigin::Drawn);
        assert_eq!(artifact.name, "signature.png");
        assert_eq!(artifact.bytes, b"ink");
    }

    #[test]
    fn test_malformed_drawn_falls_back_to_upload() {
        let upload = uploaded_signature();
        let artifact = normalize(Some("data:image/png;base64,%%%"), Some(&upload)).unwrap();

        assert_eq!(artifact.origin, SignatureOrigin::Uploaded);
        assert_eq!(artifact.name, "sig-photo.jpg");
    }

    #[test]
    fn test_upload_alone() {
        let upload = uploaded_signature();
        let artifact = normalize(None, Some(&upload)).unwrap();
        assert_eq!(artifact.origin, SignatureOrigin::Uploaded);
        assert_eq!(artifact.mime, "image/jpeg");
    }

    #[test]
    fn test_neither_source() {
        assert!(normalize(None, None).is_none());
    }
}
