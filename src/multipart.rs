//! Minimal multipart/form-data codec for the intake payload
//!
//! Covers exactly what the transport payload needs: text parts, file parts
//! with a per-part Content-Type, repeated field names, and a closing
//! delimiter. No nested multipart, no transfer encodings.

use bytes::Bytes;

use crate::error::RegistryError;

/// One part of a multipart payload, in wire order
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        content_type: String,
        data: Vec<u8>,
    },
}

impl Part {
    pub fn name(&self) -> &str {
        match self {
            Part::Text { name, .. } => name,
            Part::File { name, .. } => name,
        }
    }
}

/// The Content-Type header value for a payload with this boundary
pub fn content_type_header(boundary: &str) -> String {
    format!("multipart/form-data; boundary={}", boundary)
}

/// Encode parts into a multipart body
pub fn encode(boundary: &str, parts: &[Part]) -> Bytes {
    let mut body: Vec<u8> = Vec::new();

    for part in parts {
        body.extend_from_slice(b"--");
        body.extend_from_slice(boundary.as_bytes());
        body.extend_from_slice(b"\r\n");

        match part {
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(
                    format!("Content-Type: {}\r\n\r\n", content_type).as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(b"--");
    body.extend_from_slice(boundary.as_bytes());
    body.extend_from_slice(b"--\r\n");

    Bytes::from(body)
}

/// Extract the boundary parameter from a Content-Type header value
pub fn boundary_from_content_type(header: &str) -> Result<String, RegistryError> {
    let (mime, params) = match header.split_once(';') {
        Some((m, p)) => (m, p),
        None => (header, ""),
    };
    if !mime.trim().eq_ignore_ascii_case("multipart/form-data") {
        return Err(RegistryError::Payload(format!(
            "Expected multipart/form-data, got {}",
            mime.trim()
        )));
    }

    for param in params.split(';') {
        if let Some((key, value)) = param.split_once('=') {
            if key.trim().eq_ignore_ascii_case("boundary") {
                let value = value.trim().trim_matches('"');
                if value.is_empty() {
                    break;
                }
                return Ok(value.to_string());
            }
        }
    }

    Err(RegistryError::Payload("Missing multipart boundary".into()))
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Parse a quoted parameter out of a Content-Disposition header
fn disposition_param(header: &str, param: &str) -> Option<String> {
    for piece in header.split(';') {
        let piece = piece.trim();
        if let Some((key, value)) = piece.split_once('=') {
            if key.trim().eq_ignore_ascii_case(param) {
                return Some(value.trim().trim_matches('"').to_string());
            }
        }
    }
    None
}

/// Decode a multipart body into its parts, preserving order and
/// multiplicity
pub fn decode(boundary: &str, body: &[u8]) -> Result<Vec<Part>, RegistryError> {
    let delim = format!("--{}", boundary).into_bytes();
    let mut parts = Vec::new();

    // Skip any preamble before the first delimiter.
    let mut pos = find(body, &delim, 0)
        .ok_or_else(|| RegistryError::Payload("Opening boundary not found".into()))?
        + delim.len();

    loop {
        // After a delimiter: "--" closes the payload, CRLF opens a part.
        if body[pos..].starts_with(b"--") {
            return Ok(parts);
        }
        if !body[pos..].starts_with(b"\r\n") {
            return Err(RegistryError::Payload("Malformed boundary line".into()));
        }
        pos += 2;

        let headers_end = find(body, b"\r\n\r\n", pos)
            .ok_or_else(|| RegistryError::Payload("Part headers not terminated".into()))?;
        let headers = String::from_utf8_lossy(&body[pos..headers_end]).to_string();
        pos = headers_end + 4;

        let mut name = None;
        let mut filename = None;
        let mut part_content_type = None;
        for line in headers.split("\r\n") {
            let Some((header_name, header_value)) = line.split_once(':') else {
                continue;
            };
            let header_value = header_value.trim();
            if header_name.eq_ignore_ascii_case("content-disposition") {
                name = disposition_param(header_value, "name");
                filename = disposition_param(header_value, "filename");
            } else if header_name.eq_ignore_ascii_case("content-type") {
                part_content_type = Some(header_value.to_string());
            }
        }
        let name =
            name.ok_or_else(|| RegistryError::Payload("Part without a field name".into()))?;

        // Content runs to the CRLF preceding the next delimiter.
        let close = format!("\r\n--{}", boundary).into_bytes();
        let content_end = find(body, &close, pos)
            .ok_or_else(|| RegistryError::Payload("Closing boundary not found".into()))?;
        let data = body[pos..content_end].to_vec();
        pos = content_end + close.len();

        match filename {
            Some(filename) => parts.push(Part::File {
                name,
                filename,
                content_type: part_content_type
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                data,
            }),
            None => parts.push(Part::Text {
                name,
                value: String::from_utf8(data)
                    .map_err(|_| RegistryError::Payload("Text part is not UTF-8".into()))?,
            }),
        }
    }
}
