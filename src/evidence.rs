use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Hard cap on inlined attachments. There is no file storage service; the
/// encoded blob rides inside the report row.
pub const MAX_ATTACHMENT_BYTES: usize = 2 * 1024 * 1024;

pub const DATA_URL_PREFIX: &str = "data:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceError {
    pub code: &'static str,
    pub message: String,
}

impl EvidenceError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        EvidenceError {
            code,
            message: message.into(),
        }
    }
}

/// True when the stored value is an inlined attachment rather than an
/// external link.
pub fn is_inline(evidence_url: &str) -> bool {
    evidence_url.starts_with(DATA_URL_PREFIX)
}

/// Encode a decoded attachment payload as a `data:` URL, enforcing the
/// size cap on the raw bytes.
pub fn encode_attachment(mime_type: &str, bytes: &[u8]) -> Result<String, EvidenceError> {
    if bytes.len() > MAX_ATTACHMENT_BYTES {
        return Err(EvidenceError::new(
            "file_too_large",
            format!(
                "attachment is {} bytes; limit is {} bytes",
                bytes.len(),
                MAX_ATTACHMENT_BYTES
            ),
        ));
    }
    let mime = if mime_type.is_empty() {
        "application/octet-stream"
    } else {
        mime_type
    };
    Ok(format!("{DATA_URL_PREFIX}{mime};base64,{}", BASE64.encode(bytes)))
}

/// Accept a base64 payload straight off the wire.
pub fn encode_attachment_base64(mime_type: &str, data_base64: &str) -> Result<String, EvidenceError> {
    let bytes = BASE64
        .decode(data_base64.trim())
        .map_err(|e| EvidenceError::new("bad_params", format!("invalid base64 payload: {e}")))?;
    encode_attachment(mime_type, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_file_encodes_as_data_url() {
        let url = encode_attachment("application/pdf", &[1u8; 1024 * 1024]).unwrap();
        assert!(url.starts_with("data:application/pdf;base64,"));
        assert!(is_inline(&url));
        assert!(!url.starts_with("http"));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let err = encode_attachment("application/pdf", &[0u8; 3 * 1024 * 1024]).unwrap_err();
        assert_eq!(err.code, "file_too_large");
    }

    #[test]
    fn cap_is_on_raw_bytes_not_encoded_length() {
        // Exactly at the cap passes even though base64 inflates it by 4/3.
        assert!(encode_attachment("image/png", &[7u8; MAX_ATTACHMENT_BYTES]).is_ok());
        assert!(encode_attachment("image/png", &[7u8; MAX_ATTACHMENT_BYTES + 1]).is_err());
    }

    #[test]
    fn garbage_base64_is_a_client_error() {
        let err = encode_attachment_base64("image/png", "%%not-base64%%").unwrap_err();
        assert_eq!(err.code, "bad_params");
    }

    #[test]
    fn external_links_are_not_inline() {
        assert!(!is_inline("https://drive.example/shared-link"));
        assert!(is_inline("data:image/png;base64,AAAA"));
    }

    #[test]
    fn empty_mime_falls_back_to_octet_stream() {
        let url = encode_attachment("", b"x").unwrap();
        assert!(url.starts_with("data:application/octet-stream;base64,"));
    }
}
