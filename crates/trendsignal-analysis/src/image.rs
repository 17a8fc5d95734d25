//! Screenshot payloads handed to the vision model.

use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::{alphabet, Engine as _};

use crate::error::AnalysisError;

const DEFAULT_MIME_TYPE: &str = "image/png";

/// Standard alphabet, trailing `=` padding optional.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A validated base64 image plus the MIME type used to label it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    base64: String,
    mime_type: String,
}

impl ImagePayload {
    /// Accepts raw base64 or a `data:` URL.
    ///
    /// For data URLs everything up to the first comma is stripped and the
    /// declared MIME type is kept. Embedded whitespace is ignored. The body
    /// must decode as standard base64, padded or not; it is stored re-encoded
    /// with padding.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidImage`] if the payload is empty or is
    /// not valid base64.
    pub fn from_base64_or_data_url(input: &str) -> Result<Self, AnalysisError> {
        let input = input.trim();
        let (mime_type, body) = match input.strip_prefix("data:") {
            Some(rest) => match rest.split_once(',') {
                Some((header, body)) => (mime_from_header(header), body),
                None => (DEFAULT_MIME_TYPE.to_string(), rest),
            },
            None => (DEFAULT_MIME_TYPE.to_string(), input),
        };

        let body: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        if body.is_empty() {
            return Err(AnalysisError::InvalidImage("image payload is empty".into()));
        }
        let decoded = LENIENT
            .decode(&body)
            .map_err(|e| AnalysisError::InvalidImage(format!("not valid base64: {e}")))?;
        if decoded.is_empty() {
            return Err(AnalysisError::InvalidImage("image payload is empty".into()));
        }

        Ok(Self {
            base64: STANDARD.encode(decoded),
            mime_type,
        })
    }

    /// Encodes raw image bytes (e.g. an uploaded file).
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidImage`] if `bytes` is empty.
    pub fn from_bytes(bytes: &[u8], mime_type: Option<&str>) -> Result<Self, AnalysisError> {
        if bytes.is_empty() {
            return Err(AnalysisError::InvalidImage("image payload is empty".into()));
        }
        let mime_type = mime_type
            .map(str::trim)
            .filter(|m| m.starts_with("image/"))
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();
        Ok(Self {
            base64: STANDARD.encode(bytes),
            mime_type,
        })
    }

    #[must_use]
    pub fn base64(&self) -> &str {
        &self.base64
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// `data:<mime>;base64,<payload>` form accepted by vision chat APIs.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

fn mime_from_header(header: &str) -> String {
    header
        .split(';')
        .next()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // "hello" in standard base64
    const HELLO_B64: &str = "aGVsbG8=";

    #[test]
    fn accepts_raw_base64() {
        let payload = ImagePayload::from_base64_or_data_url(HELLO_B64).unwrap();
        assert_eq!(payload.base64(), HELLO_B64);
        assert_eq!(payload.mime_type(), "image/png");
    }

    #[test]
    fn strips_data_url_prefix_and_keeps_mime() {
        let payload =
            ImagePayload::from_base64_or_data_url(&format!("data:image/jpeg;base64,{HELLO_B64}"))
                .unwrap();
        assert_eq!(payload.base64(), HELLO_B64);
        assert_eq!(payload.mime_type(), "image/jpeg");
        assert_eq!(payload.data_url(), format!("data:image/jpeg;base64,{HELLO_B64}"));
    }

    #[test]
    fn ignores_embedded_whitespace() {
        let payload = ImagePayload::from_base64_or_data_url("aGVs\nbG8=\n").unwrap();
        assert_eq!(payload.base64(), HELLO_B64);
    }

    #[test]
    fn accepts_unpadded_base64_and_pads_it() {
        let payload = ImagePayload::from_base64_or_data_url("aGVsbG8").unwrap();
        assert_eq!(payload.base64(), HELLO_B64);

        let payload =
            ImagePayload::from_base64_or_data_url("data:image/webp;base64,aGVsbG8").unwrap();
        assert_eq!(payload.data_url(), format!("data:image/webp;base64,{HELLO_B64}"));
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = ImagePayload::from_base64_or_data_url("not*base64!").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidImage(_)));
    }

    #[test]
    fn rejects_empty_payloads() {
        assert!(ImagePayload::from_base64_or_data_url("").is_err());
        assert!(ImagePayload::from_base64_or_data_url("data:image/png;base64,").is_err());
        assert!(ImagePayload::from_bytes(&[], Some("image/png")).is_err());
    }

    #[test]
    fn from_bytes_encodes_and_defaults_mime() {
        let payload = ImagePayload::from_bytes(b"hello", Some("application/pdf")).unwrap();
        assert_eq!(payload.base64(), HELLO_B64);
        assert_eq!(payload.mime_type(), "image/png");

        let webp = ImagePayload::from_bytes(b"hello", Some("image/webp")).unwrap();
        assert_eq!(webp.mime_type(), "image/webp");
    }
}
