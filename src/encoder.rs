use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use std::path::Path;
use tokio::fs;

/// A fully read image, ready for transmission and local display.
///
/// `base64` carries the bare payload (no data-URI prefix); `preview_uri` is a
/// self-contained `data:` URI over the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub base64: String,
    pub mime_type: String,
    pub preview_uri: String,
}

impl EncodedImage {
    /// Builds an encoded image from raw bytes and a declared MIME type.
    /// Non-image MIME types are skipped without error.
    pub fn from_parts(bytes: &[u8], mime_type: &str) -> Option<Self> {
        if !mime_type.starts_with("image/") {
            return None;
        }
        let base64 = general_purpose::STANDARD.encode(bytes);
        Some(Self {
            preview_uri: format!("data:{};base64,{}", mime_type, base64),
            mime_type: mime_type.to_string(),
            base64,
        })
    }

    /// Accepts an already-encoded `data:<mime>;base64,<payload>` URL,
    /// keeping its declared MIME type. Non-image payloads are skipped.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        if !mime_type.starts_with("image/") {
            return None;
        }
        Some(Self {
            base64: payload.to_string(),
            mime_type: mime_type.to_string(),
            preview_uri: url.to_string(),
        })
    }
}

/// Reads a file and encodes it for analysis. The content is sniffed rather
/// than trusting the extension; anything that is not an image yields
/// `Ok(None)` with no further effect. Passthrough only: no size limit, no
/// re-encoding, no EXIF handling.
pub async fn encode(path: &Path) -> Result<Option<EncodedImage>> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("Failed to read image file '{}'", path.display()))?;

    let mime_type = match image::guess_format(&bytes) {
        Ok(format) => format.to_mime_type(),
        Err(_) => return Ok(None),
    };

    Ok(EncodedImage::from_parts(&bytes, mime_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use std::io::Write;
    use tempfile::NamedTempFile;

    // PNG magic followed by arbitrary bytes; guess_format only reads the magic.
    const PNG_FIXTURE: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x01, 0x02, 0x03,
    ];

    fn write_fixture(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(bytes).expect("write fixture");
        file
    }

    #[tokio::test]
    async fn encodes_png_file() {
        let file = write_fixture(PNG_FIXTURE);
        let encoded = encode(file.path()).await.unwrap().expect("image expected");

        assert_eq!(encoded.mime_type, "image/png");
        assert!(encoded.preview_uri.starts_with("data:image/png;base64,"));
        // Bare payload: no URI header characters.
        assert!(!encoded.base64.contains(','));
        assert!(!encoded.base64.starts_with("data:"));
        assert_eq!(
            general_purpose::STANDARD.decode(&encoded.base64).unwrap(),
            PNG_FIXTURE
        );
    }

    #[tokio::test]
    async fn skips_non_image_file() {
        let file = write_fixture(b"just some text, definitely not an image");
        let encoded = encode(file.path()).await.unwrap();
        assert!(encoded.is_none());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let result = encode(Path::new("/nonexistent/food.png")).await;
        assert!(result.is_err());
    }

    #[test]
    fn preview_uri_round_trips_through_data_url() {
        let encoded = EncodedImage::from_parts(PNG_FIXTURE, "image/png").unwrap();
        let reparsed = EncodedImage::from_data_url(&encoded.preview_uri).unwrap();
        assert_eq!(reparsed, encoded);
    }

    #[test]
    fn data_url_rejects_non_image_mime() {
        assert!(EncodedImage::from_data_url("data:text/plain;base64,aGVsbG8=").is_none());
    }

    #[test]
    fn data_url_requires_base64_header() {
        assert!(EncodedImage::from_data_url("data:image/png,rawbytes").is_none());
        assert!(EncodedImage::from_data_url("not a data url").is_none());
    }

    #[test]
    fn from_parts_rejects_non_image_mime() {
        assert!(EncodedImage::from_parts(b"anything", "application/pdf").is_none());
    }
}
