//! Decoding of base64 image payloads

use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::{CatalogError, CatalogResult};

/// Image bytes with the content type they should be stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Raw image bytes
    pub bytes: Vec<u8>,
    /// MIME type, e.g. `image/png`
    pub content_type: String,
}

/// Decodes an `imageData` payload.
///
/// Accepts plain standard base64 or a `data:<mime>;base64,<payload>` URL. Whitespace inside
/// the payload is ignored. The content type comes from the data URL when it names an image
/// type, otherwise it is sniffed from the decoded bytes.
///
/// # Errors
///
/// Returns `CatalogError::Decoding` if the data URL header or the base64 payload is malformed
pub fn decode_image_data(image_data: &str) -> CatalogResult<DecodedImage> {
    let (declared, payload) = split_data_url(image_data.trim())?;

    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| CatalogError::Decoding(e.to_string()))?;

    let content_type = declared
        .filter(|declared| declared.type_() == mime::IMAGE)
        .map_or_else(
            || sniff_content_type(&bytes).to_string(),
            |declared| declared.essence_str().to_string(),
        );

    Ok(DecodedImage {
        bytes,
        content_type,
    })
}

/// Splits an optional data URL header from the base64 payload
fn split_data_url(image_data: &str) -> CatalogResult<(Option<mime::Mime>, &str)> {
    let Some(rest) = image_data.strip_prefix("data:") else {
        return Ok((None, image_data));
    };

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CatalogError::Decoding("data URL has no payload".to_string()))?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| CatalogError::Decoding("data URL is not base64 encoded".to_string()))?;

    if media_type.is_empty() {
        return Ok((None, payload));
    }

    let mime = media_type
        .parse::<mime::Mime>()
        .map_err(|e| CatalogError::Decoding(format!("invalid data URL media type: {e}")))?;

    Ok((Some(mime), payload))
}

/// Detects common image formats from their magic bytes
#[must_use]
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];

    if bytes.starts_with(PNG) {
        "image/png"
    } else if bytes.starts_with(JPEG) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "image/gif"
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "application/octet-stream"
    }
}
