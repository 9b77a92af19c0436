use anyhow::{anyhow, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use thiserror::Error;

const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Warm off-white used by the avatar and cutout backdrops (#FDFBF7).
const PLACEHOLDER_FILL: Rgba<u8> = Rgba([0xFD, 0xFB, 0xF7, 0xFF]);
const PLACEHOLDER_WIDTH: u32 = 300;
const PLACEHOLDER_HEIGHT: u32 = 400;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image payload is empty")]
    Empty,
    #[error("image payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Decoded image bytes together with the MIME type they are declared as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl InlineImage {
    /// Decodes a base64 payload (optionally a data URI) and resolves its MIME
    /// type from `declared`, falling back to sniffing the bytes.
    pub fn from_base64(raw: &str, declared: Option<&str>) -> Result<Self, DecodeError> {
        let bytes = decode_base64_image(raw)?;
        let mime_type = resolve_mime_type(declared, &bytes);
        Ok(Self { bytes, mime_type })
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Strips an optional `data:<mime>;base64,` header and decodes the rest.
pub fn decode_base64_image(raw: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = raw.trim();
    let encoded = match trimmed.split_once(',') {
        Some((_, after)) => after.trim(),
        None => trimmed,
    };
    if encoded.is_empty() {
        return Err(DecodeError::Empty);
    }
    let bytes = STANDARD.decode(encoded)?;
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(bytes)
}

/// Accepts either a bare subtype (`jpeg`) or a full MIME type (`image/jpeg`).
pub fn normalize_mime_type(declared: &str) -> Option<String> {
    let lowered = declared.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return None;
    }
    let subtype = lowered.strip_prefix("image/").unwrap_or(&lowered);
    if subtype.is_empty() || subtype.contains('/') {
        return None;
    }
    let subtype = match subtype {
        "jpg" => "jpeg",
        other => other,
    };
    Some(format!("image/{subtype}"))
}

pub fn resolve_mime_type(declared: Option<&str>, bytes: &[u8]) -> String {
    declared
        .and_then(normalize_mime_type)
        .or_else(|| detect_mime_type(bytes).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}

pub fn detect_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if bytes.starts_with(b"BM") {
        return Some("image/bmp");
    }
    None
}

pub fn encode_png(image: RgbaImage) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|err| anyhow!("encode png failed: {err}"))?;
    Ok(output)
}

/// Solid 3:4 PNG returned in place of generated images when no provider is
/// configured. Always the same bytes.
pub fn placeholder_png() -> Result<InlineImage> {
    let canvas = RgbaImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, PLACEHOLDER_FILL);
    Ok(InlineImage {
        bytes: encode_png(canvas)?,
        mime_type: "image/png".to_string(),
    })
}
