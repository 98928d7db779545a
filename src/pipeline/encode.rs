//! Image encoding: raw upload bytes → base64 transport string.
//!
//! VLM APIs accept images as base64 data embedded in the JSON request body.
//! The bytes are forwarded exactly as uploaded: no decoding, resizing or
//! format validation happens here. A file that isn't really an image fails
//! later as a model-call error attributed to that image.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use tracing::debug;

/// MIME type assumed when the magic bytes are not recognised.
pub const FALLBACK_MIME: &str = "image/jpeg";

/// A base64 payload plus the MIME type to label it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: String,
    pub mime_type: String,
}

/// Encode arbitrary bytes as standard base64. Total and deterministic.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Inverse of [`encode`].
pub fn decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(data)
}

/// Guess the MIME type from the leading magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Gif) => "image/gif",
        _ => FALLBACK_MIME,
    }
}

/// Encode an uploaded image for the VLM request.
pub fn encode_image(bytes: &[u8]) -> EncodedImage {
    let data = encode(bytes);
    let mime_type = sniff_mime(bytes);
    debug!("Encoded {} bytes → {} bytes base64 ({})", bytes.len(), data.len(), mime_type);
    EncodedImage {
        data,
        mime_type: mime_type.to_string(),
    }
}
