//! PNG data-URL codec.
//!
//! The boundary exchanges rasters as `data:image/png;base64,…` strings.
//! Decoding also accepts a naked base64 payload without the prefix, and
//! any container format the `image` crate's enabled features cover
//! (PNG, JPEG, BMP, WebP); encoding always produces PNG.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder as _};
use kasane_pipeline::RgbaImage;
use thiserror::Error;

/// Prefix of every encoded payload.
pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Failure while translating between rasters and base64 payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded bytes are not a readable image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[source] image::ImageError),
    /// PNG encoding failed.
    #[error("failed to encode image as PNG: {0}")]
    ImageEncode(#[source] image::ImageError),
}

/// Encode a raster as a PNG data URL.
///
/// # Errors
///
/// Returns [`CodecError::ImageEncode`] if PNG encoding fails.
pub fn encode_data_url(image: &RgbaImage) -> Result<String, CodecError> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(CodecError::ImageEncode)?;
    let mut url = String::from(DATA_URL_PREFIX);
    STANDARD.encode_string(&png, &mut url);
    Ok(url)
}

/// Decode a data URL (or naked base64 image payload) into a raster.
///
/// Non-RGBA source formats are converted to RGBA; fully opaque alpha is
/// synthesized where the source has none.
///
/// # Errors
///
/// Returns [`CodecError::Base64`] for malformed base64 and
/// [`CodecError::ImageDecode`] for bytes no enabled format can read.
pub fn decode_data_url(data: &str) -> Result<RgbaImage, CodecError> {
    let payload = data
        .strip_prefix(DATA_URL_PREFIX)
        .unwrap_or(data)
        .trim_ascii();
    let bytes = STANDARD.decode(payload)?;
    let decoded = image::load_from_memory(&bytes).map_err(CodecError::ImageDecode)?;
    Ok(decoded.to_rgba8())
}
