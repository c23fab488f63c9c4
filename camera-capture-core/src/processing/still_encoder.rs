//! Still-frame capture: raster allocation, surface copy, PNG data-URL encoding.
//!
//! The periodic emitter and `current_frame` share this path, so both hand out
//! the same payload format.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::models::error::CaptureError;
use crate::traits::render_surface::RenderSurface;

/// MIME type of the encoded stills.
pub const STILL_MIME: &str = "image/png";

const DATA_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Allocate a one-shot, fully transparent off-screen raster.
pub fn allocate_raster(width: u32, height: u32) -> RgbaImage {
    RgbaImage::new(width, height)
}

/// Encode `raster` as PNG and wrap it in a `data:` URL.
pub fn encode_data_url(raster: &RgbaImage) -> Result<String, CaptureError> {
    let mut png = Vec::with_capacity(raster.as_raw().len() / 4);
    PngEncoder::new(&mut png)
        .write_image(
            raster.as_raw(),
            raster.width(),
            raster.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| CaptureError::EncodingFailed(format!("png encoding failed: {}", e)))?;

    let header_len = DATA_SCHEME.len() + STILL_MIME.len() + BASE64_MARKER.len();
    let mut url = String::with_capacity(header_len + png.len().div_ceil(3) * 4);
    url.push_str(DATA_SCHEME);
    url.push_str(STILL_MIME);
    url.push_str(BASE64_MARKER);
    STANDARD.encode_string(&png, &mut url);
    Ok(url)
}

/// Copy the surface's current frame into a fresh `width`x`height` raster and encode it.
///
/// Returns `Ok(None)` when the surface has not decoded a frame yet.
pub fn capture_still(
    surface: &dyn RenderSurface,
    width: u32,
    height: u32,
) -> Result<Option<String>, CaptureError> {
    let mut raster = allocate_raster(width, height);
    if !surface.draw_current_frame(&mut raster) {
        return Ok(None);
    }
    encode_data_url(&raster).map(Some)
}

/// Decode a payload produced by `encode_data_url` back into PNG bytes.
pub fn decode_data_url(payload: &str) -> Result<Vec<u8>, CaptureError> {
    let encoded = payload
        .strip_prefix(DATA_SCHEME)
        .and_then(|rest| rest.strip_prefix(STILL_MIME))
        .and_then(|rest| rest.strip_prefix(BASE64_MARKER))
        .ok_or_else(|| CaptureError::EncodingFailed("not a png data url".into()))?;
    STANDARD
        .decode(encoded)
        .map_err(|e| CaptureError::EncodingFailed(format!("invalid base64: {}", e)))
}
