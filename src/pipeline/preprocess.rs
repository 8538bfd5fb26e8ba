//! Image preprocessing: raw upload bytes → bounded base64 JPEG.
//!
//! The inference server decodes the embedded image into its vision encoder's
//! memory; an unbounded upload (a 12 MP phone photo of a notebook page) can
//! take the whole server down. The pipeline therefore normalises every
//! upload before it goes anywhere near the network:
//!
//! 1. decode with format autodetection (the declared media type is not
//!    trusted)
//! 2. flatten to three-channel RGB, discarding alpha/palette/grayscale
//!    distinctions
//! 3. downscale so the longest side is at most the configured cap,
//!    preserving aspect ratio; never upscale
//! 4. re-encode as lossy JPEG and base64-wrap for the JSON request body
//!
//! The whole transformation is pure: same bytes in, same payload out, no
//! side effects.

use crate::error::OcrError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// A preprocessed image, ready for embedding in a multimodal request.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Base64 (STANDARD alphabet) of the JPEG bitstream.
    pub base64: String,
    /// Media type of the encoded bitstream.
    pub mime_type: &'static str,
    /// Width of the raster that was encoded, after any downscale.
    pub width: u32,
    /// Height of the raster that was encoded, after any downscale.
    pub height: u32,
}

impl EncodedImage {
    /// Render as a `data:` URI for an OpenAI-style `image_url` part.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// Normalise uploaded bytes into a bounded, model-ready encoded form.
///
/// Fails with [`OcrError::Decode`] when the bytes are not a decodable image.
/// The caller (the relay) owns the error; no retry happens here.
pub fn preprocess_image(
    bytes: &[u8],
    max_dimension: u32,
    jpeg_quality: u8,
) -> Result<EncodedImage, OcrError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| OcrError::Decode {
        detail: e.to_string(),
    })?;

    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let bounded = bound_raster(rgb, max_dimension);
    let (out_w, out_h) = bounded.dimensions();

    let mut buf = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut buf), jpeg_quality);
    DynamicImage::ImageRgb8(bounded)
        .write_with_encoder(encoder)
        .map_err(|e| OcrError::Internal(format!("JPEG encoding failed: {e}")))?;

    let b64 = STANDARD.encode(&buf);
    debug!(
        "Preprocessed {}x{} → {}x{}, {} bytes JPEG, {} bytes base64",
        width,
        height,
        out_w,
        out_h,
        buf.len(),
        b64.len()
    );

    Ok(EncodedImage {
        base64: b64,
        mime_type: "image/jpeg",
        width: out_w,
        height: out_h,
    })
}

/// Downscale so the longest side equals `max_dimension`, preserving aspect
/// ratio. Images already within the cap pass through untouched: upscaling
/// adds no information for the model to read, only payload bytes.
fn bound_raster(img: RgbImage, max_dimension: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    if w <= max_dimension && h <= max_dimension {
        return img;
    }

    let (new_w, new_h) = if w >= h {
        let scaled = (h as u64 * max_dimension as u64 + w as u64 / 2) / w as u64;
        (max_dimension, (scaled as u32).max(1))
    } else {
        let scaled = (w as u64 * max_dimension as u64 + h as u64 / 2) / h as u64;
        ((scaled as u32).max(1), max_dimension)
    };

    image::imageops::resize(&img, new_w, new_h, FilterType::Lanczos3)
}
