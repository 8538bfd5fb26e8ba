//! Top-level extraction: uploaded bytes → transcribed text.
//!
//! This is the primary library entry point. It wires the pipeline stages
//! together for exactly one request/response cycle; every value it creates
//! is dropped when the call returns. There is no cross-request state, no
//! cache, and no retry.

use crate::config::RelayConfig;
use crate::error::OcrError;
use crate::pipeline::infer::InferenceBackend;
use crate::pipeline::{preprocess, request};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// An upload, tagged by what the caller claims it is.
///
/// The relay never parses PDF containers: a PDF upload must already have
/// been rasterised to an image of its first page by the caller, and the
/// variant records that provenance. Both variants feed the same
/// preprocessor, which trusts the bitstream, not the tag.
#[derive(Debug, Clone)]
pub enum UploadedDocument {
    /// Raw bytes of an image in any decodable format.
    Image(Vec<u8>),
    /// The caller-rasterised first page of a PDF.
    PdfFirstPage(Vec<u8>),
}

impl UploadedDocument {
    /// Resolve the variant from the declared media type.
    ///
    /// Resolution happens once, before preprocessing ever begins. An absent
    /// or unrecognised media type is treated as an image; the decode step
    /// is the real gatekeeper.
    pub fn from_media_type(bytes: Vec<u8>, media_type: Option<&str>) -> Self {
        match media_type {
            Some(t) if t.eq_ignore_ascii_case("application/pdf") => Self::PdfFirstPage(bytes),
            _ => Self::Image(bytes),
        }
    }

    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::PdfFirstPage(_) => "pdf-first-page",
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Image(b) | Self::PdfFirstPage(b) => b,
        }
    }
}

/// A successful extraction.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    /// The model's transcription, trimmed of surrounding whitespace.
    pub text: String,
    /// Per-request measurements.
    pub stats: ExtractionStats,
}

/// Measurements for one extraction, mirrored into the logs.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionStats {
    /// Size of the uploaded file in bytes.
    pub source_bytes: usize,
    /// Raster width after preprocessing.
    pub width: u32,
    /// Raster height after preprocessing.
    pub height: u32,
    /// Length of the base64 payload embedded in the request.
    pub payload_base64_len: usize,
    /// Wall-clock duration of the whole extraction, preprocessing included.
    pub duration_ms: u64,
}

/// Extract handwritten text from one uploaded document.
///
/// Stages: preprocess (CPU-bound, runs on the blocking pool so concurrent
/// requests are not stalled) → build the two-message request → submit to the
/// backend → trim the first choice's content.
///
/// # Errors
/// * [`OcrError::EmptyUpload`] — zero-length upload
/// * [`OcrError::Decode`] — bytes are not a decodable image
/// * [`OcrError::Transmission`] — inference server unreachable
/// * [`OcrError::Inference`] — server error or unusable response body
pub async fn extract_text(
    document: UploadedDocument,
    config: &RelayConfig,
    backend: &dyn InferenceBackend,
) -> Result<Extraction, OcrError> {
    let start = Instant::now();
    let kind = document.kind();
    let bytes = document.into_bytes();

    if bytes.is_empty() {
        return Err(OcrError::EmptyUpload);
    }

    let source_bytes = bytes.len();
    debug!("Extracting from {kind} upload, {source_bytes} bytes");

    let max_dim = config.max_image_dim;
    let quality = config.jpeg_quality;
    let encoded = tokio::task::spawn_blocking(move || {
        preprocess::preprocess_image(&bytes, max_dim, quality)
    })
    .await
    .map_err(|e| OcrError::Internal(format!("Preprocessing task panicked: {e}")))??;

    let chat_request = request::build_request(config, &encoded);
    let response = backend.complete(&chat_request).await?;

    let text = response
        .text()
        .ok_or_else(|| OcrError::Inference {
            message: "Completion response contained no choices".to_string(),
        })?
        .trim()
        .to_string();

    let stats = ExtractionStats {
        source_bytes,
        width: encoded.width,
        height: encoded.height,
        payload_base64_len: encoded.base64.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Extracted {} chars from {}x{} raster in {}ms",
        text.len(),
        stats.width,
        stats.height,
        stats.duration_ms
    );

    Ok(Extraction { text, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::infer::ChatResponse;
    use crate::pipeline::request::ChatRequest;
    use async_trait::async_trait;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    struct FixedBackend(&'static str);

    #[async_trait]
    impl InferenceBackend for FixedBackend {
        async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, OcrError> {
            Ok(ChatResponse::from_text(self.0))
        }
    }

    struct EmptyChoicesBackend;

    #[async_trait]
    impl InferenceBackend for EmptyChoicesBackend {
        async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, OcrError> {
            Ok(ChatResponse { choices: vec![] })
        }
    }

    fn jpeg_fixture() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(60, 40, Rgb([128, 128, 128])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
            .expect("jpeg encode");
        buf
    }

    #[tokio::test]
    async fn output_is_trimmed() {
        let config = RelayConfig::default();
        let backend = FixedBackend("  Dear diary,\nit rained today.  \n");
        let doc = UploadedDocument::Image(jpeg_fixture());

        let extraction = extract_text(doc, &config, &backend).await.expect("success");
        assert_eq!(extraction.text, "Dear diary,\nit rained today.");
        assert_eq!(extraction.stats.width, 60);
        assert_eq!(extraction.stats.height, 40);
        assert!(extraction.stats.payload_base64_len > 0);
    }

    #[tokio::test]
    async fn empty_upload_is_rejected_before_preprocessing() {
        let config = RelayConfig::default();
        let backend = FixedBackend("unused");
        let doc = UploadedDocument::Image(Vec::new());

        let result = extract_text(doc, &config, &backend).await;
        assert!(matches!(result, Err(OcrError::EmptyUpload)));
    }

    #[tokio::test]
    async fn undecodable_upload_fails_with_decode_error() {
        let config = RelayConfig::default();
        let backend = FixedBackend("unused");
        let doc = UploadedDocument::Image(b"plain text, not pixels".to_vec());

        let result = extract_text(doc, &config, &backend).await;
        assert!(matches!(result, Err(OcrError::Decode { .. })));
    }

    #[tokio::test]
    async fn choiceless_response_is_an_inference_error() {
        let config = RelayConfig::default();
        let doc = UploadedDocument::Image(jpeg_fixture());

        let result = extract_text(doc, &config, &EmptyChoicesBackend).await;
        assert!(matches!(result, Err(OcrError::Inference { .. })));
    }

    #[test]
    fn media_type_resolves_the_variant() {
        let pdf = UploadedDocument::from_media_type(vec![1], Some("application/pdf"));
        assert_eq!(pdf.kind(), "pdf-first-page");

        let img = UploadedDocument::from_media_type(vec![1], Some("image/png"));
        assert_eq!(img.kind(), "image");

        let unknown = UploadedDocument::from_media_type(vec![1], None);
        assert_eq!(unknown.kind(), "image");
    }
}
