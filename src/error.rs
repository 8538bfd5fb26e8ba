//! Error types for the handscribe library.
//!
//! One enum covers the whole request/response cycle because every failure is
//! surfaced the same way: caught at the HTTP boundary and converted into a
//! structured `{"status":"error","message":…}` body. The variants follow the
//! failure taxonomy of the pipeline stages:
//!
//! * [`OcrError::Decode`] — the uploaded bytes are not a decodable image.
//! * [`OcrError::Transmission`] — the inference server could not be reached.
//! * [`OcrError::Inference`] — the inference server answered, but with an
//!   error or a body we cannot use.
//!
//! The preprocessor never catches its own decode failures; that is the
//! relay's job, so a library caller using [`crate::pipeline::preprocess`]
//! directly sees the raw `Decode` error.

use thiserror::Error;

/// All errors returned by the handscribe library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Preprocessing errors ──────────────────────────────────────────────
    /// The uploaded bytes could not be decoded as an image.
    ///
    /// No retry is attempted; the caller must supply a valid image bitstream.
    #[error("Uploaded file is not a decodable image: {detail}")]
    Decode { detail: String },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The inference server is unreachable or the connection failed.
    #[error("Inference server unreachable: {reason}\nCheck that the model server is running and the endpoint URL is correct.")]
    Transmission { reason: String },

    // ── Inference errors ──────────────────────────────────────────────────
    /// The inference server responded, but with an error status or a
    /// malformed body. The diagnostic is surfaced verbatim.
    #[error("Inference failed: {message}")]
    Inference { message: String },

    // ── Upload errors ─────────────────────────────────────────────────────
    /// The multipart request contained no file field.
    #[error("No file field found in the multipart upload")]
    MissingFile,

    /// The uploaded file field was empty.
    #[error("Uploaded file is empty")]
    EmptyUpload,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// HTTP status the error maps to at the request boundary.
    ///
    /// Pipeline, transport, and inference failures are all 500-class: from
    /// the caller's perspective the extraction failed server-side. Only a
    /// request that never carried a usable file is the caller's fault.
    pub fn status_code(&self) -> u16 {
        match self {
            OcrError::MissingFile | OcrError::EmptyUpload => 400,
            _ => 500,
        }
    }
}
