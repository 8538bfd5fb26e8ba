//! # handscribe
//!
//! Extract handwritten text from images using Vision Language Models (VLMs).
//!
//! ## Why this crate?
//!
//! Classical OCR engines are trained on print and fall apart on handwriting:
//! connected strokes, inconsistent baselines, and personal letterforms come
//! out as noise. A vision-capable language model reads a page the way a
//! human does. This crate is the orchestration around that model: it
//! normalises an uploaded image into a bounded payload, wraps it in a
//! strict transcription prompt, relays it to an OpenAI-compatible inference
//! server, and hands the transcription back over HTTP.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (HTTP multipart)
//!  │
//!  ├─ 1. Preprocess  decode, RGB, ≤1024 px, JPEG, base64 (spawn_blocking)
//!  ├─ 2. Request     system prompt + user instruction + embedded image
//!  ├─ 3. Infer       POST /chat/completions on the configured server
//!  └─ 4. Respond     {"status":"success","extracted_text":…} or error
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use handscribe::{extract_text, OpenAiBackend, RelayConfig, UploadedDocument};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RelayConfig::builder()
//!         .endpoint("http://localhost:7979/v1")
//!         .model("Qwen3VL-2B-Instruct-Q4_K_M.gguf")
//!         .build()?;
//!     let backend = OpenAiBackend::new(&config)?;
//!
//!     let bytes = std::fs::read("note.jpg")?;
//!     let doc = UploadedDocument::Image(bytes);
//!     let extraction = extract_text(doc, &config, &backend).await?;
//!     println!("{}", extraction.text);
//!     Ok(())
//! }
//! ```
//!
//! Running the bundled server instead:
//!
//! ```bash
//! handscribe-server --endpoint http://localhost:7979/v1 --port 8000
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `handscribe-server` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! handscribe = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RelayConfig, RelayConfigBuilder};
pub use error::OcrError;
pub use extract::{extract_text, Extraction, ExtractionStats, UploadedDocument};
pub use pipeline::infer::{ChatResponse, InferenceBackend, OpenAiBackend};
pub use pipeline::preprocess::{preprocess_image, EncodedImage};
pub use pipeline::request::{build_request, ChatRequest};
pub use server::{router, serve, AppState};
