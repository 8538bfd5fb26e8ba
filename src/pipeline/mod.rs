//! Pipeline stages for the image-to-model request path.
//!
//! Each submodule implements exactly one transformation step. Keeping the
//! stages separate makes each independently testable and lets the backend be
//! swapped (a mock in tests, a different server in deployment) without
//! touching the preprocessing or request-building code.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ preprocess ──▶ request ──▶ infer
//! (bytes)    (RGB, ≤1024,   (messages   (OpenAI-compatible
//!             JPEG, base64)  + params)    chat completion)
//! ```
//!
//! 1. [`preprocess`] — decode, normalise, and bound the uploaded image, then
//!    base64-encode it for embedding in JSON
//! 2. [`request`]    — assemble the two-message multimodal conversation with
//!    fixed decoding parameters
//! 3. [`infer`]      — submit the request to the inference backend; the only
//!    stage with network I/O

pub mod infer;
pub mod preprocess;
pub mod request;
