//! Configuration for the OCR relay.
//!
//! Every knob lives in one immutable [`RelayConfig`], built once at process
//! start via its [`RelayConfigBuilder`] and passed explicitly into the
//! handlers. Nothing reads ambient global state: tests substitute a config
//! (and a mock backend) without touching the environment.
//!
//! # Design choice: builder over constructor
//! The decoding parameters alone are five fields; a positional constructor
//! breaks on every addition. The builder lets callers set only what they
//! care about and rely on documented defaults for the rest.

use crate::error::OcrError;
use serde::{Deserialize, Serialize};

/// Configuration for the image-to-model request pipeline.
///
/// Built via [`RelayConfig::builder()`] or [`RelayConfig::default()`].
///
/// # Example
/// ```rust
/// use handscribe::RelayConfig;
///
/// let config = RelayConfig::builder()
///     .endpoint("http://localhost:7979/v1")
///     .model("Qwen3VL-2B-Instruct-Q4_K_M.gguf")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Base URL of the OpenAI-compatible inference server, including the
    /// version prefix. Default: `http://localhost:7979/v1`.
    ///
    /// The relay appends `/chat/completions`. The address is process-start
    /// configuration, never a request parameter.
    pub endpoint: String,

    /// Model identifier sent with every completion request.
    /// Default: `Qwen3VL-2B-Instruct-Q4_K_M.gguf`.
    pub model: String,

    /// Bearer token for the inference server. Default: `sk-no-key-required`.
    ///
    /// Local llama.cpp-style servers ignore the key but reject requests
    /// without an `Authorization` header, so a placeholder is always sent.
    pub api_key: String,

    /// Maximum image dimension (width or height) in pixels after
    /// preprocessing. Default: 1024.
    ///
    /// Larger rasters make the inference server allocate proportionally more
    /// memory for the vision encoder; 1024 px keeps the payload inside what
    /// a 2B-class local model accepts without an out-of-memory failure.
    /// Images already within the cap are never upscaled.
    pub max_image_dim: u32,

    /// JPEG quality (1-100) for the re-encoded payload. Default: 75.
    ///
    /// Handwriting survives lossy compression well at 75, and the smaller
    /// payload matters more than pixel-perfect strokes for a vision model
    /// reading at 1024 px.
    pub jpeg_quality: u8,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Transcription wants the model deterministic and faithful to the page;
    /// higher values introduce creativity that worsens accuracy.
    pub temperature: f32,

    /// Nucleus sampling threshold. Default: 0.9.
    pub top_p: f32,

    /// Maximum tokens the model may generate. Default: 512.
    ///
    /// A page of handwriting rarely exceeds a few hundred tokens; the cap
    /// bounds cost and cuts off a model stuck in a generation loop.
    pub max_tokens: u32,

    /// Frequency penalty. Default: 0.5.
    ///
    /// Handwriting models loop on repeated strokes; penalising repeated
    /// tokens suppresses the "the the the ..." failure mode.
    pub frequency_penalty: f32,

    /// Presence penalty. Default: 0.3.
    pub presence_penalty: f32,

    /// Stop sequences terminating generation. Default: `["\n\n\n", "</s>"]`.
    ///
    /// A triple newline means the transcription ended; the end-of-sequence
    /// marker catches models that emit it literally instead of stopping.
    pub stop: Vec<String>,

    /// Custom system prompt. If `None`, uses
    /// [`crate::prompts::SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Per-call timeout for the inference request, in seconds. Default: `None`.
    ///
    /// `None` inherits whatever the HTTP client defaults to (reqwest: no
    /// overall timeout). The relay deliberately does not invent a value; an
    /// unresponsive inference call blocks its own request until the client
    /// or the peer gives up. Set this in deployments that need a bound.
    pub request_timeout_secs: Option<u64>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:7979/v1".to_string(),
            model: "Qwen3VL-2B-Instruct-Q4_K_M.gguf".to_string(),
            api_key: "sk-no-key-required".to_string(),
            max_image_dim: 1024,
            jpeg_quality: 75,
            temperature: 0.2,
            top_p: 0.9,
            max_tokens: 512,
            frequency_penalty: 0.5,
            presence_penalty: 0.3,
            stop: vec!["\n\n\n".to_string(), "</s>".to_string()],
            system_prompt: None,
            request_timeout_secs: None,
        }
    }
}

impl RelayConfig {
    /// Create a new builder for `RelayConfig`.
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL of the chat-completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

/// Builder for [`RelayConfig`].
#[derive(Debug)]
pub struct RelayConfigBuilder {
    config: RelayConfig,
}

impl RelayConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn max_image_dim(mut self, px: u32) -> Self {
        self.config.max_image_dim = px.max(64);
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn frequency_penalty(mut self, p: f32) -> Self {
        self.config.frequency_penalty = p;
        self
    }

    pub fn presence_penalty(mut self, p: f32) -> Self {
        self.config.presence_penalty = p;
        self
    }

    pub fn stop(mut self, sequences: Vec<String>) -> Self {
        self.config.stop = sequences;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RelayConfig, OcrError> {
        let c = &self.config;
        if c.endpoint.is_empty() {
            return Err(OcrError::InvalidConfig(
                "Endpoint URL must not be empty".into(),
            ));
        }
        if c.model.is_empty() {
            return Err(OcrError::InvalidConfig(
                "Model identifier must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(OcrError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_decoding_parameters() {
        let c = RelayConfig::default();
        assert_eq!(c.temperature, 0.2);
        assert_eq!(c.top_p, 0.9);
        assert_eq!(c.max_tokens, 512);
        assert_eq!(c.frequency_penalty, 0.5);
        assert_eq!(c.presence_penalty, 0.3);
        assert_eq!(c.stop, vec!["\n\n\n", "</s>"]);
        assert_eq!(c.max_image_dim, 1024);
        assert!(c.request_timeout_secs.is_none());
    }

    #[test]
    fn completions_url_trims_trailing_slash() {
        let c = RelayConfig::builder()
            .endpoint("http://localhost:7979/v1/")
            .build()
            .unwrap();
        assert_eq!(
            c.completions_url(),
            "http://localhost:7979/v1/chat/completions"
        );
    }

    #[test]
    fn builder_clamps_out_of_range_values() {
        let c = RelayConfig::builder()
            .temperature(5.0)
            .top_p(2.0)
            .jpeg_quality(0)
            .max_image_dim(1)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.top_p, 1.0);
        assert_eq!(c.jpeg_quality, 1);
        assert_eq!(c.max_image_dim, 64);
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let result = RelayConfig::builder().endpoint("").build();
        assert!(matches!(result, Err(OcrError::InvalidConfig(_))));
    }

    #[test]
    fn zero_max_tokens_is_rejected() {
        let result = RelayConfig::builder().max_tokens(0).build();
        assert!(matches!(result, Err(OcrError::InvalidConfig(_))));
    }
}
