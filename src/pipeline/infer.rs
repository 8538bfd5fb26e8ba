//! Inference backend: submit a chat request, return the model's reply.
//!
//! The backend sits behind a trait for one reason: the relay's behaviour
//! (status codes, error shapes, trimming) must be testable without a live
//! model server. Tests substitute a fixed or failing implementation; the
//! production [`OpenAiBackend`] speaks to any OpenAI-compatible
//! chat-completions endpoint (llama.cpp server, Ollama, LM Studio, OpenAI).
//!
//! No retry lives here. A failed attempt is surfaced immediately; the relay
//! has no fallback endpoint and the caller decides whether to resubmit.

use crate::config::RelayConfig;
use crate::error::OcrError;
use crate::pipeline::request::ChatRequest;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// A chat-completions backend.
///
/// Object-safe so the server can hold `Arc<dyn InferenceBackend>` and tests
/// can swap in mocks.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Submit one completion request and wait for the full response.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, OcrError>;
}

/// Successful chat-completions response body.
///
/// Only the fields the relay reads are modelled; the rest of the body is
/// ignored during deserialisation.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Construct a response carrying a single assistant message.
    ///
    /// Exists for tests and mock backends; production responses come off the
    /// wire via serde.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: ChoiceMessage {
                    content: Some(text.into()),
                },
            }],
        }
    }

    /// Content of the first choice, if the server produced one.
    pub fn text(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.message.content.as_deref())
    }
}

/// Production backend: OpenAI-compatible HTTP endpoint.
///
/// One instance holds one [`reqwest::Client`]; all in-flight requests share
/// it and reuse its pooled connections. Construct once at process start.
pub struct OpenAiBackend {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl OpenAiBackend {
    /// Build a backend from the relay configuration.
    ///
    /// The per-call timeout is applied only when configured; the default is
    /// to inherit reqwest's behaviour (no overall timeout).
    pub fn new(config: &RelayConfig) -> Result<Self, OcrError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| OcrError::Internal(format!("HTTP client construction failed: {e}")))?;

        Ok(Self {
            client,
            url: config.completions_url(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl InferenceBackend for OpenAiBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, OcrError> {
        debug!("Submitting completion request to {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!("Inference request failed to send: {e}");
                OcrError::Transmission {
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Inference {
                message: format!("HTTP {status}: {body}"),
            });
        }

        response.json::<ChatResponse>().await.map_err(|e| {
            OcrError::Inference {
                message: format!("Malformed completion response: {e}"),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_llama_cpp_style_response() {
        let body = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "Qwen3VL-2B-Instruct-Q4_K_M.gguf",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Dear diary,"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 900, "completion_tokens": 4}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).expect("deserialise");
        assert_eq!(parsed.text(), Some("Dear diary,"));
    }

    #[test]
    fn empty_choices_yield_no_text() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(parsed.text(), None);
    }

    #[test]
    fn null_content_yields_no_text() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert_eq!(parsed.text(), None);
    }

    #[test]
    fn from_text_round_trips() {
        let r = ChatResponse::from_text("  hello  ");
        assert_eq!(r.text(), Some("  hello  "));
    }

    #[test]
    fn backend_builds_with_and_without_timeout() {
        let no_timeout = RelayConfig::default();
        assert!(OpenAiBackend::new(&no_timeout).is_ok());

        let with_timeout = RelayConfig::builder()
            .request_timeout_secs(30)
            .build()
            .unwrap();
        assert!(OpenAiBackend::new(&with_timeout).is_ok());
    }

    #[test]
    fn unreachable_server_maps_to_transmission() {
        // Port 9 (discard) is a safe never-listening target. The timeout
        // bounds the test if the connection hangs instead of refusing.
        let config = RelayConfig::builder()
            .endpoint("http://127.0.0.1:9/v1")
            .request_timeout_secs(5)
            .build()
            .unwrap();
        let backend = OpenAiBackend::new(&config).unwrap();
        let image = crate::pipeline::preprocess::EncodedImage {
            base64: "QUJD".into(),
            mime_type: "image/jpeg",
            width: 1,
            height: 1,
        };
        let request = crate::pipeline::request::build_request(&config, &image);

        let result = tokio_test::block_on(backend.complete(&request));
        assert!(matches!(result, Err(OcrError::Transmission { .. })));
    }
}
