//! Request construction: encoded image → OpenAI-compatible chat request.
//!
//! The wire shapes mirror the chat-completions schema that llama.cpp,
//! Ollama, LM Studio, and OpenAI itself all accept: role-tagged messages
//! where a user message's content may be an array of typed parts (`text`,
//! `image_url`). The request is built fresh for every upload and never
//! reused; the only inputs are the immutable config and the encoded image.

use crate::config::RelayConfig;
use crate::pipeline::preprocess::EncodedImage;
use crate::prompts::{SYSTEM_PROMPT, USER_INSTRUCTION};
use serde::Serialize;

/// A complete chat-completions request body.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub stop: Vec<String>,
}

/// One role-tagged message.
///
/// The system turn carries plain text; the user turn carries typed content
/// parts. Serde's untagged enum picks the right JSON shape for each.
#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Assemble the fixed two-message conversation for one upload.
///
/// Message order is part of the contract: the system message pins the OCR
/// rules before the user turn pairs the instruction with the embedded image.
pub fn build_request(config: &RelayConfig, image: &EncodedImage) -> ChatRequest {
    let system_prompt = config
        .system_prompt
        .clone()
        .unwrap_or_else(|| SYSTEM_PROMPT.to_string());

    ChatRequest {
        model: config.model.clone(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(system_prompt),
            },
            ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: USER_INSTRUCTION.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_uri(),
                        },
                    },
                ]),
            },
        ],
        temperature: config.temperature,
        top_p: config.top_p,
        max_tokens: config.max_tokens,
        frequency_penalty: config.frequency_penalty,
        presence_penalty: config.presence_penalty,
        stop: config.stop.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_image() -> EncodedImage {
        EncodedImage {
            base64: "QUJD".to_string(),
            mime_type: "image/jpeg",
            width: 10,
            height: 10,
        }
    }

    #[test]
    fn request_has_system_then_user_message() {
        let config = RelayConfig::default();
        let req = build_request(&config, &sample_image());

        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, "system");
        assert_eq!(req.messages[1].role, "user");
    }

    #[test]
    fn request_carries_fixed_decoding_parameters() {
        let config = RelayConfig::default();
        let req = build_request(&config, &sample_image());

        assert_eq!(req.temperature, 0.2);
        assert_eq!(req.top_p, 0.9);
        assert_eq!(req.max_tokens, 512);
        assert_eq!(req.frequency_penalty, 0.5);
        assert_eq!(req.presence_penalty, 0.3);
        assert_eq!(req.stop, vec!["\n\n\n", "</s>"]);
    }

    #[test]
    fn json_shape_matches_openai_schema() {
        let config = RelayConfig::default();
        let req = build_request(&config, &sample_image());
        let json = serde_json::to_value(&req).expect("serialisable");

        assert_eq!(json["messages"][0]["role"], "system");
        assert!(json["messages"][0]["content"].is_string());

        let parts = json["messages"][1]["content"]
            .as_array()
            .expect("user content is a parts array");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(
            parts[1]["image_url"]["url"],
            "data:image/jpeg;base64,QUJD"
        );
    }

    #[test]
    fn custom_system_prompt_overrides_default() {
        let config = RelayConfig::builder()
            .system_prompt("transcribe everything")
            .build()
            .unwrap();
        let req = build_request(&config, &sample_image());

        match &req.messages[0].content {
            MessageContent::Text(t) => assert_eq!(t, "transcribe everything"),
            _ => panic!("system content must be plain text"),
        }
    }
}
