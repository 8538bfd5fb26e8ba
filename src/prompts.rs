//! Prompts for handwritten-text extraction.
//!
//! Centralising the prompt text here serves two purposes:
//!
//! 1. **Single source of truth** — tightening a transcription rule requires
//!    editing exactly one place.
//!
//! 2. **Testability** — unit tests inspect the prompt directly without
//!    calling a real model, so a prompt regression (a dropped sentinel rule,
//!    say) is caught in CI.
//!
//! Callers can override the system prompt via
//! [`crate::config::RelayConfig::system_prompt`]; the constants here are used
//! when no override is provided.

/// System prompt pinning strict OCR behaviour.
///
/// The rules exist to keep a chatty vision model acting like a transcription
/// engine: no corrections, no summaries, sentinel tokens instead of guesses,
/// and a hard stop when the page runs out.
pub const SYSTEM_PROMPT: &str = "\
You are an advanced OCR engine specialized in extracting text from handwritten documents.

Rules:
- Accurately transcribe handwritten text.
- Preserve original line breaks and formatting.
- Do NOT correct spelling.
- Do NOT summarize.
- Do NOT interpret meaning.
- Do NOT repeat content.
- Stop when transcription ends.
- If unreadable, write [unclear].
- If partially readable, write [word?].

Return ONLY the extracted text.";

/// User-turn instruction paired with the embedded image.
pub const USER_INSTRUCTION: &str = "Extract the handwritten text from this image.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_keeps_sentinel_rules() {
        assert!(SYSTEM_PROMPT.contains("[unclear]"));
        assert!(SYSTEM_PROMPT.contains("[word?]"));
    }

    #[test]
    fn system_prompt_forbids_rewriting() {
        assert!(SYSTEM_PROMPT.contains("Do NOT correct spelling"));
        assert!(SYSTEM_PROMPT.contains("Do NOT summarize"));
        assert!(SYSTEM_PROMPT.contains("Stop when transcription ends"));
    }

    #[test]
    fn user_instruction_mentions_the_image() {
        assert!(USER_INSTRUCTION.contains("image"));
    }
}
