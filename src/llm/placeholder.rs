//! Offline placeholder completion service.
//!
//! Answers every request with a canned casual line so a game can run
//! without network access or an API key.

use super::error::Result;
use super::r#trait::CompletionService;
use super::types::{CompletionMetadata, CompletionRequest, CompletionResponse};
use async_trait::async_trait;
use rand::seq::IndexedRandom;

const CANNED_LINES: &[&str] = &[
    "I'm not sure what to say.",
    "That's an interesting point.",
    "Tell me more about that.",
    "I need a moment to think about that.",
    "Let's hear what others have to say.",
    "Honestly I was thinking the same thing.",
    "Wait, who asked that? Sounds a bit robotic lol",
    "Hmm, not sure I agree with that one.",
    "Haha fair enough, what do you all think?",
    "I just got here, what did I miss?",
];

const WELCOME_LINE: &str = "Welcome! One of us is an AI. Can you spot who?";

#[derive(Debug, Default, Clone)]
pub struct PlaceholderCompletion;

impl PlaceholderCompletion {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CompletionService for PlaceholderCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let text = if request.prompt.to_lowercase().contains("welcome message") {
            WELCOME_LINE
        } else {
            CANNED_LINES
                .choose(&mut rand::rng())
                .copied()
                .unwrap_or(CANNED_LINES[0])
        };

        Ok(CompletionResponse {
            response: text.to_string(),
            metadata: CompletionMetadata {
                processing_time_ms: 0,
                message_count: request.messages.len(),
                model: self.model().to_string(),
                fallback: false,
            },
        })
    }

    fn name(&self) -> &str {
        "placeholder"
    }

    fn model(&self) -> &str {
        "placeholder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_placeholder_never_empty() {
        let service = PlaceholderCompletion::new();
        for _ in 0..20 {
            let resp = service
                .complete(CompletionRequest::new("respond"))
                .await
                .expect("placeholder never fails");
            assert!(!resp.response.is_empty());
        }
    }

    #[tokio::test]
    async fn test_placeholder_welcome() {
        let service = PlaceholderCompletion::new();
        let resp = service
            .complete(CompletionRequest::new("Generate a short welcome message for a game"))
            .await
            .expect("welcome");
        assert_eq!(resp.response, WELCOME_LINE);
    }
}
