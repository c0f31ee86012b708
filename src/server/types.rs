//! Request and response bodies for the HTTP surface.

use crate::llm::{ChatMessage, Role};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/ai-response`. Fields are optional so that missing
/// ones produce a 400 with a message instead of a decode rejection.
#[derive(Debug, Default, Deserialize)]
pub struct AiResponseRequest {
    #[serde(default)]
    pub messages: Option<Vec<RawMessage>>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
}

impl RawMessage {
    /// Valid only with a known role and non-empty content.
    pub fn validate(&self) -> Option<ChatMessage> {
        let role = match self.role.as_deref()? {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => return None,
        };
        let content = self.content.as_deref().filter(|c| !c.is_empty())?;
        Some(ChatMessage {
            role,
            content: content.to_string(),
            sender: self.sender.clone().filter(|s| !s.is_empty()),
        })
    }
}

/// Error payload shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub error_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCompletionResponse {
    pub success: bool,
    pub message: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub success: bool,
    pub message: String,
}
