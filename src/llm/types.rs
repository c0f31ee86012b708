//! Wire types shared by the completion client, the game layer and the
//! `/api/ai-response` proxy.

use serde::{Deserialize, Serialize};

/// Role tag of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One role-tagged history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Display name of the speaker, rendered as a `Name: ` prefix upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            sender: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Content as sent upstream: `"{sender}: {content}"` when a sender is set.
    pub fn rendered(&self) -> String {
        match &self.sender {
            Some(sender) => format!("{}: {}", sender, self.content),
            None => self.content.clone(),
        }
    }
}

/// Completion request: a system prompt plus optional chat history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,

    #[serde(default)]
    pub prompt: String,

    /// Token budget override; the service default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            prompt: prompt.into(),
            max_tokens: None,
        }
    }

    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Completion response as returned by the service and the proxy endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub response: String,
    #[serde(default)]
    pub metadata: CompletionMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionMetadata {
    #[serde(default)]
    pub processing_time_ms: u64,
    #[serde(default)]
    pub message_count: usize,
    #[serde(default)]
    pub model: String,
    /// Set when the text came from the filler path instead of the main call.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl CompletionResponse {
    pub fn text(response: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            metadata: CompletionMetadata {
                model: model.into(),
                ..Default::default()
            },
        }
    }
}
