//! Response generation.
//!
//! Builds the speaking instruction for one turn, calls the completion
//! service and trims the reply to a chat-sized line. Never fails: service
//! errors fall through a filler request to a fixed line.

use super::participant::Personality;
use crate::llm::{ChatMessage, CompletionRequest, CompletionService};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

pub const FALLBACK_LINE: &str = "Interesting point.";
pub const WELCOME_FALLBACK: &str = "Welcome to the game! Chat with others and spot the AI among us.";

const WELCOME_PROMPT: &str = "Generate a short welcome message for a social deduction game where players need to identify which player is an AI. Keep it under 15 words and make it engaging.";
const FILLER_PROMPT: &str = "Generate a very short (5-7 words) generic response that could fit in any conversation. Make it sound natural.";

const HIDDEN_AI_PROMPT: &str = "You are an AI trying to blend in as a human in a social deduction game. IMPORTANT: Pay close attention to the conversation topic and respond directly to it. Keep responses short (10-20 words) but relevant to the ongoing discussion. Be casual but coherent.";
const HUMAN_PROMPT: &str = "You are a human player in a social deduction game. IMPORTANT: Pay close attention to the conversation topic and respond directly to it. Keep responses short (10-20 words) but relevant to the ongoing discussion. Be casual but coherent.";
const FLOW_PROMPT: &str = " Maintain the flow of conversation. If someone asked a question, answer it directly.";

/// Replies longer than this are cut.
pub const MAX_REPLY_CHARS: usize = 60;
const CUT_SEARCH_START: usize = 20;
const MAX_WORDS: usize = 12;
/// Only the newest few history lines are searched for something to answer.
const TOPIC_WINDOW: usize = 5;

static SPEAKER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(Player \d+|You):\s*").expect("valid regex"));
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s").expect("valid regex"));
static CLAUSE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,;]\s").expect("valid regex"));

/// Strip a leading `Player N:` / `You:` and shorten long replies at a
/// sentence end, else a clause break, else after twelve words with `...`.
pub fn trim_response(raw: &str) -> String {
    let text = SPEAKER_PREFIX.replace(raw.trim(), "").trim().to_string();
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= MAX_REPLY_CHARS {
        return text;
    }

    let window: String = chars[CUT_SEARCH_START..MAX_REPLY_CHARS].iter().collect();
    for pattern in [&*SENTENCE_END, &*CLAUSE_END] {
        // A break right at the start of the window does not count.
        if let Some(m) = pattern.find(&window).filter(|m| m.start() > 0) {
            let offset = window[..m.start()].chars().count();
            return chars[..CUT_SEARCH_START + offset + 1].iter().collect();
        }
    }

    let words: Vec<&str> = text.split(' ').collect();
    if words.len() > MAX_WORDS {
        return format!("{}...", words[..MAX_WORDS].join(" "));
    }
    text
}

pub struct ResponseGenerator {
    service: Arc<dyn CompletionService>,
    personality: Option<&'static Personality>,
}

impl ResponseGenerator {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self {
            service,
            personality: None,
        }
    }

    /// Personality appended to the hidden AI's instruction.
    pub fn with_personality(mut self, personality: &'static Personality) -> Self {
        self.personality = Some(personality);
        self
    }

    /// Speaking instruction for one turn.
    pub fn build_prompt(&self, history: &[ChatMessage], is_hidden_ai: bool) -> String {
        let mut prompt = String::from(if is_hidden_ai { HIDDEN_AI_PROMPT } else { HUMAN_PROMPT });

        if is_hidden_ai && let Some(p) = self.personality {
            prompt.push_str(&format!(" Personality hint ({}): {}", p.name, p.prompt));
        }

        let recent = &history[history.len().saturating_sub(TOPIC_WINDOW)..];
        if let Some(last) = recent.last() {
            prompt.push_str(&format!(" Respond directly to this message: \"{}\".", last.content));
        }

        prompt.push_str(FLOW_PROMPT);
        prompt
    }

    /// One line of dialogue for a speaker. Always non-empty.
    pub async fn generate(&self, history: Vec<ChatMessage>, is_hidden_ai: bool) -> String {
        let prompt = self.build_prompt(&history, is_hidden_ai);
        let request = CompletionRequest::new(prompt).with_messages(history);

        match self.service.complete(request).await {
            Ok(resp) => {
                let line = trim_response(&resp.response);
                if !line.is_empty() {
                    tracing::debug!(
                        "Generated line in {}ms (ai={})",
                        resp.metadata.processing_time_ms,
                        is_hidden_ai
                    );
                    return line;
                }
                tracing::warn!("Completion service returned an empty line");
            }
            Err(e) => tracing::warn!("Completion failed, requesting filler: {}", e),
        }

        self.filler().await
    }

    async fn filler(&self) -> String {
        match self.service.complete(CompletionRequest::new(FILLER_PROMPT)).await {
            Ok(resp) if !resp.response.trim().is_empty() => resp.response.trim().to_string(),
            Ok(_) => FALLBACK_LINE.to_string(),
            Err(e) => {
                tracing::warn!("Filler request failed: {}", e);
                FALLBACK_LINE.to_string()
            }
        }
    }

    /// Opening line posted by the `Game` sender.
    pub async fn welcome(&self) -> String {
        match self.service.complete(CompletionRequest::new(WELCOME_PROMPT)).await {
            Ok(resp) if !resp.response.trim().is_empty() => resp.response.trim().to_string(),
            Ok(_) => WELCOME_FALLBACK.to_string(),
            Err(e) => {
                tracing::warn!("Welcome message generation failed: {}", e);
                WELCOME_FALLBACK.to_string()
            }
        }
    }

    /// Short reveal of the hidden AI's strategy for the results screen.
    pub async fn describe_ai(&self, personality: &Personality) -> String {
        let prompt = format!(
            "Generate a brief description (2-3 sentences) of an AI with this personality: \"{}: {}\". Make it sound like you're revealing the AI's strategy.",
            personality.name, personality.prompt
        );
        match self.service.complete(CompletionRequest::new(prompt)).await {
            Ok(resp) if !resp.response.trim().is_empty() => resp.response.trim().to_string(),
            _ => format!(
                "This AI was programmed with the \"{}\" personality, trying to blend in with human players.",
                personality.name
            ),
        }
    }
}
