//! Append-only chat transcript.

use crate::llm::ChatMessage;
use serde::Serialize;

/// Sender label for system lines such as the welcome message.
pub const GAME_SENDER: &str = "Game";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    /// 1-based position in the transcript.
    pub sequence_id: u64,
    pub speaker_name: String,
    pub text: String,
    pub is_hidden_ai: bool,
    pub is_local_user: bool,
}

impl TranscriptEntry {
    pub fn is_system(&self) -> bool {
        self.speaker_name == GAME_SENDER
    }
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        speaker_name: impl Into<String>,
        text: impl Into<String>,
        is_hidden_ai: bool,
        is_local_user: bool,
    ) -> &TranscriptEntry {
        let entry = TranscriptEntry {
            sequence_id: self.entries.len() as u64 + 1,
            speaker_name: speaker_name.into(),
            text: text.into(),
            is_hidden_ai,
            is_local_user,
        };
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn append_system(&mut self, text: impl Into<String>) -> &TranscriptEntry {
        self.append(GAME_SENDER, text, false, false)
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    /// Last `window` non-system entries as role-tagged chat messages: the
    /// local user's lines are `user`, everyone else's `assistant`.
    pub fn history_tail(&self, window: usize) -> Vec<ChatMessage> {
        let chat: Vec<&TranscriptEntry> = self.entries.iter().filter(|e| !e.is_system()).collect();
        let start = chat.len().saturating_sub(window);
        chat[start..]
            .iter()
            .map(|e| {
                let msg = if e.is_local_user {
                    ChatMessage::user(e.text.clone())
                } else {
                    ChatMessage::assistant(e.text.clone())
                };
                msg.with_sender(e.speaker_name.clone())
            })
            .collect()
    }

    /// Speakers of the last `window` entries, system lines excluded.
    pub fn recent_senders(&self, window: usize) -> Vec<&str> {
        let start = self.entries.len().saturating_sub(window);
        self.entries[start..]
            .iter()
            .filter(|e| !e.is_system())
            .map(|e| e.speaker_name.as_str())
            .collect()
    }

    pub fn local_message_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_local_user).count()
    }
}
