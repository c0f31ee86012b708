use crate::arena::phase::Phase;
use crate::arena::transcript::TranscriptEntry;
use serde::Serialize;

/// Broadcast to every session subscriber.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    EntryAppended { entry: TranscriptEntry },
    /// A simulated participant started composing a line.
    Typing { speaker: String },
    /// Countdown update within the current phase.
    Tick { phase: Phase },
    PhaseChanged { phase: Phase },
    VoteCast { candidate: String },
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub entries: Vec<TranscriptEntry>,
    pub local_name: String,
    pub messages_sent: u32,
    pub messages_remaining: u32,
    pub candidates: Vec<String>,
    pub ballot: Option<String>,
}
