//! Conversation orchestration for one game.
//!
//! A game is ten participants chatting for a fixed time, one of them a
//! hidden AI, followed by a vote. Everything here is in-process; the
//! completion service and the game contract are collaborators.

pub mod chaos;
pub mod generator;
pub mod participant;
pub mod phase;
pub mod queue;
pub mod results;
pub mod selector;
pub mod session;
pub mod transcript;
pub mod voting;

pub use generator::ResponseGenerator;
pub use participant::{Participant, Personality, Roster};
pub use phase::{Phase, PhaseTimer};
pub use queue::{MessageQueue, SpeakHandler, SpeakTask, TaskOrigin};
pub use results::GameResults;
pub use session::{GameSession, SessionEvent, SessionSnapshot};
pub use transcript::{Transcript, TranscriptEntry};
pub use voting::VotingBooth;
