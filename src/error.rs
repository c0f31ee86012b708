//! Crate-level error type.
//!
//! Collaborator failures (completion service, contract) keep their own
//! error enums and are wrapped here so callers can match on one type.

use crate::contract::ContractError;
use crate::llm::ProviderError;
use thiserror::Error;

/// Result alias used by the game layer.
pub type Result<T> = std::result::Result<T, ArenaError>;

#[derive(Debug, Error)]
pub enum ArenaError {
    /// Local user input rejected before submission.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The local user has used up their message allowance.
    #[error("message limit reached ({limit} messages per game)")]
    MessageLimitReached { limit: u32 },

    /// Operation not allowed in the current phase.
    #[error("not allowed during {phase} phase")]
    WrongPhase { phase: &'static str },

    /// Vote target is not on the candidate list.
    #[error("unknown vote candidate: {0}")]
    UnknownCandidate(String),

    /// A ballot was already submitted for this game.
    #[error("vote already submitted")]
    AlreadyVoted,

    /// Roster could not be assembled.
    #[error("roster error: {0}")]
    Roster(String),

    /// Identity verification has not been completed.
    #[error("identity verification required")]
    VerificationRequired,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl ArenaError {
    /// Short machine-readable code, used in HTTP error bodies and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::MessageLimitReached { .. } => "message_limit",
            Self::WrongPhase { .. } => "wrong_phase",
            Self::UnknownCandidate(_) => "unknown_candidate",
            Self::AlreadyVoted => "already_voted",
            Self::Roster(_) => "roster",
            Self::VerificationRequired => "verification_required",
            Self::Provider(_) => "provider",
            Self::Contract(_) => "contract",
        }
    }
}
