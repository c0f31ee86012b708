//! Contract call errors.

use super::types::GameId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContractError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// Transaction reverted; carries the revert reason string.
    #[error("transaction reverted: {0}")]
    Reverted(String),

    #[error("game #{0} not found")]
    NotFound(GameId),

    /// Return data did not match the expected shape.
    #[error("could not decode contract response: {0}")]
    Decode(String),

    /// Caller-side precondition failed before any transaction was sent.
    #[error("{0}")]
    Precondition(String),

    #[error("contract unreachable: {0}")]
    Transport(String),
}

impl ContractError {
    /// Revert reason, if this error is a revert.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Reverted(reason) => Some(reason.as_str()),
            _ => None,
        }
    }
}
