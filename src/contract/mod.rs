//! Game contract collaborator.
//!
//! Game lifecycle, entry fees and prize pools live in an on-chain escrow
//! contract. This module defines the typed binding the rest of the crate
//! calls through, an in-process implementation used by the CLI demo and
//! tests, and the lobby/admin flows built on top of it.

pub mod admin;
pub mod error;
pub mod lobby;
pub mod memory;
pub mod status;
#[allow(clippy::module_inception)]
mod r#trait;
pub mod types;

pub use admin::{FinishOptions, FinishOutcome, finish_game, start_game};
pub use error::{ContractError, Result};
pub use lobby::{JoinOutcome, Lobby, StatusFilter};
pub use memory::MemoryContract;
pub use r#trait::GameContract;
pub use status::{GameSummary, StatusInference};
pub use types::*;
