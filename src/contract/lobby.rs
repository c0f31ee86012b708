//! Game listing and the join flow.

use super::r#trait::GameContract;
use super::status::{GameSummary, StatusInference};
use super::types::{Address, GameId, GameStatus, TxReceipt, Wei};
use super::error::ContractError;
use crate::error::{ArenaError, Result};
use crate::identity::VerificationSession;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lobby status filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    #[default]
    All,
    NotStarted,
    InProgress,
}

impl StatusFilter {
    pub fn matches(&self, status: GameStatus) -> bool {
        match self {
            Self::All => true,
            Self::NotStarted => status == GameStatus::NotStarted,
            Self::InProgress => status == GameStatus::InProgress,
        }
    }
}

/// Result of a join attempt that let the player into the lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined(TxReceipt),
    /// Already a player; nothing was paid.
    AlreadyJoined,
    /// Contract owner enters without paying.
    OwnerAccess,
}

pub struct Lobby {
    contract: Arc<dyn GameContract>,
    inference: StatusInference,
    default_fee: Wei,
}

impl Lobby {
    pub fn new(contract: Arc<dyn GameContract>, inference: StatusInference, default_fee: Wei) -> Self {
        Self {
            contract,
            inference,
            default_fee,
        }
    }

    pub fn contract(&self) -> &Arc<dyn GameContract> {
        &self.contract
    }

    /// List every non-completed game, not-started first, then by time
    /// until timeout descending. Fails only if the game counter cannot be
    /// read; per-game failures degrade inside [`StatusInference`].
    pub async fn list_games(&self, local: Option<&Address>) -> Result<Vec<GameSummary>> {
        let counter = self.contract.game_id_counter().await?;
        let reads = (0..counter).map(|id| {
            self.inference
                .summarize(self.contract.as_ref(), id, local, self.default_fee)
        });
        let mut games: Vec<GameSummary> = join_all(reads)
            .await
            .into_iter()
            .filter(|g| g.status != GameStatus::Completed)
            .collect();

        games.sort_by(|a, b| {
            let a_open = a.status == GameStatus::NotStarted;
            let b_open = b.status == GameStatus::NotStarted;
            b_open
                .cmp(&a_open)
                .then(b.time_until_timeout.cmp(&a.time_until_timeout))
        });
        tracing::debug!("Listed {} open games", games.len());
        Ok(games)
    }

    pub async fn list_filtered(&self, local: Option<&Address>, filter: StatusFilter) -> Result<Vec<GameSummary>> {
        let mut games = self.list_games(local).await?;
        games.retain(|g| filter.matches(g.status));
        Ok(games)
    }

    /// Create a game. Only the contract owner may do this.
    pub async fn create_game(&self, caller: &Address, entry_fee: Wei) -> Result<GameId> {
        let owner = self.contract.owner().await?;
        if &owner != caller {
            return Err(ContractError::Precondition(
                "Only the contract owner can create games".into(),
            )
            .into());
        }
        Ok(self.contract.create_game(caller, entry_fee).await?)
    }

    /// Join `game_id`, paying its entry fee unless the caller is already a
    /// player or is the contract owner.
    pub async fn join(
        &self,
        caller: &Address,
        game_id: GameId,
        verification: &VerificationSession,
    ) -> Result<JoinOutcome> {
        if !verification.is_verified() {
            return Err(ArenaError::VerificationRequired);
        }

        match self.contract.players(game_id).await {
            Ok(players) if players.contains(caller) => return Ok(JoinOutcome::AlreadyJoined),
            Ok(_) => {}
            Err(e) => tracing::warn!("Membership check failed for game #{}: {}", game_id, e),
        }

        let owner = self.contract.owner().await?;
        if &owner == caller {
            tracing::info!("Owner accessing game #{} without payment", game_id);
            return Ok(JoinOutcome::OwnerAccess);
        }

        let fee = match self.contract.game_details(game_id).await {
            Ok(details) => details.entry_fee,
            Err(e) => {
                tracing::warn!("Using default entry fee for game #{}: {}", game_id, e);
                self.default_fee
            }
        };

        match self.contract.join_game(caller, game_id, fee).await {
            Ok(receipt) => {
                tracing::info!("Joined game #{} (tx {})", game_id, receipt.hash);
                Ok(JoinOutcome::Joined(receipt))
            }
            Err(e) if e.reason() == Some("Already joined this game") => {
                Ok(JoinOutcome::AlreadyJoined)
            }
            Err(e) => Err(e.into()),
        }
    }
}
