//! In-process game contract.
//!
//! Mirrors the escrow contract's rules and revert reasons so lobby, join
//! and admin flows can run without a chain. State lives behind a tokio
//! `RwLock` shared by clones.

use super::error::{ContractError, Result};
use super::r#trait::GameContract;
use super::types::{Address, GameDetails, GameId, GameStatus, TxReceipt, Wei};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Seconds after the last join before an unstarted game may be refunded.
pub const GAME_TIMEOUT_SECS: u64 = 3600;

#[derive(Debug, Clone)]
struct GameRecord {
    entry_fee: Wei,
    prize_pool: Wei,
    players: Vec<Address>,
    ai_player: Option<Address>,
    status: GameStatus,
    creation_time: i64,
    last_join_time: i64,
    start_time: Option<i64>,
    duration_secs: u64,
}

#[derive(Debug, Default)]
struct ChainState {
    games: HashMap<GameId, GameRecord>,
    counter: u64,
    tx_nonce: u64,
}

impl ChainState {
    fn game_mut(&mut self, game_id: GameId) -> Result<&mut GameRecord> {
        self.games
            .get_mut(&game_id)
            .ok_or_else(|| ContractError::Reverted("Game not found".into()))
    }

    fn receipt(&mut self, label: &str) -> TxReceipt {
        self.tx_nonce += 1;
        let digest = Sha256::digest(format!("{}:{}", label, self.tx_nonce).as_bytes());
        TxReceipt {
            hash: format!("0x{}", hex::encode(digest)),
        }
    }
}

#[derive(Clone)]
pub struct MemoryContract {
    owner: Address,
    state: Arc<RwLock<ChainState>>,
    broken_details: bool,
}

impl MemoryContract {
    pub fn new(owner: impl Into<Address>) -> Self {
        Self {
            owner: owner.into(),
            state: Arc::new(RwLock::new(ChainState::default())),
            broken_details: false,
        }
    }

    /// Make `game_details` fail to decode, as a mismatched ABI would.
    pub fn with_broken_details(mut self) -> Self {
        self.broken_details = true;
        self
    }

    /// Address recorded by `set_ai_player`, if any.
    pub async fn ai_player(&self, game_id: GameId) -> Option<Address> {
        let state = self.state.read().await;
        state.games.get(&game_id).and_then(|g| g.ai_player.clone())
    }

    fn require_owner(&self, caller: &Address) -> Result<()> {
        if caller != &self.owner {
            return Err(ContractError::Reverted("Only owner".into()));
        }
        Ok(())
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[async_trait]
impl GameContract for MemoryContract {
    async fn game_id_counter(&self) -> Result<u64> {
        Ok(self.state.read().await.counter)
    }

    async fn owner(&self) -> Result<Address> {
        Ok(self.owner.clone())
    }

    async fn create_game(&self, caller: &Address, entry_fee: Wei) -> Result<GameId> {
        self.require_owner(caller)?;
        if entry_fee == 0 {
            return Err(ContractError::Reverted(
                "Entry fee must be greater than 0".into(),
            ));
        }
        let mut state = self.state.write().await;
        let id = state.counter;
        let ts = now();
        state.games.insert(
            id,
            GameRecord {
                entry_fee,
                prize_pool: 0,
                players: Vec::new(),
                ai_player: None,
                status: GameStatus::NotStarted,
                creation_time: ts,
                last_join_time: ts,
                start_time: None,
                duration_secs: 0,
            },
        );
        state.counter += 1;
        tracing::debug!("Created game #{} (fee {} wei)", id, entry_fee);
        Ok(id)
    }

    async fn join_game(&self, caller: &Address, game_id: GameId, value: Wei) -> Result<TxReceipt> {
        let mut state = self.state.write().await;
        let game = state.game_mut(game_id)?;
        if game.status != GameStatus::NotStarted {
            return Err(ContractError::Reverted("Game already started".into()));
        }
        if game.players.contains(caller) {
            return Err(ContractError::Reverted("Already joined this game".into()));
        }
        if value != game.entry_fee {
            return Err(ContractError::Reverted("Incorrect entry fee".into()));
        }
        game.players.push(caller.clone());
        game.prize_pool += value;
        game.last_join_time = now();
        Ok(state.receipt("join"))
    }

    async fn game_details(&self, game_id: GameId) -> Result<GameDetails> {
        if self.broken_details {
            return Err(ContractError::Decode(
                "getGameDetails returned an unexpected tuple".into(),
            ));
        }
        let state = self.state.read().await;
        let game = state
            .games
            .get(&game_id)
            .ok_or(ContractError::NotFound(game_id))?;
        let elapsed = (now() - game.last_join_time).max(0) as u64;
        Ok(GameDetails {
            entry_fee: game.entry_fee,
            prize_pool: game.prize_pool,
            player_count: game.players.len() as u64,
            status: game.status,
            creation_time: game.creation_time,
            last_join_time: game.last_join_time,
            time_until_timeout: GAME_TIMEOUT_SECS.saturating_sub(elapsed),
        })
    }

    async fn players(&self, game_id: GameId) -> Result<Vec<Address>> {
        let state = self.state.read().await;
        state
            .games
            .get(&game_id)
            .map(|g| g.players.clone())
            .ok_or(ContractError::NotFound(game_id))
    }

    async fn set_ai_player(&self, caller: &Address, game_id: GameId, ai_player: &Address) -> Result<TxReceipt> {
        self.require_owner(caller)?;
        let mut state = self.state.write().await;
        let game = state.game_mut(game_id)?;
        if game.status != GameStatus::NotStarted {
            return Err(ContractError::Reverted("Game already started".into()));
        }
        game.ai_player = Some(ai_player.clone());
        Ok(state.receipt("set_ai"))
    }

    async fn start_game(&self, caller: &Address, game_id: GameId, duration_secs: u64) -> Result<TxReceipt> {
        self.require_owner(caller)?;
        let mut state = self.state.write().await;
        let game = state.game_mut(game_id)?;
        if game.status != GameStatus::NotStarted {
            return Err(ContractError::Reverted("Game already started".into()));
        }
        if game.players.len() < 2 {
            return Err(ContractError::Reverted("Not enough players".into()));
        }
        if game.ai_player.is_none() {
            return Err(ContractError::Reverted("AI player not set".into()));
        }
        game.status = GameStatus::InProgress;
        game.start_time = Some(now());
        game.duration_secs = duration_secs;
        Ok(state.receipt("start"))
    }

    async fn end_game(&self, caller: &Address, game_id: GameId) -> Result<TxReceipt> {
        self.require_owner(caller)?;
        let mut state = self.state.write().await;
        let game = state.game_mut(game_id)?;
        if game.status != GameStatus::InProgress {
            return Err(ContractError::Reverted("Game not in progress".into()));
        }
        game.status = GameStatus::Completed;
        Ok(state.receipt("end"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEE: Wei = 1_000_000_000_000_000;

    fn owner() -> Address {
        Address::new("0xOWNER00000000000000000000000000000000000")
    }

    fn player(n: u8) -> Address {
        Address::new(format!("0x{:040x}", 0x100 + n as u64))
    }

    #[tokio::test]
    async fn test_join_accumulates_prize_pool() {
        let contract = MemoryContract::new(owner());
        let id = contract.create_game(&owner(), FEE).await.unwrap();
        contract.join_game(&player(1), id, FEE).await.unwrap();
        contract.join_game(&player(2), id, FEE).await.unwrap();

        let details = contract.game_details(id).await.unwrap();
        assert_eq!(details.player_count, 2);
        assert_eq!(details.prize_pool, 2 * FEE);
        assert_eq!(details.status, GameStatus::NotStarted);
        assert!(details.time_until_timeout <= GAME_TIMEOUT_SECS);
    }

    #[tokio::test]
    async fn test_join_reverts() {
        let contract = MemoryContract::new(owner());
        let id = contract.create_game(&owner(), FEE).await.unwrap();
        contract.join_game(&player(1), id, FEE).await.unwrap();

        let err = contract.join_game(&player(1), id, FEE).await.unwrap_err();
        assert_eq!(err.reason(), Some("Already joined this game"));

        let err = contract.join_game(&player(2), id, FEE / 2).await.unwrap_err();
        assert_eq!(err.reason(), Some("Incorrect entry fee"));

        let err = contract.join_game(&player(2), 42, FEE).await.unwrap_err();
        assert_eq!(err.reason(), Some("Game not found"));
    }

    #[tokio::test]
    async fn test_owner_only_lifecycle() {
        let contract = MemoryContract::new(owner());
        let id = contract.create_game(&owner(), FEE).await.unwrap();
        contract.join_game(&player(1), id, FEE).await.unwrap();
        contract.join_game(&player(2), id, FEE).await.unwrap();

        let err = contract
            .set_ai_player(&player(1), id, &player(2))
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Some("Only owner"));

        contract.set_ai_player(&owner(), id, &player(2)).await.unwrap();
        contract.start_game(&owner(), id, 60).await.unwrap();
        assert_eq!(
            contract.game_details(id).await.unwrap().status,
            GameStatus::InProgress
        );

        let err = contract.join_game(&player(3), id, FEE).await.unwrap_err();
        assert_eq!(err.reason(), Some("Game already started"));

        contract.end_game(&owner(), id).await.unwrap();
        let err = contract.end_game(&owner(), id).await.unwrap_err();
        assert_eq!(err.reason(), Some("Game not in progress"));
    }

    #[tokio::test]
    async fn test_create_game_owner_only() {
        let contract = MemoryContract::new(owner());
        let err = contract.create_game(&player(1), FEE).await.unwrap_err();
        assert_eq!(err.reason(), Some("Only owner"));
        let err = contract.create_game(&owner(), 0).await.unwrap_err();
        assert_eq!(err.reason(), Some("Entry fee must be greater than 0"));
        assert_eq!(contract.game_id_counter().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_broken_details() {
        let contract = MemoryContract::new(owner()).with_broken_details();
        let id = contract.create_game(&owner(), FEE).await.unwrap();
        assert!(matches!(
            contract.game_details(id).await,
            Err(ContractError::Decode(_))
        ));
        assert!(contract.players(id).await.unwrap().is_empty());
    }
}
