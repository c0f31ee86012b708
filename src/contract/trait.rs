use super::error::Result;
use super::types::{Address, GameDetails, GameId, TxReceipt, Wei};
use async_trait::async_trait;

/// Typed binding to the game escrow contract.
///
/// Write methods take the calling account explicitly; an on-chain binding
/// would take it from the connected signer instead.
#[async_trait]
pub trait GameContract: Send + Sync {
    /// Number of games ever created; ids are `0..counter`.
    async fn game_id_counter(&self) -> Result<u64>;

    async fn owner(&self) -> Result<Address>;

    async fn create_game(&self, caller: &Address, entry_fee: Wei) -> Result<GameId>;

    /// Join paying `value`, which must equal the entry fee.
    async fn join_game(&self, caller: &Address, game_id: GameId, value: Wei) -> Result<TxReceipt>;

    async fn game_details(&self, game_id: GameId) -> Result<GameDetails>;

    async fn players(&self, game_id: GameId) -> Result<Vec<Address>>;

    async fn set_ai_player(&self, caller: &Address, game_id: GameId, ai_player: &Address) -> Result<TxReceipt>;

    async fn start_game(&self, caller: &Address, game_id: GameId, duration_secs: u64) -> Result<TxReceipt>;

    async fn end_game(&self, caller: &Address, game_id: GameId) -> Result<TxReceipt>;
}
