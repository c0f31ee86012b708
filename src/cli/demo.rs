//! In-process demo chain used by `play` and `games`.
//!
//! Seeds a [`MemoryContract`] with a handful of games in different states
//! so the lobby and the play loop have something to show without a node.

use crate::arena::participant::random_address;
use crate::contract::{
    Address, FinishOptions, GameContract, GameId, MemoryContract, Wei, finish_game, start_game,
};
use anyhow::{Context, Result};
use rand::Rng;
use std::sync::Arc;

/// Owner of the demo contract.
pub const DEMO_OWNER: &str = "0x00000000000000000000000000000000000000aa";

/// Seeded demo chain plus the id of the game the local user plays.
pub struct DemoChain {
    pub contract: Arc<MemoryContract>,
    pub owner: Address,
    pub playable: GameId,
}

impl DemoChain {
    /// Build the chain: one finished game, one running game, one open game
    /// with a few players waiting (the playable one) and one empty open game.
    pub async fn seed(entry_fee: Wei, rng: &mut impl Rng) -> Result<Self> {
        let owner = Address::new(DEMO_OWNER);
        let contract = Arc::new(MemoryContract::new(owner.clone()));

        let finished = open_game(contract.as_ref(), &owner, entry_fee, 3, rng).await?;
        start_game(contract.as_ref(), &owner, finished, &Address::dummy_ai(), 60)
            .await
            .context("Failed to start demo game")?;
        finish_game(contract.as_ref(), &owner, finished, FinishOptions::default())
            .await
            .context("Failed to finish demo game")?;

        let running = open_game(contract.as_ref(), &owner, entry_fee, 4, rng).await?;
        start_game(contract.as_ref(), &owner, running, &Address::dummy_ai(), 600)
            .await
            .context("Failed to start demo game")?;

        let playable = open_game(contract.as_ref(), &owner, entry_fee, 3, rng).await?;
        open_game(contract.as_ref(), &owner, entry_fee * 2, 0, rng).await?;

        tracing::debug!("Seeded demo chain, playable game is #{}", playable);
        Ok(Self {
            contract,
            owner,
            playable,
        })
    }
}

/// Create a game and fill it with `players` random addresses.
async fn open_game(
    contract: &dyn GameContract,
    owner: &Address,
    entry_fee: Wei,
    players: usize,
    rng: &mut impl Rng,
) -> Result<GameId> {
    let id = contract
        .create_game(owner, entry_fee)
        .await
        .context("Failed to create demo game")?;
    for _ in 0..players {
        let player = random_address(rng);
        contract
            .join_game(&player, id, entry_fee)
            .await
            .with_context(|| format!("Failed to join demo game #{}", id))?;
    }
    Ok(id)
}
