//! Owner-only game administration.

use super::error::{ContractError, Result};
use super::r#trait::GameContract;
use super::types::{Address, GameId, GameStatus, TxReceipt};

/// Duration used when a forced finish has to start the game first.
pub const FORCED_START_DURATION_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, Default)]
pub struct FinishOptions {
    /// Call `endGame` straight away and surface whatever it reverts with.
    pub bypass_checks: bool,
    /// Start a not-started game (dummy AI, short duration) so it can be ended.
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishOutcome {
    pub receipt: TxReceipt,
    pub forced_start: bool,
}

/// Set the AI player and start a not-started game with at least two players.
pub async fn start_game(
    contract: &dyn GameContract,
    caller: &Address,
    game_id: GameId,
    ai_player: &Address,
    duration_secs: u64,
) -> Result<TxReceipt> {
    let details = contract.game_details(game_id).await?;
    if details.status != GameStatus::NotStarted {
        return Err(ContractError::Precondition(format!(
            "Cannot start game in '{}' status. Game must be in 'Not Started' status.",
            details.status
        )));
    }
    if details.player_count < 2 {
        return Err(ContractError::Precondition(
            "Not enough players to start the game. Need at least 2 players.".into(),
        ));
    }

    contract.set_ai_player(caller, game_id, ai_player).await?;
    let receipt = contract.start_game(caller, game_id, duration_secs).await?;
    tracing::info!("Started game #{} for {}s", game_id, duration_secs);
    Ok(receipt)
}

/// End a game, optionally bypassing status checks or forcing a start first.
pub async fn finish_game(
    contract: &dyn GameContract,
    caller: &Address,
    game_id: GameId,
    options: FinishOptions,
) -> Result<FinishOutcome> {
    if options.bypass_checks {
        tracing::warn!("Finishing game #{} with checks bypassed", game_id);
        let receipt = contract.end_game(caller, game_id).await?;
        return Ok(FinishOutcome {
            receipt,
            forced_start: false,
        });
    }

    let details = contract.game_details(game_id).await?;
    let mut forced_start = false;
    match details.status {
        GameStatus::Completed => {
            return Err(ContractError::Precondition(format!(
                "Game #{} is already completed.",
                game_id
            )));
        }
        GameStatus::InProgress => {}
        GameStatus::NotStarted if options.force => {
            if details.player_count < 2 {
                return Err(ContractError::Precondition(format!(
                    "Game #{} has only {} player(s). Need at least 2 players to start. Cannot force finish.",
                    game_id, details.player_count
                )));
            }
            contract
                .set_ai_player(caller, game_id, &Address::dummy_ai())
                .await?;
            contract
                .start_game(caller, game_id, FORCED_START_DURATION_SECS)
                .await?;
            forced_start = true;
        }
        status => {
            return Err(ContractError::Precondition(format!(
                "Cannot finish game in '{}' status. Game must be in 'In Progress' status.",
                status
            )));
        }
    }

    let receipt = contract.end_game(caller, game_id).await?;
    tracing::info!("Finished game #{}", game_id);
    Ok(FinishOutcome {
        receipt,
        forced_start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{MemoryContract, Wei};

    const FEE: Wei = 1_000_000_000_000_000;

    fn owner() -> Address {
        Address::new("0x00000000000000000000000000000000000000aa")
    }

    async fn game(contract: &MemoryContract, players: u64) -> GameId {
        let id = contract.create_game(&owner(), FEE).await.unwrap();
        for n in 0..players {
            let p = Address::new(format!("0x{:040x}", 0x400 + n));
            contract.join_game(&p, id, FEE).await.unwrap();
        }
        id
    }

    #[tokio::test]
    async fn test_finish_requires_in_progress() {
        let contract = MemoryContract::new(owner());
        let id = game(&contract, 2).await;
        let err = finish_game(&contract, &owner(), id, FinishOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Not Started"));
    }

    #[tokio::test]
    async fn test_force_finish_starts_with_dummy_ai() {
        let contract = MemoryContract::new(owner());
        let id = game(&contract, 2).await;
        let outcome = finish_game(
            &contract,
            &owner(),
            id,
            FinishOptions {
                force: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(outcome.forced_start);
        assert_eq!(contract.ai_player(id).await, Some(Address::dummy_ai()));
        assert_eq!(
            contract.game_details(id).await.unwrap().status,
            GameStatus::Completed
        );

        let err = finish_game(&contract, &owner(), id, FinishOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already completed"));
    }

    #[tokio::test]
    async fn test_force_finish_needs_two_players() {
        let contract = MemoryContract::new(owner());
        let id = game(&contract, 1).await;
        let err = finish_game(
            &contract,
            &owner(),
            id,
            FinishOptions {
                force: true,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("only 1 player"));
    }

    #[tokio::test]
    async fn test_bypass_surfaces_revert() {
        let contract = MemoryContract::new(owner());
        let id = game(&contract, 0).await;
        let err = finish_game(
            &contract,
            &owner(),
            id,
            FinishOptions {
                bypass_checks: true,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.reason(), Some("Game not in progress"));
    }

    #[tokio::test]
    async fn test_start_game_preconditions() {
        let contract = MemoryContract::new(owner());
        let id = game(&contract, 1).await;
        let ai = Address::new("0x00000000000000000000000000000000000000a1");
        let err = start_game(&contract, &owner(), id, &ai, 120).await.unwrap_err();
        assert!(matches!(err, ContractError::Precondition(_)));

        let id = game(&contract, 2).await;
        start_game(&contract, &owner(), id, &ai, 120).await.unwrap();
        assert_eq!(
            contract.game_details(id).await.unwrap().status,
            GameStatus::InProgress
        );
    }
}
