//! Per-game summaries for the lobby.
//!
//! Some deployments return `getGameDetails` data that does not decode
//! cleanly, so the lobby can infer status from the player list instead.

use super::r#trait::GameContract;
use super::types::{Address, GameId, GameStatus, Wei};
use serde::{Deserialize, Serialize};

/// How a game's status is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusInference {
    /// Trust `getGameDetails`.
    #[default]
    Authoritative,
    /// Fewer than two players means not started, otherwise in progress.
    /// Prize pool is estimated as `players * default fee`.
    PlayerCountHeuristic,
}

/// What the lobby shows for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub id: GameId,
    pub entry_fee: Wei,
    pub prize_pool: Wei,
    pub player_count: u64,
    pub status: GameStatus,
    pub time_until_timeout: u64,
    pub is_player_in_game: bool,
}

impl StatusInference {
    /// Summarise one game. Read failures degrade to conservative defaults
    /// instead of failing the whole listing.
    pub async fn summarize(
        &self,
        contract: &dyn GameContract,
        game_id: GameId,
        local: Option<&Address>,
        default_fee: Wei,
    ) -> GameSummary {
        let players = match contract.players(game_id).await {
            Ok(players) => Some(players),
            Err(e) => {
                tracing::warn!("Failed to fetch players for game #{}: {}", game_id, e);
                None
            }
        };
        let is_player_in_game = match (local, &players) {
            (Some(addr), Some(players)) => players.contains(addr),
            _ => false,
        };

        match self {
            Self::PlayerCountHeuristic => {
                let player_count = players.as_ref().map_or(0, |p| p.len() as u64);
                let status = if player_count < 2 {
                    GameStatus::NotStarted
                } else {
                    GameStatus::InProgress
                };
                GameSummary {
                    id: game_id,
                    entry_fee: default_fee,
                    prize_pool: default_fee * player_count as Wei,
                    player_count,
                    status,
                    time_until_timeout: 0,
                    is_player_in_game,
                }
            }
            Self::Authoritative => match contract.game_details(game_id).await {
                Ok(details) => GameSummary {
                    id: game_id,
                    entry_fee: details.entry_fee,
                    prize_pool: details.prize_pool,
                    player_count: details.player_count,
                    status: details.status,
                    time_until_timeout: details.time_until_timeout,
                    is_player_in_game,
                },
                Err(e) => {
                    tracing::warn!("Failed to read details for game #{}: {}", game_id, e);
                    GameSummary {
                        id: game_id,
                        entry_fee: default_fee,
                        prize_pool: 0,
                        player_count: 0,
                        status: GameStatus::Unknown,
                        time_until_timeout: 0,
                        is_player_in_game,
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MemoryContract;

    const FEE: Wei = 1_000_000_000_000_000;

    async fn game_with_players(contract: &MemoryContract, owner: &Address, n: u8) -> GameId {
        let id = contract.create_game(owner, FEE).await.unwrap();
        for i in 0..n {
            let p = Address::new(format!("0x{:040x}", 0x200 + i as u64));
            contract.join_game(&p, id, FEE).await.unwrap();
        }
        id
    }

    #[tokio::test]
    async fn test_heuristic_status_from_player_count() {
        let owner = Address::new("0xaa");
        let contract = MemoryContract::new(owner.clone()).with_broken_details();
        let one = game_with_players(&contract, &owner, 1).await;
        let three = game_with_players(&contract, &owner, 3).await;

        let inference = StatusInference::PlayerCountHeuristic;
        let s1 = inference.summarize(&contract, one, None, FEE).await;
        assert_eq!(s1.status, GameStatus::NotStarted);
        assert_eq!(s1.prize_pool, FEE);

        let s3 = inference.summarize(&contract, three, None, FEE).await;
        assert_eq!(s3.status, GameStatus::InProgress);
        assert_eq!(s3.player_count, 3);
        assert_eq!(s3.prize_pool, 3 * FEE);
    }

    #[tokio::test]
    async fn test_authoritative_degrades_to_unknown() {
        let owner = Address::new("0xaa");
        let contract = MemoryContract::new(owner.clone()).with_broken_details();
        let id = game_with_players(&contract, &owner, 2).await;

        let summary = StatusInference::Authoritative
            .summarize(&contract, id, None, FEE)
            .await;
        assert_eq!(summary.status, GameStatus::Unknown);
        assert_eq!(summary.player_count, 0);
    }

    #[tokio::test]
    async fn test_membership_is_case_insensitive() {
        let owner = Address::new("0xaa");
        let contract = MemoryContract::new(owner.clone());
        let id = contract.create_game(&owner, FEE).await.unwrap();
        let joined = Address::new("0xABCDEF0000000000000000000000000000000009");
        contract.join_game(&joined, id, FEE).await.unwrap();

        let local = Address::new("0xabcdef0000000000000000000000000000000009");
        let summary = StatusInference::Authoritative
            .summarize(&contract, id, Some(&local), FEE)
            .await;
        assert!(summary.is_player_in_game);
        assert_eq!(summary.status, GameStatus::NotStarted);
    }
}
