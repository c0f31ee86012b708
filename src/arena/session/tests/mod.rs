
use super::*;
use crate::config::{GameConfig, SchedulerConfig};
use crate::contract::{Address, GameContract, GameId, MemoryContract};
use crate::llm::{CompletionRequest, CompletionResponse, CompletionService};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const FEE: u128 = 1_000_000_000_000_000;

/// Numbered replies, optionally after a delay.
struct CountingService {
    calls: AtomicUsize,
    latency: Duration,
}

impl CountingService {
    fn new() -> Arc<Self> {
        Self::with_latency(Duration::ZERO)
    }

    fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            latency,
        })
    }
}

#[async_trait]
impl CompletionService for CountingService {
    async fn complete(&self, _request: CompletionRequest) -> crate::llm::Result<CompletionResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(CompletionResponse::text(format!("line number {}", n), "counting"))
    }

    fn name(&self) -> &str {
        "counting"
    }

    fn model(&self) -> &str {
        "counting"
    }
}

fn owner() -> Address {
    Address::new("0x00000000000000000000000000000000000000aa")
}

fn local() -> Address {
    Address::new("0x00000000000000000000000000000000000000b1")
}

fn game_config(chat: u64, voting: u64) -> GameConfig {
    GameConfig {
        chat_duration_secs: chat,
        voting_duration_secs: voting,
        seed: Some(7),
        ..GameConfig::default()
    }
}

async fn contract_with_local() -> (MemoryContract, GameId) {
    let contract = MemoryContract::new(owner());
    let id = contract.create_game(&owner(), FEE).await.unwrap();
    contract.join_game(&local(), id, FEE).await.unwrap();
    (contract, id)
}

async fn session_with(service: Arc<dyn CompletionService>, game: GameConfig) -> GameSession {
    let (contract, id) = contract_with_local().await;
    GameSession::load(
        &game,
        &SchedulerConfig::default(),
        service,
        &contract,
        id,
        &local(),
    )
    .await
    .unwrap()
}

fn simulated_lines(session: &GameSession) -> usize {
    session
        .snapshot()
        .entries
        .iter()
        .filter(|e| !e.is_local_user && !e.is_system())
        .count()
}
