//! Terminal play loop.
//!
//! Joins the demo game, runs a session and wires stdin to it: lines are
//! chat messages during Chat and candidate numbers during Voting.

use super::demo::DemoChain;
use crate::arena::participant::random_address;
use crate::arena::{GameSession, Phase, SessionEvent, TranscriptEntry};
use crate::config::Config;
use crate::contract::{
    Address, FinishOptions, GameContract, GameId, JoinOutcome, Lobby, StatusInference, finish_game, format_eth,
};
use crate::identity::{VerificationSession, ZkIdentity};
use crate::llm;
use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

#[derive(Debug, Default)]
pub struct PlayOptions {
    pub game_id: Option<GameId>,
    pub address: Option<String>,
    pub offline: bool,
    pub seed: Option<u64>,
}

pub async fn cmd_play(mut config: Config, options: PlayOptions) -> Result<()> {
    if options.offline {
        config.llm.offline = true;
    }
    if !config.llm.offline && config.llm.api_key.as_ref().is_none_or(|k| k.is_empty()) {
        tracing::warn!("No API key configured, playing with the offline placeholder service");
        config.llm.offline = true;
    }
    if options.seed.is_some() {
        config.game.seed = options.seed;
    }

    let mut rng = match config.game.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let fee = config.game.entry_fee_wei as u128;
    let chain = DemoChain::seed(fee, &mut rng).await?;
    let game_id = options.game_id.unwrap_or(chain.playable);
    let local = options
        .address
        .map(Address::new)
        .unwrap_or_else(|| random_address(&mut rng));

    let mut verification = VerificationSession::new(config.identity.persist_verification);
    verification.begin_page_load();
    let identity = ZkIdentity::generate();
    verification.mark_verified();
    println!("Verified as human (commitment {})", short(identity.commitment()));

    println!("Playing as {}", local.short());

    let lobby = Lobby::new(chain.contract.clone(), StatusInference::default(), fee);
    match lobby.join(&local, game_id, &verification).await {
        Ok(JoinOutcome::Joined(receipt)) => {
            println!("Joined game #{} for {} ETH (tx {})", game_id, format_eth(fee), short(&receipt.hash))
        }
        Ok(JoinOutcome::AlreadyJoined) => println!("Already in game #{}", game_id),
        Ok(JoinOutcome::OwnerAccess) => println!("Entering game #{} as owner", game_id),
        Err(e) => println!("Could not join game #{}: {}", game_id, e),
    }

    let service = llm::create_service(&config.llm);
    let session = GameSession::load(
        &config.game,
        &config.scheduler,
        service,
        chain.contract.as_ref(),
        game_id,
        &local,
    )
    .await
    .context("Failed to load game")?;

    let snapshot = session.snapshot();
    println!("\nYou are {}. One of the others is an AI. Find it.", snapshot.local_name);
    println!(
        "Chat for {}s, then vote. Up to {} messages.\n",
        config.game.chat_duration_secs, config.game.max_user_messages
    );
    for entry in &snapshot.entries {
        print_entry(entry);
    }

    let printer = tokio::spawn(print_events(session.subscribe(), snapshot.candidates.clone()));
    session.start();
    read_input(&session).await?;
    session.shutdown();
    printer.abort();

    let prize_pool = chain
        .contract
        .game_details(game_id)
        .await
        .map(|d| d.prize_pool)
        .unwrap_or_default();
    let results = session.results(prize_pool, 0);
    println!("\n{}", results.summary());
    println!("{}", session.describe_ai().await);

    settle(chain.contract.as_ref(), &chain.owner, game_id).await;
    Ok(())
}

/// Feed stdin into the session until the game ends or input closes.
async fn read_input(session: &GameSession) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = session.wait_until_ended() => return Ok(()),
            line = lines.next_line() => line.context("Failed to read stdin")?,
        };
        let Some(line) = line else {
            // Input closed: let the timers run the game out.
            session.wait_until_ended().await;
            return Ok(());
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match session.phase() {
            Phase::Chat(_) => match session.send_local_message(line) {
                Ok(_) => {
                    let left = session.snapshot().messages_remaining;
                    if left <= 3 {
                        println!("({} messages left)", left);
                    }
                }
                Err(e) => println!("! {}", e),
            },
            Phase::Voting(_) => {
                let candidates = session.snapshot().candidates;
                let choice = line
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| candidates.get(i).cloned())
                    .unwrap_or_else(|| line.to_string());
                match session.cast_vote(&choice) {
                    Ok(name) => println!("You voted for {}", name),
                    Err(e) => println!("! {}", e),
                }
            }
            Phase::Ended => return Ok(()),
        }
    }
}

async fn print_events(mut rx: broadcast::Receiver<SessionEvent>, candidates: Vec<String>) {
    loop {
        match rx.recv().await {
            Ok(SessionEvent::EntryAppended { entry }) => print_entry(&entry),
            Ok(SessionEvent::Typing { speaker }) => tracing::debug!("{} is typing", speaker),
            Ok(SessionEvent::Tick { phase }) => {
                let left = phase.seconds_remaining();
                if left > 0 && left % 15 == 0 {
                    println!("-- {}s left --", left);
                }
            }
            Ok(SessionEvent::PhaseChanged { phase: Phase::Voting(secs) }) => {
                println!("\n== Voting ({}s). Who is the AI? ==", secs);
                for (i, name) in candidates.iter().enumerate() {
                    println!("  {}. {}", i + 1, name);
                }
                println!("Enter a number or a name:");
            }
            Ok(SessionEvent::PhaseChanged { phase: Phase::Ended }) => println!("\n== Game over =="),
            Ok(SessionEvent::PhaseChanged { .. }) => {}
            Ok(SessionEvent::VoteCast { .. }) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Event printer lagged, skipped {} events", n)
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_entry(entry: &TranscriptEntry) {
    if entry.is_system() {
        println!("* {}", entry.text);
    } else if entry.is_local_user {
        println!("[{} (you)] {}", entry.speaker_name, entry.text);
    } else {
        println!("[{}] {}", entry.speaker_name, entry.text);
    }
}

/// Close the game on the demo chain, forcing a start if nobody did.
async fn settle(contract: &dyn GameContract, owner: &Address, game_id: GameId) {
    let options = FinishOptions {
        bypass_checks: false,
        force: true,
    };
    match finish_game(contract, owner, game_id, options).await {
        Ok(outcome) => tracing::info!(
            "Settled game #{} (forced start: {}, tx {})",
            game_id,
            outcome.forced_start,
            outcome.receipt.hash
        ),
        Err(e) => tracing::warn!("Could not settle game #{}: {}", game_id, e),
    }
}

fn short(hex: &str) -> String {
    let chars: Vec<char> = hex.chars().collect();
    if chars.len() <= 12 {
        return hex.to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
