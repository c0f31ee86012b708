//! Non-interactive subcommands.

use super::demo::DemoChain;
use crate::config::Config;
use crate::contract::{Address, Lobby, StatusFilter, StatusInference, format_eth};
use crate::llm::{self, ChatMessage, CompletionRequest};
use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Load configuration from `--config` or the default locations.
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config = if let Some(path) = config_path {
        Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path))?
    } else {
        Config::load().context("Failed to load configuration")?
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Print the effective configuration.
pub fn cmd_config(config: &Config, show_secrets: bool) -> Result<()> {
    println!("Turing Arena configuration\n");
    if let Some(path) = Config::system_config_path() {
        println!("System config: {}", path.display());
    }

    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("\n{}", rendered);

    match &config.llm.api_key {
        Some(key) if show_secrets => println!("llm.api_key = {}", key.expose_secret()),
        Some(key) => println!("llm.api_key = {} (use --show-secrets to reveal)", key.masked_prefix()),
        None => println!("llm.api_key is not set"),
    }
    Ok(())
}

/// One fixed round-trip against the configured completion service.
pub async fn cmd_test_llm(config: &Config) -> Result<()> {
    let service = llm::create_service(&config.llm);
    println!("Testing completion service '{}' ({})", service.name(), service.model());

    let request = CompletionRequest::new("You are a helpful assistant.")
        .with_messages(vec![ChatMessage::user("Hello, how are you?")])
        .with_max_tokens(50);
    let response = service
        .complete(request)
        .await
        .context("Completion request failed")?;

    println!("Model:    {}", response.metadata.model);
    println!("Latency:  {}ms", response.metadata.processing_time_ms);
    println!("Response: {}", response.response);
    Ok(())
}

/// Run the HTTP surface until interrupted.
pub async fn cmd_serve(config: &Config) -> Result<()> {
    let service = llm::create_service(&config.llm);
    crate::server::start_server(&config.server, service).await
}

/// List the demo lobby.
pub async fn cmd_games(config: &Config, address: Option<String>, filter: StatusFilter) -> Result<()> {
    let mut rng = match config.game.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let fee = config.game.entry_fee_wei as u128;
    let chain = DemoChain::seed(fee, &mut rng).await?;
    let lobby = Lobby::new(chain.contract.clone(), StatusInference::default(), fee);
    let local = address.map(Address::new);

    let games = lobby.list_filtered(local.as_ref(), filter).await?;
    if games.is_empty() {
        println!("No games available.");
        return Ok(());
    }

    println!(
        "{:<6} {:<12} {:>10} {:>12} {:>8} {:>9}  {}",
        "GAME", "STATUS", "FEE (ETH)", "POOL (ETH)", "PLAYERS", "TIMEOUT", "JOINED"
    );
    for game in games {
        println!(
            "#{:<5} {:<12} {:>10} {:>12} {:>8} {:>8}s  {}",
            game.id,
            game.status.label(),
            format_eth(game.entry_fee),
            format_eth(game.prize_pool),
            game.player_count,
            game.time_until_timeout,
            if game.is_player_in_game { "yes" } else { "" }
        );
    }
    Ok(())
}
