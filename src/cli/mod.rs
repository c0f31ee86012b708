//! CLI Module
//!
//! Command-line interface for Turing Arena using Clap v4.

mod commands;
mod demo;
mod play;

use crate::contract::{GameId, StatusFilter};
use anyhow::Result;
use clap::{Parser, Subcommand};

/// Turing Arena - chat with strangers, one of them is an AI
#[derive(Parser, Debug)]
#[command(name = "turing-arena")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play a game in the terminal (default)
    Play {
        /// Game to join on the demo chain
        #[arg(short, long)]
        game_id: Option<GameId>,

        /// Your wallet address (random when omitted)
        #[arg(short, long)]
        address: Option<String>,

        /// Use the offline placeholder instead of the completion service
        #[arg(long)]
        offline: bool,

        /// Seed for a reproducible session
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run the HTTP surface
    Serve,

    /// Send one test request to the completion service
    TestLlm,

    /// Show configuration
    Config {
        /// Show full configuration including secrets
        #[arg(short, long)]
        show_secrets: bool,
    },

    /// List games in the demo lobby
    Games {
        /// Status filter
        #[arg(short, long, value_enum, default_value = "all")]
        filter: StatusFilter,

        /// Mark games this address has joined
        #[arg(short, long)]
        address: Option<String>,
    },
}

/// Main CLI entry point
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref())?;
    let _log_guard = crate::logging::init(&config.logging, cli.debug)?;
    if cli.debug {
        tracing::info!("Debug mode enabled");
    }

    match cli.command {
        None => play::cmd_play(config, play::PlayOptions::default()).await,
        Some(Commands::Play {
            game_id,
            address,
            offline,
            seed,
        }) => {
            let options = play::PlayOptions {
                game_id,
                address,
                offline,
                seed,
            };
            play::cmd_play(config, options).await
        }
        Some(Commands::Serve) => commands::cmd_serve(&config).await,
        Some(Commands::TestLlm) => commands::cmd_test_llm(&config).await,
        Some(Commands::Config { show_secrets }) => commands::cmd_config(&config, show_secrets),
        Some(Commands::Games { filter, address }) => {
            commands::cmd_games(&config, address, filter).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_play_args() {
        let cli = Cli::parse_from([
            "turing-arena",
            "play",
            "--game-id",
            "2",
            "--offline",
            "--seed",
            "9",
        ]);
        match cli.command {
            Some(Commands::Play {
                game_id,
                offline,
                seed,
                address,
            }) => {
                assert_eq!(game_id, Some(2));
                assert!(offline);
                assert_eq!(seed, Some(9));
                assert!(address.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_games_filter() {
        let cli = Cli::parse_from(["turing-arena", "--debug", "games", "--filter", "in-progress"]);
        assert!(cli.debug);
        assert!(matches!(
            cli.command,
            Some(Commands::Games {
                filter: StatusFilter::InProgress,
                ..
            })
        ));
    }
}
