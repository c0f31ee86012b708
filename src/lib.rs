//! Turing Arena - social-deduction chat with a hidden AI
//!
//! A player joins a paid game, chats for a fixed time with a roster of
//! simulated participants (one of them secretly an AI), then votes on who
//! the AI was. Correct guessers split the prize pool.
//!
//! ## Layout
//!
//! - **arena:** game session, turn-taking scheduler, phases, voting, results
//! - **llm:** completion service used to write every simulated line
//! - **contract:** game contract collaborator, lobby and admin flows
//! - **identity:** human verification context
//! - **server:** HTTP proxy endpoints for browser clients
//!
//! ## Quick Start
//!
//! ```bash
//! # Play offline against canned lines
//! turing-arena play --offline
//!
//! # Serve the HTTP endpoints
//! turing-arena serve
//! ```

pub mod arena;
pub mod cli;
pub mod config;
pub mod contract;
pub mod error;
pub mod identity;
pub mod llm;
pub mod logging;
pub mod server;

// Re-export commonly used types
pub use error::{ArenaError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
