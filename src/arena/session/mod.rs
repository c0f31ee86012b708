//! Game Session
//!
//! Wires roster, transcript, turn selection, generation, the message queue,
//! the chaos driver and the phase timer into one running game.

mod builder;
mod handler;
mod messaging;
mod types;

#[cfg(test)]
mod tests;

pub use builder::GameSession;
pub use types::{SessionEvent, SessionSnapshot};
