//! Voting: candidate list and the local user's single ballot.

use super::participant::Roster;
use super::transcript::GAME_SENDER;
use crate::error::{ArenaError, Result};

/// Display names the local user may vote for, in roster order. Excludes
/// the local user and the system sender.
pub fn candidates(roster: &Roster) -> Vec<String> {
    roster
        .participants()
        .iter()
        .filter(|p| !p.is_local_user && p.display_name != GAME_SENDER)
        .map(|p| p.display_name.clone())
        .collect()
}

#[derive(Debug, Clone)]
pub struct VotingBooth {
    candidates: Vec<String>,
    ballot: Option<String>,
}

impl VotingBooth {
    pub fn new(roster: &Roster) -> Self {
        Self {
            candidates: candidates(roster),
            ballot: None,
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Record the one allowed vote.
    pub fn cast(&mut self, candidate: &str) -> Result<&str> {
        if self.ballot.is_some() {
            return Err(ArenaError::AlreadyVoted);
        }
        if !self.candidates.iter().any(|c| c == candidate) {
            return Err(ArenaError::UnknownCandidate(candidate.to_string()));
        }
        tracing::info!("Vote cast for {}", candidate);
        Ok(self.ballot.insert(candidate.to_string()))
    }

    pub fn ballot(&self) -> Option<&str> {
        self.ballot.as_deref()
    }
}
