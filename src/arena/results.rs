//! Game results.

use super::participant::Roster;
use crate::contract::{Wei, format_eth};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResults {
    pub hidden_ai_name: String,
    pub personality: String,
    pub voted_for: Option<String>,
    pub guessed_correctly: bool,
    pub prize_pool: Wei,
    pub correct_guesses: u64,
    /// The local user's share of the pool; zero when the guess was wrong.
    pub prize_share: Wei,
}

impl GameResults {
    /// Reveal the hidden AI and split the pool among correct guessers.
    pub fn resolve(roster: &Roster, vote: Option<&str>, prize_pool: Wei, correct_guesses: u64) -> Self {
        let ai = roster.hidden_ai();
        let guessed_correctly = vote == Some(ai.display_name.as_str());
        let winners = if guessed_correctly {
            correct_guesses.max(1)
        } else {
            correct_guesses
        };
        let prize_share = if guessed_correctly {
            prize_pool / winners as Wei
        } else {
            0
        };

        Self {
            hidden_ai_name: ai.display_name.clone(),
            personality: roster.personality().name.to_string(),
            voted_for: vote.map(str::to_string),
            guessed_correctly,
            prize_pool,
            correct_guesses: winners,
            prize_share,
        }
    }

    pub fn summary(&self) -> String {
        let verdict = if self.guessed_correctly {
            format!("You found the AI and win {} ETH.", format_eth(self.prize_share))
        } else {
            "You did not find the AI.".to_string()
        };
        format!(
            "The AI was {} ({}). {}",
            self.hidden_ai_name, self.personality, verdict
        )
    }
}
