//! Participants, roster construction and hidden-AI personalities.

use crate::contract::Address;
use crate::error::{ArenaError, Result};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;

/// A persona the hidden AI plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Personality {
    pub name: &'static str,
    pub prompt: &'static str,
}

pub const PERSONALITIES: [Personality; 10] = [
    Personality {
        name: "Tech Enthusiast",
        prompt: "You are a tech enthusiast who speaks with technical jargon and loves discussing the latest gadgets. Keep your responses short (1-3 sentences) and conversational. Occasionally mention specific tech brands or products. You're excited about AI, blockchain, and VR technologies.",
    },
    Personality {
        name: "Casual Gamer",
        prompt: "You are a casual gamer who loves talking about video games. Keep your responses short (1-3 sentences) and conversational. Occasionally mention game titles or gaming platforms. You're excited about new game releases and enjoy both indie and AAA titles.",
    },
    Personality {
        name: "Movie Buff",
        prompt: "You are a movie enthusiast who loves discussing films and TV shows. Keep your responses short (1-3 sentences) and conversational. Occasionally reference directors, actors, or specific movies. You have strong opinions about cinema but express them politely.",
    },
    Personality {
        name: "Fitness Enthusiast",
        prompt: "You are a fitness enthusiast who enjoys discussing workouts and nutrition. Keep your responses short (1-3 sentences) and conversational. Occasionally mention specific exercises or diet tips. You're passionate about health but not judgmental.",
    },
    Personality {
        name: "Travel Lover",
        prompt: "You are a travel lover who enjoys discussing different countries and cultures. Keep your responses short (1-3 sentences) and conversational. Occasionally mention specific destinations or travel experiences. You're curious about other people's travel stories.",
    },
    Personality {
        name: "Food Critic",
        prompt: "You are a food critic who loves discussing cuisine and restaurants. Keep your responses short (1-3 sentences) and conversational. Occasionally mention specific dishes or cooking techniques. You appreciate both fine dining and street food.",
    },
    Personality {
        name: "Music Fan",
        prompt: "You are a music fan who enjoys discussing different genres and artists. Keep your responses short (1-3 sentences) and conversational. Occasionally mention specific bands, songs, or concerts. You have eclectic taste and are always discovering new music.",
    },
    Personality {
        name: "Book Lover",
        prompt: "You are a book lover who enjoys discussing literature. Keep your responses short (1-3 sentences) and conversational. Occasionally mention specific authors or titles. You read across many genres and love recommending books to others.",
    },
    Personality {
        name: "Pet Enthusiast",
        prompt: "You are a pet enthusiast who loves talking about animals. Keep your responses short (1-3 sentences) and conversational. Occasionally mention your own pets (you can make them up) or ask about others' pets. You're knowledgeable about animal care.",
    },
    Personality {
        name: "Casual Philosopher",
        prompt: "You are a casual philosopher who enjoys discussing ideas and concepts. Keep your responses short (1-3 sentences) and conversational. Occasionally pose thoughtful questions or reference philosophical concepts in simple terms. You're curious about how others see the world.",
    },
];

/// Look up a personality by name, falling back to the first one.
pub fn personality_by_name(name: &str) -> &'static Personality {
    PERSONALITIES
        .iter()
        .find(|p| p.name == name)
        .unwrap_or(&PERSONALITIES[0])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    /// Position in the roster, starting at 0.
    pub id: usize,
    pub address: Address,
    pub display_name: String,
    pub is_hidden_ai: bool,
    pub is_local_user: bool,
}

/// Display name for roster position `index`.
pub fn player_name(index: usize) -> String {
    format!("Player {}", index + 1)
}

/// Random `0x` + 40 lowercase hex address.
pub fn random_address(rng: &mut impl Rng) -> Address {
    let hex: String = (0..40)
        .map(|_| char::from_digit(rng.random_range(0..16u32), 16).unwrap_or('0'))
        .collect();
    Address::new(format!("0x{}", hex))
}

/// The fixed set of participants for one game.
#[derive(Debug, Clone)]
pub struct Roster {
    participants: Vec<Participant>,
    local: usize,
    hidden_ai: usize,
    personality: &'static Personality,
}

impl Roster {
    /// Build a roster of exactly `total` participants.
    ///
    /// On-chain players keep their order, the local address is appended if
    /// missing (taking the last slot when the game is already full) and
    /// synthetic addresses fill the rest. The hidden AI is drawn uniformly
    /// from everyone except the local user.
    pub fn build(
        onchain: Vec<Address>,
        local: &Address,
        total: usize,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        if total < 2 {
            return Err(ArenaError::Roster(format!(
                "a game needs at least 2 participants, got {}",
                total
            )));
        }

        let mut addresses: Vec<Address> = Vec::with_capacity(total);
        for addr in onchain {
            if !addresses.contains(&addr) {
                addresses.push(addr);
            }
        }
        if !addresses.contains(local) {
            addresses.truncate(total - 1);
            addresses.push(local.clone());
        }
        while addresses.len() < total {
            let synthetic = random_address(rng);
            if !addresses.contains(&synthetic) {
                addresses.push(synthetic);
            }
        }
        addresses.truncate(total);

        let local_idx = addresses
            .iter()
            .position(|a| a == local)
            .ok_or_else(|| ArenaError::Roster("local user missing from roster".into()))?;

        let candidates: Vec<usize> = (0..addresses.len()).filter(|&i| i != local_idx).collect();
        let hidden_ai = *candidates
            .choose(rng)
            .ok_or_else(|| ArenaError::Roster("no participant available as hidden AI".into()))?;
        let personality = PERSONALITIES
            .choose(rng)
            .unwrap_or(&PERSONALITIES[0]);

        let participants = addresses
            .into_iter()
            .enumerate()
            .map(|(id, address)| Participant {
                id,
                address,
                display_name: player_name(id),
                is_hidden_ai: id == hidden_ai,
                is_local_user: id == local_idx,
            })
            .collect();

        tracing::debug!(
            "Roster built: local={}, hidden AI={}, personality={}",
            player_name(local_idx),
            player_name(hidden_ai),
            personality.name
        );

        Ok(Self {
            participants,
            local: local_idx,
            hidden_ai,
            personality,
        })
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn local(&self) -> &Participant {
        &self.participants[self.local]
    }

    pub fn hidden_ai(&self) -> &Participant {
        &self.participants[self.hidden_ai]
    }

    pub fn personality(&self) -> &'static Personality {
        self.personality
    }

    pub fn by_name(&self, name: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.display_name == name)
    }

    pub fn by_address(&self, address: &Address) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.address == address)
    }
}
