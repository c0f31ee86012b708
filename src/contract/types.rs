//! Contract-facing value types.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type GameId = u64;

/// Amount in wei.
pub type Wei = u128;

pub const WEI_PER_ETH: Wei = 1_000_000_000_000_000_000;

/// Format a wei amount as ETH with three decimals, e.g. `0.003`.
pub fn format_eth(wei: Wei) -> String {
    let milli = wei / (WEI_PER_ETH / 1000);
    format!("{}.{:03}", milli / 1000, milli % 1000)
}

/// Account address. Stored lowercase; comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    /// Address `0x000…0001`, used as a placeholder AI player by admin flows.
    pub fn dummy_ai() -> Self {
        Self::new(format!("0x{:040x}", 1))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `0x1234…abcd` form for display.
    pub fn short(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 10 {
            return self.0.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Address::new(s)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address::new(s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.0
    }
}

/// On-chain game status (`uint8`: 0, 1, 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    NotStarted,
    InProgress,
    Completed,
    /// Read failed or the discriminant was out of range.
    Unknown,
}

impl GameStatus {
    pub fn from_discriminant(value: u8) -> Self {
        match value {
            0 => Self::NotStarted,
            1 => Self::InProgress,
            2 => Self::Completed,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of `getGameDetails`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDetails {
    pub entry_fee: Wei,
    pub prize_pool: Wei,
    pub player_count: u64,
    pub status: GameStatus,
    pub creation_time: i64,
    pub last_join_time: i64,
    pub time_until_timeout: u64,
}

/// Mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub hash: String,
}
