//! Phase timer.
//!
//! `Chat(n)` counts down once per tick, then switches to `Voting` with the
//! configured voting duration, which counts down to `Ended`.

use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "secondsRemaining", rename_all = "snake_case")]
pub enum Phase {
    Chat(u64),
    Voting(u64),
    Ended,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Chat(_) => "chat",
            Phase::Voting(_) => "voting",
            Phase::Ended => "ended",
        }
    }

    pub fn seconds_remaining(&self) -> u64 {
        match self {
            Phase::Chat(s) | Phase::Voting(s) => *s,
            Phase::Ended => 0,
        }
    }

    pub fn is_chat(&self) -> bool {
        matches!(self, Phase::Chat(_))
    }

    pub fn is_voting(&self) -> bool {
        matches!(self, Phase::Voting(_))
    }

    /// Same phase, ignoring the countdown.
    pub fn same_kind(&self, other: &Phase) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// `m:ss` countdown.
pub fn format_remaining(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone)]
pub struct PhaseTimer {
    state: Phase,
    voting_duration: u64,
}

impl PhaseTimer {
    pub fn new(chat_duration: u64, voting_duration: u64) -> Self {
        Self {
            state: Phase::Chat(chat_duration),
            voting_duration,
        }
    }

    pub fn state(&self) -> Phase {
        self.state
    }

    /// Advance one second. Returns the new state when the phase changed.
    pub fn tick(&mut self) -> Option<Phase> {
        let (next, changed) = match self.state {
            Phase::Chat(s) if s <= 1 => (Phase::Voting(self.voting_duration), true),
            Phase::Chat(s) => (Phase::Chat(s - 1), false),
            Phase::Voting(s) if s <= 1 => (Phase::Ended, true),
            Phase::Voting(s) => (Phase::Voting(s - 1), false),
            Phase::Ended => (Phase::Ended, false),
        };
        self.state = next;
        changed.then_some(next)
    }

    /// Jump straight to `Ended`, e.g. when the vote is submitted early.
    pub fn end(&mut self) {
        self.state = Phase::Ended;
    }

    /// Tick every `period`, publishing each state, until `Ended` or cancel.
    pub async fn run(mut self, period: Duration, phase_tx: watch::Sender<Phase>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            if let Some(next) = self.tick() {
                tracing::info!("Phase changed to {}", next.name());
            }
            phase_tx.send_replace(self.state);
            if self.state == Phase::Ended {
                break;
            }
        }
    }
}
