//! Local user actions: sending chat lines and voting.

use super::builder::{GameSession, Inner};
use super::types::SessionEvent;
use crate::arena::phase::Phase;
use crate::arena::queue::TaskOrigin;
use crate::arena::transcript::TranscriptEntry;
use crate::error::{ArenaError, Result};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Chance that a local send is answered first by a single turn, then more.
const QUICK_REPLY_PROBABILITY: f64 = 0.6;

impl GameSession {
    /// Whether another local message would be accepted right now.
    pub fn can_send(&self) -> bool {
        let state = self.inner.lock();
        state.phase.is_chat() && state.messages_sent < self.inner.game.max_user_messages
    }

    /// Post a line as the local user and schedule simulated replies.
    pub fn send_local_message(&self, text: &str) -> Result<TranscriptEntry> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ArenaError::InvalidInput("message is empty".into()));
        }
        let max_chars = self.inner.game.max_message_chars;
        if text.chars().count() > max_chars {
            return Err(ArenaError::InvalidInput(format!(
                "message is longer than {} characters",
                max_chars
            )));
        }

        let (entry, quick_reply, follow_ups, follow_up_delay) = {
            let mut state = self.inner.lock();
            if !state.phase.is_chat() {
                return Err(ArenaError::WrongPhase {
                    phase: state.phase.name(),
                });
            }
            let limit = self.inner.game.max_user_messages;
            if state.messages_sent >= limit {
                return Err(ArenaError::MessageLimitReached { limit });
            }

            let name = state.roster.local().display_name.clone();
            let entry = state.transcript.append(name, text, false, true).clone();
            state.messages_sent += 1;

            let quick_reply = state.rng.random::<f64>() < QUICK_REPLY_PROBABILITY;
            let follow_ups = state.rng.random_range(1..=2usize);
            let follow_up_delay = Duration::from_millis(state.rng.random_range(1500..2500u64));
            (entry, quick_reply, follow_ups, follow_up_delay)
        };

        self.inner.clock.touch();
        self.inner.emit(SessionEvent::EntryAppended {
            entry: entry.clone(),
        });
        tracing::debug!("Local message #{} sent", entry.sequence_id);

        tokio::spawn(schedule_replies(
            Arc::clone(&self.inner),
            quick_reply,
            follow_ups,
            follow_up_delay,
        ));
        Ok(entry)
    }

    /// Cast the local user's vote. Ends the game immediately.
    pub fn cast_vote(&self, candidate: &str) -> Result<String> {
        let mut state = self.inner.lock();
        if !state.phase.is_voting() {
            return Err(ArenaError::WrongPhase {
                phase: state.phase.name(),
            });
        }
        let ballot = state.booth.cast(candidate)?.to_string();
        self.inner.emit(SessionEvent::VoteCast {
            candidate: ballot.clone(),
        });
        self.inner.set_phase(&mut state, Phase::Ended);
        Ok(ballot)
    }
}

/// After a short pause either enqueue one turn and, a little later, one or
/// two more, or enqueue one or two straight away. Not subject to the
/// chaos cap.
async fn schedule_replies(inner: Arc<Inner>, quick_reply: bool, follow_ups: usize, follow_up_delay: Duration) {
    let cancel = inner.chat_token.clone();
    let reply_delay = Duration::from_millis(inner.scheduler.reply_delay_ms);

    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = tokio::time::sleep(reply_delay) => {}
    }

    if quick_reply {
        inner.queue.enqueue(TaskOrigin::Reply);
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(follow_up_delay) => {}
        }
    }
    for _ in 0..follow_ups {
        inner.queue.enqueue(TaskOrigin::Reply);
    }
}
