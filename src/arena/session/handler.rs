//! Speak tasks and the chaos gate.

use super::builder::Inner;
use super::types::SessionEvent;
use crate::arena::chaos::ChaosGate;
use crate::arena::queue::{SpeakHandler, SpeakTask};
use crate::arena::selector::select_speaker;
use async_trait::async_trait;

#[async_trait]
impl SpeakHandler for Inner {
    async fn speak(&self, task: SpeakTask) {
        let (selection, history) = {
            let mut state = self.lock();
            if self.chat_token.is_cancelled()
                || !state.phase.is_chat()
                || state.transcript.len() > self.game.max_transcript_len
            {
                return;
            }
            let state = &mut *state;
            let selection = select_speaker(
                &state.roster,
                &state.transcript,
                self.game.recent_sender_window,
                &mut state.rng,
            );
            (selection, state.transcript.history_tail(self.game.history_window))
        };

        let Some(selection) = selection else {
            tracing::debug!("Task #{}: no responder available", task.id);
            return;
        };

        self.emit(SessionEvent::Typing {
            speaker: selection.speaker.display_name.clone(),
        });
        let text = self.generator.generate(history, selection.is_hidden_ai).await;

        let mut state = self.lock();
        if self.chat_token.is_cancelled() || !state.phase.is_chat() {
            tracing::debug!("Task #{}: chat ended during generation, line dropped", task.id);
            return;
        }
        let entry = state
            .transcript
            .append(
                selection.speaker.display_name,
                text,
                selection.is_hidden_ai,
                false,
            )
            .clone();
        drop(state);
        self.emit(SessionEvent::EntryAppended { entry });
    }
}

impl ChaosGate for Inner {
    fn accepting(&self) -> bool {
        let state = self.lock();
        state.phase.is_chat() && state.transcript.len() > 1
    }
}
