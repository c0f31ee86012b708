use super::types::{SessionEvent, SessionSnapshot};
use crate::arena::chaos::{ActivityClock, ChaosDriver};
use crate::arena::generator::ResponseGenerator;
use crate::arena::participant::Roster;
use crate::arena::phase::{Phase, PhaseTimer};
use crate::arena::queue::{MessageQueue, TaskOrigin};
use crate::arena::results::GameResults;
use crate::arena::transcript::Transcript;
use crate::arena::voting::VotingBooth;
use crate::config::{GameConfig, SchedulerConfig};
use crate::contract::{Address, GameContract, GameId, Wei};
use crate::error::Result;
use crate::llm::CompletionService;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

const EVENT_CAPACITY: usize = 256;

/// Mutable game state. Guarded by a std mutex that is never held across
/// an `.await`.
pub(super) struct SessionState {
    pub(super) phase: Phase,
    pub(super) roster: Roster,
    pub(super) transcript: Transcript,
    pub(super) messages_sent: u32,
    pub(super) booth: VotingBooth,
    pub(super) rng: StdRng,
}

pub(super) struct Inner {
    /// Game rules
    pub(super) game: GameConfig,

    /// Queue and chaos pacing
    pub(super) scheduler: SchedulerConfig,

    pub(super) state: Mutex<SessionState>,

    pub(super) generator: ResponseGenerator,

    pub(super) queue: Arc<MessageQueue>,

    /// Last enqueue or local send, read by the chaos driver
    pub(super) clock: Arc<ActivityClock>,

    pub(super) events: broadcast::Sender<SessionEvent>,

    /// Published phase; mirrors `state.phase`
    pub(super) phase_tx: watch::Sender<Phase>,

    /// Cancelled on shutdown; parent of every other token
    pub(super) session_token: CancellationToken,

    /// Cancelled when chat ends: chaos, opening burst, replies, queue runner
    pub(super) chat_token: CancellationToken,

    /// Cancelled when the timer must stop early (vote submitted)
    pub(super) timer_token: CancellationToken,

    /// Seconds per timer tick
    pub(super) tick_period: Duration,
}

impl Inner {
    pub(super) fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(super) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Move to `next`, publishing it. Leaving chat stops every chat task
    /// and drops queued turns.
    pub(super) fn set_phase(&self, state: &mut SessionState, next: Phase) {
        let previous = state.phase;
        state.phase = next;
        self.phase_tx.send_replace(next);

        if previous.same_kind(&next) {
            self.emit(SessionEvent::Tick { phase: next });
            return;
        }

        tracing::info!("Session phase {} -> {}", previous.name(), next.name());
        if previous.is_chat() {
            self.chat_token.cancel();
            let dropped = self.queue.clear();
            if dropped > 0 {
                tracing::debug!("Dropped {} queued turns at end of chat", dropped);
            }
        }
        if next == Phase::Ended {
            self.timer_token.cancel();
        }
        self.emit(SessionEvent::PhaseChanged { phase: next });
    }
}

/// A running game. Dropping the handle cancels every background task.
pub struct GameSession {
    pub(super) inner: Arc<Inner>,
}

impl GameSession {
    /// Load a game: read on-chain players, build the roster, post the
    /// welcome line. Background tasks start with [`GameSession::start`].
    pub async fn load(
        game: &GameConfig,
        scheduler: &SchedulerConfig,
        service: Arc<dyn CompletionService>,
        contract: &dyn GameContract,
        game_id: GameId,
        local: &Address,
    ) -> Result<Self> {
        let onchain = match contract.players(game_id).await {
            Ok(players) => players,
            Err(e) => {
                tracing::warn!("Could not read players for game #{}: {}", game_id, e);
                Vec::new()
            }
        };

        let mut rng = match game.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let roster = Roster::build(onchain, local, game.total_players, &mut rng)?;
        let generator = ResponseGenerator::new(service).with_personality(roster.personality());

        let mut transcript = Transcript::new();
        transcript.append_system(generator.welcome().await);

        tracing::info!(
            "Loaded game #{} with {} participants, you are {}",
            game_id,
            roster.len(),
            roster.local().display_name
        );

        Ok(Self::from_parts(game, scheduler, generator, roster, transcript, rng))
    }

    pub(super) fn from_parts(
        game: &GameConfig,
        scheduler: &SchedulerConfig,
        generator: ResponseGenerator,
        roster: Roster,
        transcript: Transcript,
        rng: StdRng,
    ) -> Self {
        let phase = Phase::Chat(game.chat_duration_secs);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (phase_tx, _) = watch::channel(phase);
        let session_token = CancellationToken::new();
        let chat_token = session_token.child_token();
        let timer_token = session_token.child_token();
        let booth = VotingBooth::new(&roster);

        Self {
            inner: Arc::new(Inner {
                game: game.clone(),
                scheduler: scheduler.clone(),
                state: Mutex::new(SessionState {
                    phase,
                    roster,
                    transcript,
                    messages_sent: 0,
                    booth,
                    rng,
                }),
                generator,
                queue: Arc::new(MessageQueue::new(scheduler)),
                clock: Arc::new(ActivityClock::default()),
                events,
                phase_tx,
                session_token,
                chat_token,
                timer_token,
                tick_period: Duration::from_secs(1),
            }),
        }
    }

    /// Spawn the phase timer, queue runner, chaos driver and opening burst.
    pub fn start(&self) {
        let inner = &self.inner;
        let (timer, chaos_rng) = {
            let mut state = inner.lock();
            let timer = PhaseTimer::new(
                state.phase.seconds_remaining(),
                inner.game.voting_duration_secs,
            );
            let seed: u64 = rand::Rng::random(&mut state.rng);
            (timer, StdRng::seed_from_u64(seed))
        };

        // Timer ticks land on a private channel and are applied here so
        // a vote that ends the game early cannot be overwritten.
        let (tick_tx, mut tick_rx) = watch::channel(timer.state());
        tokio::spawn(timer.run(inner.tick_period, tick_tx, inner.timer_token.clone()));
        let this = Arc::clone(inner);
        tokio::spawn(async move {
            while tick_rx.changed().await.is_ok() {
                let next = *tick_rx.borrow_and_update();
                let mut state = this.lock();
                if state.phase == Phase::Ended {
                    break;
                }
                this.set_phase(&mut state, next);
            }
        });

        tokio::spawn(
            Arc::clone(&inner.queue).run(Arc::clone(inner) as _, inner.chat_token.clone()),
        );

        let driver = ChaosDriver::new(&inner.scheduler, chaos_rng);
        tokio::spawn(driver.run(
            Arc::clone(inner) as _,
            Arc::clone(&inner.queue),
            Arc::clone(&inner.clock),
            inner.chat_token.clone(),
        ));

        let queue = Arc::clone(&inner.queue);
        let cancel = inner.chat_token.clone();
        let delay = Duration::from_millis(inner.scheduler.opening_delay_ms);
        let burst = inner.scheduler.opening_burst;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    for _ in 0..burst {
                        queue.enqueue(TaskOrigin::Opening);
                    }
                }
            }
        });

        tracing::debug!("Session started");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    pub fn watch_phase(&self) -> watch::Receiver<Phase> {
        self.inner.phase_tx.subscribe()
    }

    /// Resolve once the game reaches `Ended`.
    pub async fn wait_until_ended(&self) {
        let mut rx = self.watch_phase();
        let _ = rx.wait_for(|p| *p == Phase::Ended).await;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.lock();
        SessionSnapshot {
            phase: state.phase,
            entries: state.transcript.entries().to_vec(),
            local_name: state.roster.local().display_name.clone(),
            messages_sent: state.messages_sent,
            messages_remaining: self
                .inner
                .game
                .max_user_messages
                .saturating_sub(state.messages_sent),
            candidates: state.booth.candidates().to_vec(),
            ballot: state.booth.ballot().map(str::to_string),
        }
    }

    pub fn roster(&self) -> Roster {
        self.inner.lock().roster.clone()
    }

    pub fn pending_turns(&self) -> usize {
        self.inner.queue.len()
    }

    /// Reveal the hidden AI and compute the local user's share.
    pub fn results(&self, prize_pool: Wei, correct_guesses: u64) -> GameResults {
        let state = self.inner.lock();
        GameResults::resolve(&state.roster, state.booth.ballot(), prize_pool, correct_guesses)
    }

    pub async fn describe_ai(&self) -> String {
        let personality = self.inner.lock().roster.personality();
        self.inner.generator.describe_ai(personality).await
    }

    /// Stop every background task.
    pub fn shutdown(&self) {
        self.inner.session_token.cancel();
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.inner.session_token.cancel();
    }
}
