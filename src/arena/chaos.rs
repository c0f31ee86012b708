//! Chaos driver.
//!
//! Keeps the chat moving: every 1–2.5 s it bumps the chaos level and, if
//! the room has been quiet long enough, offers one or two speak tasks to
//! the queue. The level only grows; nothing reads it to scale pacing.

use super::queue::{MessageQueue, TaskOrigin};
use crate::config::SchedulerConfig;
use rand::Rng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Monotonic, capped scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaosLevel {
    value: f64,
    step: f64,
    cap: f64,
}

impl ChaosLevel {
    pub fn new(step: f64, cap: f64) -> Self {
        Self {
            value: 0.0,
            step,
            cap,
        }
    }

    pub fn bump(&mut self) -> f64 {
        self.value = (self.value + self.step).min(self.cap);
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Time of the last enqueue or local send.
#[derive(Debug)]
pub struct ActivityClock(Mutex<Instant>);

impl Default for ActivityClock {
    fn default() -> Self {
        Self(Mutex::new(Instant::now()))
    }
}

impl ActivityClock {
    pub fn touch(&self) {
        *self.0.lock().unwrap_or_else(|p| p.into_inner()) = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).elapsed()
    }
}

/// Decides whether the driver may act on a given wake-up.
pub trait ChaosGate: Send + Sync {
    /// True while in Chat with more than one transcript entry.
    fn accepting(&self) -> bool;
}

pub struct ChaosDriver {
    level: ChaosLevel,
    min_delay: Duration,
    max_delay: Duration,
    quiet: Duration,
    enqueue_probability: f64,
    rng: StdRng,
}

impl ChaosDriver {
    pub fn new(config: &SchedulerConfig, rng: StdRng) -> Self {
        Self {
            level: ChaosLevel::new(config.chaos_step, config.chaos_cap),
            min_delay: Duration::from_millis(config.chaos_min_delay_ms),
            max_delay: Duration::from_millis(config.chaos_max_delay_ms),
            quiet: Duration::from_millis(config.chaos_quiet_ms),
            enqueue_probability: config.chaos_enqueue_probability,
            rng,
        }
    }

    pub fn level(&self) -> ChaosLevel {
        self.level
    }

    fn next_delay(&mut self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        self.rng.random_range(self.min_delay..self.max_delay)
    }

    /// One wake-up. Returns how many tasks the queue accepted.
    pub fn step(&mut self, gate: &dyn ChaosGate, queue: &MessageQueue, clock: &ActivityClock) -> usize {
        if !gate.accepting() {
            return 0;
        }
        self.level.bump();
        if clock.elapsed() < self.quiet {
            return 0;
        }

        // One attempt two times in three, otherwise two.
        let attempts = (self.rng.random::<f64>() * 1.5).floor() as usize + 1;
        let mut accepted = 0;
        for _ in 0..attempts {
            if self.rng.random::<f64>() < self.enqueue_probability && queue.offer(TaskOrigin::Chaos) {
                accepted += 1;
            }
        }
        clock.touch();
        accepted
    }

    /// Wake up after a random delay, act, repeat until cancelled. Only one
    /// timer is ever pending.
    pub async fn run(
        mut self,
        gate: Arc<dyn ChaosGate>,
        queue: Arc<MessageQueue>,
        clock: Arc<ActivityClock>,
        cancel: CancellationToken,
    ) -> ChaosLevel {
        loop {
            let delay = self.next_delay();
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            let accepted = self.step(gate.as_ref(), &queue, &clock);
            if accepted > 0 {
                tracing::debug!(
                    "Chaos enqueued {} task(s), level {:.2}, pending {}",
                    accepted,
                    self.level.value(),
                    queue.len()
                );
            }
        }
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Gate(AtomicBool);

    impl ChaosGate for Gate {
        fn accepting(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn driver(seed: u64) -> ChaosDriver {
        ChaosDriver::new(&SchedulerConfig::default(), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_level_capped() {
        let mut level = ChaosLevel::new(0.05, 10.0);
        for _ in 0..1000 {
            level.bump();
        }
        assert_eq!(level.value(), 10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_respects_gate() {
        let mut d = driver(1);
        let gate = Gate(AtomicBool::new(false));
        let queue = MessageQueue::new(&SchedulerConfig::default());
        let clock = ActivityClock::default();
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(d.step(&gate, &queue, &clock), 0);
        assert_eq!(d.level().value(), 0.0);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_waits_for_quiet_period() {
        let mut d = driver(2);
        let gate = Gate(AtomicBool::new(true));
        let queue = MessageQueue::new(&SchedulerConfig::default());
        let clock = ActivityClock::default();

        assert_eq!(d.step(&gate, &queue, &clock), 0);
        assert!(d.level().value() > 0.0);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_steps_never_overfill_queue() {
        let mut d = driver(3);
        let gate = Gate(AtomicBool::new(true));
        let queue = MessageQueue::new(&SchedulerConfig::default());
        let clock = ActivityClock::default();
        let mut total = 0;
        for _ in 0..200 {
            tokio::time::advance(Duration::from_millis(1500)).await;
            total += d.step(&gate, &queue, &clock);
            assert!(queue.len() <= 10);
        }
        assert_eq!(total, 10);
        assert_eq!(queue.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_enqueueing_once_gate_closes() {
        let gate = Arc::new(Gate(AtomicBool::new(true)));
        let queue = Arc::new(MessageQueue::new(&SchedulerConfig::default()));
        let clock = Arc::new(ActivityClock::default());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(driver(4).run(gate.clone(), queue.clone(), clock, cancel.clone()));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!queue.is_empty());

        gate.0.store(false, Ordering::SeqCst);
        let cleared = queue.clear();
        assert!(cleared > 0);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(queue.is_empty());

        cancel.cancel();
        let level = handle.await.unwrap();
        assert!(level.value() > 0.0);
    }
}
