//! Message queue and scheduler.
//!
//! Speak tasks are drained one small batch at a time with a random pause
//! between tasks, so transcript appends happen strictly in drain order.
//! Only one drain cycle runs at once.

use crate::config::SchedulerConfig;
use async_trait::async_trait;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// What enqueued a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOrigin {
    Opening,
    Chaos,
    Reply,
}

/// Deferred "pick a speaker and append one line".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeakTask {
    pub id: u64,
    pub origin: TaskOrigin,
}

/// Executes a dequeued task. Implementations must not fail; a turn that
/// cannot produce a line is simply skipped.
#[async_trait]
pub trait SpeakHandler: Send + Sync {
    async fn speak(&self, task: SpeakTask);
}

#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub batch_size: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Pacing {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    fn delay(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        rand::rng().random_range(self.min_delay..self.max_delay)
    }
}

/// Resets the draining flag even if the cycle future is dropped.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct MessageQueue {
    pending: Mutex<VecDeque<SpeakTask>>,
    draining: AtomicBool,
    wake: Notify,
    next_id: AtomicU64,
    max_pending: usize,
    pacing: Pacing,
}

impl MessageQueue {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            draining: AtomicBool::new(false),
            wake: Notify::new(),
            next_id: AtomicU64::new(1),
            max_pending: config.max_pending,
            pacing: Pacing::from_config(config),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<SpeakTask>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, origin: TaskOrigin) -> SpeakTask {
        let task = SpeakTask {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            origin,
        };
        self.lock().push_back(task);
        task
    }

    /// Enqueue unconditionally. Used for the opening burst and replies.
    pub fn enqueue(&self, origin: TaskOrigin) -> SpeakTask {
        let task = self.push(origin);
        self.wake.notify_one();
        task
    }

    /// Enqueue unless `max_pending` tasks are already waiting. Returns
    /// whether the task was accepted.
    pub fn offer(&self, origin: TaskOrigin) -> bool {
        {
            let mut pending = self.lock();
            if pending.len() >= self.max_pending {
                tracing::debug!("Queue full ({}), dropping {:?} task", pending.len(), origin);
                return false;
            }
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            pending.push_back(SpeakTask { id, origin });
        }
        self.wake.notify_one();
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Drop every pending task.
    pub fn clear(&self) -> usize {
        let mut pending = self.lock();
        let n = pending.len();
        pending.clear();
        n
    }

    /// Run one drain cycle: up to `batch_size` tasks, sequentially, each
    /// followed by a random pause. Returns 0 without doing anything if a
    /// cycle is already running.
    pub async fn drain_cycle(&self, handler: &dyn SpeakHandler) -> usize {
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return 0;
        }
        let _guard = DrainGuard(&self.draining);

        let batch: Vec<SpeakTask> = {
            let mut pending = self.lock();
            let n = self.pacing.batch_size.min(pending.len());
            pending.drain(..n).collect()
        };

        for task in &batch {
            tracing::trace!("Running speak task #{} ({:?})", task.id, task.origin);
            handler.speak(*task).await;
            tokio::time::sleep(self.pacing.delay()).await;
        }
        batch.len()
    }

    /// Drain whenever tasks are pending until `cancel` fires. A cycle that
    /// is already running finishes; in-flight tasks are not aborted.
    pub async fn run(self: Arc<Self>, handler: Arc<dyn SpeakHandler>, cancel: CancellationToken) {
        while !cancel.is_cancelled() {
            if self.is_empty() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = self.wake.notified() => continue,
                }
            }
            self.drain_cycle(handler.as_ref()).await;
        }
        tracing::debug!("Queue runner stopped with {} pending", self.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u64>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    #[async_trait]
    impl SpeakHandler for Recorder {
        async fn speak(&self, task: SpeakTask) {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.seen.lock().unwrap().push(task.id);
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn queue() -> MessageQueue {
        MessageQueue::new(&SchedulerConfig::default())
    }

    #[test]
    fn test_offer_respects_cap() {
        let q = queue();
        for _ in 0..25 {
            q.offer(TaskOrigin::Chaos);
        }
        assert_eq!(q.len(), 10);
        assert!(!q.offer(TaskOrigin::Chaos));
        assert_eq!(q.len(), 10);
    }

    #[test]
    fn test_enqueue_is_uncapped() {
        let q = queue();
        for _ in 0..15 {
            q.enqueue(TaskOrigin::Reply);
        }
        assert_eq!(q.len(), 15);
        assert!(!q.offer(TaskOrigin::Chaos));
        assert_eq!(q.clear(), 15);
        assert!(q.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_cycle_batches_two() {
        let q = queue();
        let handler = Recorder::default();
        let ids: Vec<u64> = (0..5).map(|_| q.enqueue(TaskOrigin::Opening).id).collect();

        assert_eq!(q.drain_cycle(&handler).await, 2);
        assert_eq!(q.len(), 3);
        assert_eq!(q.drain_cycle(&handler).await, 2);
        assert_eq!(q.drain_cycle(&handler).await, 1);
        assert_eq!(q.drain_cycle(&handler).await, 0);

        assert_eq!(*handler.seen.lock().unwrap(), ids);
        assert!(!q.is_draining());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_cycle_is_rejected() {
        let q = queue();
        let handler = Recorder::default();
        for _ in 0..4 {
            q.enqueue(TaskOrigin::Chaos);
        }
        let (a, b) = tokio::join!(q.drain_cycle(&handler), q.drain_cycle(&handler));
        assert_eq!(a, 2);
        assert_eq!(b, 0);
        assert_eq!(handler.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_drains_in_order_until_cancelled() {
        let q = Arc::new(queue());
        let handler = Arc::new(Recorder::default());
        let cancel = CancellationToken::new();
        let runner = tokio::spawn(q.clone().run(handler.clone(), cancel.clone()));

        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(q.enqueue(TaskOrigin::Reply).id);
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
        ids.push(q.enqueue(TaskOrigin::Reply).id);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(*handler.seen.lock().unwrap(), ids);
        assert_eq!(handler.max_active.load(Ordering::SeqCst), 1);

        cancel.cancel();
        runner.await.unwrap();
        assert!(!q.is_draining());
    }

    #[test]
    fn test_pacing_delay_in_range() {
        let pacing = Pacing::from_config(&SchedulerConfig::default());
        for _ in 0..100 {
            let d = pacing.delay();
            assert!(d >= Duration::from_millis(300) && d < Duration::from_millis(1000));
        }
    }
}
