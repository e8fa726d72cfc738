//! Cooperative Task Scheduler
//!
//! A single-consumer run loop primitive: a FIFO task queue plus a timer wheel
//! advanced by external ticks.
//!
//! - [`TaskQueue`] is the clonable producer side of the FIFO.
//! - [`TickHandle`] advances time from any thread. It only bumps an atomic
//!   counter and wakes the consumer; expired timers are collected by the
//!   consumer itself, so the wheel has a single writer.
//! - [`TaskScheduler`] owns the receiver and the wheel and hands out one task
//!   at a time.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tracing::trace;

/// The scheduler that owns the queue has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("task queue closed")]
pub struct QueueClosed;

// ============================================================================
// Task Queue
// ============================================================================

/// Producer side of the scheduler's FIFO.
#[derive(Debug)]
pub struct TaskQueue<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for TaskQueue<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> TaskQueue<T> {
    /// Appends a task to the back of the queue.
    pub fn push(&self, task: T) -> Result<(), QueueClosed> {
        self.tx.send(task).map_err(|_| QueueClosed)
    }

    /// Returns true if the scheduler is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// ============================================================================
// Tick Handle
// ============================================================================

/// Advances the scheduler clock by one tick per call.
#[derive(Debug, Clone, Default)]
pub struct TickHandle {
    inner: Arc<TickState>,
}

#[derive(Debug, Default)]
struct TickState {
    pending: AtomicU64,
    notify: Notify,
}

impl TickHandle {
    /// Records one elapsed tick and wakes the scheduler.
    pub fn tick(&self) {
        self.inner.pending.fetch_add(1, Ordering::AcqRel);
        self.inner.notify.notify_one();
    }

    fn take_pending(&self) -> u64 {
        self.inner.pending.swap(0, Ordering::AcqRel)
    }

    async fn notified(&self) {
        self.inner.notify.notified().await
    }
}

// ============================================================================
// Timer Wheel
// ============================================================================

/// Ordered set of one-shot timers keyed by a caller chosen id.
///
/// Starting a timer whose id is already running replaces it.
#[derive(Debug)]
pub struct TimerWheel<T> {
    now: u64,
    seq: u64,
    entries: BTreeMap<(u64, u64), (u32, T)>,
    by_id: HashMap<u32, (u64, u64)>,
}

impl<T> Default for TimerWheel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerWheel<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            seq: 0,
            entries: BTreeMap::new(),
            by_id: HashMap::new(),
        }
    }

    /// Current time in ticks.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Arms timer `id` to fire `ticks` ticks from now (at least one).
    pub fn start(&mut self, id: u32, ticks: u64, task: T) {
        self.cancel(id);
        let key = (self.now.saturating_add(ticks.max(1)), self.seq);
        self.seq += 1;
        self.entries.insert(key, (id, task));
        self.by_id.insert(id, key);
    }

    /// Disarms timer `id`. Returns true if it was running.
    pub fn cancel(&mut self, id: u32) -> bool {
        match self.by_id.remove(&id) {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn is_running(&self, id: u32) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Number of armed timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Moves time forward and returns the tasks of every expired timer, in
    /// expiry order.
    pub fn advance(&mut self, ticks: u64) -> Vec<T> {
        self.now = self.now.saturating_add(ticks);
        let pending = self.entries.split_off(&(self.now.saturating_add(1), 0));
        let expired = std::mem::replace(&mut self.entries, pending);

        expired
            .into_values()
            .map(|(id, task)| {
                self.by_id.remove(&id);
                task
            })
            .collect()
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Single-consumer scheduler combining the FIFO and the timer wheel.
#[derive(Debug)]
pub struct TaskScheduler<T> {
    queue: TaskQueue<T>,
    rx: mpsc::UnboundedReceiver<T>,
    ticks: TickHandle,
    timers: TimerWheel<T>,
}

impl<T> Default for TaskScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskScheduler<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            queue: TaskQueue { tx },
            rx,
            ticks: TickHandle::default(),
            timers: TimerWheel::new(),
        }
    }

    /// Returns a new producer handle for the queue.
    pub fn make_task_queue(&self) -> TaskQueue<T> {
        self.queue.clone()
    }

    /// Returns a handle that advances this scheduler's clock.
    pub fn tick_handle(&self) -> TickHandle {
        self.ticks.clone()
    }

    /// Current time in ticks.
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    pub fn start_timer(&mut self, id: u32, ticks: u64, task: T) {
        trace!("Timer {} started for {} ticks", id, ticks);
        self.timers.start(id, ticks, task);
    }

    pub fn cancel_timer(&mut self, id: u32) -> bool {
        self.timers.cancel(id)
    }

    pub fn is_timer_running(&self, id: u32) -> bool {
        self.timers.is_running(id)
    }

    /// Applies pending ticks and queues the tasks of expired timers.
    ///
    /// Returns the number of timers that expired.
    pub fn advance_timers(&mut self) -> usize {
        let ticks = self.ticks.take_pending();
        if ticks == 0 {
            return 0;
        }

        let expired = self.timers.advance(ticks);
        let count = expired.len();
        for task in expired {
            // The scheduler holds its own sender, the queue cannot be closed
            let _ = self.queue.push(task);
        }
        count
    }

    /// Returns the next task without waiting.
    pub fn try_next_task(&mut self) -> Option<T> {
        self.advance_timers();
        self.rx.try_recv().ok()
    }

    /// Waits for the next task, applying ticks as they arrive.
    pub async fn next_task(&mut self) -> Option<T> {
        loop {
            if let Some(task) = self.try_next_task() {
                return Some(task);
            }

            let ticks = self.ticks.clone();
            tokio::select! {
                task = self.rx.recv() => return task,
                _ = ticks.notified() => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_queue_fifo() {
        let mut scheduler = TaskScheduler::new();
        let queue = scheduler.make_task_queue();
        queue.push(1).unwrap();
        queue.push(2).unwrap();
        queue.push(3).unwrap();

        assert_eq!(scheduler.try_next_task(), Some(1));
        assert_eq!(scheduler.try_next_task(), Some(2));
        assert_eq!(scheduler.try_next_task(), Some(3));
        assert_eq!(scheduler.try_next_task(), None);
    }

    #[test]
    fn test_queue_closed_after_drop() {
        let scheduler = TaskScheduler::<u8>::new();
        let queue = scheduler.make_task_queue();
        drop(scheduler);
        assert!(queue.is_closed());
        assert_eq!(queue.push(1), Err(QueueClosed));
    }

    #[test]
    fn test_timer_fires_after_ticks() {
        let mut scheduler = TaskScheduler::new();
        let ticks = scheduler.tick_handle();
        scheduler.start_timer(7, 3, "expired");

        ticks.tick();
        ticks.tick();
        assert_eq!(scheduler.try_next_task(), None);
        assert!(scheduler.is_timer_running(7));

        ticks.tick();
        assert_eq!(scheduler.try_next_task(), Some("expired"));
        assert!(!scheduler.is_timer_running(7));
        assert_eq!(scheduler.now(), 3);
    }

    #[test]
    fn test_timer_cancel() {
        let mut scheduler = TaskScheduler::new();
        let ticks = scheduler.tick_handle();
        scheduler.start_timer(1, 1, 10);
        assert!(scheduler.cancel_timer(1));
        assert!(!scheduler.cancel_timer(1));

        ticks.tick();
        assert_eq!(scheduler.try_next_task(), None);
    }

    #[test]
    fn test_timer_restart_replaces() {
        let mut wheel = TimerWheel::new();
        wheel.start(1, 5, "first");
        wheel.start(1, 2, "second");
        assert_eq!(wheel.len(), 1);

        assert_eq!(wheel.advance(2), vec!["second"]);
        assert!(wheel.is_empty());
        assert!(wheel.advance(10).is_empty());
    }

    #[test]
    fn test_timer_expiry_order() {
        let mut wheel = TimerWheel::new();
        wheel.start(1, 4, 'c');
        wheel.start(2, 1, 'a');
        wheel.start(3, 2, 'b');
        wheel.start(4, 9, 'd');

        assert_eq!(wheel.advance(5), vec!['a', 'b', 'c']);
        assert!(wheel.is_running(4));
        assert_eq!(wheel.now(), 5);
    }

    #[test]
    fn test_zero_tick_timer_waits_one_tick() {
        let mut wheel = TimerWheel::new();
        wheel.start(1, 0, ());
        assert!(wheel.advance(0).is_empty());
        assert_eq!(wheel.advance(1).len(), 1);
    }

    #[test]
    fn test_expired_timers_queue_behind_pending_tasks() {
        let mut scheduler = TaskScheduler::new();
        let queue = scheduler.make_task_queue();
        let ticks = scheduler.tick_handle();
        scheduler.start_timer(1, 1, "timer");
        queue.push("queued").unwrap();

        ticks.tick();
        assert_eq!(scheduler.try_next_task(), Some("queued"));
        assert_eq!(scheduler.try_next_task(), Some("timer"));
    }

    #[tokio::test]
    async fn test_next_task_wakes_on_push() {
        let mut scheduler = TaskScheduler::new();
        let queue = scheduler.make_task_queue();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            queue.push(42u32).unwrap();
        });

        let task = tokio::time::timeout(Duration::from_secs(1), scheduler.next_task())
            .await
            .unwrap();
        assert_eq!(task, Some(42));
    }

    #[tokio::test]
    async fn test_next_task_wakes_on_tick() {
        let mut scheduler = TaskScheduler::new();
        let ticks = scheduler.tick_handle();
        scheduler.start_timer(1, 2, "timeout");

        let ticker = std::thread::spawn(move || {
            ticks.tick();
            ticks.tick();
        });

        let task = tokio::time::timeout(Duration::from_secs(1), scheduler.next_task())
            .await
            .unwrap();
        assert_eq!(task, Some("timeout"));
        ticker.join().unwrap();
    }
}
