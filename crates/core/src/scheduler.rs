use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::notice::NoticeId;

/// How long a freshly arrived line stays highlighted.
pub const NEW_LOG_TIMEOUT: Duration = Duration::from_millis(500);
/// How long an error notice stays on screen.
pub const ERROR_TIMEOUT: Duration = Duration::from_millis(5000);

/// Target of a deferred state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKey {
    /// Drop the "new" highlight from the log item with this sequence id.
    Highlight(u64),
    /// Remove this notice from display.
    Dismiss(NoticeId),
}

/// Fire-once, cancellable timers keyed by the item or notice they act on.
///
/// Cancellation is lazy: the heap entry stays behind and is skipped when it
/// comes due because its serial no longer matches the live one.
#[derive(Debug, Default)]
pub struct TransientScheduler {
    queue: BinaryHeap<Reverse<(Instant, u64, TaskKey)>>,
    live: HashMap<TaskKey, u64>,
    next_serial: u64,
}

impl TransientScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to fire `delay` after `now`, replacing any pending
    /// task for the same key.
    pub fn schedule(&mut self, key: TaskKey, now: Instant, delay: Duration) {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.live.insert(key, serial);
        self.queue.push(Reverse((now + delay, serial, key)));
    }

    pub fn schedule_highlight_decay(&mut self, seq: u64, now: Instant, delay: Duration) {
        self.schedule(TaskKey::Highlight(seq), now, delay);
    }

    pub fn schedule_notice_dismissal(&mut self, id: NoticeId, now: Instant, delay: Duration) {
        self.schedule(TaskKey::Dismiss(id), now, delay);
    }

    /// Cancel the pending task for `key`. Safe to call repeatedly; returns
    /// whether anything was pending.
    pub fn cancel(&mut self, key: &TaskKey) -> bool {
        self.live.remove(key).is_some()
    }

    /// Pop every task due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TaskKey> {
        let mut due = Vec::new();
        while let Some(Reverse((fire_at, serial, key))) = self.queue.peek().copied() {
            if fire_at > now {
                break;
            }
            self.queue.pop();
            if self.live.get(&key) == Some(&serial) {
                self.live.remove(&key);
                due.push(key);
            } else {
                debug!("Skipping cancelled task {:?}", key);
            }
        }
        due
    }

    /// Earliest deadline among pending tasks.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        while let Some(Reverse((fire_at, serial, key))) = self.queue.peek().copied() {
            if self.live.get(&key) == Some(&serial) {
                return Some(fire_at);
            }
            self.queue.pop();
        }
        None
    }

    pub fn pending(&self) -> usize {
        self.live.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.live.clear();
    }
}
