use std::collections::VecDeque;
use std::time::Instant;

/// Max log lines kept on screen.
pub const DEFAULT_MAX_ELEMENTS: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogItem {
    pub seq: u64,
    pub text: String,
    pub is_new: bool,
    pub received_at: Instant,
}

/// Result of a single insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inserted {
    pub seq: u64,
    /// The oldest item, when the insert pushed the buffer over capacity.
    pub evicted: Option<LogItem>,
}

/// Newest-first log lines with a hard capacity.
///
/// Items only leave through tail eviction on insert or through `clear`.
/// Eviction order follows arrival, not reads.
#[derive(Debug)]
pub struct RenderBuffer {
    items: VecDeque<LogItem>,
    capacity: usize,
    next_seq: u64,
}

impl RenderBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity + 1),
            capacity,
            next_seq: 1,
        }
    }

    /// Put `text` at the front and evict the tail if over capacity.
    pub fn insert(&mut self, text: String, now: Instant) -> Inserted {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.items.push_front(LogItem {
            seq,
            text,
            is_new: true,
            received_at: now,
        });

        let evicted = if self.items.len() > self.capacity {
            self.items.pop_back()
        } else {
            None
        };

        Inserted { seq, evicted }
    }

    /// Clear the "new" state of an item. Returns false if it is gone.
    pub fn mark_seen(&mut self, seq: u64) -> bool {
        match self.items.iter_mut().find(|item| item.seq == seq) {
            Some(item) => {
                item.is_new = false;
                true
            }
            None => false,
        }
    }

    /// Drops every highlight at once.
    pub fn mark_all_seen(&mut self) {
        for item in self.items.iter_mut() {
            item.is_new = false;
        }
    }

    pub fn get(&self, seq: u64) -> Option<&LogItem> {
        self.items.iter().find(|item| item.seq == seq)
    }

    /// Items, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &LogItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ELEMENTS)
    }
}
