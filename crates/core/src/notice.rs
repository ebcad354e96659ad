use std::time::Instant;

/// Shown when a close or transport error carries no text.
pub const FALLBACK_REASON: &str = "unknown error or reason";

pub fn reason_or_fallback(reason: &str) -> String {
    if reason.trim().is_empty() {
        FALLBACK_REASON.to_string()
    } else {
        reason.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoticeId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub id: NoticeId,
    pub message: String,
    pub created_at: Instant,
}

/// Error notices currently on screen, oldest first.
#[derive(Debug)]
pub struct NoticeBoard {
    notices: Vec<ErrorNotice>,
    next_id: u64,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self {
            notices: Vec::new(),
            next_id: 1,
        }
    }

    pub fn show(&mut self, message: &str, now: Instant) -> NoticeId {
        let id = NoticeId(self.next_id);
        self.next_id += 1;
        self.notices.push(ErrorNotice {
            id,
            message: reason_or_fallback(message),
            created_at: now,
        });
        id
    }

    /// Remove a notice. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: NoticeId) -> bool {
        let before = self.notices.len();
        self.notices.retain(|notice| notice.id != id);
        self.notices.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorNotice> {
        self.notices.iter()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}
