//! Transient notices ("toasts") raised by the search domain.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoticeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub level: NoticeLevel,
    pub message: String,
}

/// Sink for user-facing notices.
pub trait Notifier: Send + Sync + std::fmt::Debug {
    fn notify(&self, level: NoticeLevel, message: String) -> NoticeId;
}

/// Keeps notices until they are dismissed.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    next_id: AtomicU64,
    notices: Mutex<Vec<Notice>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices still showing, oldest first.
    pub fn active(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn dismiss(&self, id: NoticeId) -> bool {
        let mut notices = self.notices.lock();
        let before = notices.len();
        notices.retain(|notice| notice.id != id);
        notices.len() != before
    }

    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }
}

impl Notifier for NoticeBoard {
    fn notify(&self, level: NoticeLevel, message: String) -> NoticeId {
        let id = NoticeId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.notices.lock().push(Notice { id, level, message });
        id
    }
}

/// Notices straight to the log, for headless runs.
#[derive(Debug, Default)]
pub struct TracingNotifier {
    next_id: AtomicU64,
}

impl Notifier for TracingNotifier {
    fn notify(&self, level: NoticeLevel, message: String) -> NoticeId {
        let id = NoticeId(self.next_id.fetch_add(1, Ordering::Relaxed));
        match level {
            NoticeLevel::Info => info!(notice = id.0, "{message}"),
            NoticeLevel::Warning | NoticeLevel::Error => {
                warn!(notice = id.0, "{message}")
            }
        }
        id
    }
}
