//! Browser-history abstraction.

use parking_lot::Mutex;
use url::Url;

/// The address bar. Every committed search is a new history entry.
pub trait Navigator: Send + Sync + std::fmt::Debug {
    fn location(&self) -> Url;
    fn push(&self, url: Url);
}

#[derive(Debug)]
struct HistoryState {
    entries: Vec<Url>,
    cursor: usize,
}

/// In-memory history stack with back/forward, used by the CLI and tests.
#[derive(Debug)]
pub struct MemoryHistory {
    state: Mutex<HistoryState>,
}

impl MemoryHistory {
    pub fn new(initial: Url) -> Self {
        Self {
            state: Mutex::new(HistoryState {
                entries: vec![initial],
                cursor: 0,
            }),
        }
    }

    /// Step back; the caller forwards the returned URL to the session as a
    /// location change.
    pub fn back(&self) -> Option<Url> {
        let mut state = self.state.lock();
        if state.cursor == 0 {
            return None;
        }
        state.cursor -= 1;
        Some(state.entries[state.cursor].clone())
    }

    pub fn forward(&self) -> Option<Url> {
        let mut state = self.state.lock();
        if state.cursor + 1 >= state.entries.len() {
            return None;
        }
        state.cursor += 1;
        Some(state.entries[state.cursor].clone())
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn entries(&self) -> Vec<Url> {
        self.state.lock().entries.clone()
    }
}

impl Navigator for MemoryHistory {
    fn location(&self) -> Url {
        let state = self.state.lock();
        state.entries[state.cursor].clone()
    }

    fn push(&self, url: Url) {
        let mut state = self.state.lock();
        let keep = state.cursor + 1;
        state.entries.truncate(keep);
        state.entries.push(url);
        state.cursor = keep;
    }
}
