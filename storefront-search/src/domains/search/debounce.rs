use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Identifies one scheduled firing; a message carrying an older ticket is
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DebounceTicket(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebouncePhase {
    #[default]
    Idle,
    Pending,
    Fired,
    Cancelled,
}

/// One debounce class (commit, suggest, home redirect). Rescheduling cancels
/// the timer that is already running.
#[derive(Debug)]
pub struct Debouncer {
    label: &'static str,
    delay: Duration,
    generation: u64,
    token: Option<CancellationToken>,
    phase: DebouncePhase,
}

impl Debouncer {
    pub fn new(label: &'static str, delay: Duration) -> Self {
        Self {
            label,
            delay,
            generation: 0,
            token: None,
            phase: DebouncePhase::Idle,
        }
    }

    /// Post `make(ticket)` on `tx` once `delay` passes without another
    /// schedule or cancel.
    pub fn schedule<M, F>(&mut self, tx: &UnboundedSender<M>, make: F)
    where
        M: Send + 'static,
        F: FnOnce(DebounceTicket) -> M,
    {
        self.cancel();
        self.generation += 1;
        let ticket = DebounceTicket(self.generation);
        let token = CancellationToken::new();
        self.token = Some(token.clone());
        self.phase = DebouncePhase::Pending;

        let message = make(ticket);
        let delay = self.delay;
        let tx = tx.clone();
        let label = self.label;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    trace!("[Debounce] {} elapsed", label);
                    let _ = tx.send(message);
                }
            }
        });
    }

    /// Returns true when a pending timer was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.token.take() {
            Some(token) => {
                token.cancel();
                self.phase = DebouncePhase::Cancelled;
                true
            }
            None => false,
        }
    }

    /// Accept a firing. False for stale tickets and cancelled timers.
    pub fn fire(&mut self, ticket: DebounceTicket) -> bool {
        if self.phase != DebouncePhase::Pending || ticket.0 != self.generation
        {
            return false;
        }
        self.token = None;
        self.phase = DebouncePhase::Fired;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.phase == DebouncePhase::Pending
    }

    pub fn phase(&self) -> DebouncePhase {
        self.phase
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
