//! Quiescence-window debouncer.

use std::time::Duration;

use tokio::time::Instant;

/// Holds back a changing value until it has been stable for `delay`.
///
/// Every [`push`](Self::push) replaces the pending value and restarts the
/// window, so intermediate values are never emitted. The owner drives it
/// with [`poll`](Self::poll) and can sleep until [`deadline`](Self::deadline).
#[derive(Debug)]
pub struct Debouncer<T> {
    /// Quiescence window.
    delay: Duration,
    /// Latest value and the instant it becomes due.
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    /// Creates an idle debouncer with the given window.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Returns the quiescence window.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Records a new value, cancelling any pending one.
    pub fn push(&mut self, value: T, now: Instant) {
        let due = now.checked_add(self.delay).unwrap_or(now);
        self.pending = Some((value, due));
    }

    /// Emits the pending value if its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending.take() {
            Some((value, due)) if due <= now => Some(value),
            other => {
                self.pending = other;
                None
            }
        }
    }

    /// Instant at which the pending value becomes due, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    /// Returns `true` while a value is waiting for its window to elapse.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops the pending value; it will never be emitted.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
