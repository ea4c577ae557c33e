//! Request pacing for the TMDB API.

use std::time::Duration;

use tokio::time::Instant;

/// Default spacing between requests (~40 req/s, TMDB's documented ceiling).
const DEFAULT_SPACING: Duration = Duration::from_millis(25);

/// Keeps consecutive requests at least `spacing` apart.
///
/// Pacing only delays; a request that fails is never replayed.
#[derive(Debug)]
pub struct RequestPacer {
    /// Minimum gap between two requests.
    spacing: Duration,
    /// When the next request may start.
    next_slot: Option<Instant>,
}

impl RequestPacer {
    /// Creates a pacer with the given spacing.
    pub(crate) const fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            next_slot: None,
        }
    }

    /// Creates a pacer with the default spacing (25ms).
    pub(crate) const fn with_default_spacing() -> Self {
        Self::new(DEFAULT_SPACING)
    }

    /// Waits for the next free slot and reserves the one after it.
    pub async fn acquire(&mut self) {
        if let Some(slot) = self.next_slot {
            tokio::time::sleep_until(slot).await;
        }
        self.next_slot = Instant::now().checked_add(self.spacing);
    }
}
