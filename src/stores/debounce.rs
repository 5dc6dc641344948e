//! Debounce gate for search-as-you-type.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Generation-counting debouncer.
///
/// Every `wait` call bumps the generation and sleeps for the configured
/// delay; only the call that is still the newest when its sleep ends wins.
/// Superseded callers return `false` and skip their work. No task handles
/// are kept, so there is nothing to cancel.
pub struct Debouncer {
    delay: Duration,
    generation: AtomicU64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
        }
    }

    /// Sleep out the debounce window. Returns `true` when no newer call
    /// arrived in the meantime.
    pub async fn wait(&self) -> bool {
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        self.generation.load(Ordering::SeqCst) == mine
    }
}
