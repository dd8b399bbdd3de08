use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;

/// Default quiet period of a [`SettleGate`].
pub const DEFAULT_SETTLE_MS: u64 = 500;

/// Debounces user input such as a search box.
///
/// Each call to [`Self::settle`] waits for the settle delay and yields its value only if no
/// newer input arrived in the meantime. Superseded calls resolve to `None`; nothing is aborted.
#[derive(Debug)]
pub struct SettleGate {
    delay: Duration,
    generation: AtomicU64,
}

impl Default for SettleGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_SETTLE_MS))
    }
}

impl SettleGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn settle<V>(&self, value: V) -> Option<V> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tokio::time::sleep(self.delay).await;
        if self.generation.load(Ordering::Acquire) == generation {
            Some(value)
        } else {
            vtrace!(generation, "input superseded before settling");
            None
        }
    }

    /// Drops every pending input, e.g. when the search box is cleared or closed.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}
