use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Single-slot gate spacing outbound calls at least `min_interval` apart
///
/// Callers queue on the internal mutex, so concurrent acquirers are released
/// one at a time, each after the remainder of the interval since the
/// previous release. Share one instance (behind `Arc`) across every client
/// of the same upstream.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Wait until a call may be dispatched and claim the slot
    pub async fn acquire(&self) {
        let mut last = self.last_dispatch.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::trace!("Rate limiter waiting {:?}", wait);
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }
}
