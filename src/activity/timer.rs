//! One-shot cancellable timers.
//!
//! A [`OneShot`] runs its callback after `delay` unless cancelled first. Each
//! armed timer carries a generation number so the owner can tell a stale
//! firing (from a timer already replaced) from the current one.

use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

/// Handle to an armed timer.
#[derive(Debug)]
pub(crate) struct OneShot {
    generation: u64,
    cancel: CancellationToken,
}

impl OneShot {
    /// Arms a timer; `on_fire` receives the generation it was armed with.
    pub(crate) fn arm<F>(generation: u64, delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce(u64) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            select! {
                _ = token.cancelled() => {}
                _ = &mut sleep => on_fire(generation),
            }
        });

        Self { generation, cancel }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Disarms the timer. No-op if it already fired.
    pub(crate) fn disarm(self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test(start_paused = true)]
    async fn fires_with_its_generation() {
        let seen = Arc::new(AtomicU64::new(0));
        let s = seen.clone();
        let _t = OneShot::arm(3, Duration::from_secs(1), move |g| s.store(g, Ordering::SeqCst));

        time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn disarmed_timer_never_fires() {
        let seen = Arc::new(AtomicU64::new(0));
        let s = seen.clone();
        let t = OneShot::arm(1, Duration::from_secs(1), move |g| s.store(g, Ordering::SeqCst));
        assert_eq!(t.generation(), 1);
        t.disarm();

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }
}
