//! The relogin countdown behind the session-expired prompt.
//!
//! A background task ticks once per second, publishes the seconds left on
//! a `watch` channel and runs a callback when it reaches zero. Cancelling
//! (or dropping the [`Countdown`]) stops it without running the callback.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant};
use tokio_util::sync::{CancellationToken, DropGuard};

const TICK: Duration = Duration::from_secs(1);

pub struct Countdown {
    remaining: watch::Receiver<u64>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl Countdown {
    /// Spawns the countdown task. Must be called inside a Tokio runtime.
    pub fn start(secs: u64, on_elapsed: impl FnOnce() + Send + 'static) -> Self {
        let (tx, rx) = watch::channel(secs);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
            let mut remaining = secs;
            while remaining > 0 {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        tracing::debug!(remaining, "relogin countdown cancelled");
                        return;
                    }
                    _ = ticker.tick() => {
                        remaining -= 1;
                        tx.send_replace(remaining);
                        tracing::trace!(remaining, "relogin countdown tick");
                    }
                }
            }
            if !token.is_cancelled() {
                tracing::debug!("relogin countdown elapsed");
                on_elapsed();
            }
        });

        Self {
            remaining: rx,
            _guard: cancel.clone().drop_guard(),
            cancel,
        }
    }

    /// Seconds left.
    pub fn remaining(&self) -> u64 {
        *self.remaining.borrow()
    }

    /// Follows the seconds left, e.g. to redraw a prompt.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.remaining.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl std::fmt::Debug for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Countdown")
            .field("remaining", &self.remaining())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_ticks_down_then_fires() {
        let (fired, on_elapsed) = counter();
        let countdown = Countdown::start(3, on_elapsed);
        assert_eq!(countdown.remaining(), 3);

        time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(countdown.remaining(), 2);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(countdown.remaining(), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_cancel_prevents_callback() {
        let (fired, on_elapsed) = counter();
        let countdown = Countdown::start(2, on_elapsed);

        time::sleep(Duration::from_millis(1_500)).await;
        countdown.cancel();
        time::sleep(Duration::from_secs(5)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(countdown.remaining(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_drop_cancels() {
        let (fired, on_elapsed) = counter();
        drop(Countdown::start(1, on_elapsed));

        time::sleep(Duration::from_secs(3)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_zero_fires_right_away() {
        let (fired, on_elapsed) = counter();
        let _countdown = Countdown::start(0, on_elapsed);

        tokio::task::yield_now().await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_subscribers_see_every_second() {
        let (_fired, on_elapsed) = counter();
        let countdown = Countdown::start(2, on_elapsed);
        let mut rx = countdown.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 0);
    }
}
