//! Periodic background task with an owner-controlled lifetime

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Shortest period the refresher runs at
pub const MIN_REFRESH_PERIOD: Duration = Duration::from_secs(1);

/// Runs `tick` on a fixed interval until stopped or dropped.
///
/// The first tick fires immediately. Returning `false` from `tick` ends the
/// task, which is how a tick notices its owner is gone. Periods below
/// [`MIN_REFRESH_PERIOD`] are raised to it.
#[derive(Debug)]
pub struct BalanceRefresher {
    handle: JoinHandle<()>,
}

impl BalanceRefresher {
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        if period < MIN_REFRESH_PERIOD {
            tracing::warn!(?period, min = ?MIN_REFRESH_PERIOD, "Refresh period too short, using the minimum");
        }
        let period = period.max(MIN_REFRESH_PERIOD);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !tick().await {
                    tracing::debug!("Balance refresher owner gone, exiting");
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the task
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for BalanceRefresher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(count: &Arc<AtomicUsize>, limit: usize) -> impl FnMut() -> futures::future::Ready<bool> {
        let count = count.clone();
        move || {
            let n = count.fetch_add(1, Ordering::SeqCst) + 1;
            futures::future::ready(n < limit)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_immediately_then_on_period() {
        let count = Arc::new(AtomicUsize::new(0));
        let refresher = BalanceRefresher::spawn(Duration::from_secs(30), counting(&count, usize::MAX));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        refresher.stop();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_cancels() {
        let count = Arc::new(AtomicUsize::new(0));
        let refresher = BalanceRefresher::spawn(Duration::from_secs(1), counting(&count, usize::MAX));
        tokio::time::sleep(Duration::from_millis(1)).await;
        drop(refresher);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_runs_at_the_minimum() {
        let count = Arc::new(AtomicUsize::new(0));
        let refresher = BalanceRefresher::spawn(Duration::ZERO, counting(&count, usize::MAX));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!refresher.is_finished());

        tokio::time::sleep(MIN_REFRESH_PERIOD).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(!refresher.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn false_from_tick_ends_task() {
        let count = Arc::new(AtomicUsize::new(0));
        let refresher = BalanceRefresher::spawn(Duration::from_secs(1), counting(&count, 3));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(refresher.is_finished());
    }
}
