//! Periodic capture trigger.
//!
//! The timer exists only while auto-refresh is on: enabling creates an
//! [`AutoRefreshTimer`], disabling (or tearing down the screen) drops it.
//! Dropping aborts the background task and the tick channel with it, so no
//! tick can be observed after that point.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a running periodic trigger.
///
/// Ticks are wall-clock: the next tick is scheduled regardless of whether the
/// cycle started by the previous one has finished. Unconsumed ticks collapse
/// into one.
#[derive(Debug)]
pub struct AutoRefreshTimer {
    interval: Duration,
    ticks: mpsc::Receiver<()>,
    task: JoinHandle<()>,
}

impl AutoRefreshTimer {
    /// Start ticking. The first tick fires one full `interval` from now.
    #[must_use]
    pub fn start(interval: Duration) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        let (tx, ticks) = mpsc::channel(1);
        let first = Instant::now() + interval;

        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval_at(first, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                timer.tick().await;
                match tx.try_send(()) {
                    Ok(()) | Err(TrySendError::Full(())) => {}
                    Err(TrySendError::Closed(())) => break,
                }
            }
        });

        debug!(interval_ms = interval.as_millis() as u64, "Auto-refresh timer started");
        Self {
            interval,
            ticks,
            task,
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Consume pending ticks. Returns `true` if at least one fired since the
    /// last call.
    pub fn take_tick(&mut self) -> bool {
        let mut fired = false;
        while self.ticks.try_recv().is_ok() {
            fired = true;
        }
        fired
    }

    /// Wait for the next tick.
    pub async fn next_tick(&mut self) {
        let _ = self.ticks.recv().await;
    }
}

impl Drop for AutoRefreshTimer {
    fn drop(&mut self) {
        self.ticks.close();
        self.task.abort();
        debug!("Auto-refresh timer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_a_full_interval() {
        let mut timer = AutoRefreshTimer::start(Duration::from_secs(30));
        tokio::time::sleep(Duration::from_millis(29_999)).await;
        assert!(!timer.take_tick());
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(timer.take_tick());
    }

    #[tokio::test(start_paused = true)]
    async fn missed_ticks_collapse() {
        let mut timer = AutoRefreshTimer::start(Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(550)).await;
        assert!(timer.take_tick());
        assert!(!timer.take_tick());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_repeat_on_the_period() {
        let mut timer = AutoRefreshTimer::start(Duration::from_millis(100));
        let start = Instant::now();
        timer.next_tick().await;
        timer.next_tick().await;
        timer.next_tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_clamped() {
        let timer = AutoRefreshTimer::start(Duration::ZERO);
        assert_eq!(timer.interval(), MIN_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_the_task() {
        let timer = AutoRefreshTimer::start(Duration::from_millis(10));
        let handle = timer.task.abort_handle();
        drop(timer);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished());
    }
}
