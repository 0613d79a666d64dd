//! Repeating ticker driving the cancel countdown
//!
//! The ticker never touches controller state. It only posts
//! [`CountdownTick`] messages to the channel owned by the foreground event
//! loop, which hands them to the controller. Each countdown gets its own
//! generation so a tick that was already queued when the countdown stopped
//! is recognised as stale and dropped.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Interval between countdown ticks
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// One elapsed second of a specific countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    pub generation: u64,
}

/// Handle to a running ticker task. Stopping or dropping it aborts the task.
#[derive(Debug)]
pub struct CountdownTicker {
    generation: u64,
    handle: JoinHandle<()>,
}

impl CountdownTicker {
    /// Spawn a ticker that sends a tick for `generation` every `period`,
    /// starting one period from now
    pub fn start(
        generation: u64,
        period: Duration,
        tx: mpsc::UnboundedSender<CountdownTick>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if tx.send(CountdownTick { generation }).is_err() {
                    debug!(generation, "Countdown receiver gone, ticker exiting");
                    break;
                }
            }
        });

        Self { generation, handle }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the ticker; no tick is sent after this returns
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ticker = CountdownTicker::start(3, COUNTDOWN_TICK, tx);
        let started = Instant::now();

        for _ in 0..3 {
            let tick = rx.recv().await.unwrap();
            assert_eq!(tick.generation, 3);
        }
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert_eq!(ticker.generation(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_after_stop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ticker = CountdownTicker::start(1, COUNTDOWN_TICK, tx);

        rx.recv().await.unwrap();
        ticker.stop();

        time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_stops_ticker() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        drop(CountdownTicker::start(1, COUNTDOWN_TICK, tx));

        time::sleep(Duration::from_secs(5)).await;
        // Sender dropped with the aborted task, so the channel is closed and empty
        assert!(rx.recv().await.is_none());
    }
}
