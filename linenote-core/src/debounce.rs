//! Trailing-edge debounce for store writes.
//!
//! The debouncer holds no callback and spawns no task. Each `signal()` pushes a
//! deadline `interval` into the future; the owner flushes when `take_due()`
//! reports the deadline has passed, and calls `take_pending()` once at
//! shutdown so a signalled write is never lost.

use std::time::Duration;

use tokio::time::Instant;

/// Quiet period before a signalled save is written.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self { interval, deadline: None }
    }

    /// Records an event, cancelling any earlier deadline.
    pub fn signal(&mut self) {
        self.deadline = Some(Instant::now() + self.interval);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` (and clears the deadline) once the quiet period is over.
    pub fn take_due(&mut self) -> bool {
        match self.deadline {
            Some(at) if at <= Instant::now() => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Clears and reports any pending deadline regardless of time.
    pub fn take_pending(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Completes when the current deadline passes; never completes if idle.
    ///
    /// The deadline is read once, so a `signal()` issued while this future is
    /// pending is only observed by the next call.
    pub async fn wait(&self) {
        sleep_until(self.deadline()).await
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SAVE_DEBOUNCE)
    }
}

/// Sleeps until `deadline`, or forever when there is none.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_of_signals_fires_once_after_quiet_period() {
        let mut d = Debouncer::default();
        for _ in 0..5 {
            d.signal();
            tokio::time::advance(Duration::from_millis(100)).await;
            assert!(!d.take_due(), "still inside the window");
        }
        tokio::time::advance(Duration::from_millis(400)).await;
        assert!(d.take_due());
        assert!(!d.take_due(), "flushes only once");
        assert_eq!(d.deadline(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_completes_at_deadline() {
        let mut d = Debouncer::new(Duration::from_millis(50));
        d.signal();
        let start = Instant::now();
        d.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(d.take_due());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_on_idle_debouncer_never_completes() {
        let d = Debouncer::default();
        let waited = tokio::time::timeout(Duration::from_secs(60), d.wait()).await;
        assert!(waited.is_err());
    }

    #[test]
    fn shutdown_takes_pending_signal() {
        let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
        rt.block_on(async {
            let mut d = Debouncer::default();
            assert!(!d.take_pending());
            d.signal();
            assert!(d.take_pending());
            assert_eq!(d.deadline(), None);
        });
    }
}
