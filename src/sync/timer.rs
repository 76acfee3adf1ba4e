//! Timer handles owned by the synchronizer loop
//!
//! Both are polled from `tokio::select!`; when disarmed they never resolve.

use std::future;
use std::pin::Pin;

use tokio::time::{self, Duration, Instant, Sleep};

/// A re-armable one-shot timer
#[derive(Default)]
pub struct OneShot {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl OneShot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire after `delay`, replacing any pending deadline
    pub fn arm(&mut self, delay: Duration) {
        let deadline = Instant::now() + delay;
        match self.sleep.as_mut() {
            Some(sleep) => sleep.as_mut().reset(deadline),
            None => self.sleep = Some(Box::pin(time::sleep_until(deadline))),
        }
    }

    pub fn disarm(&mut self) {
        self.sleep = None;
    }

    /// Resolves once the armed deadline passes, then disarms
    pub async fn elapsed(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => sleep.as_mut().await,
            None => future::pending::<()>().await,
        }
        self.sleep = None;
    }
}

/// Coalescing timer for one control: each push replaces the pending value
/// and restarts the quiet period.
pub struct Debounce<T> {
    delay: Duration,
    timer: OneShot,
    pending: Option<T>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timer: OneShot::new(),
            pending: None,
        }
    }

    pub fn push(&mut self, value: T) {
        self.pending = Some(value);
        self.timer.arm(self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Resolves with the last pushed value once the quiet period elapses
    pub async fn fired(&mut self) -> T {
        loop {
            self.timer.elapsed().await;
            if let Some(value) = self.pending.take() {
                return value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Paused-clock deadlines land on the next millisecond tick
    fn assert_elapsed(start: Instant, millis: u64) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_millis(millis)
                && elapsed <= Duration::from_millis(millis + 5),
            "elapsed {:?}, expected ~{}ms",
            elapsed,
            millis
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_fires_after_delay() {
        let mut timer = OneShot::new();
        let start = Instant::now();
        timer.arm(Duration::from_millis(3000));

        timer.elapsed().await;
        assert_elapsed(start, 3000);

        // Disarmed after firing
        let again = time::timeout(Duration::from_secs(10), timer.elapsed()).await;
        assert!(again.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_one_shot_never_fires() {
        let mut timer = OneShot::new();
        timer.arm(Duration::from_millis(10));
        timer.disarm();

        let fired = time::timeout(Duration::from_secs(60), timer.elapsed()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_keeps_last_value_and_restarts_quiet_period() {
        let mut debounce = Debounce::new(Duration::from_millis(200));
        let start = Instant::now();

        debounce.push(10u8);
        time::sleep(Duration::from_millis(150)).await;
        debounce.push(20);
        time::sleep(Duration::from_millis(150)).await;
        debounce.push(30);
        assert!(debounce.is_pending());

        assert_eq!(debounce.fired().await, 30);
        assert_elapsed(start, 500);
        assert!(!debounce.is_pending());
    }
}
