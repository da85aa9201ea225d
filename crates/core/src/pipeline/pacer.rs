use std::thread;
use std::time::{Duration, Instant};

/// Spaces displayed frames at least `interval` apart.
///
/// Only affects how fast frames are shown; processing results never depend on it.
#[derive(Clone, Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// `0` disables pacing.
    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    /// Sleeps for whatever is left of the interval since the previous call.
    pub fn wait(&mut self) {
        if !self.is_enabled() {
            return;
        }
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::disabled()
    }
}
