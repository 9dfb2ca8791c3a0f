//! Time sources for the tracker.
//!
//! All timestamps (creation, last-seen, memory expiry, export throttling) come
//! from a [`Clock`], so lifecycle behaviour can be driven deterministically in
//! tests and replays without real sleeps.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeDelta};

/// Source of the current time.
pub trait Clock: Send {
    fn now(&self) -> DateTime<Local>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Manually advanced clock.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give another to the tracker.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, time: DateTime<Local>) {
        *self.lock() = time;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.lock();
        *now += delta;
    }

    /// Advance by a fractional number of seconds.
    pub fn advance_secs(&self, secs: f64) {
        self.advance(TimeDelta::microseconds((secs * 1e6) as i64));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Local>> {
        // A poisoned lock still holds a valid timestamp.
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Local::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::default();
        let handle = clock.clone();
        let start = clock.now();

        handle.advance_secs(1.5);
        assert_eq!(clock.now() - start, TimeDelta::milliseconds(1500));
    }
}
