//! Wall-clock source and inactivity comparison.
//!
//! `SystemClock` is what the application runs on. `ManualClock` is a
//! shareable, settable clock for simulated time.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

pub trait ActivityClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// True once strictly more than `timeout` has passed since `last`.
pub fn is_expired(clock: &dyn ActivityClock, last: DateTime<Utc>, timeout: Duration) -> bool {
    clock.now() - last > timeout
}

pub struct SystemClock;

impl ActivityClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Start at a given number of milliseconds since the Unix epoch
    pub fn from_millis(millis: i64) -> Self {
        Self::new(DateTime::from_timestamp_millis(millis).unwrap_or_default())
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.lock() = instant;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned lock still holds a valid timestamp
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ActivityClock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_expired_boundary() {
        let clock = ManualClock::from_millis(1_000_000);
        let last = clock.now();
        let timeout = Duration::milliseconds(1_800_000);

        clock.advance(Duration::milliseconds(1_800_000));
        assert!(!is_expired(&clock, last, timeout)); // exactly at the limit

        clock.advance(Duration::milliseconds(1));
        assert!(is_expired(&clock, last, timeout));
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::from_millis(0);
        let other = clock.clone();
        clock.advance(Duration::seconds(5));
        assert_eq!(other.now().timestamp_millis(), 5_000);
    }

    #[test]
    fn test_future_timestamp_is_not_expired() {
        let clock = ManualClock::from_millis(10_000);
        let last = DateTime::from_timestamp_millis(20_000).unwrap();
        assert!(!is_expired(&clock, last, Duration::zero()));
    }
}
