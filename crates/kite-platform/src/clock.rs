//! Millisecond-resolution monotonic clock.

use std::time::Instant;

/// Monotonic clock reporting seconds since an origin fixed at construction.
///
/// Readings are truncated to whole milliseconds before conversion, so two
/// readings within the same millisecond compare equal. Derived from
/// [`Instant`], readings never regress even if wall-clock time is adjusted.
#[derive(Debug, Copy, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose origin is now.
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Elapsed seconds since the origin, truncated to millisecond resolution.
    pub fn now_seconds(&self) -> f64 {
        let millis = self.origin.elapsed().as_millis();
        millis as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_reading_starts_near_zero() {
        let clock = MonotonicClock::start();
        assert!(clock.now_seconds() < 0.1);
    }

    #[test]
    fn test_readings_never_regress() {
        let clock = MonotonicClock::start();
        let mut last = clock.now_seconds();
        for _ in 0..100 {
            let now = clock.now_seconds();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn test_millisecond_truncation() {
        let clock = MonotonicClock::start();
        thread::sleep(Duration::from_millis(25));
        let seconds = clock.now_seconds();
        assert!(seconds >= 0.025);
        // Truncated readings are exact multiples of 1ms.
        let millis = seconds * 1000.0;
        assert!((millis - millis.round()).abs() < 1e-9);
    }
}
