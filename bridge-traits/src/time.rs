//! Time Abstractions
//!
//! Provides an injectable monotonic time source so playback synchronisation
//! can be driven deterministically in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source.
///
/// Values are measured from an arbitrary, fixed origin and never decrease.
/// Only differences between two readings are meaningful.
///
/// # Example
///
/// ```
/// use bridge_traits::time::{Clock, MonotonicClock};
///
/// let clock = MonotonicClock::new();
/// let start = clock.now();
/// assert!(clock.now() >= start);
/// ```
pub trait Clock: Send + Sync {
    /// Current reading of the clock.
    fn now(&self) -> Duration;

    /// Current reading in whole milliseconds.
    fn now_millis(&self) -> u64 {
        self.now().as_millis() as u64
    }
}

/// Clock backed by [`Instant`], with its origin at construction time.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock for deterministic tests and offline rendering.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at a given reading.
    pub fn starting_at(start: Duration) -> Self {
        Self {
            millis: AtomicU64::new(start.as_millis() as u64),
        }
    }

    /// Move the clock forward. The clock never goes backwards.
    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Jump to an absolute reading, ignored if it lies in the past.
    pub fn set(&self, to: Duration) {
        self.millis
            .fetch_max(to.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_never_decreases() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new();
        assert_eq!(clock.now_millis(), 0);

        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(250));

        clock.advance(Duration::from_millis(50));
        assert_eq!(clock.now_millis(), 300);
    }

    #[test]
    fn test_manual_clock_set_is_monotonic() {
        let clock = ManualClock::starting_at(Duration::from_secs(1));
        clock.set(Duration::from_millis(500));
        assert_eq!(clock.now(), Duration::from_secs(1));

        clock.set(Duration::from_secs(2));
        assert_eq!(clock.now(), Duration::from_secs(2));
    }
}
