//! # Host Time
//!
//! Contracts never look at the wall clock. The host reads the time once per
//! operation and passes it in as a [`Timestamp`], so that a single call sees
//! one consistent "now" no matter how long it takes to run. The [`Clock`]
//! trait is the host-side half of that contract.
//!
//! Time is measured in whole seconds since the Unix epoch and must never go
//! backwards. [`ManualClock`] enforces that, which is what makes it useful
//! for tests that fast-forward through reward intervals.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use thiserror::Error;

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Errors from driving a manual clock.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// Attempted to move the clock backwards.
    #[error("clock must be monotonic: now {now}, requested {requested}")]
    NonMonotonic {
        /// Current clock value.
        now: Timestamp,
        /// The earlier value that was requested.
        requested: Timestamp,
    },

    /// Advancing would overflow `u64` seconds. Congratulations on your
    /// extremely long-running test.
    #[error("clock overflow")]
    Overflow,
}

/// A source of monotonic, second-resolution time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time via `chrono`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // Pre-epoch system clocks are a misconfiguration, not a time machine.
        u64::try_from(Utc::now().timestamp()).unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Moves the clock forward by `secs` and returns the new time.
    pub fn advance(&self, secs: u64) -> Result<Timestamp, ClockError> {
        let current = self.now.load(Ordering::SeqCst);
        let next = current.checked_add(secs).ok_or(ClockError::Overflow)?;
        self.now.store(next, Ordering::SeqCst);
        Ok(next)
    }

    /// Jumps to `at`, which must not be earlier than the current time.
    pub fn set(&self, at: Timestamp) -> Result<(), ClockError> {
        let current = self.now.load(Ordering::SeqCst);
        if at < current {
            return Err(ClockError::NonMonotonic {
                now: current,
                requested: at,
            });
        }
        self.now.store(at, Ordering::SeqCst);
        Ok(())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now(), 1_000);
        assert_eq!(clock.advance(1_200), Ok(2_200));
        assert_eq!(clock.now(), 2_200);
    }

    #[test]
    fn manual_clock_refuses_to_rewind() {
        let clock = ManualClock::new(500);
        assert_eq!(
            clock.set(499),
            Err(ClockError::NonMonotonic {
                now: 500,
                requested: 499
            })
        );
        assert!(clock.set(500).is_ok());
        assert!(clock.set(10_000).is_ok());
        assert_eq!(clock.now(), 10_000);
    }

    #[test]
    fn manual_clock_overflow() {
        let clock = ManualClock::new(u64::MAX - 1);
        assert_eq!(clock.advance(2), Err(ClockError::Overflow));
        assert_eq!(clock.now(), u64::MAX - 1);
    }

    #[test]
    fn system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z. If this fails, check the CI box's BIOS battery.
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
