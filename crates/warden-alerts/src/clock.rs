//! Time sources.
//!
//! Every age-based decision (deduplication window, escalation thresholds,
//! aggregation window, retention) reads time through a [`Clock`] so that
//! tests can drive it deterministically with a [`ManualClock`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// A source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the instant `span` before now, clamped to the earliest
    /// representable instant.
    fn ago(&self, span: Duration) -> DateTime<Utc> {
        self.now()
            .checked_sub_signed(span)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// Sets the current instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.write() = instant;
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now += by;
    }

    /// Moves the clock forward by whole minutes.
    pub fn advance_minutes(&self, minutes: i64) {
        self.advance(Duration::minutes(minutes));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_frozen() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        clock.advance_minutes(16);
        assert_eq!(clock.now(), start + Duration::minutes(16));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::default();
        let other = clock.clone();
        let target = Utc::now() + Duration::days(3);
        other.set(target);
        assert_eq!(clock.now(), target);
    }

    #[test]
    fn ago_subtracts_span() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.ago(Duration::minutes(15)), start - Duration::minutes(15));
    }

    #[test]
    fn ago_clamps_to_earliest_instant() {
        let clock = ManualClock::default();
        let span = Duration::days(i64::from(u32::MAX));
        assert_eq!(clock.ago(span), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
