//! Wall clock abstraction used to compute reading age at read time.

use chrono::{DateTime, Utc};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Seconds elapsed from `time` to `now`, with millisecond resolution.
///
/// Negative when the device clock is ahead of ours.
pub fn age_seconds(time: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - time).num_milliseconds() as f64 / 1000.0
}
