//! Time sources for the scheduler.

use chrono::{DateTime, Duration, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Wall-clock time shifted by a fixed offset.
///
/// Backs the simulated "Next Day" button: the offset is persisted in the
/// database and grows by one day per press.
#[derive(Debug, Clone, Copy)]
pub struct OffsetClock {
    pub offset: Duration,
}

impl OffsetClock {
    pub fn new(offset: Duration) -> Self {
        Self { offset }
    }
}

impl Clock for OffsetClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now() + self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let instant = Utc::now();
        assert_eq!(FixedClock(instant).now(), instant);
    }

    #[test]
    fn test_offset_clock_runs_ahead() {
        let clock = OffsetClock::new(Duration::days(2));
        assert!(clock.now() >= Utc::now() + Duration::days(2) - Duration::seconds(1));
    }
}
