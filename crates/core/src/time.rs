use chrono::{DateTime, Duration, FixedOffset, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Calendar stamp of the current instant, as seen from `offset`.
    #[must_use]
    pub fn stamp(&self, offset: FixedOffset) -> CalendarStamp {
        CalendarStamp::at(self.now(), offset)
    }
}

/// Wall-clock breakdown stored alongside history records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarStamp {
    /// `YYYY-MM-DD`; sorts lexicographically in calendar order.
    pub date: String,
    /// `HH:MM:SS`
    pub time: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
}

impl CalendarStamp {
    #[must_use]
    pub fn at(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = instant.with_timezone(&offset);
        Self {
            date: local.format("%Y-%m-%d").to_string(),
            time: local.format("%H:%M:%S").to_string(),
            timestamp: instant.timestamp(),
        }
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_formats_utc() {
        let stamp = fixed_clock().stamp(FixedOffset::east_opt(0).unwrap());
        assert_eq!(stamp.date, "2023-11-14");
        assert_eq!(stamp.time, "22:13:20");
        assert_eq!(stamp.timestamp, FIXED_TEST_TIMESTAMP);
    }

    #[test]
    fn stamp_respects_offset() {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let stamp = fixed_clock().stamp(jst);
        assert_eq!(stamp.date, "2023-11-15");
        assert_eq!(stamp.time, "07:13:20");
        assert_eq!(stamp.timestamp, FIXED_TEST_TIMESTAMP);
    }

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        clock.advance(Duration::days(1));
        assert_eq!(clock.now(), fixed_now() + Duration::days(1));

        let mut real = Clock::default_clock();
        real.advance(Duration::days(1));
        assert!(matches!(real, Clock::Default));
    }
}
