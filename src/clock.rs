//! Wall-clock access for the reconstruction cutoffs.
//!
//! Payload reconstruction stops at the last day whose bars have settled, and
//! transaction dates that fail to parse fall back to the current day. Both
//! read the time through [`Clock`] so a pinned instant can stand in for the
//! real one.

use chrono::{DateTime, Duration, NaiveDate, Utc};

pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// UTC calendar day of [`Clock::now`].
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// The UTC day `delay` ago. Bars dated after it may still be revised by
    /// the market data source.
    fn settled_date(&self, delay: Duration) -> NaiveDate {
        let now = self.now();
        now.checked_sub_signed(delay).unwrap_or(now).date_naive()
    }
}

/// Reads the operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the instant it was built with.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn settled_date_rolls_back_across_midnight() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 3, 0, 10, 0).unwrap());
        assert_eq!(clock.today(), june(3));
        assert_eq!(clock.settled_date(Duration::minutes(20)), june(2));
        assert_eq!(clock.settled_date(Duration::minutes(5)), june(3));
    }

    #[test]
    fn zero_delay_settles_today() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 9, 23, 59, 0).unwrap());
        assert_eq!(clock.settled_date(Duration::zero()), june(9));
    }
}
