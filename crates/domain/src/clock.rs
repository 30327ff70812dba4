// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The reference-timezone clock.
//!
//! Every "day" and "month" boundary in the system is a civil date in one
//! fixed reference timezone (Asia/Seoul). Components never read the wall
//! clock directly; they take a [`Clock`] so tests can pin or move time
//! without waiting for real month boundaries.

use crate::month::MonthId;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Mutex;

/// The fixed reference timezone for all civil-date computations.
pub const REFERENCE_TIMEZONE: Tz = chrono_tz::Asia::Seoul;

/// Supplies the current instant in the reference timezone.
pub trait Clock: Send + Sync {
    /// Returns the current instant in the reference timezone.
    fn now(&self) -> DateTime<Tz>;

    /// Returns the current civil date in the reference timezone.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Returns the month identifier containing the current civil date.
    fn current_month(&self) -> MonthId {
        MonthId::from_date(self.today())
    }

    /// Returns the current instant as an RFC 3339 timestamp string.
    fn timestamp(&self) -> String {
        self.now().to_rfc3339()
    }
}

/// Wall-clock implementation of [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&REFERENCE_TIMEZONE)
    }
}

/// A settable clock for deterministic tests.
///
/// Reports a fixed instant until [`Self::set`] moves it.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Tz>>,
}

impl FixedClock {
    /// Creates a clock pinned to the given instant.
    #[must_use]
    pub const fn new(now: DateTime<Tz>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Creates a clock pinned to noon on the given civil date in the
    /// reference timezone.
    ///
    /// Returns `None` if the components do not form a valid date.
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        use chrono::TimeZone;
        REFERENCE_TIMEZONE
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .map(Self::new)
    }

    /// Moves the clock to a new instant.
    pub fn set(&self, now: DateTime<Tz>) {
        let mut guard = match self.now.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_reports_pinned_civil_date() {
        let clock = FixedClock::from_ymd(2024, 6, 15).unwrap();
        assert_eq!(
            clock.today(),
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
        );
        assert_eq!(clock.current_month(), MonthId::new(2024, 6).unwrap());
    }

    #[test]
    fn fixed_clock_can_be_moved() {
        let clock = FixedClock::from_ymd(2024, 6, 30).unwrap();
        let july = REFERENCE_TIMEZONE
            .with_ymd_and_hms(2024, 7, 1, 0, 5, 0)
            .single()
            .unwrap();
        clock.set(july);
        assert_eq!(clock.current_month(), MonthId::new(2024, 7).unwrap());
    }

    #[test]
    fn midnight_boundary_belongs_to_the_new_day() {
        // 2024-06-30T15:00:00Z is 2024-07-01T00:00:00 in Seoul.
        let utc = Utc.with_ymd_and_hms(2024, 6, 30, 15, 0, 0).single().unwrap();
        let clock = FixedClock::new(utc.with_timezone(&REFERENCE_TIMEZONE));
        assert_eq!(
            clock.today(),
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
        );
    }

    #[test]
    fn timestamp_is_rfc3339_in_reference_offset() {
        let clock = FixedClock::from_ymd(2024, 6, 15).unwrap();
        let stamp: String = clock.timestamp();
        assert!(stamp.starts_with("2024-06-15T12:00:00"));
        assert!(stamp.ends_with("+09:00"));
    }
}
