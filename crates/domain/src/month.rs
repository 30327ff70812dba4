// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Month identifiers.
//!
//! Reset runs and failed-message records are scoped by a logical calendar
//! month, persisted as a `YYYY-MM` string (e.g., "2024-06"). All month
//! boundaries are civil dates in the reference timezone.

use crate::error::DomainError;
use chrono::{Datelike, NaiveDate};
use std::str::FromStr;

/// A logical calendar month identifier.
///
/// Ordered chronologically; displayed and persisted as zero-padded
/// `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthId {
    year: i32,
    month: u32,
}

impl MonthId {
    /// Creates a new `MonthId`.
    ///
    /// # Arguments
    ///
    /// * `year` - The calendar year
    /// * `month` - The month number (1..=12)
    ///
    /// # Errors
    ///
    /// Returns an error if `month` is outside 1..=12.
    pub const fn new(year: i32, month: u32) -> Result<Self, DomainError> {
        if month == 0 || month > 12 {
            return Err(DomainError::InvalidMonthNumber { month });
        }
        Ok(Self { year, month })
    }

    /// Builds the month identifier containing the given civil date.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Returns the calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Returns the month number (1..=12).
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Returns the identifier of the preceding calendar month.
    #[must_use]
    pub const fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Returns the first civil date of this month.
    ///
    /// # Errors
    ///
    /// Returns an error if the month lies outside the supported date range.
    pub fn first_day(&self) -> Result<NaiveDate, DomainError> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).ok_or(DomainError::MonthOutOfRange {
            year: self.year,
            month: self.month,
        })
    }

    /// Returns the first civil date of the following month.
    ///
    /// Together with [`Self::first_day`] this forms the half-open civil-date
    /// range `[first_day, first_day_of_next)` covering the month.
    ///
    /// # Errors
    ///
    /// Returns an error if the following month lies outside the supported
    /// date range.
    pub fn first_day_of_next(&self) -> Result<NaiveDate, DomainError> {
        let (year, month): (i32, u32) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(DomainError::MonthOutOfRange { year, month })
    }
}

impl FromStr for MonthId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((year_part, month_part)) = s.split_once('-') else {
            return Err(DomainError::InvalidMonthIdentifier(s.to_string()));
        };
        let year: i32 = year_part
            .parse()
            .map_err(|_| DomainError::InvalidMonthIdentifier(s.to_string()))?;
        let month: u32 = month_part
            .parse()
            .map_err(|_| DomainError::InvalidMonthIdentifier(s.to_string()))?;
        Self::new(year, month).map_err(|_| DomainError::InvalidMonthIdentifier(s.to_string()))
    }
}

impl std::fmt::Display for MonthId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Parses a civil date from its `YYYY-MM-DD` text form.
///
/// # Errors
///
/// Returns an error if the string is not a valid ISO calendar date.
pub fn parse_civil_date(s: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| DomainError::InvalidCivilDate(s.to_string()))
}
