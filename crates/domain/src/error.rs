// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Month number is outside 1..=12.
    InvalidMonthNumber {
        /// The invalid month number.
        month: u32,
    },
    /// A month identifier string could not be parsed.
    InvalidMonthIdentifier(String),
    /// A civil date string could not be parsed.
    InvalidCivilDate(String),
    /// A month's civil-date bounds could not be computed.
    MonthOutOfRange {
        /// The year component.
        year: i32,
        /// The month component.
        month: u32,
    },
    /// A persisted run status string was not recognized.
    UnknownRunStatus(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMonthNumber { month } => {
                write!(f, "Invalid month number: {month} (expected 1..=12)")
            }
            Self::InvalidMonthIdentifier(value) => {
                write!(f, "Invalid month identifier: '{value}' (expected YYYY-MM)")
            }
            Self::InvalidCivilDate(value) => {
                write!(f, "Invalid civil date: '{value}' (expected YYYY-MM-DD)")
            }
            Self::MonthOutOfRange { year, month } => {
                write!(f, "Month out of supported date range: {year:04}-{month:02}")
            }
            Self::UnknownRunStatus(value) => {
                write!(f, "Unknown run status: '{value}'")
            }
        }
    }
}

impl std::error::Error for DomainError {}
