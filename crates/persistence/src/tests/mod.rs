// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod initialization_tests;
mod run_tests;

use chrono::NaiveDate;
use rollcall_domain::{ActivityId, DeliveryError, MonthId, UserId};

use crate::SqlitePersistence;

pub fn create_test_persistence() -> SqlitePersistence {
    SqlitePersistence::new_in_memory().expect("In-memory database should initialize")
}

pub fn test_user(id: i64) -> UserId {
    UserId::new(id)
}

pub fn test_activity(id: i64) -> ActivityId {
    ActivityId::new(id)
}

pub fn test_month(year: i32, month: u32) -> MonthId {
    MonthId::new(year, month).expect("Valid test month")
}

pub fn test_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("Valid test date")
}

pub fn test_delivery_error() -> DeliveryError {
    DeliveryError::new("TIMEOUT", "connection timed out")
}

/// Fixed RFC 3339 timestamp used where the exact instant does not matter.
pub const TEST_TIMESTAMP: &str = "2024-06-01T00:05:00+09:00";
