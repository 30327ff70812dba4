// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and scripted collaborators.

use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Mutex;

use rollcall::{MonthlyReset, ResetStepError, ReviewMessenger};
use rollcall_domain::{ActivityId, DeliveryError, FixedClock, MonthId, UserId};
use rollcall_persistence::SqlitePersistence;

pub const TEST_TIMESTAMP: &str = "2024-06-10T08:00:00+09:00";

pub fn create_test_persistence() -> SqlitePersistence {
    SqlitePersistence::new_in_memory().expect("In-memory database should initialize")
}

/// Clock pinned to noon on 2024-07-01, the first day of a fresh month.
/// A reset run triggered on this clock covers "2024-07" and reviews
/// June activity.
pub fn create_test_clock() -> FixedClock {
    FixedClock::from_ymd(2024, 7, 1).expect("Valid test clock date")
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

/// Records one completion per user on the given date.
pub fn seed_completions(persistence: &mut SqlitePersistence, users: &[i64], date: NaiveDate) {
    for id in users {
        let created: bool = persistence
            .record_completion(test_user(*id), test_activity(10), date, TEST_TIMESTAMP)
            .expect("Completion should be recorded");
        assert!(created, "Seed completion for user {id} should be new");
    }
}

/// Messenger that records every send and fails for chosen recipients.
pub struct ScriptedMessenger {
    failing: Mutex<HashSet<i64>>,
    sent: Mutex<Vec<(UserId, MonthId)>>,
}

impl ScriptedMessenger {
    pub fn reliable() -> Self {
        Self {
            failing: Mutex::new(HashSet::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_for(recipients: &[UserId]) -> Self {
        Self {
            failing: Mutex::new(recipients.iter().map(|user| user.value()).collect()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Makes future sends to the recipient succeed.
    pub fn recover(&self, recipient: UserId) {
        self.failing.lock().unwrap().remove(&recipient.value());
    }

    /// Every `(recipient, month)` send attempted so far, in order.
    pub fn sent(&self) -> Vec<(UserId, MonthId)> {
        self.sent.lock().unwrap().clone()
    }
}

impl ReviewMessenger for ScriptedMessenger {
    fn send_review(&self, recipient: UserId, month: MonthId) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push((recipient, month));
        if self.failing.lock().unwrap().contains(&recipient.value()) {
            return Err(DeliveryError::new("TIMEOUT", "connection timed out"));
        }
        Ok(())
    }
}

/// Reset collaborator that records the months it was asked to reset.
pub struct RecordingReset {
    performed: Mutex<Vec<MonthId>>,
}

impl RecordingReset {
    pub fn new() -> Self {
        Self {
            performed: Mutex::new(Vec::new()),
        }
    }

    pub fn performed(&self) -> Vec<MonthId> {
        self.performed.lock().unwrap().clone()
    }
}

impl MonthlyReset for RecordingReset {
    fn perform(&self, month: MonthId) -> Result<(), ResetStepError> {
        self.performed.lock().unwrap().push(month);
        Ok(())
    }
}

/// Reset collaborator whose step always fails.
pub struct FailingReset;

impl MonthlyReset for FailingReset {
    fn perform(&self, _month: MonthId) -> Result<(), ResetStepError> {
        Err(ResetStepError::new("reset_counters", "table locked"))
    }
}
