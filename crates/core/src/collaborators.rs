// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use rollcall_domain::{DeliveryError, MonthId, UserId};

/// Failure raised by a monthly reset step.
///
/// Unlike a delivery failure, a step failure is unrecoverable for the run:
/// the run ends with a `Failed` status and must be re-triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetStepError {
    /// Name of the step that failed (e.g., "clear_completions").
    pub step: String,
    /// Description of what went wrong.
    pub message: String,
}

impl ResetStepError {
    /// Creates a new `ResetStepError`.
    #[must_use]
    pub fn new(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ResetStepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {} failed: {}", self.step, self.message)
    }
}

impl std::error::Error for ResetStepError {}

/// Transport that delivers monthly review messages to users.
///
/// Implementations report failures through [`DeliveryError`] so the run
/// can record them and keep going. They must not panic on delivery
/// problems.
pub trait ReviewMessenger: Send + Sync {
    /// Sends the review message for `month` to one recipient.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] describing why the message could not be
    /// delivered to this recipient.
    fn send_review(&self, recipient: UserId, month: MonthId) -> Result<(), DeliveryError>;
}

/// The reset work a monthly run performs besides messaging.
///
/// Implementations clear or archive the previous month's working state.
/// Each step must be idempotent so that a re-triggered run after a
/// failure can repeat already-finished steps safely.
pub trait MonthlyReset: Send + Sync {
    /// Performs the reset for the month that just ended.
    ///
    /// # Errors
    ///
    /// Returns a [`ResetStepError`] naming the failed step. The caller
    /// marks the whole run `Failed` in response.
    fn perform(&self, month: MonthId) -> Result<(), ResetStepError>;
}
