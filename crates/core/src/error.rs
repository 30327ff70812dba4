// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::collaborators::ResetStepError;

use rollcall_domain::{DomainError, MonthId};

/// Errors that can end or reject a monthly reset run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// A run for this month is already executing; the trigger was rejected.
    RunInProgress(MonthId),
    /// A run for this month already completed and the trigger did not force.
    RunAlreadyCompleted(MonthId),
    /// A reset step failed; the run was marked `Failed`.
    ResetStepFailed {
        /// The month whose run failed.
        month: MonthId,
        /// The step failure reported by the reset collaborator.
        error: ResetStepError,
    },
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::RunInProgress(month) => {
                write!(f, "A monthly reset run for {month} is already in progress")
            }
            Self::RunAlreadyCompleted(month) => {
                write!(f, "The monthly reset run for {month} already completed")
            }
            Self::ResetStepFailed { month, error } => {
                write!(f, "Monthly reset for {month} failed: {error}")
            }
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
