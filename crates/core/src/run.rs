// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use rollcall_domain::{MonthId, RunStatus};

/// Whether a monthly reset run may start for a month.
///
/// Decided from the persisted status of the month's previous run, if any.
/// The decision itself is pure; callers evaluate it inside the same
/// transaction that claims the run so that two concurrent triggers cannot
/// both proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDecision {
    /// No conflicting run exists. The caller should claim the month.
    Proceed,
    /// A run for this month is executing right now.
    AlreadyRunning,
    /// A run for this month already finished successfully.
    AlreadyCompleted,
}

/// Decides whether a reset run may start given the month's current status.
///
/// A `Running` run always blocks a new one. A `Completed` run blocks a
/// normal trigger but yields to a forced one. A `Failed` run never blocks:
/// re-triggering after a failure is the recovery path.
///
/// # Arguments
///
/// * `existing` - Status of the month's recorded run, or `None` when no
///   run row exists yet
/// * `force` - Whether the trigger explicitly asked to redo a completed run
///
/// # Returns
///
/// The decision for this trigger.
#[must_use]
pub const fn start_decision(existing: Option<RunStatus>, force: bool) -> StartDecision {
    match existing {
        None | Some(RunStatus::NotStarted | RunStatus::Failed) => StartDecision::Proceed,
        Some(RunStatus::Running) => StartDecision::AlreadyRunning,
        Some(RunStatus::Completed) => {
            if force {
                StartDecision::Proceed
            } else {
                StartDecision::AlreadyCompleted
            }
        }
    }
}

/// Summary of one monthly reset run.
///
/// The run keeps going past individual delivery failures, so a report can
/// carry a `Completed` status alongside a non-zero `failed_deliveries`
/// count. Only a reset-step failure produces `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// The month the run covered.
    pub month: MonthId,
    /// Number of users selected to receive a review message.
    pub recipients: usize,
    /// Number of review messages delivered successfully.
    pub delivered: usize,
    /// Number of deliveries that failed and were recorded for retry.
    pub failed_deliveries: usize,
    /// Final status of the run.
    pub status: RunStatus,
}
