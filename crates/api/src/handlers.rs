// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for the completion pipeline and the scheduler
//! management surface.

use chrono::NaiveDate;
use rollcall::{
    CompletionEvent, CoreError, DerivationOutcome, MonthlyReset, RetryPolicy, RetrySummary,
    ReviewMessenger, RunReport, StartDecision,
};
use rollcall_domain::{ActivityId, Clock, MonthId, RunStatus, UserId};
use rollcall_persistence::{FailedMessageData, MonthlyRunData, SqlitePersistence};
use tracing::{error, warn};

use crate::error::{ApiError, translate_core_error, translate_domain_error};
use crate::request_response::{
    FailedMessageInfo, FailedMessageStatusResponse, MonthlyAttendanceResponse,
    MonthlyResetResponse, RecordCompletionResponse, RetryFailedMessagesResponse,
    SchedulerStatusResponse,
};

/// Origin code written on attendance rows derived from completion events.
const COMPLETION_ORIGIN: &str = "completion";

// ============================================================================
// Completion Pipeline
// ============================================================================

/// Records a routine completion for a user.
///
/// Recording is idempotent per `(user, activity, date)`: submitting the
/// same completion twice reports `created: false` instead of failing.
/// The caller publishes the completion event only after this returns
/// with `created: true`, so listeners never observe an uncommitted
/// completion.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `clock` - The reference-timezone clock
/// * `user` - The user who completed the activity
/// * `activity` - The completed activity
/// * `date` - The civil date of the completion, or `None` for today
///
/// # Returns
///
/// * `Ok(RecordCompletionResponse)` with the `created` flag
///
/// # Errors
///
/// Returns an error if persistence fails.
pub fn record_completion(
    persistence: &mut SqlitePersistence,
    clock: &dyn Clock,
    user: UserId,
    activity: ActivityId,
    date: Option<NaiveDate>,
) -> Result<RecordCompletionResponse, ApiError> {
    let date: NaiveDate = date.unwrap_or_else(|| clock.today());
    let created: bool = persistence
        .record_completion(user, activity, date, &clock.timestamp())
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to record completion: {e}"),
        })?;

    let message: String = if created {
        format!("Completion of activity {activity} by user {user} recorded for {date}")
    } else {
        format!("Completion of activity {activity} by user {user} was already recorded for {date}")
    };

    Ok(RecordCompletionResponse {
        user_id: user.value(),
        activity_id: activity.value(),
        date: date.to_string(),
        created,
        message,
    })
}

/// Derives an attendance record from a committed completion event.
///
/// The handler is safe against duplicate delivery, reordering, and
/// concurrent handlers racing on the same `(user, date)`: it re-checks
/// that any committed completion exists for the day, then attempts a
/// create that the store's uniqueness constraint turns into a no-op if
/// attendance was already derived.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `clock` - The reference-timezone clock
/// * `event` - The completion event being consumed
///
/// # Returns
///
/// * `Ok(DerivationOutcome)` describing what the handler did
///
/// # Errors
///
/// Returns an error if persistence fails.
pub fn derive_attendance(
    persistence: &mut SqlitePersistence,
    clock: &dyn Clock,
    event: &CompletionEvent,
) -> Result<DerivationOutcome, ApiError> {
    let committed: bool = persistence
        .has_completion_on(event.user, event.date)
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to check for a committed completion: {e}"),
        })?;
    if !committed {
        return Ok(DerivationOutcome::NoCompletion);
    }

    let context: String = format!("activity {}", event.activity);
    let created: bool = persistence
        .record_attendance(
            event.user,
            event.date,
            &clock.timestamp(),
            COMPLETION_ORIGIN,
            Some(&context),
        )
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to record attendance: {e}"),
        })?;

    if created {
        Ok(DerivationOutcome::Recorded)
    } else {
        Ok(DerivationOutcome::AlreadyRecorded)
    }
}

/// Lists a user's derived attendance dates for one month.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `user` - The user to query
/// * `month` - The month to query
///
/// # Errors
///
/// Returns an error if the month's date range cannot be computed or the
/// query fails.
pub fn get_monthly_attendance(
    persistence: &mut SqlitePersistence,
    user: UserId,
    month: MonthId,
) -> Result<MonthlyAttendanceResponse, ApiError> {
    let from: NaiveDate = month.first_day().map_err(translate_domain_error)?;
    let to: NaiveDate = month.first_day_of_next().map_err(translate_domain_error)?;
    let dates: Vec<NaiveDate> =
        persistence
            .attendance_dates(user, from, to)
            .map_err(|e| ApiError::Internal {
                message: format!("Failed to list attendance dates: {e}"),
            })?;

    Ok(MonthlyAttendanceResponse {
        user_id: user.value(),
        month: month.to_string(),
        dates: dates.into_iter().map(|date| date.to_string()).collect(),
    })
}

// ============================================================================
// Monthly Reset Scheduler
// ============================================================================

/// Executes the monthly reset workflow for a month.
///
/// At most one effective run exists per month: a trigger while the month
/// is `Running` is rejected, and a trigger for a `Completed` month is
/// rejected unless `force` is set. A `Failed` run never blocks a
/// re-trigger. Individual delivery failures are recorded in the failed
/// message registry and do not fail the run. A claimed run always ends
/// `Completed` or `Failed`, so an error never leaves the month blocked.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `reset` - The collaborator performing the domain reset
/// * `messenger` - The transport delivering review messages
/// * `clock` - The reference-timezone clock
/// * `month` - The month to run, or `None` for the current month
/// * `force` - Whether a completed run should be redone
///
/// # Returns
///
/// * `Ok(MonthlyResetResponse)` summarizing the finished run
///
/// # Errors
///
/// Returns an error if the trigger conflicts with the month's existing
/// run, the reset step fails, or persistence fails.
pub fn execute_monthly_reset(
    persistence: &mut SqlitePersistence,
    reset: &dyn MonthlyReset,
    messenger: &dyn ReviewMessenger,
    clock: &dyn Clock,
    month: Option<MonthId>,
    force: bool,
) -> Result<MonthlyResetResponse, ApiError> {
    let month: MonthId = month.unwrap_or_else(|| clock.current_month());
    let report: RunReport = run_monthly_reset(persistence, reset, messenger, clock, month, force)?;
    Ok(reset_response(&report))
}

/// Executes the monthly reset workflow for the current month on behalf
/// of an operator.
///
/// This is the recovery trigger: it follows the same workflow as the
/// scheduled run and exists so an operator can re-run a month whose run
/// failed, or redo a completed month with `force`.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `reset` - The collaborator performing the domain reset
/// * `messenger` - The transport delivering review messages
/// * `clock` - The reference-timezone clock
/// * `force` - Whether a completed run should be redone
///
/// # Errors
///
/// Returns an error if the trigger conflicts with the month's existing
/// run, the reset step fails, or persistence fails.
pub fn manual_monthly_reset(
    persistence: &mut SqlitePersistence,
    reset: &dyn MonthlyReset,
    messenger: &dyn ReviewMessenger,
    clock: &dyn Clock,
    force: bool,
) -> Result<MonthlyResetResponse, ApiError> {
    let month: MonthId = clock.current_month();
    let report: RunReport = run_monthly_reset(persistence, reset, messenger, clock, month, force)?;
    Ok(reset_response(&report))
}

/// Claims the run for `month`, performs the reset, and sends one review
/// message per user active in the previous month.
///
/// Once the claim succeeds the run always reaches a terminal status:
/// any error past that point marks the run `Failed` before it surfaces.
fn run_monthly_reset(
    persistence: &mut SqlitePersistence,
    reset: &dyn MonthlyReset,
    messenger: &dyn ReviewMessenger,
    clock: &dyn Clock,
    month: MonthId,
    force: bool,
) -> Result<RunReport, ApiError> {
    let reviewed: MonthId = month.previous();
    let from: NaiveDate = reviewed.first_day().map_err(translate_domain_error)?;
    let to: NaiveDate = reviewed.first_day_of_next().map_err(translate_domain_error)?;

    let decision: StartDecision = persistence
        .begin_monthly_run(month, force, &clock.timestamp())
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to claim the reset run for {month}: {e}"),
        })?;
    match decision {
        StartDecision::Proceed => {}
        StartDecision::AlreadyRunning => {
            return Err(translate_core_error(CoreError::RunInProgress(month)));
        }
        StartDecision::AlreadyCompleted => {
            return Err(translate_core_error(CoreError::RunAlreadyCompleted(month)));
        }
    }

    if let Err(step_error) = reset.perform(month) {
        fail_claimed_run(persistence, clock, month, &step_error.to_string());
        return Err(translate_core_error(CoreError::ResetStepFailed {
            month,
            error: step_error,
        }));
    }

    with_claimed_run(persistence, clock, month, |persistence| {
        let recipients: Vec<UserId> =
            persistence
                .review_recipients(from, to)
                .map_err(|e| ApiError::Internal {
                    message: format!("Failed to select review recipients for {reviewed}: {e}"),
                })?;

        let mut delivered: usize = 0;
        let mut failed_deliveries: usize = 0;
        for recipient in &recipients {
            match messenger.send_review(*recipient, month) {
                Ok(()) => delivered += 1,
                Err(delivery_error) => {
                    warn!(
                        "Review message for {} to user {} failed: {}",
                        month, recipient, delivery_error
                    );
                    persistence
                        .record_send_failure(month, *recipient, &delivery_error, &clock.timestamp())
                        .map_err(|e| ApiError::Internal {
                            message: format!("Failed to record the delivery failure: {e}"),
                        })?;
                    failed_deliveries += 1;
                }
            }
        }

        Ok(RunReport {
            month,
            recipients: recipients.len(),
            delivered,
            failed_deliveries,
            status: RunStatus::Completed,
        })
    })
}

/// Runs the claimed month's workflow and records its terminal status.
///
/// On success the run is recorded `Completed`; on any error it is marked
/// `Failed` before the error is returned. A row left `Running` rejects
/// every later trigger for its month, so no error path may leave the
/// claim open.
///
/// # Errors
///
/// Returns the workflow's error, or an internal error if the completed
/// run could not be recorded.
pub(crate) fn with_claimed_run<F>(
    persistence: &mut SqlitePersistence,
    clock: &dyn Clock,
    month: MonthId,
    work: F,
) -> Result<RunReport, ApiError>
where
    F: FnOnce(&mut SqlitePersistence) -> Result<RunReport, ApiError>,
{
    match work(persistence) {
        Ok(report) => {
            if let Err(e) = persistence.finish_monthly_run(
                month,
                RunStatus::Completed,
                &clock.timestamp(),
                None,
            ) {
                let run_error: ApiError = ApiError::Internal {
                    message: format!("Failed to record the completed run for {month}: {e}"),
                };
                fail_claimed_run(persistence, clock, month, &run_error.to_string());
                return Err(run_error);
            }
            Ok(report)
        }
        Err(run_error) => {
            fail_claimed_run(persistence, clock, month, &run_error.to_string());
            Err(run_error)
        }
    }
}

/// Marks the month's claimed run `Failed` with the given reason.
///
/// Used on error paths that already carry a run error. A failure to
/// record the transition is logged, not propagated, so the original
/// error is the one the caller sees.
fn fail_claimed_run(
    persistence: &mut SqlitePersistence,
    clock: &dyn Clock,
    month: MonthId,
    reason: &str,
) {
    if let Err(e) = persistence.finish_monthly_run(
        month,
        RunStatus::Failed,
        &clock.timestamp(),
        Some(reason),
    ) {
        error!("Failed to mark the run for {} as failed: {}", month, e);
    }
}

fn reset_response(report: &RunReport) -> MonthlyResetResponse {
    MonthlyResetResponse {
        month: report.month.to_string(),
        status: report.status.to_string(),
        recipients: report.recipients,
        delivered: report.delivered,
        failed_deliveries: report.failed_deliveries,
        message: format!(
            "Monthly reset for {} completed: {} of {} review messages delivered",
            report.month, report.delivered, report.recipients
        ),
    }
}

// ============================================================================
// Failed Message Retry
// ============================================================================

/// Retries the current month's unresolved failed review messages.
///
/// This is the scheduled retry trigger. The pass re-attempts each
/// unresolved registry entry independently, skipping entries whose
/// attempt count reached the configured limit.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `messenger` - The transport delivering review messages
/// * `clock` - The reference-timezone clock
/// * `policy` - The configured retry attempt limit
///
/// # Errors
///
/// Returns an error if persistence fails.
pub fn retry_failed_review_messages(
    persistence: &mut SqlitePersistence,
    messenger: &dyn ReviewMessenger,
    clock: &dyn Clock,
    policy: RetryPolicy,
) -> Result<RetryFailedMessagesResponse, ApiError> {
    let month: MonthId = clock.current_month();
    let summary: RetrySummary = run_retry_pass(persistence, messenger, clock, policy, month)?;
    Ok(retry_response(&summary))
}

/// Retries an explicit month's unresolved failed review messages on
/// behalf of an operator.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `messenger` - The transport delivering review messages
/// * `clock` - The reference-timezone clock
/// * `policy` - The configured retry attempt limit
/// * `month` - The month whose registry entries to retry
///
/// # Errors
///
/// Returns an error if persistence fails.
pub fn manual_retry_review_messages(
    persistence: &mut SqlitePersistence,
    messenger: &dyn ReviewMessenger,
    clock: &dyn Clock,
    policy: RetryPolicy,
    month: MonthId,
) -> Result<RetryFailedMessagesResponse, ApiError> {
    let summary: RetrySummary = run_retry_pass(persistence, messenger, clock, policy, month)?;
    Ok(retry_response(&summary))
}

/// Runs one retry pass over the month's unresolved registry entries.
///
/// Resolved entries are never re-sent. Each entry is processed
/// independently so one failing recipient does not stall the rest.
fn run_retry_pass(
    persistence: &mut SqlitePersistence,
    messenger: &dyn ReviewMessenger,
    clock: &dyn Clock,
    policy: RetryPolicy,
    month: MonthId,
) -> Result<RetrySummary, ApiError> {
    let pending: Vec<FailedMessageData> = persistence
        .unresolved_failed_messages_for_month(month)
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to list unresolved messages for {month}: {e}"),
        })?;

    let mut attempted: usize = 0;
    let mut resolved: usize = 0;
    let mut still_failing: usize = 0;
    let mut exhausted: usize = 0;
    for entry in &pending {
        if policy.is_exhausted(entry.attempts) {
            exhausted += 1;
            continue;
        }
        attempted += 1;
        match messenger.send_review(entry.recipient, month) {
            Ok(()) => {
                persistence
                    .mark_message_resolved(month, entry.recipient, &clock.timestamp())
                    .map_err(|e| ApiError::Internal {
                        message: format!("Failed to mark a message resolved: {e}"),
                    })?;
                resolved += 1;
            }
            Err(delivery_error) => {
                warn!(
                    "Retry of review message for {} to user {} failed: {}",
                    month, entry.recipient, delivery_error
                );
                persistence
                    .record_send_failure(month, entry.recipient, &delivery_error, &clock.timestamp())
                    .map_err(|e| ApiError::Internal {
                        message: format!("Failed to record the delivery failure: {e}"),
                    })?;
                still_failing += 1;
            }
        }
    }

    Ok(RetrySummary {
        month,
        attempted,
        resolved,
        still_failing,
        exhausted,
    })
}

fn retry_response(summary: &RetrySummary) -> RetryFailedMessagesResponse {
    RetryFailedMessagesResponse {
        month: summary.month.to_string(),
        attempted: summary.attempted,
        resolved: summary.resolved,
        still_failing: summary.still_failing,
        exhausted: summary.exhausted,
        message: format!(
            "Retry pass for {} attempted {} messages: {} resolved, {} still failing, {} out of retries",
            summary.month,
            summary.attempted,
            summary.resolved,
            summary.still_failing,
            summary.exhausted
        ),
    }
}

// ============================================================================
// Status Reads
// ============================================================================

/// Reports the reset run state of a month.
///
/// A month with no persisted run row is reported as `NotStarted`.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `clock` - The reference-timezone clock
/// * `month` - The month to query, or `None` for the current month
///
/// # Errors
///
/// Returns an error if the query fails or a stored value cannot be
/// parsed.
pub fn get_scheduler_status(
    persistence: &mut SqlitePersistence,
    clock: &dyn Clock,
    month: Option<MonthId>,
) -> Result<SchedulerStatusResponse, ApiError> {
    let month: MonthId = month.unwrap_or_else(|| clock.current_month());
    let run: Option<MonthlyRunData> =
        persistence
            .get_monthly_run(month)
            .map_err(|e| ApiError::Internal {
                message: format!("Failed to read the run state for {month}: {e}"),
            })?;

    Ok(run.map_or_else(
        || SchedulerStatusResponse {
            month: month.to_string(),
            status: RunStatus::NotStarted.to_string(),
            started_at: None,
            finished_at: None,
            error: None,
        },
        |data| SchedulerStatusResponse {
            month: data.month.to_string(),
            status: data.status.to_string(),
            started_at: Some(data.started_at),
            finished_at: data.finished_at,
            error: data.error,
        },
    ))
}

/// Reports the failed message registry for a month.
///
/// Counts resolved and unresolved entries and flags unresolved entries
/// whose attempts reached the configured limit so an operator can decide
/// what to do with them.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `policy` - The configured retry attempt limit
/// * `month` - The month to query
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_failed_message_status(
    persistence: &mut SqlitePersistence,
    policy: RetryPolicy,
    month: MonthId,
) -> Result<FailedMessageStatusResponse, ApiError> {
    let records: Vec<FailedMessageData> =
        persistence
            .failed_messages_for_month(month)
            .map_err(|e| ApiError::Internal {
                message: format!("Failed to list the registry entries for {month}: {e}"),
            })?;

    let mut resolved: usize = 0;
    let mut exhausted: usize = 0;
    let mut messages: Vec<FailedMessageInfo> = Vec::with_capacity(records.len());
    for record in records {
        let out_of_retries: bool = !record.resolved && policy.is_exhausted(record.attempts);
        if record.resolved {
            resolved += 1;
        }
        if out_of_retries {
            exhausted += 1;
        }
        messages.push(FailedMessageInfo {
            recipient_id: record.recipient.value(),
            error_code: record.error.code,
            error_message: record.error.message,
            attempts: record.attempts,
            resolved: record.resolved,
            exhausted: out_of_retries,
            last_attempt_at: record.last_attempt_at,
        });
    }

    let total: usize = messages.len();
    Ok(FailedMessageStatusResponse {
        month: month.to_string(),
        total,
        resolved,
        unresolved: total - resolved,
        exhausted,
        messages,
    })
}
