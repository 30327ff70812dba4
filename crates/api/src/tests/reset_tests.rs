// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for the monthly reset workflow: claiming, reviewing the
//! previous month's users, delivery failure capture, and re-triggering.

use rollcall::{RunReport, StartDecision};
use rollcall_domain::{FixedClock, MonthId};
use rollcall_persistence::{FailedMessageData, SqlitePersistence};

use crate::handlers::with_claimed_run;
use crate::{
    ApiError, MonthlyResetResponse, SchedulerStatusResponse, execute_monthly_reset,
    get_scheduler_status, manual_monthly_reset,
};

use super::helpers::{
    FailingReset, RecordingReset, ScriptedMessenger, TEST_TIMESTAMP, create_test_clock,
    create_test_persistence, seed_completions, test_date, test_month, test_user,
};

#[test]
fn test_reset_run_reviews_previous_month_users() {
    let mut persistence: SqlitePersistence = create_test_persistence();
    let clock: FixedClock = create_test_clock();
    let reset: RecordingReset = RecordingReset::new();
    let messenger: ScriptedMessenger = ScriptedMessenger::reliable();
    seed_completions(&mut persistence, &[1, 2, 3], test_date(2024, 6, 10));

    let response: MonthlyResetResponse =
        execute_monthly_reset(&mut persistence, &reset, &messenger, &clock, None, false)
            .expect("Run should complete");

    assert_eq!(response.month, "2024-07");
    assert_eq!(response.status, "Completed");
    assert_eq!(response.recipients, 3);
    assert_eq!(response.delivered, 3);
    assert_eq!(response.failed_deliveries, 0);
    assert_eq!(reset.performed(), vec![test_month(2024, 7)]);

    assert_eq!(
        messenger.sent(),
        vec![
            (test_user(1), test_month(2024, 7)),
            (test_user(2), test_month(2024, 7)),
            (test_user(3), test_month(2024, 7)),
        ]
    );
}

#[test]
fn test_delivery_failure_is_recorded_without_failing_the_run() {
    let mut persistence: SqlitePersistence = create_test_persistence();
    let clock: FixedClock = create_test_clock();
    let reset: RecordingReset = RecordingReset::new();
    let messenger: ScriptedMessenger = ScriptedMessenger::failing_for(&[test_user(2)]);
    seed_completions(&mut persistence, &[1, 2, 3], test_date(2024, 6, 10));

    let response: MonthlyResetResponse =
        execute_monthly_reset(&mut persistence, &reset, &messenger, &clock, None, false)
            .expect("A delivery failure must not fail the run");

    assert_eq!(response.status, "Completed");
    assert_eq!(response.delivered, 2);
    assert_eq!(response.failed_deliveries, 1);

    let pending: Vec<FailedMessageData> = persistence
        .unresolved_failed_messages_for_month(test_month(2024, 7))
        .expect("Registry query should succeed");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].recipient, test_user(2));
    assert_eq!(pending[0].attempts, 1);
    assert!(!pending[0].resolved);
    assert_eq!(pending[0].error.code, "TIMEOUT");
}

#[test]
fn test_duplicate_trigger_is_rejected() {
    let mut persistence: SqlitePersistence = create_test_persistence();
    let clock: FixedClock = create_test_clock();
    let reset: RecordingReset = RecordingReset::new();
    let messenger: ScriptedMessenger = ScriptedMessenger::reliable();
    seed_completions(&mut persistence, &[1, 2], test_date(2024, 6, 10));

    execute_monthly_reset(&mut persistence, &reset, &messenger, &clock, None, false)
        .expect("First run should complete");
    let result: Result<MonthlyResetResponse, ApiError> =
        execute_monthly_reset(&mut persistence, &reset, &messenger, &clock, None, false);

    let err: ApiError = result.expect_err("Second trigger should be rejected");
    match err {
        ApiError::RunConflict { month, .. } => assert_eq!(month, "2024-07"),
        other => panic!("Expected RunConflict, got {other:?}"),
    }
    // The rejected trigger performed no reset and sent nothing.
    assert_eq!(reset.performed().len(), 1);
    assert_eq!(messenger.sent().len(), 2);
}

#[test]
fn test_forced_trigger_redoes_a_completed_month() {
    let mut persistence: SqlitePersistence = create_test_persistence();
    let clock: FixedClock = create_test_clock();
    let reset: RecordingReset = RecordingReset::new();
    let messenger: ScriptedMessenger = ScriptedMessenger::reliable();
    seed_completions(&mut persistence, &[1, 2], test_date(2024, 6, 10));

    execute_monthly_reset(&mut persistence, &reset, &messenger, &clock, None, false)
        .expect("First run should complete");
    let rerun: MonthlyResetResponse =
        execute_monthly_reset(&mut persistence, &reset, &messenger, &clock, None, true)
            .expect("Forced re-trigger should run");

    assert_eq!(rerun.status, "Completed");
    assert_eq!(rerun.delivered, 2);
    assert_eq!(reset.performed().len(), 2);
    assert_eq!(messenger.sent().len(), 4);
}

#[test]
fn test_reset_step_failure_marks_the_run_failed() {
    let mut persistence: SqlitePersistence = create_test_persistence();
    let clock: FixedClock = create_test_clock();
    let messenger: ScriptedMessenger = ScriptedMessenger::reliable();
    seed_completions(&mut persistence, &[1, 2], test_date(2024, 6, 10));

    let result: Result<MonthlyResetResponse, ApiError> = execute_monthly_reset(
        &mut persistence,
        &FailingReset,
        &messenger,
        &clock,
        None,
        false,
    );

    let err: ApiError = result.expect_err("A reset step failure must surface");
    match err {
        ApiError::ResetFailed { month, message } => {
            assert_eq!(month, "2024-07");
            assert!(message.contains("reset_counters"));
        }
        other => panic!("Expected ResetFailed, got {other:?}"),
    }
    // The run never reached the messaging phase.
    assert!(messenger.sent().is_empty());

    let status: SchedulerStatusResponse =
        get_scheduler_status(&mut persistence, &clock, Some(test_month(2024, 7)))
            .expect("Status query should succeed");
    assert_eq!(status.status, "Failed");
    let error: String = status.error.expect("A failed run records its error");
    assert!(error.contains("table locked"));
}

#[test]
fn test_failed_run_can_be_retriggered_without_force() {
    let mut persistence: SqlitePersistence = create_test_persistence();
    let clock: FixedClock = create_test_clock();
    let reset: RecordingReset = RecordingReset::new();
    let messenger: ScriptedMessenger = ScriptedMessenger::reliable();
    seed_completions(&mut persistence, &[1], test_date(2024, 6, 10));

    execute_monthly_reset(&mut persistence, &FailingReset, &messenger, &clock, None, false)
        .expect_err("The failing reset should fail the run");
    let recovery: MonthlyResetResponse =
        execute_monthly_reset(&mut persistence, &reset, &messenger, &clock, None, false)
            .expect("Re-trigger after a failure should run without force");

    assert_eq!(recovery.status, "Completed");
    assert_eq!(recovery.delivered, 1);
}

#[test]
fn test_error_after_claim_marks_the_run_failed() {
    let mut persistence: SqlitePersistence = create_test_persistence();
    let clock: FixedClock = create_test_clock();
    let month: MonthId = test_month(2024, 7);
    let decision: StartDecision = persistence
        .begin_monthly_run(month, false, TEST_TIMESTAMP)
        .expect("Claim should succeed");
    assert_eq!(decision, StartDecision::Proceed);

    let result: Result<RunReport, ApiError> =
        with_claimed_run(&mut persistence, &clock, month, |_| {
            Err(ApiError::Internal {
                message: String::from("recipient query lost the connection"),
            })
        });

    let err: ApiError = result.expect_err("The workflow error must surface");
    assert!(matches!(err, ApiError::Internal { .. }));

    // The run landed in a terminal state, not `Running`.
    let status: SchedulerStatusResponse =
        get_scheduler_status(&mut persistence, &clock, Some(month))
            .expect("Status query should succeed");
    assert_eq!(status.status, "Failed");
    let error: String = status.error.expect("A failed run records its reason");
    assert!(error.contains("recipient query lost the connection"));

    // The month stays re-triggerable without any manual repair.
    let reset: RecordingReset = RecordingReset::new();
    let messenger: ScriptedMessenger = ScriptedMessenger::reliable();
    let recovery: MonthlyResetResponse =
        execute_monthly_reset(&mut persistence, &reset, &messenger, &clock, Some(month), false)
            .expect("Re-trigger after the failure should run");
    assert_eq!(recovery.status, "Completed");
}

#[test]
fn test_explicit_month_runs_that_month() {
    let mut persistence: SqlitePersistence = create_test_persistence();
    let clock: FixedClock = create_test_clock();
    let reset: RecordingReset = RecordingReset::new();
    let messenger: ScriptedMessenger = ScriptedMessenger::reliable();
    seed_completions(&mut persistence, &[7], test_date(2024, 5, 15));

    let response: MonthlyResetResponse = execute_monthly_reset(
        &mut persistence,
        &reset,
        &messenger,
        &clock,
        Some(test_month(2024, 6)),
        false,
    )
    .expect("Run should complete");

    assert_eq!(response.month, "2024-06");
    assert_eq!(response.recipients, 1);
    assert_eq!(reset.performed(), vec![test_month(2024, 6)]);
    assert_eq!(
        messenger.sent(),
        vec![(test_user(7), test_month(2024, 6))]
    );
}

#[test]
fn test_manual_reset_targets_the_current_month() {
    let mut persistence: SqlitePersistence = create_test_persistence();
    let clock: FixedClock = create_test_clock();
    let reset: RecordingReset = RecordingReset::new();
    let messenger: ScriptedMessenger = ScriptedMessenger::reliable();
    seed_completions(&mut persistence, &[1], test_date(2024, 6, 10));

    let first: MonthlyResetResponse =
        manual_monthly_reset(&mut persistence, &reset, &messenger, &clock, false)
            .expect("Manual trigger should run");
    assert_eq!(first.month, "2024-07");

    let repeat: Result<MonthlyResetResponse, ApiError> =
        manual_monthly_reset(&mut persistence, &reset, &messenger, &clock, false);
    assert!(matches!(repeat, Err(ApiError::RunConflict { .. })));

    let forced: MonthlyResetResponse =
        manual_monthly_reset(&mut persistence, &reset, &messenger, &clock, true)
            .expect("Forced manual trigger should redo the month");
    assert_eq!(forced.status, "Completed");
}

#[test]
fn test_run_with_no_recipients_completes() {
    let mut persistence: SqlitePersistence = create_test_persistence();
    let clock: FixedClock = create_test_clock();
    let reset: RecordingReset = RecordingReset::new();
    let messenger: ScriptedMessenger = ScriptedMessenger::reliable();

    let response: MonthlyResetResponse =
        execute_monthly_reset(&mut persistence, &reset, &messenger, &clock, None, false)
            .expect("Run should complete");

    assert_eq!(response.status, "Completed");
    assert_eq!(response.recipients, 0);
    assert_eq!(response.delivered, 0);
    assert!(messenger.sent().is_empty());
    assert_eq!(reset.performed(), vec![test_month(2024, 7)]);
}
