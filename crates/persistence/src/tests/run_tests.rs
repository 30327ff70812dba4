// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for monthly reset run persistence.
//!
//! These tests validate the transactional run claim and the recorded
//! lifecycle `Running -> {Completed, Failed}`.

use crate::tests::{TEST_TIMESTAMP, create_test_persistence, test_month};
use crate::{MonthlyRunData, PersistenceError};
use rollcall::StartDecision;
use rollcall_domain::RunStatus;

#[test]
fn test_begin_claims_fresh_month() {
    let mut persistence = create_test_persistence();

    let decision: StartDecision = persistence
        .begin_monthly_run(test_month(2024, 6), false, TEST_TIMESTAMP)
        .unwrap();
    assert_eq!(decision, StartDecision::Proceed, "Fresh month should be claimable");

    let run: MonthlyRunData = persistence
        .get_monthly_run(test_month(2024, 6))
        .unwrap()
        .expect("Claim should persist a run row");
    assert_eq!(run.status, RunStatus::Running, "Claimed run should be Running");
    assert_eq!(run.started_at, TEST_TIMESTAMP);
    assert!(run.finished_at.is_none(), "Running run has no finish time");
    assert!(run.error.is_none(), "Running run has no error");
}

#[test]
fn test_begin_rejects_duplicate_trigger() {
    let mut persistence = create_test_persistence();

    persistence
        .begin_monthly_run(test_month(2024, 6), false, TEST_TIMESTAMP)
        .unwrap();
    let decision: StartDecision = persistence
        .begin_monthly_run(test_month(2024, 6), false, "2024-06-01T00:06:00+09:00")
        .unwrap();

    assert_eq!(
        decision,
        StartDecision::AlreadyRunning,
        "Second trigger while running should be rejected"
    );
}

#[test]
fn test_begin_rejects_forced_trigger_while_running() {
    let mut persistence = create_test_persistence();

    persistence
        .begin_monthly_run(test_month(2024, 6), false, TEST_TIMESTAMP)
        .unwrap();
    let decision: StartDecision = persistence
        .begin_monthly_run(test_month(2024, 6), true, "2024-06-01T00:06:00+09:00")
        .unwrap();

    assert_eq!(
        decision,
        StartDecision::AlreadyRunning,
        "Force must not interrupt an in-flight run"
    );
}

#[test]
fn test_completed_run_rejects_normal_retrigger() {
    let mut persistence = create_test_persistence();

    persistence
        .begin_monthly_run(test_month(2024, 6), false, TEST_TIMESTAMP)
        .unwrap();
    persistence
        .finish_monthly_run(
            test_month(2024, 6),
            RunStatus::Completed,
            "2024-06-01T00:07:00+09:00",
            None,
        )
        .unwrap();

    let decision: StartDecision = persistence
        .begin_monthly_run(test_month(2024, 6), false, "2024-06-01T00:08:00+09:00")
        .unwrap();
    assert_eq!(
        decision,
        StartDecision::AlreadyCompleted,
        "Completed month should reject a normal retrigger"
    );
}

#[test]
fn test_completed_run_yields_to_forced_retrigger() {
    let mut persistence = create_test_persistence();

    persistence
        .begin_monthly_run(test_month(2024, 6), false, TEST_TIMESTAMP)
        .unwrap();
    persistence
        .finish_monthly_run(
            test_month(2024, 6),
            RunStatus::Completed,
            "2024-06-01T00:07:00+09:00",
            None,
        )
        .unwrap();

    let decision: StartDecision = persistence
        .begin_monthly_run(test_month(2024, 6), true, "2024-06-01T00:08:00+09:00")
        .unwrap();
    assert_eq!(decision, StartDecision::Proceed, "Forced rerun should reclaim the month");

    let run: MonthlyRunData = persistence
        .get_monthly_run(test_month(2024, 6))
        .unwrap()
        .expect("Reclaimed run row should exist");
    assert_eq!(run.status, RunStatus::Running, "Reclaimed run should be Running");
    assert_eq!(run.started_at, "2024-06-01T00:08:00+09:00");
    assert!(run.finished_at.is_none(), "Reclaim should clear the finish time");
    assert!(run.error.is_none(), "Reclaim should clear the error");
}

#[test]
fn test_failed_run_can_be_retriggered_without_force() {
    let mut persistence = create_test_persistence();

    persistence
        .begin_monthly_run(test_month(2024, 6), false, TEST_TIMESTAMP)
        .unwrap();
    persistence
        .finish_monthly_run(
            test_month(2024, 6),
            RunStatus::Failed,
            "2024-06-01T00:07:00+09:00",
            Some("step reset_counters failed: table locked"),
        )
        .unwrap();

    let decision: StartDecision = persistence
        .begin_monthly_run(test_month(2024, 6), false, "2024-06-01T00:08:00+09:00")
        .unwrap();
    assert_eq!(
        decision,
        StartDecision::Proceed,
        "Failed month should be claimable without force"
    );
}

#[test]
fn test_failed_run_records_error_detail() {
    let mut persistence = create_test_persistence();

    persistence
        .begin_monthly_run(test_month(2024, 6), false, TEST_TIMESTAMP)
        .unwrap();
    persistence
        .finish_monthly_run(
            test_month(2024, 6),
            RunStatus::Failed,
            "2024-06-01T00:07:00+09:00",
            Some("step reset_counters failed: table locked"),
        )
        .unwrap();

    let run: MonthlyRunData = persistence
        .get_monthly_run(test_month(2024, 6))
        .unwrap()
        .expect("Failed run row should exist");
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.finished_at.as_deref(), Some("2024-06-01T00:07:00+09:00"));
    assert_eq!(
        run.error.as_deref(),
        Some("step reset_counters failed: table locked"),
        "The step failure detail should be preserved"
    );
}

#[test]
fn test_finish_without_claim_is_an_error() {
    let mut persistence = create_test_persistence();

    let result = persistence.finish_monthly_run(
        test_month(2024, 6),
        RunStatus::Completed,
        TEST_TIMESTAMP,
        None,
    );

    assert!(
        matches!(result, Err(PersistenceError::RunNotFound(month)) if month == test_month(2024, 6)),
        "Finishing an unclaimed month should report RunNotFound"
    );
}

#[test]
fn test_get_monthly_run_absent_month_is_none() {
    let mut persistence = create_test_persistence();

    let run = persistence.get_monthly_run(test_month(2024, 6)).unwrap();
    assert!(run.is_none(), "Month with no recorded run should be None");
}

#[test]
fn test_running_runs_lists_only_running_months() {
    let mut persistence = create_test_persistence();

    persistence
        .begin_monthly_run(test_month(2024, 5), false, TEST_TIMESTAMP)
        .unwrap();
    persistence
        .finish_monthly_run(
            test_month(2024, 5),
            RunStatus::Completed,
            "2024-05-01T00:07:00+09:00",
            None,
        )
        .unwrap();
    persistence
        .begin_monthly_run(test_month(2024, 7), false, TEST_TIMESTAMP)
        .unwrap();
    persistence
        .begin_monthly_run(test_month(2024, 6), false, TEST_TIMESTAMP)
        .unwrap();

    let running: Vec<MonthlyRunData> = persistence.running_runs().unwrap();
    let months: Vec<String> = running.iter().map(|run| run.month.to_string()).collect();

    assert_eq!(
        months,
        vec![String::from("2024-06"), String::from("2024-07")],
        "Only running months should be listed, ascending"
    );
}
