// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend initialization tests.
//!
//! Connection establishment, migration application, and foreign key
//! enforcement are also exercised implicitly by every persistence test
//! that calls `SqlitePersistence::new_in_memory()`; the tests here pin
//! the explicit guarantees.

use crate::SqlitePersistence;
use crate::tests::{TEST_TIMESTAMP, create_test_persistence, test_activity, test_date, test_user};

#[test]
fn test_in_memory_initialization_succeeds() {
    let result: Result<SqlitePersistence, crate::PersistenceError> =
        SqlitePersistence::new_in_memory();
    assert!(result.is_ok(), "In-memory database should initialize");
}

#[test]
fn test_in_memory_databases_are_isolated() {
    let mut first = create_test_persistence();
    let mut second = create_test_persistence();

    let created = first
        .record_completion(test_user(1), test_activity(10), test_date(2024, 6, 1), TEST_TIMESTAMP)
        .unwrap();
    assert!(created, "First database should accept the completion");

    let seen_in_second = second
        .has_completion_on(test_user(1), test_date(2024, 6, 1))
        .unwrap();
    assert!(
        !seen_in_second,
        "Second database should not see rows written to the first"
    );
}

#[test]
fn test_migrations_create_all_tables() {
    let mut persistence = create_test_persistence();

    // Each table is touched through a query; a missing table would error.
    let has_completion = persistence
        .has_completion_on(test_user(1), test_date(2024, 6, 1))
        .unwrap();
    assert!(!has_completion, "Fresh database should have no completions");

    let dates = persistence
        .attendance_dates(test_user(1), test_date(2024, 6, 1), test_date(2024, 7, 1))
        .unwrap();
    assert!(dates.is_empty(), "Fresh database should have no attendance");

    let run = persistence
        .get_monthly_run(crate::tests::test_month(2024, 6))
        .unwrap();
    assert!(run.is_none(), "Fresh database should have no runs");

    let failed = persistence.unresolved_failed_messages().unwrap();
    assert!(
        failed.is_empty(),
        "Fresh database should have no failed messages"
    );
}
