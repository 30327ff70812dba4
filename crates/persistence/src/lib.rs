// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the Rollcall attendance system.
//!
//! This crate stores routine completions, derived attendance records,
//! monthly reset runs, and the failed review-message registry. It is
//! built on Diesel over `SQLite`.
//!
//! ## Idempotency at the Constraint Level
//!
//! The write paths lean on table uniqueness constraints instead of
//! read-then-write checks:
//!
//! - `completions` is unique over `(user_id, activity_id, completed_on)`
//! - `attendance_records` is unique over `(user_id, attended_on)`
//! - `monthly_runs` is unique over `month`
//! - `failed_messages` is unique over `(month, recipient_id)`
//!
//! A conflicting insert is reported to callers as "already exists", never
//! as a failure, so repeated submissions and redelivered events are safe.
//!
//! ## Dates and Timestamps
//!
//! Civil dates are stored as `TEXT` in `%Y-%m-%d` form and months in
//! `%Y-%m` form; both sort chronologically. Timestamps are RFC 3339
//! strings supplied by the caller, which keeps the clock injectable.
//!
//! ## Testing
//!
//! Unit tests run against unique shared in-memory databases, one per
//! test, allocated from an atomic counter. No external infrastructure is
//! required.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use chrono::NaiveDate;
use diesel::SqliteConnection;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use rollcall::StartDecision;
use rollcall_domain::{ActivityId, DeliveryError, MonthId, RunStatus, UserId};

/// Atomic counter for generating unique in-memory database names.
///
/// This ensures deterministic test isolation by eliminating time-based collisions.
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use data_models::{FailedMessageData, MonthlyRunData};
pub use error::PersistenceError;

/// Type alias for backward compatibility.
/// All new code should use `Persistence` directly.
pub type SqlitePersistence = Persistence;

/// Persistence adapter for the attendance store.
///
/// One adapter owns one `SQLite` connection. Callers serialize access
/// themselves (the server wraps the adapter in a mutex), so every method
/// takes `&mut self`.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Uses a shared in-memory database via Diesel.
    ///
    /// Each call receives a unique database instance via atomic counter,
    /// ensuring deterministic test isolation without time-based collisions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        // Create a unique shared in-memory database name per call so tests are isolated.
        // Use atomic counter instead of timestamp to eliminate race conditions.
        let db_id = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_name = format!("memdb_test_{db_id}");
        let shared_memory_url = format!("file:{db_name}?mode=memory&cache=shared");

        // Initialize database with Diesel migrations
        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;

        // Verify foreign key enforcement is active
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        // Initialize database with Diesel migrations
        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;

        // Enable WAL mode for better read concurrency
        backend::sqlite::enable_wal_mode(&mut conn)?;

        // Verify foreign key enforcement is active
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    // ========================================================================
    // Completions & Attendance
    // ========================================================================

    /// Records a routine completion for `(user, activity, date)`.
    ///
    /// # Arguments
    ///
    /// * `user` - The user who completed the activity
    /// * `activity` - The completed activity
    /// * `date` - The reference-timezone civil date of the completion
    /// * `completed_at` - Timestamp of the submission (RFC 3339)
    ///
    /// # Returns
    ///
    /// `true` if a new row was created, `false` if the completion already
    /// existed. Both are successful outcomes.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn record_completion(
        &mut self,
        user: UserId,
        activity: ActivityId,
        date: NaiveDate,
        completed_at: &str,
    ) -> Result<bool, PersistenceError> {
        mutations::record_completion(&mut self.conn, user, activity, date, completed_at)
    }

    /// Checks whether the user has any committed completion on `date`.
    ///
    /// # Arguments
    ///
    /// * `user` - The user to check
    /// * `date` - The reference-timezone civil date
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn has_completion_on(
        &mut self,
        user: UserId,
        date: NaiveDate,
    ) -> Result<bool, PersistenceError> {
        queries::has_completion_on(&mut self.conn, user, date)
    }

    /// Lists the users with at least one completion in `[from, to)`.
    ///
    /// # Arguments
    ///
    /// * `from` - First civil date of the range (inclusive)
    /// * `to` - First civil date after the range (exclusive)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn review_recipients(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<UserId>, PersistenceError> {
        queries::review_recipients(&mut self.conn, from, to)
    }

    /// Records derived attendance for `(user, date)`.
    ///
    /// Attendance rows are write-once; a second derivation for the same
    /// day inserts nothing.
    ///
    /// # Arguments
    ///
    /// * `user` - The user attendance is derived for
    /// * `date` - The reference-timezone civil date
    /// * `recorded_at` - Timestamp of the derivation (RFC 3339)
    /// * `origin` - Short code of the writer that derived the record
    /// * `context` - Optional free-form detail, such as the triggering
    ///   activity
    ///
    /// # Returns
    ///
    /// `true` if a new row was created, `false` if attendance already
    /// existed for the day.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn record_attendance(
        &mut self,
        user: UserId,
        date: NaiveDate,
        recorded_at: &str,
        origin: &str,
        context: Option<&str>,
    ) -> Result<bool, PersistenceError> {
        mutations::record_attendance(&mut self.conn, user, date, recorded_at, origin, context)
    }

    /// Lists the user's attendance dates in `[from, to)`, ascending.
    ///
    /// # Arguments
    ///
    /// * `user` - The user to query
    /// * `from` - First civil date of the range (inclusive)
    /// * `to` - First civil date after the range (exclusive)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored date cannot be parsed.
    pub fn attendance_dates(
        &mut self,
        user: UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>, PersistenceError> {
        queries::attendance_dates(&mut self.conn, user, from, to)
    }

    // ========================================================================
    // Monthly Reset Runs
    // ========================================================================

    /// Claims the monthly reset run for `month`.
    ///
    /// The claim is transactional: of any number of concurrent triggers
    /// for a month, exactly one observes [`StartDecision::Proceed`].
    ///
    /// # Arguments
    ///
    /// * `month` - The month to claim
    /// * `force` - Whether a completed run should be redone
    /// * `started_at` - Timestamp of the claim (RFC 3339)
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails or a stored status cannot
    /// be parsed.
    pub fn begin_monthly_run(
        &mut self,
        month: MonthId,
        force: bool,
        started_at: &str,
    ) -> Result<StartDecision, PersistenceError> {
        mutations::begin_monthly_run(&mut self.conn, month, force, started_at)
    }

    /// Records the outcome of the monthly reset run for `month`.
    ///
    /// # Arguments
    ///
    /// * `month` - The month whose run finished
    /// * `status` - The final status (`Completed` or `Failed`)
    /// * `finished_at` - Timestamp of completion (RFC 3339)
    /// * `error` - The reset step failure message, when the run failed
    ///
    /// # Errors
    ///
    /// Returns an error if no run row exists for the month or the update
    /// fails.
    pub fn finish_monthly_run(
        &mut self,
        month: MonthId,
        status: RunStatus,
        finished_at: &str,
        error: Option<&str>,
    ) -> Result<(), PersistenceError> {
        mutations::finish_monthly_run(&mut self.conn, month, status, finished_at, error)
    }

    /// Retrieves the recorded run for a month.
    ///
    /// # Arguments
    ///
    /// * `month` - The month to look up
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no run has ever been recorded for the month.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored value cannot be
    /// parsed.
    pub fn get_monthly_run(
        &mut self,
        month: MonthId,
    ) -> Result<Option<MonthlyRunData>, PersistenceError> {
        queries::get_monthly_run(&mut self.conn, month)
    }

    /// Lists every run currently recorded as `Running`.
    ///
    /// Used at startup to fail runs interrupted by a crash.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn running_runs(&mut self) -> Result<Vec<MonthlyRunData>, PersistenceError> {
        queries::running_runs(&mut self.conn)
    }

    // ========================================================================
    // Failed Message Registry
    // ========================================================================

    /// Records a failed review-message delivery for `(month, recipient)`.
    ///
    /// A repeated failure for the same key increments the attempt count
    /// and replaces the stored error detail.
    ///
    /// # Arguments
    ///
    /// * `month` - The run month the message belongs to
    /// * `recipient` - The user the message could not be delivered to
    /// * `error` - Structured detail of the delivery failure
    /// * `attempted_at` - Timestamp of the attempt (RFC 3339)
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn record_send_failure(
        &mut self,
        month: MonthId,
        recipient: UserId,
        error: &DeliveryError,
        attempted_at: &str,
    ) -> Result<(), PersistenceError> {
        mutations::record_send_failure(&mut self.conn, month, recipient, error, attempted_at)
    }

    /// Marks a registry entry as resolved after a successful delivery.
    ///
    /// # Arguments
    ///
    /// * `month` - The run month of the entry
    /// * `recipient` - The recipient of the entry
    /// * `resolved_at` - Timestamp of the successful delivery (RFC 3339)
    ///
    /// # Errors
    ///
    /// Returns an error if no entry exists for the key or the update fails.
    pub fn mark_message_resolved(
        &mut self,
        month: MonthId,
        recipient: UserId,
        resolved_at: &str,
    ) -> Result<(), PersistenceError> {
        mutations::mark_message_resolved(&mut self.conn, month, recipient, resolved_at)
    }

    /// Lists every unresolved registry entry, ordered by month and recipient.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn unresolved_failed_messages(
        &mut self,
    ) -> Result<Vec<FailedMessageData>, PersistenceError> {
        queries::unresolved_failed_messages(&mut self.conn)
    }

    /// Lists the unresolved registry entries for one month.
    ///
    /// # Arguments
    ///
    /// * `month` - The run month to filter by
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn unresolved_failed_messages_for_month(
        &mut self,
        month: MonthId,
    ) -> Result<Vec<FailedMessageData>, PersistenceError> {
        queries::unresolved_failed_messages_for_month(&mut self.conn, month)
    }

    /// Lists every registry entry for one month, resolved entries included.
    ///
    /// # Arguments
    ///
    /// * `month` - The run month to filter by
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn failed_messages_for_month(
        &mut self,
        month: MonthId,
    ) -> Result<Vec<FailedMessageData>, PersistenceError> {
        queries::failed_messages_for_month(&mut self.conn, month)
    }
}
