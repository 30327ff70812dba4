// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Attendance record mutations.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::{debug, info};

use crate::diesel_schema::attendance_records;
use crate::error::PersistenceError;

use rollcall_domain::UserId;

/// Records derived attendance for `(user, date)`.
///
/// The attendance table carries a uniqueness constraint over that pair,
/// so derivation stays idempotent under redelivered completion events
/// and under multiple completions on the same day. Rows are write-once;
/// nothing updates or deletes them afterwards.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `user` - The user attendance is derived for
/// * `date` - The reference-timezone civil date
/// * `recorded_at` - Timestamp of the derivation (RFC 3339)
/// * `origin` - Short code of the writer that derived the record
/// * `context` - Optional free-form detail, such as the triggering activity
///
/// # Returns
///
/// `true` if a new row was created, `false` if attendance already existed.
///
/// # Errors
///
/// Returns an error if the insert fails for any reason other than the
/// uniqueness constraint.
pub fn record_attendance(
    conn: &mut SqliteConnection,
    user: UserId,
    date: NaiveDate,
    recorded_at: &str,
    origin: &str,
    context: Option<&str>,
) -> Result<bool, PersistenceError> {
    debug!("Recording attendance for user {}, date {}", user, date);

    let inserted: usize = diesel::insert_into(attendance_records::table)
        .values((
            attendance_records::user_id.eq(user.value()),
            attendance_records::attended_on.eq(date.format("%Y-%m-%d").to_string()),
            attendance_records::recorded_at.eq(recorded_at),
            attendance_records::origin.eq(origin),
            attendance_records::context.eq(context),
        ))
        .on_conflict_do_nothing()
        .execute(conn)?;

    if inserted > 0 {
        info!("Attendance recorded for user {}, date {}", user, date);
    }

    Ok(inserted > 0)
}
