// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Attendance record queries.

use chrono::NaiveDate;
use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use crate::diesel_schema::attendance_records;
use crate::error::PersistenceError;

use rollcall_domain::{UserId, parse_civil_date};

/// Lists the user's attendance dates in `[from, to)`, ascending.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `user` - The user to query
/// * `from` - First civil date of the range (inclusive)
/// * `to` - First civil date after the range (exclusive)
///
/// # Errors
///
/// Returns an error if the query fails or a stored date cannot be parsed.
pub fn attendance_dates(
    conn: &mut SqliteConnection,
    user: UserId,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<NaiveDate>, PersistenceError> {
    debug!("Listing attendance for user {} in [{}, {})", user, from, to);

    let raw_dates: Vec<String> = attendance_records::table
        .filter(attendance_records::user_id.eq(user.value()))
        .filter(attendance_records::attended_on.ge(from.format("%Y-%m-%d").to_string()))
        .filter(attendance_records::attended_on.lt(to.format("%Y-%m-%d").to_string()))
        .select(attendance_records::attended_on)
        .order(attendance_records::attended_on.asc())
        .load(conn)?;

    raw_dates
        .iter()
        .map(|raw| parse_civil_date(raw).map_err(PersistenceError::from))
        .collect()
}
