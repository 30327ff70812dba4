// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Routine completion queries.

use chrono::NaiveDate;
use diesel::SqliteConnection;
use diesel::dsl::exists;
use diesel::prelude::*;
use tracing::debug;

use crate::diesel_schema::completions;
use crate::error::PersistenceError;

use rollcall_domain::UserId;

/// Checks whether the user has any committed completion on `date`.
///
/// Attendance derivation consults the committed store rather than the
/// event payload, so a redelivered or stale event for a day without a
/// completion derives nothing.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `user` - The user to check
/// * `date` - The reference-timezone civil date
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn has_completion_on(
    conn: &mut SqliteConnection,
    user: UserId,
    date: NaiveDate,
) -> Result<bool, PersistenceError> {
    debug!("Checking completions for user {}, date {}", user, date);

    let found: bool = diesel::select(exists(
        completions::table
            .filter(completions::user_id.eq(user.value()))
            .filter(completions::completed_on.eq(date.format("%Y-%m-%d").to_string())),
    ))
    .get_result(conn)?;

    Ok(found)
}

/// Lists the users with at least one completion in `[from, to)`.
///
/// The monthly reset run sends its review message to exactly this set,
/// evaluated over the month that just ended.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `from` - First civil date of the range (inclusive)
/// * `to` - First civil date after the range (exclusive)
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn review_recipients(
    conn: &mut SqliteConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<UserId>, PersistenceError> {
    debug!("Selecting review recipients for [{}, {})", from, to);

    let user_ids: Vec<i64> = completions::table
        .filter(completions::completed_on.ge(from.format("%Y-%m-%d").to_string()))
        .filter(completions::completed_on.lt(to.format("%Y-%m-%d").to_string()))
        .select(completions::user_id)
        .distinct()
        .order(completions::user_id.asc())
        .load(conn)?;

    Ok(user_ids.into_iter().map(UserId::new).collect())
}
