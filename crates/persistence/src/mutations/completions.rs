// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Routine completion mutations.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::{debug, info};

use crate::diesel_schema::completions;
use crate::error::PersistenceError;

use rollcall_domain::{ActivityId, UserId};

/// Records a routine completion for `(user, activity, date)`.
///
/// The completions table carries a uniqueness constraint over that
/// triple, so a repeated submission inserts nothing. Callers treat the
/// already-recorded case as success.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `user` - The user who completed the activity
/// * `activity` - The completed activity
/// * `date` - The reference-timezone civil date of the completion
/// * `completed_at` - Timestamp of the submission (RFC 3339)
///
/// # Returns
///
/// `true` if a new row was created, `false` if the completion already existed.
///
/// # Errors
///
/// Returns an error if the insert fails for any reason other than the
/// uniqueness constraint.
pub fn record_completion(
    conn: &mut SqliteConnection,
    user: UserId,
    activity: ActivityId,
    date: NaiveDate,
    completed_at: &str,
) -> Result<bool, PersistenceError> {
    debug!(
        "Recording completion for user {}, activity {}, date {}",
        user, activity, date
    );

    let inserted: usize = diesel::insert_into(completions::table)
        .values((
            completions::user_id.eq(user.value()),
            completions::activity_id.eq(activity.value()),
            completions::completed_on.eq(date.format("%Y-%m-%d").to_string()),
            completions::completed_at.eq(completed_at),
        ))
        .on_conflict_do_nothing()
        .execute(conn)?;

    if inserted == 0 {
        info!(
            "Completion already recorded for user {}, activity {}, date {}",
            user, activity, date
        );
    } else {
        info!(
            "Completion recorded for user {}, activity {}, date {}",
            user, activity, date
        );
    }

    Ok(inserted > 0)
}
