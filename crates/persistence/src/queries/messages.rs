// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Failed review-message registry queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use num_traits::ToPrimitive;
use tracing::debug;

use crate::data_models::FailedMessageData;
use crate::diesel_schema::failed_messages;
use crate::error::PersistenceError;

use rollcall_domain::{DeliveryError, MonthId, UserId};

/// Diesel Queryable struct for failed message rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = failed_messages)]
struct FailedMessageRow {
    month: String,
    recipient_id: i64,
    error_code: String,
    error_message: String,
    attempts: i32,
    resolved: i32,
    last_attempt_at: String,
}

impl FailedMessageRow {
    fn into_data(self) -> Result<FailedMessageData, PersistenceError> {
        let attempts: u32 = self.attempts.to_u32().ok_or_else(|| {
            PersistenceError::DatabaseError("Attempt count conversion failed".to_string())
        })?;

        Ok(FailedMessageData {
            month: self.month.parse::<MonthId>()?,
            recipient: UserId::new(self.recipient_id),
            error: DeliveryError::new(self.error_code, self.error_message),
            attempts,
            resolved: self.resolved != 0,
            last_attempt_at: self.last_attempt_at,
        })
    }
}

/// Lists every unresolved registry entry, ordered by month and recipient.
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Errors
///
/// Returns an error if the query fails or a stored value cannot be parsed.
pub fn unresolved_failed_messages(
    conn: &mut SqliteConnection,
) -> Result<Vec<FailedMessageData>, PersistenceError> {
    debug!("Listing unresolved failed messages");

    let rows: Vec<FailedMessageRow> = failed_messages::table
        .filter(failed_messages::resolved.eq(0))
        .order((
            failed_messages::month.asc(),
            failed_messages::recipient_id.asc(),
        ))
        .select(FailedMessageRow::as_select())
        .load(conn)?;

    rows.into_iter().map(FailedMessageRow::into_data).collect()
}

/// Lists the unresolved registry entries for one month.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `month` - The run month to filter by
///
/// # Errors
///
/// Returns an error if the query fails or a stored value cannot be parsed.
pub fn unresolved_failed_messages_for_month(
    conn: &mut SqliteConnection,
    month: MonthId,
) -> Result<Vec<FailedMessageData>, PersistenceError> {
    debug!("Listing unresolved failed messages for {}", month);

    let rows: Vec<FailedMessageRow> = failed_messages::table
        .filter(failed_messages::resolved.eq(0))
        .filter(failed_messages::month.eq(month.to_string()))
        .order(failed_messages::recipient_id.asc())
        .select(FailedMessageRow::as_select())
        .load(conn)?;

    rows.into_iter().map(FailedMessageRow::into_data).collect()
}

/// Lists every registry entry for one month, resolved entries included.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `month` - The run month to filter by
///
/// # Errors
///
/// Returns an error if the query fails or a stored value cannot be parsed.
pub fn failed_messages_for_month(
    conn: &mut SqliteConnection,
    month: MonthId,
) -> Result<Vec<FailedMessageData>, PersistenceError> {
    debug!("Listing failed messages for {}", month);

    let rows: Vec<FailedMessageRow> = failed_messages::table
        .filter(failed_messages::month.eq(month.to_string()))
        .order(failed_messages::recipient_id.asc())
        .select(FailedMessageRow::as_select())
        .load(conn)?;

    rows.into_iter().map(FailedMessageRow::into_data).collect()
}
