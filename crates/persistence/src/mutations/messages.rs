// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Failed review-message registry mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::{debug, info};

use crate::diesel_schema::failed_messages;
use crate::error::PersistenceError;

use rollcall_domain::{DeliveryError, MonthId, UserId};

/// Records a failed review-message delivery.
///
/// The registry is keyed by `(month, recipient)`. A first failure inserts
/// a row with one attempt; a repeated failure for the same key replaces
/// the stored error detail, increments the attempt count, and reopens the
/// entry if it had been resolved.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `month` - The run month the message belongs to
/// * `recipient` - The user the message could not be delivered to
/// * `error` - Structured detail of the delivery failure
/// * `attempted_at` - Timestamp of the attempt (RFC 3339)
///
/// # Errors
///
/// Returns an error if the write fails, including when no monthly run row
/// exists for `month` (the registry references the run table).
pub fn record_send_failure(
    conn: &mut SqliteConnection,
    month: MonthId,
    recipient: UserId,
    error: &DeliveryError,
    attempted_at: &str,
) -> Result<(), PersistenceError> {
    debug!(
        "Recording send failure for month {}, recipient {}: {}",
        month, recipient, error
    );

    diesel::insert_into(failed_messages::table)
        .values((
            failed_messages::month.eq(month.to_string()),
            failed_messages::recipient_id.eq(recipient.value()),
            failed_messages::error_code.eq(&error.code),
            failed_messages::error_message.eq(&error.message),
            failed_messages::attempts.eq(1),
            failed_messages::resolved.eq(0),
            failed_messages::last_attempt_at.eq(attempted_at),
        ))
        .on_conflict((failed_messages::month, failed_messages::recipient_id))
        .do_update()
        .set((
            failed_messages::error_code.eq(&error.code),
            failed_messages::error_message.eq(&error.message),
            failed_messages::attempts.eq(failed_messages::attempts + 1),
            failed_messages::resolved.eq(0),
            failed_messages::last_attempt_at.eq(attempted_at),
        ))
        .execute(conn)?;

    info!(
        "Send failure recorded for month {}, recipient {}",
        month, recipient
    );

    Ok(())
}

/// Marks a registry entry as resolved after a successful delivery.
///
/// The entry is kept for inspection; resolved entries are excluded from
/// later retry passes.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `month` - The run month of the entry
/// * `recipient` - The recipient of the entry
/// * `resolved_at` - Timestamp of the successful delivery (RFC 3339)
///
/// # Errors
///
/// Returns [`PersistenceError::MessageNotFound`] if no entry exists for
/// the key, or a database error if the update fails.
pub fn mark_message_resolved(
    conn: &mut SqliteConnection,
    month: MonthId,
    recipient: UserId,
    resolved_at: &str,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(failed_messages::table)
        .filter(failed_messages::month.eq(month.to_string()))
        .filter(failed_messages::recipient_id.eq(recipient.value()))
        .set((
            failed_messages::resolved.eq(1),
            failed_messages::last_attempt_at.eq(resolved_at),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::MessageNotFound { month, recipient });
    }

    info!(
        "Failed message for month {}, recipient {} marked resolved",
        month, recipient
    );

    Ok(())
}
