// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Monthly reset run mutations.
//!
//! Claiming a run and recording its outcome. The claim runs as a single
//! transaction over the month's unique row, so concurrent triggers for
//! the same month collapse to one `Proceed` and the rest are rejected.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::{debug, info};

use crate::diesel_schema::monthly_runs;
use crate::error::PersistenceError;

use rollcall::{StartDecision, start_decision};
use rollcall_domain::{MonthId, RunStatus};

/// Claims the monthly reset run for `month`.
///
/// Reads the month's recorded status, applies the start decision, and on
/// `Proceed` writes the row as `Running` inside one transaction. A unique
/// constraint violation on insert means another writer claimed the month
/// first and is reported as `AlreadyRunning`, not as an error.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `month` - The month to claim
/// * `force` - Whether a completed run should be redone
/// * `started_at` - Timestamp of the claim (RFC 3339)
///
/// # Returns
///
/// The start decision. The caller proceeds with the run only on
/// [`StartDecision::Proceed`].
///
/// # Errors
///
/// Returns an error if the transaction fails or a stored status cannot
/// be parsed.
pub fn begin_monthly_run(
    conn: &mut SqliteConnection,
    month: MonthId,
    force: bool,
    started_at: &str,
) -> Result<StartDecision, PersistenceError> {
    debug!("Claiming monthly reset run for {} (force: {})", month, force);

    conn.transaction::<StartDecision, PersistenceError, _>(|conn| {
        let raw_status: Option<String> = monthly_runs::table
            .filter(monthly_runs::month.eq(month.to_string()))
            .select(monthly_runs::status)
            .first(conn)
            .optional()?;

        let existing: Option<RunStatus> = match raw_status {
            Some(raw) => Some(raw.parse::<RunStatus>()?),
            None => None,
        };

        let decision: StartDecision = start_decision(existing, force);
        if decision != StartDecision::Proceed {
            info!("Run claim for {} rejected: {:?}", month, decision);
            return Ok(decision);
        }

        if existing.is_some() {
            // Re-claiming a failed or force-redone month reuses its row.
            diesel::update(monthly_runs::table)
                .filter(monthly_runs::month.eq(month.to_string()))
                .set((
                    monthly_runs::status.eq(RunStatus::Running.as_str()),
                    monthly_runs::started_at.eq(started_at),
                    monthly_runs::finished_at.eq(None::<String>),
                    monthly_runs::error.eq(None::<String>),
                ))
                .execute(conn)?;

            info!("Run for {} re-claimed", month);
            return Ok(StartDecision::Proceed);
        }

        let inserted: Result<usize, diesel::result::Error> =
            diesel::insert_into(monthly_runs::table)
                .values((
                    monthly_runs::month.eq(month.to_string()),
                    monthly_runs::status.eq(RunStatus::Running.as_str()),
                    monthly_runs::started_at.eq(started_at),
                ))
                .execute(conn);

        match inserted {
            Ok(_) => {
                info!("Run for {} claimed", month);
                Ok(StartDecision::Proceed)
            }
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => {
                info!("Run claim for {} lost to a concurrent trigger", month);
                Ok(StartDecision::AlreadyRunning)
            }
            Err(e) => Err(e.into()),
        }
    })
}

/// Records the outcome of the monthly reset run for `month`.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `month` - The month whose run finished
/// * `status` - The final status (`Completed` or `Failed`)
/// * `finished_at` - Timestamp of completion (RFC 3339)
/// * `error` - The reset step failure message, when the run failed
///
/// # Errors
///
/// Returns [`PersistenceError::RunNotFound`] if no run row exists for the
/// month, or a database error if the update fails.
pub fn finish_monthly_run(
    conn: &mut SqliteConnection,
    month: MonthId,
    status: RunStatus,
    finished_at: &str,
    error: Option<&str>,
) -> Result<(), PersistenceError> {
    info!("Finishing run for {} with status {}", month, status);

    let updated: usize = diesel::update(monthly_runs::table)
        .filter(monthly_runs::month.eq(month.to_string()))
        .set((
            monthly_runs::status.eq(status.as_str()),
            monthly_runs::finished_at.eq(Some(finished_at)),
            monthly_runs::error.eq(error),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::RunNotFound(month));
    }

    Ok(())
}
