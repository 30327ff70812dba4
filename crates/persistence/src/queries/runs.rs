// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Monthly reset run queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use crate::data_models::MonthlyRunData;
use crate::diesel_schema::monthly_runs;
use crate::error::PersistenceError;

use rollcall_domain::{MonthId, RunStatus};

/// Diesel Queryable struct for monthly run rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = monthly_runs)]
struct MonthlyRunRow {
    month: String,
    status: String,
    started_at: String,
    finished_at: Option<String>,
    error: Option<String>,
}

impl MonthlyRunRow {
    fn into_data(self) -> Result<MonthlyRunData, PersistenceError> {
        Ok(MonthlyRunData {
            month: self.month.parse::<MonthId>()?,
            status: self.status.parse::<RunStatus>()?,
            started_at: self.started_at,
            finished_at: self.finished_at,
            error: self.error,
        })
    }
}

/// Retrieves the recorded run for a month.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `month` - The month to look up
///
/// # Returns
///
/// `Ok(None)` when no run has ever been recorded for the month.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value cannot be parsed.
pub fn get_monthly_run(
    conn: &mut SqliteConnection,
    month: MonthId,
) -> Result<Option<MonthlyRunData>, PersistenceError> {
    debug!("Looking up monthly run for {}", month);

    let row: Option<MonthlyRunRow> = monthly_runs::table
        .filter(monthly_runs::month.eq(month.to_string()))
        .select(MonthlyRunRow::as_select())
        .first(conn)
        .optional()?;

    row.map(MonthlyRunRow::into_data).transpose()
}

/// Lists every run currently recorded as `Running`.
///
/// Used at startup to find runs interrupted by a crash; a live system
/// has at most one.
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Errors
///
/// Returns an error if the query fails or a stored value cannot be parsed.
pub fn running_runs(conn: &mut SqliteConnection) -> Result<Vec<MonthlyRunData>, PersistenceError> {
    debug!("Listing runs in Running status");

    let rows: Vec<MonthlyRunRow> = monthly_runs::table
        .filter(monthly_runs::status.eq(RunStatus::Running.as_str()))
        .order(monthly_runs::month.asc())
        .select(MonthlyRunRow::as_select())
        .load(conn)?;

    rows.into_iter().map(MonthlyRunRow::into_data).collect()
}
