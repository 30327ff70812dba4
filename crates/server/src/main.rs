// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use clap::Parser;
use rollcall::{
    CompletionEvent, DerivationOutcome, MonthlyReset, ResetStepError, RetryPolicy, ReviewMessenger,
};
use rollcall_api::{
    ApiError, FailedMessageStatusResponse, MonthlyAttendanceResponse, MonthlyResetResponse,
    RecordCompletionResponse, RetryFailedMessagesResponse, SchedulerStatusResponse,
    derive_attendance, execute_monthly_reset, get_failed_message_status, get_monthly_attendance,
    get_scheduler_status, manual_monthly_reset, manual_retry_review_messages, record_completion,
    retry_failed_review_messages,
};
use rollcall_domain::{
    ActivityId, Clock, DeliveryError, MonthId, RunStatus, SystemClock, UserId, parse_civil_date,
};
use rollcall_persistence::{MonthlyRunData, PersistenceError, SqlitePersistence};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::{error, info, warn};

/// Capacity of the completion event queue feeding attendance derivation.
const COMPLETION_QUEUE_CAPACITY: usize = 256;

/// Rollcall Server - HTTP server for the Rollcall attendance system
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Seconds between scheduler polls for a month boundary
    #[arg(long, default_value_t = 300)]
    scheduler_poll_secs: u64,

    /// Seconds between automatic retry passes over failed review messages
    #[arg(long, default_value_t = 600)]
    retry_interval_secs: u64,

    /// Maximum delivery attempts per failed message. Unlimited if not provided.
    #[arg(long)]
    max_send_attempts: Option<u32>,
}

/// Application state shared across handlers.
///
/// This contains the persistence layer wrapped in a Mutex to allow
/// safe concurrent access, plus the scheduler collaborators and the
/// completion event queue.
#[derive(Clone)]
struct AppState {
    /// The persistence layer for completions, attendance, and runs.
    persistence: Arc<Mutex<SqlitePersistence>>,
    /// The transport delivering review messages.
    messenger: Arc<dyn ReviewMessenger>,
    /// The collaborator performing the monthly domain reset.
    reset: Arc<dyn MonthlyReset>,
    /// The reference-timezone clock.
    clock: Arc<dyn Clock>,
    /// The configured retry attempt limit.
    retry_policy: RetryPolicy,
    /// Queue feeding committed completion events to the deriver.
    completions: mpsc::Sender<CompletionEvent>,
}

/// Review messenger that logs deliveries instead of calling a transport.
///
/// Stands in until a real messaging integration is wired up.
struct LoggingMessenger;

impl ReviewMessenger for LoggingMessenger {
    fn send_review(&self, recipient: UserId, month: MonthId) -> Result<(), DeliveryError> {
        info!(
            user_id = recipient.value(),
            month = %month,
            "Review message dispatched"
        );
        Ok(())
    }
}

/// Reset collaborator that logs the step instead of touching counters.
struct LoggingReset;

impl MonthlyReset for LoggingReset {
    fn perform(&self, month: MonthId) -> Result<(), ResetStepError> {
        info!(month = %month, "Monthly counters reset");
        Ok(())
    }
}

/// API request for recording a routine completion.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct RecordCompletionApiRequest {
    /// The completing user's identifier.
    user_id: i64,
    /// The completed activity's identifier.
    activity_id: i64,
    /// The completion date (`YYYY-MM-DD`). Defaults to today in the
    /// reference timezone when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
}

/// API request for triggering a monthly reset run.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct MonthlyResetApiRequest {
    /// The month to run (`YYYY-MM`). Defaults to the current month when
    /// omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    month: Option<String>,
    /// Whether a completed month should be redone.
    #[serde(default)]
    force: bool,
}

/// API request for manually triggering the current month's reset run.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ManualResetApiRequest {
    /// Whether a completed month should be redone.
    #[serde(default)]
    force: bool,
}

/// Query parameters for the monthly attendance endpoint.
#[derive(Debug, Deserialize)]
struct AttendanceQuery {
    /// The user identifier.
    user_id: i64,
    /// The month (`YYYY-MM`).
    month: String,
}

/// Query parameters for the scheduler status endpoint.
#[derive(Debug, Deserialize)]
struct SchedulerStatusQuery {
    /// The month (`YYYY-MM`). Defaults to the current month when omitted.
    month: Option<String>,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidInput { .. } => Self {
                status: StatusCode::BAD_REQUEST,
                message: err.to_string(),
            },
            ApiError::ResourceNotFound { .. } => Self {
                status: StatusCode::NOT_FOUND,
                message: err.to_string(),
            },
            ApiError::RunConflict { .. } => Self {
                status: StatusCode::CONFLICT,
                message: err.to_string(),
            },
            ApiError::ResetFailed { .. } => Self {
                status: StatusCode::BAD_GATEWAY,
                message: err.to_string(),
            },
            ApiError::Internal { .. } => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: err.to_string(),
            },
        }
    }
}

/// Parses a `YYYY-MM` month identifier, rejecting invalid input.
fn parse_month(raw: &str) -> Result<MonthId, HttpError> {
    raw.parse::<MonthId>().map_err(|err| HttpError {
        status: StatusCode::BAD_REQUEST,
        message: err.to_string(),
    })
}

/// Parses a `YYYY-MM-DD` civil date, rejecting invalid input.
fn parse_date(raw: &str) -> Result<NaiveDate, HttpError> {
    parse_civil_date(raw).map_err(|err| HttpError {
        status: StatusCode::BAD_REQUEST,
        message: err.to_string(),
    })
}

/// Handler for POST /completions endpoint.
///
/// Records a routine completion and queues the committed event for
/// attendance derivation.
async fn handle_record_completion(
    AxumState(app_state): AxumState<AppState>,
    Json(request): Json<RecordCompletionApiRequest>,
) -> Result<Json<RecordCompletionResponse>, HttpError> {
    info!(
        user_id = request.user_id,
        activity_id = request.activity_id,
        date = ?request.date,
        "Handling record_completion request"
    );

    let date: Option<NaiveDate> = request.date.as_deref().map(parse_date).transpose()?;
    let date: NaiveDate = date.unwrap_or_else(|| app_state.clock.today());
    let user: UserId = UserId::new(request.user_id);
    let activity: ActivityId = ActivityId::new(request.activity_id);

    let mut persistence = app_state.persistence.lock().await;
    let response: RecordCompletionResponse = record_completion(
        &mut persistence,
        app_state.clock.as_ref(),
        user,
        activity,
        Some(date),
    )?;
    drop(persistence);

    // Publish only after the completion write is durable.
    if response.created {
        let event: CompletionEvent = CompletionEvent {
            user,
            activity,
            date,
        };
        if let Err(err) = app_state.completions.send(event).await {
            error!(error = %err, "Completion event could not be queued");
        }
    }

    info!(
        user_id = response.user_id,
        date = %response.date,
        created = response.created,
        "Completion recorded"
    );

    Ok(Json(response))
}

/// Handler for GET /attendance endpoint.
///
/// Returns the user's derived attendance dates for one month.
async fn handle_get_attendance(
    AxumState(app_state): AxumState<AppState>,
    Query(params): Query<AttendanceQuery>,
) -> Result<Json<MonthlyAttendanceResponse>, HttpError> {
    info!(
        user_id = params.user_id,
        month = %params.month,
        "Handling get_attendance request"
    );

    let month: MonthId = parse_month(&params.month)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: MonthlyAttendanceResponse =
        get_monthly_attendance(&mut persistence, UserId::new(params.user_id), month)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST /scheduler/run endpoint.
///
/// Triggers the monthly reset workflow, defaulting to the current month.
async fn handle_execute_reset(
    AxumState(app_state): AxumState<AppState>,
    Json(request): Json<MonthlyResetApiRequest>,
) -> Result<Json<MonthlyResetResponse>, HttpError> {
    info!(
        month = ?request.month,
        force = request.force,
        "Handling execute_reset request"
    );

    let month: Option<MonthId> = request.month.as_deref().map(parse_month).transpose()?;

    let mut persistence = app_state.persistence.lock().await;
    let response: MonthlyResetResponse = execute_monthly_reset(
        &mut persistence,
        app_state.reset.as_ref(),
        app_state.messenger.as_ref(),
        app_state.clock.as_ref(),
        month,
        request.force,
    )?;
    drop(persistence);

    info!(
        month = %response.month,
        delivered = response.delivered,
        failed_deliveries = response.failed_deliveries,
        "Monthly reset completed"
    );

    Ok(Json(response))
}

/// Handler for POST /scheduler/run/manual endpoint.
///
/// Triggers the current month's reset on behalf of an operator.
async fn handle_manual_reset(
    AxumState(app_state): AxumState<AppState>,
    Json(request): Json<ManualResetApiRequest>,
) -> Result<Json<MonthlyResetResponse>, HttpError> {
    info!(force = request.force, "Handling manual_reset request");

    let mut persistence = app_state.persistence.lock().await;
    let response: MonthlyResetResponse = manual_monthly_reset(
        &mut persistence,
        app_state.reset.as_ref(),
        app_state.messenger.as_ref(),
        app_state.clock.as_ref(),
        request.force,
    )?;
    drop(persistence);

    info!(
        month = %response.month,
        delivered = response.delivered,
        failed_deliveries = response.failed_deliveries,
        "Manual monthly reset completed"
    );

    Ok(Json(response))
}

/// Handler for POST /scheduler/retry endpoint.
///
/// Runs a retry pass over the current month's unresolved failed
/// review messages.
async fn handle_retry_messages(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<RetryFailedMessagesResponse>, HttpError> {
    info!("Handling retry_messages request");

    let mut persistence = app_state.persistence.lock().await;
    let response: RetryFailedMessagesResponse = retry_failed_review_messages(
        &mut persistence,
        app_state.messenger.as_ref(),
        app_state.clock.as_ref(),
        app_state.retry_policy,
    )?;
    drop(persistence);

    info!(
        month = %response.month,
        attempted = response.attempted,
        resolved = response.resolved,
        "Retry pass completed"
    );

    Ok(Json(response))
}

/// Handler for POST `/scheduler/retry/{month}` endpoint.
///
/// Runs a retry pass over an explicit month's unresolved failed
/// review messages.
async fn handle_manual_retry(
    AxumState(app_state): AxumState<AppState>,
    Path(month): Path<String>,
) -> Result<Json<RetryFailedMessagesResponse>, HttpError> {
    info!(month = %month, "Handling manual_retry request");

    let month: MonthId = parse_month(&month)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: RetryFailedMessagesResponse = manual_retry_review_messages(
        &mut persistence,
        app_state.messenger.as_ref(),
        app_state.clock.as_ref(),
        app_state.retry_policy,
        month,
    )?;
    drop(persistence);

    info!(
        month = %response.month,
        attempted = response.attempted,
        resolved = response.resolved,
        "Manual retry pass completed"
    );

    Ok(Json(response))
}

/// Handler for GET /scheduler/status endpoint.
///
/// Reports the reset run state of a month, defaulting to the current
/// month.
async fn handle_get_scheduler_status(
    AxumState(app_state): AxumState<AppState>,
    Query(params): Query<SchedulerStatusQuery>,
) -> Result<Json<SchedulerStatusResponse>, HttpError> {
    info!(month = ?params.month, "Handling get_scheduler_status request");

    let month: Option<MonthId> = params.month.as_deref().map(parse_month).transpose()?;

    let mut persistence = app_state.persistence.lock().await;
    let response: SchedulerStatusResponse =
        get_scheduler_status(&mut persistence, app_state.clock.as_ref(), month)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/scheduler/failed_messages/{month}` endpoint.
///
/// Reports the month's failed message registry.
async fn handle_get_failed_messages(
    AxumState(app_state): AxumState<AppState>,
    Path(month): Path<String>,
) -> Result<Json<FailedMessageStatusResponse>, HttpError> {
    info!(month = %month, "Handling get_failed_messages request");

    let month: MonthId = parse_month(&month)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: FailedMessageStatusResponse =
        get_failed_message_status(&mut persistence, app_state.retry_policy, month)?;
    drop(persistence);

    Ok(Json(response))
}

/// Applies one committed completion event to the attendance table.
async fn derive_event(app_state: &AppState, event: CompletionEvent) {
    let mut persistence = app_state.persistence.lock().await;
    let outcome: Result<DerivationOutcome, ApiError> =
        derive_attendance(&mut persistence, app_state.clock.as_ref(), &event);
    drop(persistence);

    match outcome {
        Ok(DerivationOutcome::Recorded) => info!(
            user_id = event.user.value(),
            date = %event.date,
            "Attendance derived from completion"
        ),
        Ok(DerivationOutcome::AlreadyRecorded) => info!(
            user_id = event.user.value(),
            date = %event.date,
            "Attendance already recorded, duplicate event absorbed"
        ),
        Ok(DerivationOutcome::NoCompletion) => warn!(
            user_id = event.user.value(),
            date = %event.date,
            "No committed completion backs the event, nothing derived"
        ),
        Err(err) => error!(error = %err, "Attendance derivation failed"),
    }
}

/// Drains the completion event queue, deriving attendance for each event.
///
/// Events are consumed one at a time. Redelivered or reordered events
/// are harmless because derivation is idempotent per user and day.
async fn run_deriver(app_state: &AppState, events: &mut mpsc::Receiver<CompletionEvent>) {
    while let Some(event) = events.recv().await {
        derive_event(app_state, event).await;
    }
    info!("Completion event queue closed, stopping attendance derivation");
}

/// Fires the monthly reset for `month`, treating an already-handled
/// month as benign.
///
/// Returns whether the month is settled: the run completed, the month
/// was already handled, or the run ended `Failed` and waits for an
/// operator re-trigger. A trigger that errors before the run reaches a
/// terminal status is not settled and should be re-fired on the next
/// poll.
async fn trigger_monthly_reset(app_state: &AppState, month: MonthId) -> bool {
    let mut persistence = app_state.persistence.lock().await;
    let result: Result<MonthlyResetResponse, ApiError> = execute_monthly_reset(
        &mut persistence,
        app_state.reset.as_ref(),
        app_state.messenger.as_ref(),
        app_state.clock.as_ref(),
        Some(month),
        false,
    );
    drop(persistence);

    match result {
        Ok(response) => {
            info!(
                month = %response.month,
                recipients = response.recipients,
                delivered = response.delivered,
                failed_deliveries = response.failed_deliveries,
                "Scheduled monthly reset completed"
            );
            true
        }
        Err(ApiError::RunConflict { month: claimed, message }) => {
            info!(
                month = %claimed,
                message = %message,
                "Scheduled monthly reset already handled"
            );
            true
        }
        Err(ApiError::ResetFailed { month: failed, message }) => {
            error!(
                month = %failed,
                message = %message,
                "Scheduled monthly reset failed"
            );
            true
        }
        Err(err) => {
            error!(
                error = %err,
                month = %month,
                "Scheduled monthly reset errored, retrying on the next poll"
            );
            false
        }
    }
}

/// Polls the clock and fires the monthly reset when the month changes.
///
/// The first poll fires for the month the server booted in, so a server
/// that was down across a month boundary still triggers its run. A month
/// is only remembered as handled once its trigger settles; an error
/// before the run reaches a terminal status is retried on the next poll.
async fn run_scheduler(app_state: &AppState, poll_interval: Duration) {
    let mut ticker: tokio::time::Interval = tokio::time::interval(poll_interval);
    let mut last_triggered: Option<MonthId> = None;
    loop {
        ticker.tick().await;
        let month: MonthId = app_state.clock.current_month();
        if last_triggered != Some(month) {
            info!(month = %month, "Scheduler triggering monthly reset");
            if trigger_monthly_reset(app_state, month).await {
                last_triggered = Some(month);
            }
        }
    }
}

/// Periodically retries the current month's unresolved failed messages.
async fn run_retry_loop(app_state: &AppState, retry_interval: Duration) {
    let mut ticker: tokio::time::Interval = tokio::time::interval(retry_interval);
    loop {
        ticker.tick().await;
        let mut persistence = app_state.persistence.lock().await;
        let result: Result<RetryFailedMessagesResponse, ApiError> = retry_failed_review_messages(
            &mut persistence,
            app_state.messenger.as_ref(),
            app_state.clock.as_ref(),
            app_state.retry_policy,
        );
        drop(persistence);

        match result {
            Ok(response) if response.attempted > 0 => info!(
                month = %response.month,
                attempted = response.attempted,
                resolved = response.resolved,
                still_failing = response.still_failing,
                "Scheduled retry pass finished"
            ),
            Ok(_) => {}
            Err(err) => error!(error = %err, "Scheduled retry pass failed"),
        }
    }
}

/// Sweeps runs left in `Running` by an earlier shutdown to `Failed`.
///
/// A `Running` row rejects every new trigger for its month, so a crash
/// mid-run would otherwise wedge the scheduler until the row is fixed
/// by hand. `Failed` keeps the month re-triggerable.
fn recover_interrupted_runs(
    persistence: &mut SqlitePersistence,
    clock: &dyn Clock,
) -> Result<(), PersistenceError> {
    let interrupted: Vec<MonthlyRunData> = persistence.running_runs()?;
    for run in interrupted {
        warn!(month = %run.month, "Marking interrupted reset run as failed");
        persistence.finish_monthly_run(
            run.month,
            RunStatus::Failed,
            &clock.timestamp(),
            Some("interrupted by server restart"),
        )?;
    }
    Ok(())
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/completions", post(handle_record_completion))
        .route("/attendance", get(handle_get_attendance))
        .route("/scheduler/run", post(handle_execute_reset))
        .route("/scheduler/run/manual", post(handle_manual_reset))
        .route("/scheduler/retry", post(handle_retry_messages))
        .route("/scheduler/retry/{month}", post(handle_manual_retry))
        .route("/scheduler/status", get(handle_get_scheduler_status))
        .route(
            "/scheduler/failed_messages/{month}",
            get(handle_get_failed_messages),
        )
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Rollcall server");

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let mut persistence: SqlitePersistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        SqlitePersistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        SqlitePersistence::new_in_memory()?
    };

    // Runs interrupted by the previous shutdown block their month until
    // swept to Failed.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    recover_interrupted_runs(&mut persistence, clock.as_ref())?;

    let (completions, mut events) = mpsc::channel::<CompletionEvent>(COMPLETION_QUEUE_CAPACITY);

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        messenger: Arc::new(LoggingMessenger),
        reset: Arc::new(LoggingReset),
        clock,
        retry_policy: RetryPolicy::new(args.max_send_attempts),
        completions,
    };

    // Spawn background workers
    let deriver_state: AppState = app_state.clone();
    tokio::spawn(async move {
        run_deriver(&deriver_state, &mut events).await;
    });

    let scheduler_state: AppState = app_state.clone();
    let scheduler_poll: Duration = Duration::from_secs(args.scheduler_poll_secs);
    tokio::spawn(async move {
        run_scheduler(&scheduler_state, scheduler_poll).await;
    });

    let retry_state: AppState = app_state.clone();
    let retry_every: Duration = Duration::from_secs(args.retry_interval_secs);
    tokio::spawn(async move {
        run_retry_loop(&retry_state, retry_every).await;
    });

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
