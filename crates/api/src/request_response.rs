// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API response data transfer objects.
//!
//! These DTOs are distinct from domain and core types and represent the
//! API contract. Dates are ISO `YYYY-MM-DD` strings, months `YYYY-MM`,
//! timestamps RFC 3339.

/// API response for a recorded routine completion.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RecordCompletionResponse {
    /// The user who completed the activity.
    pub user_id: i64,
    /// The completed activity.
    pub activity_id: i64,
    /// The civil date the completion was recorded for.
    pub date: String,
    /// Whether a new completion row was created. `false` means the same
    /// completion was already recorded; both outcomes are successes.
    pub created: bool,
    /// A success message.
    pub message: String,
}

/// API response listing a user's derived attendance for one month.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MonthlyAttendanceResponse {
    /// The user the attendance belongs to.
    pub user_id: i64,
    /// The month that was queried.
    pub month: String,
    /// The attended civil dates within the month, ascending.
    pub dates: Vec<String>,
}

/// API response for a finished monthly reset run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MonthlyResetResponse {
    /// The month the run covered.
    pub month: String,
    /// The final status of the run.
    pub status: String,
    /// Number of users selected to receive a review message.
    pub recipients: usize,
    /// Number of review messages delivered successfully.
    pub delivered: usize,
    /// Number of deliveries that failed and were recorded for retry.
    pub failed_deliveries: usize,
    /// A success message.
    pub message: String,
}

/// API response for a retry pass over the failed message registry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RetryFailedMessagesResponse {
    /// The month whose registry entries were considered.
    pub month: String,
    /// Number of messages the pass tried to deliver again.
    pub attempted: usize,
    /// Number of messages delivered this pass and marked resolved.
    pub resolved: usize,
    /// Number of messages that failed again and stay in the registry.
    pub still_failing: usize,
    /// Number of messages skipped because their attempts reached the
    /// configured limit.
    pub exhausted: usize,
    /// A success message.
    pub message: String,
}

/// API response describing the reset run state of one month.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SchedulerStatusResponse {
    /// The month that was queried.
    pub month: String,
    /// The run status: `NotStarted`, `Running`, `Completed`, or `Failed`.
    /// `NotStarted` means no run row exists for the month.
    pub status: String,
    /// When the run started (RFC 3339), if one was triggered.
    pub started_at: Option<String>,
    /// When the run finished (RFC 3339), if it has.
    pub finished_at: Option<String>,
    /// The reset step failure message, if the run failed.
    pub error: Option<String>,
}

/// One failed review-message registry entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FailedMessageInfo {
    /// The user the message could not be delivered to.
    pub recipient_id: i64,
    /// Transport error code of the most recent failure.
    pub error_code: String,
    /// Human-readable detail of the most recent failure.
    pub error_message: String,
    /// Number of delivery attempts that have failed.
    pub attempts: u32,
    /// Whether a later attempt delivered the message.
    pub resolved: bool,
    /// Whether the attempt count reached the configured limit. Exhausted
    /// entries are skipped by retry passes and surfaced for operator
    /// decision.
    pub exhausted: bool,
    /// When the most recent attempt was made (RFC 3339).
    pub last_attempt_at: String,
}

/// API response describing the failed message registry for one month.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FailedMessageStatusResponse {
    /// The month that was queried.
    pub month: String,
    /// Total number of registry entries for the month.
    pub total: usize,
    /// Number of entries whose message was eventually delivered.
    pub resolved: usize,
    /// Number of entries still awaiting a successful delivery.
    pub unresolved: usize,
    /// Number of unresolved entries whose attempts reached the configured
    /// limit.
    pub exhausted: usize,
    /// The registry entries, ordered by recipient.
    pub messages: Vec<FailedMessageInfo>,
}
