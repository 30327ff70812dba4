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

mod error;
mod handlers;
mod request_response;

#[cfg(test)]
mod tests;

pub use error::{ApiError, translate_core_error, translate_domain_error};
pub use handlers::{
    derive_attendance, execute_monthly_reset, get_failed_message_status, get_monthly_attendance,
    get_scheduler_status, manual_monthly_reset, manual_retry_review_messages, record_completion,
    retry_failed_review_messages,
};
pub use request_response::{
    FailedMessageInfo, FailedMessageStatusResponse, MonthlyAttendanceResponse,
    MonthlyResetResponse, RecordCompletionResponse, RetryFailedMessagesResponse,
    SchedulerStatusResponse,
};
