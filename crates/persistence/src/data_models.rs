// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use rollcall_domain::{DeliveryError, MonthId, RunStatus, UserId};

/// A monthly reset run as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyRunData {
    /// The month the run covers.
    pub month: MonthId,
    /// Current status of the run.
    pub status: RunStatus,
    /// When the run started (RFC 3339).
    pub started_at: String,
    /// When the run finished (RFC 3339), if it has.
    pub finished_at: Option<String>,
    /// The reset step failure message, if the run failed.
    pub error: Option<String>,
}

/// A failed review-message registry entry as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedMessageData {
    /// The run month the failed message belongs to.
    pub month: MonthId,
    /// The user the message could not be delivered to.
    pub recipient: UserId,
    /// Structured detail of the most recent delivery failure.
    pub error: DeliveryError,
    /// Number of delivery attempts that have failed.
    pub attempts: u32,
    /// Whether a later attempt delivered the message.
    pub resolved: bool,
    /// When the most recent attempt was made (RFC 3339).
    pub last_attempt_at: String,
}
