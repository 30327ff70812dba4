// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use chrono::NaiveDate;
use rollcall_domain::{ActivityId, UserId};

/// Event published after a routine completion is committed.
///
/// Publication happens strictly after the completion row is durable, so a
/// consumer that observes the event can rely on the committed record. The
/// event payload is a pointer, not a source of truth: attendance derivation
/// re-reads the store instead of trusting these fields alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionEvent {
    /// The user who completed the activity.
    pub user: UserId,
    /// The activity that was completed.
    pub activity: ActivityId,
    /// The reference-timezone civil date of the completion.
    pub date: NaiveDate,
}

/// Outcome of deriving an attendance record from a completion event.
///
/// Derivation is idempotent per `(user, date)`: however many completions
/// a user commits on one day, and however many times their events are
/// redelivered, at most one attendance record exists for that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationOutcome {
    /// A new attendance record was created for `(user, date)`.
    Recorded,
    /// An attendance record for `(user, date)` already existed.
    AlreadyRecorded,
    /// No committed completion backs the event; nothing was derived.
    NoCompletion,
}
