// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Query modules.
//!
//! This module contains all read-only operations for the persistence
//! layer. All queries use Diesel DSL. Civil dates and months are stored
//! as `TEXT` in `%Y-%m-%d` and `%Y-%m` form, so lexicographic range
//! filters match chronological order.
//!
//! ## Module Organization
//!
//! - `attendance` — Attendance record reads
//! - `completions` — Routine completion reads and recipient selection
//! - `messages` — Failed review-message registry reads
//! - `runs` — Monthly reset run status reads

pub mod attendance;
pub mod completions;
pub mod messages;
pub mod runs;

pub use attendance::attendance_dates;
pub use completions::{has_completion_on, review_recipients};
pub use messages::{
    failed_messages_for_month, unresolved_failed_messages, unresolved_failed_messages_for_month,
};
pub use runs::{get_monthly_run, running_runs};
