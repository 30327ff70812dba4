// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Mutation modules.
//!
//! This module contains all state-changing operations for the persistence
//! layer. All mutations use Diesel DSL; constraint-driven idempotency
//! (insert-or-report-existing) is expressed through `SQLite` upsert clauses
//! rather than read-then-write sequences.
//!
//! ## Module Organization
//!
//! - `attendance` — Attendance record derivation writes
//! - `completions` — Routine completion writes
//! - `messages` — Failed review-message registry writes
//! - `runs` — Monthly reset run claiming and completion

pub mod attendance;
pub mod completions;
pub mod messages;
pub mod runs;

pub use attendance::record_attendance;
pub use completions::record_completion;
pub use messages::{mark_message_resolved, record_send_failure};
pub use runs::{begin_monthly_run, finish_monthly_run};
