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
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod clock;
mod error;
mod month;
mod types;

pub use clock::{Clock, FixedClock, REFERENCE_TIMEZONE, SystemClock};
pub use error::DomainError;
pub use month::{MonthId, parse_civil_date};
pub use types::{ActivityId, DeliveryError, RunStatus, UserId};
