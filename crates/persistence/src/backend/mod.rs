// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Database backend-specific code.
//!
//! This module isolates initialization, migration, and helper functions
//! that cannot be expressed in Diesel DSL. All domain queries and
//! mutations live in the `queries/` and `mutations/` modules and use
//! Diesel DSL exclusively; this module is limited to:
//!
//! - Connection initialization
//! - Migration execution
//! - `SQLite`-specific configuration (PRAGMA statements)

pub mod sqlite;
