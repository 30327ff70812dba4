// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use rollcall::CoreError;
use rollcall_domain::DomainError;

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// A reset run trigger conflicted with the month's existing run.
    RunConflict {
        /// The month whose run rejected the trigger.
        month: String,
        /// A human-readable description of the conflict.
        message: String,
    },
    /// A reset run was claimed but its reset step failed.
    ResetFailed {
        /// The month whose run failed.
        month: String,
        /// A human-readable description of the step failure.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::RunConflict { month, message } => {
                write!(f, "Run conflict for {month}: {message}")
            }
            Self::ResetFailed { month, message } => {
                write!(f, "Monthly reset for {month} failed: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidMonthNumber { month } => ApiError::InvalidInput {
            field: String::from("month"),
            message: format!("Invalid month number: {month}. Must be between 1 and 12"),
        },
        DomainError::InvalidMonthIdentifier(value) => ApiError::InvalidInput {
            field: String::from("month"),
            message: format!("Invalid month identifier '{value}'. Expected YYYY-MM"),
        },
        DomainError::InvalidCivilDate(value) => ApiError::InvalidInput {
            field: String::from("date"),
            message: format!("Invalid date '{value}'. Expected YYYY-MM-DD"),
        },
        DomainError::MonthOutOfRange { year, month } => ApiError::InvalidInput {
            field: String::from("month"),
            message: format!("Month {year:04}-{month:02} is outside the supported date range"),
        },
        DomainError::UnknownRunStatus(value) => ApiError::Internal {
            message: format!("Stored run status '{value}' is not recognized"),
        },
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::RunInProgress(month) => ApiError::RunConflict {
            month: month.to_string(),
            message: String::from("A reset run for this month is already in progress"),
        },
        CoreError::RunAlreadyCompleted(month) => ApiError::RunConflict {
            month: month.to_string(),
            message: String::from(
                "The reset run for this month already completed. Re-trigger with force to redo it",
            ),
        },
        CoreError::ResetStepFailed { month, error } => ApiError::ResetFailed {
            month: month.to_string(),
            message: error.to_string(),
        },
    }
}
