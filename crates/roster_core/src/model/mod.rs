//! Entity model for student/course/enrollment records.
//!
//! # Responsibility
//! - Define the canonical shapes shared by the gateway, services and API.
//! - Check structural validity before anything is persisted.
//!
//! # Invariants
//! - Server-generated identifiers are `0` until the store assigns them.
//! - Relationships are plain foreign-key attributes; nested collections are
//!   populated only by explicit gateway joins.

pub mod course;
pub mod datetime;
pub mod enrollment;
pub mod student;

use thiserror::Error;

/// Structural validation failures for entity payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required text field is empty after trimming.
    #[error("{entity}.{field} must not be blank")]
    BlankField {
        entity: &'static str,
        field: &'static str,
    },
    /// A required identifier is zero or negative.
    #[error("{entity}.{field} must be a positive identifier, got {value}")]
    InvalidIdentifier {
        entity: &'static str,
        field: &'static str,
        value: i64,
    },
    /// Course credits must not be negative.
    #[error("Course.Credits must not be negative, got {0}")]
    NegativeCredits(i32),
}

pub(crate) fn require_text(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField { entity, field });
    }
    Ok(())
}

pub(crate) fn require_id(
    entity: &'static str,
    field: &'static str,
    value: i64,
) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::InvalidIdentifier {
            entity,
            field,
            value,
        });
    }
    Ok(())
}
