//! Student entity.
//!
//! # Invariants
//! - `id` is assigned by the store; `0` means "not yet persisted".
//! - `row_version` is the optimistic concurrency token. `0` on input means
//!   the caller did not read one, so the replace is unconditional.
//! - `enrollments` is a read projection filled by the gateway join; writes
//!   to a student never touch enrollment rows.

use super::enrollment::Enrollment;
use super::{require_text, ValidationError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Server-generated student primary key.
pub type StudentId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Student {
    #[serde(rename = "ID", default)]
    pub id: StudentId,
    pub last_name: String,
    pub first_mid_name: String,
    #[serde(with = "crate::model::datetime")]
    pub enrollment_date: NaiveDateTime,
    #[serde(default)]
    pub row_version: i64,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

impl Student {
    /// Creates an unsaved student with no enrollments.
    pub fn new(
        last_name: impl Into<String>,
        first_mid_name: impl Into<String>,
        enrollment_date: NaiveDateTime,
    ) -> Self {
        Self {
            id: 0,
            last_name: last_name.into(),
            first_mid_name: first_mid_name.into(),
            enrollment_date,
            row_version: 0,
            enrollments: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("Student", "LastName", &self.last_name)?;
        require_text("Student", "FirstMidName", &self.first_mid_name)?;
        Ok(())
    }
}
