//! Course entity. `course_id` is supplied by the caller, never generated.

use super::enrollment::Enrollment;
use super::{require_id, require_text, ValidationError};
use serde::{Deserialize, Serialize};

/// Client-supplied course primary key.
pub type CourseId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Course {
    #[serde(rename = "CourseID")]
    pub course_id: CourseId,
    pub title: String,
    pub credits: i32,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

impl Course {
    pub fn new(course_id: CourseId, title: impl Into<String>, credits: i32) -> Self {
        Self {
            course_id,
            title: title.into(),
            credits,
            enrollments: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id("Course", "CourseID", self.course_id)?;
        require_text("Course", "Title", &self.title)?;
        if self.credits < 0 {
            return Err(ValidationError::NegativeCredits(self.credits));
        }
        Ok(())
    }
}
