//! Enrollment join entity between Student and Course.
//!
//! # Invariants
//! - `course_id` and `student_id` are required foreign keys; the gateway
//!   refuses to persist an enrollment whose parents are not both present.
//! - `course` and `student` are read projections, never written back.

use super::course::{Course, CourseId};
use super::student::{Student, StudentId};
use super::{require_id, ValidationError};
use serde::{Deserialize, Serialize};

/// Server-generated enrollment primary key.
pub type EnrollmentId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Enrollment {
    #[serde(rename = "EnrollmentID", default)]
    pub enrollment_id: EnrollmentId,
    #[serde(rename = "CourseID", default)]
    pub course_id: CourseId,
    #[serde(rename = "StudentID", default)]
    pub student_id: StudentId,
    #[serde(default)]
    pub grade: Option<i32>,
    #[serde(default)]
    pub course: Option<Course>,
    #[serde(default)]
    pub student: Option<Box<Student>>,
}

impl Enrollment {
    /// Creates an unsaved enrollment linking one student to one course.
    pub fn new(course_id: CourseId, student_id: StudentId, grade: Option<i32>) -> Self {
        Self {
            enrollment_id: 0,
            course_id,
            student_id,
            grade,
            course: None,
            student: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id("Enrollment", "CourseID", self.course_id)?;
        require_id("Enrollment", "StudentID", self.student_id)?;
        Ok(())
    }
}
