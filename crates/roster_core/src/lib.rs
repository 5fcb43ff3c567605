//! Core record-keeping logic for students, courses and enrollments.
//! This crate is the single source of truth for referential integrity and
//! write-conflict rules.

pub mod api;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use api::{handle_request, ApiResponse, Method};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::course::{Course, CourseId};
pub use model::enrollment::{Enrollment, EnrollmentId};
pub use model::student::{Student, StudentId};
pub use model::ValidationError;
pub use repo::course_repo::{CourseRepository, SqliteCourseRepository};
pub use repo::enrollment_repo::{EnrollmentRepository, SqliteEnrollmentRepository};
pub use repo::student_repo::{SqliteStudentRepository, StudentRepository};
pub use repo::{RepoError, RepoResult};
pub use service::student_service::{
    RecordOutcome, StudentService, StudentServiceError, StudentServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
