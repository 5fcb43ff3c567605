//! Student record service.
//!
//! # Responsibility
//! - Expose create/read/update/delete as stateless per-call flows.
//! - Classify gateway failures into `Ok`, `Created`, `BadRequest`,
//!   `NotFound` or a raised error.
//!
//! # Invariants
//! - A conflicting write re-checks existence before reporting: a vanished
//!   row is `NotFound`, a changed row raises `Conflict`.
//! - Conflicts are never retried.
//! - Client errors are logged at `info`; storage errors at `error`.

use crate::model::student::{Student, StudentId};
use crate::repo::student_repo::StudentRepository;
use crate::repo::RepoError;
use log::{error, info};
use std::time::Instant;
use thiserror::Error;

/// Terminal, non-exceptional result of one service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome<T> {
    Ok(T),
    Created(T),
    /// Input rejected before any write; carries a descriptive reason.
    BadRequest(String),
    NotFound(i64),
}

impl<T> RecordOutcome<T> {
    /// Returns the entity for `Ok` / `Created` outcomes.
    pub fn into_entity(self) -> Option<T> {
        match self {
            Self::Ok(value) | Self::Created(value) => Some(value),
            Self::BadRequest(_) | Self::NotFound(_) => None,
        }
    }
}

/// Failures raised to the caller instead of classified.
#[derive(Debug, Error)]
pub enum StudentServiceError {
    /// The target still exists but changed since the caller read it.
    #[error("student {0} was modified concurrently; reload and resubmit")]
    Conflict(StudentId),
    /// Storage or decoding failure.
    #[error("{0}")]
    Repo(RepoError),
}

pub type StudentServiceResult<T> = Result<RecordOutcome<T>, StudentServiceError>;

/// Use-case service over any student repository implementation.
pub struct StudentService<R: StudentRepository> {
    repo: R,
}

impl<R: StudentRepository> StudentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists all students ascending by id.
    pub fn list_students(&self) -> StudentServiceResult<Vec<Student>> {
        self.repo
            .list_students()
            .map(RecordOutcome::Ok)
            .map_err(|err| storage_failure("student_list", err))
    }

    pub fn get_student(&self, id: StudentId) -> StudentServiceResult<Student> {
        match self.repo.get_student(id) {
            Ok(Some(student)) => Ok(RecordOutcome::Ok(student)),
            Ok(None) => Ok(RecordOutcome::NotFound(id)),
            Err(err) => Err(storage_failure("student_get", err)),
        }
    }

    /// Creates a student; any caller-supplied id is ignored.
    pub fn create_student(&self, student: &Student) -> StudentServiceResult<Student> {
        let started_at = Instant::now();
        match self.repo.create_student(student) {
            Ok(created) => {
                info!(
                    "event=student_create module=service status=ok id={} duration_ms={}",
                    created.id,
                    started_at.elapsed().as_millis()
                );
                Ok(RecordOutcome::Created(created))
            }
            Err(err) => classify(err, "student_create", student.id),
        }
    }

    /// Replaces every field of student `id` with `student`.
    pub fn update_student(&self, id: StudentId, student: &Student) -> StudentServiceResult<Student> {
        if student.id != id {
            let mismatch = RepoError::IdentityMismatch {
                path_id: id,
                body_id: student.id,
            };
            return classify(mismatch, "student_replace", id);
        }
        if let Err(err) = student.validate() {
            return classify(err.into(), "student_replace", id);
        }

        let started_at = Instant::now();
        match self.repo.replace_student(id, student) {
            Ok(updated) => {
                info!(
                    "event=student_replace module=service status=ok id={id} row_version={} duration_ms={}",
                    updated.row_version,
                    started_at.elapsed().as_millis()
                );
                Ok(RecordOutcome::Ok(updated))
            }
            Err(RepoError::ConcurrencyConflict { .. }) => self.resolve_conflict(id),
            Err(err) => classify(err, "student_replace", id),
        }
    }

    /// Deletes a student and its enrollments, returning the prior snapshot.
    pub fn delete_student(&self, id: StudentId) -> StudentServiceResult<Student> {
        match self.repo.delete_student(id) {
            Ok(deleted) => {
                info!(
                    "event=student_delete module=service status=ok id={id} cascaded_enrollments={}",
                    deleted.enrollments.len()
                );
                Ok(RecordOutcome::Ok(deleted))
            }
            Err(err) => classify(err, "student_delete", id),
        }
    }

    fn resolve_conflict(&self, id: StudentId) -> StudentServiceResult<Student> {
        match self.repo.student_exists(id) {
            Ok(false) => {
                info!(
                    "event=student_replace module=service status=not_found id={id} reason=deleted_concurrently"
                );
                Ok(RecordOutcome::NotFound(id))
            }
            Ok(true) => {
                info!("event=student_replace module=service status=conflict id={id}");
                Err(StudentServiceError::Conflict(id))
            }
            Err(err) => Err(storage_failure("student_replace", err)),
        }
    }
}

fn classify<T>(err: RepoError, event: &str, id: StudentId) -> StudentServiceResult<T> {
    match err {
        RepoError::NotFound { id, .. } => {
            info!("event={event} module=service status=not_found id={id}");
            Ok(RecordOutcome::NotFound(id))
        }
        err if err.is_client_error() => {
            info!("event={event} module=service status=bad_request id={id} error={err}");
            Ok(RecordOutcome::BadRequest(err.to_string()))
        }
        err => Err(storage_failure(event, err)),
    }
}

fn storage_failure(event: &str, err: RepoError) -> StudentServiceError {
    error!("event={event} module=service status=error error={err}");
    StudentServiceError::Repo(err)
}
