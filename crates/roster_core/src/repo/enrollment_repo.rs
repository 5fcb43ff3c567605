//! Enrollment repository contract and SQLite implementation.
//!
//! # Invariants
//! - An enrollment is inserted only after both parents are confirmed inside
//!   the same transaction.
//! - Deleting an enrollment never touches its parents.

use super::rows::{load_enrollment, load_enrollments_for_student, row_exists};
use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::enrollment::{Enrollment, EnrollmentId};
use crate::model::student::StudentId;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

const ENTITY: &str = "Enrollment";

/// Repository interface for enrollment join rows.
pub trait EnrollmentRepository {
    /// Inserts with a store-generated id; both parents must exist.
    fn create_enrollment(&self, enrollment: &Enrollment) -> RepoResult<Enrollment>;
    fn get_enrollment(&self, id: EnrollmentId) -> RepoResult<Option<Enrollment>>;
    fn list_enrollments_for_student(&self, student_id: StudentId) -> RepoResult<Vec<Enrollment>>;
    fn delete_enrollment(&self, id: EnrollmentId) -> RepoResult<Enrollment>;
}

pub struct SqliteEnrollmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEnrollmentRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EnrollmentRepository for SqliteEnrollmentRepository<'_> {
    fn create_enrollment(&self, enrollment: &Enrollment) -> RepoResult<Enrollment> {
        enrollment.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !row_exists(
            &tx,
            "SELECT 1 FROM students WHERE id = ?1;",
            enrollment.student_id,
        )? {
            return Err(RepoError::MissingReference {
                entity: "Student",
                id: enrollment.student_id,
            });
        }
        if !row_exists(
            &tx,
            "SELECT 1 FROM courses WHERE course_id = ?1;",
            enrollment.course_id,
        )? {
            return Err(RepoError::MissingReference {
                entity: "Course",
                id: enrollment.course_id,
            });
        }

        tx.execute(
            "INSERT INTO enrollments (course_id, student_id, grade) VALUES (?1, ?2, ?3);",
            params![enrollment.course_id, enrollment.student_id, enrollment.grade],
        )?;
        let enrollment_id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Enrollment {
            enrollment_id,
            course_id: enrollment.course_id,
            student_id: enrollment.student_id,
            grade: enrollment.grade,
            course: None,
            student: None,
        })
    }

    fn get_enrollment(&self, id: EnrollmentId) -> RepoResult<Option<Enrollment>> {
        load_enrollment(self.conn, id)
    }

    fn list_enrollments_for_student(&self, student_id: StudentId) -> RepoResult<Vec<Enrollment>> {
        load_enrollments_for_student(self.conn, student_id)
    }

    fn delete_enrollment(&self, id: EnrollmentId) -> RepoResult<Enrollment> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(snapshot) = load_enrollment(&tx, id)? else {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        };
        tx.execute("DELETE FROM enrollments WHERE enrollment_id = ?1;", [id])?;
        tx.commit()?;
        Ok(snapshot)
    }
}
