//! Course repository contract and SQLite implementation.
//!
//! # Invariants
//! - `course_id` comes from the caller; duplicates are rejected, not merged.
//! - `list_courses` is ordered by `course_id ASC`.
//! - `delete_course` removes dependent enrollments and the course in one
//!   transaction.

use super::rows::{
    load_enrollments_for_course, parse_course_row, read_consistent, row_exists, COURSE_SELECT_SQL,
};
use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::course::{Course, CourseId};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

const ENTITY: &str = "Course";

/// Repository interface for course records.
pub trait CourseRepository {
    fn create_course(&self, course: &Course) -> RepoResult<Course>;
    /// Point lookup with enrollments (each carrying its student).
    fn get_course(&self, id: CourseId) -> RepoResult<Option<Course>>;
    /// Flat course rows without nested enrollments.
    fn list_courses(&self) -> RepoResult<Vec<Course>>;
    fn delete_course(&self, id: CourseId) -> RepoResult<Course>;
    fn course_exists(&self, id: CourseId) -> RepoResult<bool>;
}

pub struct SqliteCourseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCourseRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CourseRepository for SqliteCourseRepository<'_> {
    fn create_course(&self, course: &Course) -> RepoResult<Course> {
        course.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if course_exists_in(&tx, course.course_id)? {
            return Err(RepoError::AlreadyExists {
                entity: ENTITY,
                id: course.course_id,
            });
        }
        tx.execute(
            "INSERT INTO courses (course_id, title, credits) VALUES (?1, ?2, ?3);",
            params![course.course_id, course.title.as_str(), course.credits],
        )?;
        tx.commit()?;

        Ok(Course {
            enrollments: Vec::new(),
            ..course.clone()
        })
    }

    fn get_course(&self, id: CourseId) -> RepoResult<Option<Course>> {
        read_consistent(self.conn, |conn| {
            let mut stmt = conn.prepare(&format!("{COURSE_SELECT_SQL} WHERE course_id = ?1;"))?;
            let mut rows = stmt.query([id])?;
            let Some(row) = rows.next()? else {
                return Ok(None);
            };

            let mut course = parse_course_row(row)?;
            course.enrollments = load_enrollments_for_course(conn, id)?;
            Ok(Some(course))
        })
    }

    fn list_courses(&self) -> RepoResult<Vec<Course>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COURSE_SELECT_SQL} ORDER BY course_id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut courses = Vec::new();
        while let Some(row) = rows.next()? {
            courses.push(parse_course_row(row)?);
        }
        Ok(courses)
    }

    fn delete_course(&self, id: CourseId) -> RepoResult<Course> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let snapshot = {
            let mut stmt = tx.prepare(&format!("{COURSE_SELECT_SQL} WHERE course_id = ?1;"))?;
            let mut rows = stmt.query([id])?;
            match rows.next()? {
                Some(row) => parse_course_row(row)?,
                None => return Err(RepoError::NotFound { entity: ENTITY, id }),
            }
        };
        let enrollments = load_enrollments_for_course(&tx, id)?;

        tx.execute("DELETE FROM enrollments WHERE course_id = ?1;", [id])?;
        tx.execute("DELETE FROM courses WHERE course_id = ?1;", [id])?;
        tx.commit()?;

        Ok(Course {
            enrollments,
            ..snapshot
        })
    }

    fn course_exists(&self, id: CourseId) -> RepoResult<bool> {
        course_exists_in(self.conn, id)
    }
}

fn course_exists_in(conn: &Connection, id: CourseId) -> RepoResult<bool> {
    row_exists(conn, "SELECT 1 FROM courses WHERE course_id = ?1;", id)
}
