//! Student repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide list/get/create/replace/delete/exists over `students`.
//! - Populate nested enrollments through explicit joins.
//!
//! # Invariants
//! - `list_students` is ordered by `id ASC`.
//! - Reads that span several statements see one snapshot.
//! - `create_student` writes the student and any nested enrollments
//!   together, or nothing.
//! - `replace_student` cross-checks identity before any SQL and bumps
//!   `row_version` in the same conditional statement that writes.
//! - `delete_student` removes dependent enrollments and the student in one
//!   transaction.

use super::rows::{
    load_enrollments_by_student, load_enrollments_for_student, load_student, parse_student_row,
    read_consistent, row_exists, STUDENT_SELECT_SQL,
};
use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::datetime::format_datetime;
use crate::model::enrollment::Enrollment;
use crate::model::student::{Student, StudentId};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

const ENTITY: &str = "Student";

/// Repository interface for student records.
pub trait StudentRepository {
    /// All students ascending by id, each with nested enrollments.
    fn list_students(&self) -> RepoResult<Vec<Student>>;
    /// Point lookup with nested enrollments.
    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>>;
    /// Inserts with a store-generated id, together with any nested
    /// enrollments, and returns the persisted record.
    fn create_student(&self, student: &Student) -> RepoResult<Student>;
    /// Full-record overwrite guarded by identity and row version.
    fn replace_student(&self, id: StudentId, student: &Student) -> RepoResult<Student>;
    /// Deletes the student and its enrollments, returning the prior snapshot.
    fn delete_student(&self, id: StudentId) -> RepoResult<Student>;
    fn student_exists(&self, id: StudentId) -> RepoResult<bool>;
}

/// SQLite-backed student repository over a caller-owned connection.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn list_students(&self) -> RepoResult<Vec<Student>> {
        read_consistent(self.conn, |conn| {
            let mut enrollments = load_enrollments_by_student(conn)?;
            let mut stmt = conn.prepare(&format!("{STUDENT_SELECT_SQL} ORDER BY id ASC;"))?;
            let mut rows = stmt.query([])?;
            let mut students = Vec::new();

            while let Some(row) = rows.next()? {
                let mut student = parse_student_row(row)?;
                student.enrollments = enrollments.remove(&student.id).unwrap_or_default();
                students.push(student);
            }

            Ok(students)
        })
    }

    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>> {
        read_consistent(self.conn, |conn| load_student(conn, id))
    }

    fn create_student(&self, student: &Student) -> RepoResult<Student> {
        student.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO students (
                last_name,
                first_mid_name,
                enrollment_date,
                row_version
            ) VALUES (?1, ?2, ?3, 1);",
            params![
                student.last_name.as_str(),
                student.first_mid_name.as_str(),
                format_datetime(&student.enrollment_date),
            ],
        )?;
        let id = tx.last_insert_rowid();

        // Nested enrollments belong to the new row whatever StudentID they carry.
        for enrollment in &student.enrollments {
            let enrollment = Enrollment {
                student_id: id,
                ..enrollment.clone()
            };
            enrollment.validate()?;
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
                params![enrollment.course_id, id, enrollment.grade],
            )?;
        }

        let enrollments = load_enrollments_for_student(&tx, id)?;
        tx.commit()?;

        Ok(Student {
            id,
            row_version: 1,
            enrollments,
            ..student.clone()
        })
    }

    fn replace_student(&self, id: StudentId, student: &Student) -> RepoResult<Student> {
        if student.id != id {
            return Err(RepoError::IdentityMismatch {
                path_id: id,
                body_id: student.id,
            });
        }
        student.validate()?;

        // A zero token means the caller never read a version: only the
        // row's existence is checked.
        let new_version: Option<i64> = self
            .conn
            .query_row(
                "UPDATE students
                 SET
                    last_name = ?1,
                    first_mid_name = ?2,
                    enrollment_date = ?3,
                    row_version = row_version + 1
                 WHERE id = ?4
                   AND (?5 = 0 OR row_version = ?5)
                 RETURNING row_version;",
                params![
                    student.last_name.as_str(),
                    student.first_mid_name.as_str(),
                    format_datetime(&student.enrollment_date),
                    id,
                    student.row_version,
                ],
                |row| row.get(0),
            )
            .optional()?;

        let Some(row_version) = new_version else {
            return Err(RepoError::ConcurrencyConflict { entity: ENTITY, id });
        };

        Ok(Student {
            row_version,
            enrollments: load_enrollments_for_student(self.conn, id)?,
            ..student.clone()
        })
    }

    fn delete_student(&self, id: StudentId) -> RepoResult<Student> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(snapshot) = load_student(&tx, id)? else {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        };

        tx.execute("DELETE FROM enrollments WHERE student_id = ?1;", [id])?;
        tx.execute("DELETE FROM students WHERE id = ?1;", [id])?;
        tx.commit()?;

        Ok(snapshot)
    }

    fn student_exists(&self, id: StudentId) -> RepoResult<bool> {
        row_exists(self.conn, "SELECT 1 FROM students WHERE id = ?1;", id)
    }
}

#[cfg(test)]
mod tests {
    use super::{SqliteStudentRepository, StudentRepository};
    use crate::db::open_db_in_memory;
    use crate::model::course::Course;
    use crate::model::datetime::parse_datetime;
    use crate::model::enrollment::Enrollment;
    use crate::model::student::Student;
    use crate::repo::course_repo::{CourseRepository, SqliteCourseRepository};
    use crate::repo::RepoError;
    use rusqlite::Connection;

    fn student(last: &str, first: &str) -> Student {
        Student::new(last, first, parse_datetime("2019-09-01").expect("valid date"))
    }

    #[test]
    fn unmigrated_connection_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteStudentRepository::try_new(&conn)
            .err()
            .expect("raw connection must be rejected");
        assert!(matches!(err, RepoError::UninitializedConnection { .. }));
    }

    #[test]
    fn replace_bumps_row_version() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteStudentRepository::try_new(&conn).unwrap();
        let created = repo.create_student(&student("Alexander", "Carson")).unwrap();
        assert_eq!(created.row_version, 1);

        let mut edited = created.clone();
        edited.first_mid_name = "Carsen".to_string();
        let replaced = repo.replace_student(created.id, &edited).unwrap();
        assert_eq!(replaced.row_version, 2);

        let loaded = repo.get_student(created.id).unwrap().unwrap();
        assert_eq!(loaded.first_mid_name, "Carsen");
        assert_eq!(loaded.row_version, 2);
    }

    #[test]
    fn replace_with_stale_version_conflicts_without_writing() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteStudentRepository::try_new(&conn).unwrap();
        let created = repo.create_student(&student("Alonso", "Meredith")).unwrap();

        let mut first = created.clone();
        first.last_name = "Alonso-Smith".to_string();
        repo.replace_student(created.id, &first).unwrap();

        let mut stale = created.clone();
        stale.last_name = "Overwritten".to_string();
        let err = repo.replace_student(created.id, &stale).unwrap_err();
        assert!(matches!(
            err,
            RepoError::ConcurrencyConflict { id, .. } if id == created.id
        ));

        let loaded = repo.get_student(created.id).unwrap().unwrap();
        assert_eq!(loaded.last_name, "Alonso-Smith");
    }

    #[test]
    fn create_persists_nested_enrollments_with_the_student() {
        let conn = open_db_in_memory().unwrap();
        SqliteCourseRepository::try_new(&conn)
            .unwrap()
            .create_course(&Course::new(1050, "Chemistry", 3))
            .unwrap();
        let repo = SqliteStudentRepository::try_new(&conn).unwrap();

        let mut input = student("Alexander", "Carson");
        input.enrollments.push(Enrollment::new(1050, 0, Some(0)));
        let created = repo.create_student(&input).unwrap();

        assert_eq!(created.enrollments.len(), 1);
        assert_eq!(created.enrollments[0].student_id, created.id);
        assert_eq!(
            created.enrollments[0].course.as_ref().map(|c| c.title.as_str()),
            Some("Chemistry")
        );
        let loaded = repo.get_student(created.id).unwrap().unwrap();
        assert_eq!(loaded.enrollments, created.enrollments);
    }

    #[test]
    fn create_with_unknown_course_writes_nothing() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteStudentRepository::try_new(&conn).unwrap();

        let mut input = student("Anand", "Arturo");
        input.enrollments.push(Enrollment::new(9999, 0, None));
        let err = repo.create_student(&input).unwrap_err();

        assert!(matches!(
            err,
            RepoError::MissingReference { entity: "Course", id: 9999 }
        ));
        assert!(repo.list_students().unwrap().is_empty());
    }
}
