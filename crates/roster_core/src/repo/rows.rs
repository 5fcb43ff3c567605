//! Row decoding and the explicit joins that populate nested collections.

use super::{RepoError, RepoResult};
use crate::model::course::{Course, CourseId};
use crate::model::datetime::parse_datetime;
use crate::model::enrollment::Enrollment;
use crate::model::student::{Student, StudentId};
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;

pub(crate) const STUDENT_SELECT_SQL: &str = "SELECT
    id,
    last_name,
    first_mid_name,
    enrollment_date,
    row_version
FROM students";

pub(crate) const COURSE_SELECT_SQL: &str = "SELECT
    course_id,
    title,
    credits
FROM courses";

// Enrollment joined with its course; `Student` stays unpopulated to avoid
// cycles when nested under a student.
const ENROLLMENT_WITH_COURSE_SQL: &str = "SELECT
    e.enrollment_id AS enrollment_id,
    e.course_id AS course_id,
    e.student_id AS student_id,
    e.grade AS grade,
    c.title AS course_title,
    c.credits AS course_credits
FROM enrollments e
JOIN courses c ON c.course_id = e.course_id";

pub(crate) fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let date_text: String = row.get("enrollment_date")?;
    Ok(Student {
        id: row.get("id")?,
        last_name: row.get("last_name")?,
        first_mid_name: row.get("first_mid_name")?,
        enrollment_date: parse_stored_datetime(&date_text)?,
        row_version: row.get("row_version")?,
        enrollments: Vec::new(),
    })
}

pub(crate) fn parse_course_row(row: &Row<'_>) -> RepoResult<Course> {
    Ok(Course {
        course_id: row.get("course_id")?,
        title: row.get("title")?,
        credits: row.get("credits")?,
        enrollments: Vec::new(),
    })
}

fn parse_enrollment_with_course_row(row: &Row<'_>) -> RepoResult<Enrollment> {
    let course_id: CourseId = row.get("course_id")?;
    Ok(Enrollment {
        enrollment_id: row.get("enrollment_id")?,
        course_id,
        student_id: row.get("student_id")?,
        grade: row.get("grade")?,
        course: Some(Course {
            course_id,
            title: row.get("course_title")?,
            credits: row.get("course_credits")?,
            enrollments: Vec::new(),
        }),
        student: None,
    })
}

fn parse_stored_datetime(value: &str) -> RepoResult<NaiveDateTime> {
    parse_datetime(value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{value}` in students.enrollment_date"
        ))
    })
}

/// Runs a multi-statement read against one snapshot.
///
/// The deferred transaction holds a shared lock from the first read until
/// commit, so no writer can land between the statements inside `read`.
pub(crate) fn read_consistent<T>(
    conn: &Connection,
    read: impl FnOnce(&Connection) -> RepoResult<T>,
) -> RepoResult<T> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Deferred)?;
    let value = read(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Loads one student with its enrollments, or `None` when absent.
///
/// Issues two statements; callers outside a transaction wrap it in
/// [`read_consistent`].
pub(crate) fn load_student(conn: &Connection, id: StudentId) -> RepoResult<Option<Student>> {
    let mut stmt = conn.prepare(&format!("{STUDENT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let mut student = parse_student_row(row)?;
    student.enrollments = load_enrollments_for_student(conn, id)?;
    Ok(Some(student))
}

/// Enrollments owned by one student, ordered by `enrollment_id`.
pub(crate) fn load_enrollments_for_student(
    conn: &Connection,
    student_id: StudentId,
) -> RepoResult<Vec<Enrollment>> {
    let mut stmt = conn.prepare(&format!(
        "{ENROLLMENT_WITH_COURSE_SQL}
         WHERE e.student_id = ?1
         ORDER BY e.enrollment_id ASC;"
    ))?;
    let mut rows = stmt.query([student_id])?;
    let mut enrollments = Vec::new();
    while let Some(row) = rows.next()? {
        enrollments.push(parse_enrollment_with_course_row(row)?);
    }
    Ok(enrollments)
}

/// All enrollments grouped by owning student, in one join.
pub(crate) fn load_enrollments_by_student(
    conn: &Connection,
) -> RepoResult<HashMap<StudentId, Vec<Enrollment>>> {
    let mut stmt = conn.prepare(&format!(
        "{ENROLLMENT_WITH_COURSE_SQL}
         ORDER BY e.student_id ASC, e.enrollment_id ASC;"
    ))?;
    let mut rows = stmt.query([])?;
    let mut grouped: HashMap<StudentId, Vec<Enrollment>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let enrollment = parse_enrollment_with_course_row(row)?;
        grouped
            .entry(enrollment.student_id)
            .or_default()
            .push(enrollment);
    }
    Ok(grouped)
}

/// Loads one enrollment with its course projection.
pub(crate) fn load_enrollment(conn: &Connection, id: i64) -> RepoResult<Option<Enrollment>> {
    let mut stmt = conn.prepare(&format!(
        "{ENROLLMENT_WITH_COURSE_SQL} WHERE e.enrollment_id = ?1;"
    ))?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_enrollment_with_course_row(row)?)),
        None => Ok(None),
    }
}

/// Enrollments owned by one course, each with its student projection.
pub(crate) fn load_enrollments_for_course(
    conn: &Connection,
    course_id: CourseId,
) -> RepoResult<Vec<Enrollment>> {
    let mut stmt = conn.prepare(
        "SELECT
            e.enrollment_id AS enrollment_id,
            e.course_id AS course_id,
            e.student_id AS student_id,
            e.grade AS grade,
            s.id AS id,
            s.last_name AS last_name,
            s.first_mid_name AS first_mid_name,
            s.enrollment_date AS enrollment_date,
            s.row_version AS row_version
         FROM enrollments e
         JOIN students s ON s.id = e.student_id
         WHERE e.course_id = ?1
         ORDER BY e.enrollment_id ASC;",
    )?;
    let mut rows = stmt.query([course_id])?;
    let mut enrollments = Vec::new();
    while let Some(row) = rows.next()? {
        let student = parse_student_row(row)?;
        enrollments.push(Enrollment {
            enrollment_id: row.get("enrollment_id")?,
            course_id: row.get("course_id")?,
            student_id: student.id,
            grade: row.get("grade")?,
            course: None,
            student: Some(Box::new(student)),
        });
    }
    Ok(enrollments)
}

pub(crate) fn row_exists(conn: &Connection, sql: &str, id: i64) -> RepoResult<bool> {
    let found = conn
        .query_row(sql, [id], |row| row.get::<_, i64>(0))
        .optional()?;
    Ok(found.is_some())
}
