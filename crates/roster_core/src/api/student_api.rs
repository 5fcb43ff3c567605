//! Student route handlers.

use super::ApiResponse;
use crate::model::student::{Student, StudentId};
use crate::repo::student_repo::SqliteStudentRepository;
use crate::service::student_service::{
    RecordOutcome, StudentService, StudentServiceError, StudentServiceResult,
};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;

/// `GET /api/Student`
pub fn list_students(conn: &Connection) -> ApiResponse {
    with_service(conn, |service| respond(service.list_students()))
}

/// `GET /api/Student/{id}`
pub fn get_student(conn: &Connection, id: StudentId) -> ApiResponse {
    with_service(conn, |service| respond(service.get_student(id)))
}

/// `PUT /api/Student/{id}` with a full student payload.
pub fn update_student(conn: &Connection, id: StudentId, body: Option<&str>) -> ApiResponse {
    let student = match parse_student(body) {
        Ok(student) => student,
        Err(response) => return response,
    };
    with_service(conn, |service| respond(service.update_student(id, &student)))
}

/// `POST /api/Student`; any `ID` in the payload is ignored.
pub fn create_student(conn: &Connection, body: Option<&str>) -> ApiResponse {
    let student = match parse_student(body) {
        Ok(student) => student,
        Err(response) => return response,
    };
    with_service(conn, |service| {
        let mut response = respond(service.create_student(&student));
        if response.status == 201 {
            response.location = response
                .body
                .get("ID")
                .and_then(Value::as_i64)
                .map(|id| format!("/api/Student/{id}"));
        }
        response
    })
}

/// `DELETE /api/Student/{id}`
pub fn delete_student(conn: &Connection, id: StudentId) -> ApiResponse {
    with_service(conn, |service| respond(service.delete_student(id)))
}

fn with_service<F>(conn: &Connection, handler: F) -> ApiResponse
where
    F: FnOnce(&StudentService<SqliteStudentRepository<'_>>) -> ApiResponse,
{
    match SqliteStudentRepository::try_new(conn) {
        Ok(repo) => handler(&StudentService::new(repo)),
        Err(err) => ApiResponse::error(500, "server_error", err.to_string()),
    }
}

fn parse_student(body: Option<&str>) -> Result<Student, ApiResponse> {
    let Some(raw) = body.filter(|raw| !raw.trim().is_empty()) else {
        return Err(ApiResponse::error(
            400,
            "bad_request",
            "request body must contain a student",
        ));
    };
    serde_json::from_str(raw).map_err(|err| {
        ApiResponse::error(400, "bad_request", format!("invalid student payload: {err}"))
    })
}

fn respond<T: Serialize>(result: StudentServiceResult<T>) -> ApiResponse {
    match result {
        Ok(RecordOutcome::Ok(value)) => to_json(200, &value),
        Ok(RecordOutcome::Created(value)) => to_json(201, &value),
        Ok(RecordOutcome::BadRequest(message)) => ApiResponse::error(400, "bad_request", message),
        Ok(RecordOutcome::NotFound(id)) => {
            ApiResponse::error(404, "not_found", format!("student not found: {id}"))
        }
        Err(err @ StudentServiceError::Conflict(_)) => {
            ApiResponse::error(409, "conflict", err.to_string())
        }
        Err(err @ StudentServiceError::Repo(_)) => {
            ApiResponse::error(500, "server_error", err.to_string())
        }
    }
}

fn to_json<T: Serialize>(status: u16, value: &T) -> ApiResponse {
    match serde_json::to_value(value) {
        Ok(body) => ApiResponse::json(status, body),
        Err(err) => ApiResponse::error(500, "server_error", err.to_string()),
    }
}
