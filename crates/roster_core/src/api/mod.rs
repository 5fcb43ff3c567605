//! HTTP-shaped request boundary.
//!
//! # Responsibility
//! - Map `(method, path, body)` onto record service calls.
//! - Map service outcomes onto status codes and JSON bodies.
//!
//! # Invariants
//! - Never panics; every failure becomes a response.
//! - One connection handle per request, borrowed from the caller.
//! - No server or socket handling lives here.

pub mod student_api;

use rusqlite::Connection;
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const STUDENT_COLLECTION: &str = "student";

/// HTTP verbs understood by the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl FromStr for Method {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!(
                "unsupported method `{other}`; expected GET|POST|PUT|DELETE"
            )),
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Response envelope handed back to the transport layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Identity of a newly created resource (`201` only).
    pub location: Option<String>,
    pub body: Value,
}

impl ApiResponse {
    pub(crate) fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            location: None,
            body,
        }
    }

    pub(crate) fn error(status: u16, kind: &str, message: impl Into<String>) -> Self {
        Self::json(
            status,
            json!({
                "error": kind,
                "message": message.into(),
            }),
        )
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Dispatches one request against the student routes.
///
/// Paths are matched case-insensitively on the collection name:
/// `/api/Student` and `/api/Student/{id}`.
pub fn handle_request(
    conn: &Connection,
    method: Method,
    path: &str,
    body: Option<&str>,
) -> ApiResponse {
    let segments: Vec<&str> = path
        .split('?')
        .next()
        .unwrap_or_default()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    match segments.as_slice() {
        [api, collection] if is_student_route(api, collection) => match method {
            Method::Get => student_api::list_students(conn),
            Method::Post => student_api::create_student(conn, body),
            Method::Put | Method::Delete => method_not_allowed(method, path),
        },
        [api, collection, raw_id] if is_student_route(api, collection) => {
            let Ok(id) = raw_id.parse::<i64>() else {
                return ApiResponse::error(
                    400,
                    "bad_request",
                    format!("student id must be an integer, got `{raw_id}`"),
                );
            };
            match method {
                Method::Get => student_api::get_student(conn, id),
                Method::Put => student_api::update_student(conn, id, body),
                Method::Delete => student_api::delete_student(conn, id),
                Method::Post => method_not_allowed(method, path),
            }
        }
        _ => ApiResponse::error(404, "not_found", format!("no route for `{path}`")),
    }
}

fn is_student_route(api: &str, collection: &str) -> bool {
    api.eq_ignore_ascii_case("api") && collection.eq_ignore_ascii_case(STUDENT_COLLECTION)
}

fn method_not_allowed(method: Method, path: &str) -> ApiResponse {
    ApiResponse::error(
        405,
        "method_not_allowed",
        format!("{method} is not supported on `{path}`"),
    )
}
