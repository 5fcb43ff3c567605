use roster_core::db::open_db_in_memory;
use roster_core::{
    handle_request, Course, CourseRepository, Enrollment, EnrollmentRepository, Method,
    SqliteCourseRepository, SqliteEnrollmentRepository,
};
use serde_json::{json, Value};

const CARSON: &str =
    r#"{"LastName":"Alexander","FirstMidName":"Carson","EnrollmentDate":"2019-09-01"}"#;

fn post_student(conn: &rusqlite::Connection, body: &str) -> Value {
    let response = handle_request(conn, Method::Post, "/api/Student", Some(body));
    assert_eq!(response.status, 201, "unexpected body: {}", response.body);
    response.body
}

#[test]
fn create_returns_201_with_location_and_empty_enrollments() {
    let conn = open_db_in_memory().unwrap();

    let response = handle_request(&conn, Method::Post, "/api/Student", Some(CARSON));
    assert_eq!(response.status, 201);
    assert_eq!(response.location.as_deref(), Some("/api/Student/1"));
    assert_eq!(
        response.body,
        json!({
            "ID": 1,
            "LastName": "Alexander",
            "FirstMidName": "Carson",
            "EnrollmentDate": "2019-09-01T00:00:00",
            "RowVersion": 1,
            "Enrollments": [],
        })
    );
}

#[test]
fn get_returns_nested_enrollments_and_404_for_missing() {
    let conn = open_db_in_memory().unwrap();
    post_student(&conn, CARSON);
    SqliteCourseRepository::try_new(&conn)
        .unwrap()
        .create_course(&Course::new(1050, "Chemistry", 3))
        .unwrap();
    let enrollment = SqliteEnrollmentRepository::try_new(&conn)
        .unwrap()
        .create_enrollment(&Enrollment::new(1050, 1, None))
        .unwrap();

    let response = handle_request(&conn, Method::Get, "/api/Student/1", None);
    assert_eq!(response.status, 200);
    let enrollments = response.body["Enrollments"].as_array().unwrap();
    assert_eq!(enrollments.len(), 1);
    assert_eq!(enrollments[0]["EnrollmentID"], enrollment.enrollment_id);
    assert_eq!(enrollments[0]["CourseID"], 1050);
    assert!(enrollments[0]["Grade"].is_null());
    assert_eq!(enrollments[0]["Course"]["Title"], "Chemistry");
    assert!(enrollments[0]["Student"].is_null());

    let missing = handle_request(&conn, Method::Get, "/api/Student/2", None);
    assert_eq!(missing.status, 404);
    assert_eq!(missing.body["error"], "not_found");
}

#[test]
fn list_is_sorted_by_id() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("PRAGMA reverse_unordered_selects = ON;")
        .unwrap();
    for (id, first) in [(7, "Carson"), (3, "Meredith"), (11, "Arturo")] {
        conn.execute(
            "INSERT INTO students (id, last_name, first_mid_name, enrollment_date)
             VALUES (?1, 'Student', ?2, '2019-09-01T00:00:00');",
            rusqlite::params![id, first],
        )
        .unwrap();
    }

    let response = handle_request(&conn, Method::Get, "/api/student", None);
    assert_eq!(response.status, 200);
    let ids: Vec<i64> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|student| student["ID"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 7, 11]);
}

#[test]
fn create_with_nested_enrollments_persists_them() {
    let conn = open_db_in_memory().unwrap();
    SqliteCourseRepository::try_new(&conn)
        .unwrap()
        .create_course(&Course::new(1050, "Chemistry", 3))
        .unwrap();

    let body = json!({
        "LastName": "Alexander",
        "FirstMidName": "Carson",
        "EnrollmentDate": "2019-09-01",
        "Enrollments": [{ "CourseID": 1050, "Grade": 0 }],
    })
    .to_string();
    let created = post_student(&conn, &body);
    assert_eq!(created["Enrollments"][0]["CourseID"], 1050);
    assert_eq!(created["Enrollments"][0]["StudentID"], created["ID"]);
    assert_eq!(created["Enrollments"][0]["Course"]["Title"], "Chemistry");

    let fetched = handle_request(&conn, Method::Get, "/api/Student/1", None);
    assert_eq!(fetched.body["Enrollments"], created["Enrollments"]);
}

#[test]
fn create_with_enrollment_in_unknown_course_is_400_and_writes_nothing() {
    let conn = open_db_in_memory().unwrap();

    let body = json!({
        "LastName": "Alexander",
        "FirstMidName": "Carson",
        "EnrollmentDate": "2019-09-01",
        "Enrollments": [{ "CourseID": 4041 }],
    })
    .to_string();
    let response = handle_request(&conn, Method::Post, "/api/Student", Some(&body));
    assert_eq!(response.status, 400);
    assert!(response.location.is_none());

    let listed = handle_request(&conn, Method::Get, "/api/Student", None);
    assert_eq!(listed.body, json!([]));
}

#[test]
fn put_with_mismatched_id_is_400_and_mutates_nothing() {
    let conn = open_db_in_memory().unwrap();
    let first = post_student(&conn, CARSON);
    let second = post_student(
        &conn,
        r#"{"LastName":"Alonso","FirstMidName":"Meredith","EnrollmentDate":"2017-09-01"}"#,
    );

    let body = json!({
        "ID": 2,
        "LastName": "Hijacked",
        "FirstMidName": "Name",
        "EnrollmentDate": "2000-01-01",
    })
    .to_string();
    let response = handle_request(&conn, Method::Put, "/api/Student/1", Some(&body));
    assert_eq!(response.status, 400);
    assert_eq!(response.body["error"], "bad_request");

    let after_first = handle_request(&conn, Method::Get, "/api/Student/1", None).body;
    let after_second = handle_request(&conn, Method::Get, "/api/Student/2", None).body;
    assert_eq!(after_first, first);
    assert_eq!(after_second, second);
}

#[test]
fn put_replaces_and_returns_updated_student() {
    let conn = open_db_in_memory().unwrap();
    post_student(&conn, CARSON);

    let body = json!({
        "ID": 1,
        "LastName": "Alexander",
        "FirstMidName": "Carsen",
        "EnrollmentDate": "2019-09-02T10:00:00",
        "RowVersion": 1,
    })
    .to_string();
    let response = handle_request(&conn, Method::Put, "/api/Student/1", Some(&body));
    assert_eq!(response.status, 200);
    assert_eq!(response.body["FirstMidName"], "Carsen");
    assert_eq!(response.body["EnrollmentDate"], "2019-09-02T10:00:00");
    assert_eq!(response.body["RowVersion"], 2);

    let stale = handle_request(&conn, Method::Put, "/api/Student/1", Some(&body));
    assert_eq!(stale.status, 409);
    assert_eq!(stale.body["error"], "conflict");
}

#[test]
fn put_on_missing_student_is_404() {
    let conn = open_db_in_memory().unwrap();
    let body = json!({
        "ID": 5,
        "LastName": "Ghost",
        "FirstMidName": "Row",
        "EnrollmentDate": "2019-09-01",
    })
    .to_string();
    let response = handle_request(&conn, Method::Put, "/api/Student/5", Some(&body));
    assert_eq!(response.status, 404);
}

#[test]
fn delete_returns_snapshot_then_404() {
    let conn = open_db_in_memory().unwrap();
    let created = post_student(&conn, CARSON);

    let response = handle_request(&conn, Method::Delete, "/api/Student/1", None);
    assert_eq!(response.status, 200);
    assert_eq!(response.body, created);

    let again = handle_request(&conn, Method::Delete, "/api/Student/1", None);
    assert_eq!(again.status, 404);
}

#[test]
fn malformed_or_invalid_payloads_are_400() {
    let conn = open_db_in_memory().unwrap();

    for body in [
        None,
        Some("not json"),
        Some(r#"{"LastName":"Alexander","EnrollmentDate":"2019-09-01"}"#),
        Some(r#"{"LastName":"Alexander","FirstMidName":"Carson","EnrollmentDate":"someday"}"#),
        Some(r#"{"LastName":" ","FirstMidName":"Carson","EnrollmentDate":"2019-09-01"}"#),
    ] {
        let response = handle_request(&conn, Method::Post, "/api/Student", body);
        assert_eq!(response.status, 400, "body {body:?} should be rejected");
    }

    let listed = handle_request(&conn, Method::Get, "/api/Student", None);
    assert_eq!(listed.body, json!([]));
}
