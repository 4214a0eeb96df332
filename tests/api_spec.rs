use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::NaiveDate;
use classroom::api::create_router;
use classroom::db::Database;
use classroom::models::*;
use serde_json::{json, Value};

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db);
    TestServer::new(app).expect("Failed to create test server")
}

fn student_input(first: &str) -> CreateStudentInput {
    CreateStudentInput {
        first_name: first.to_string(),
        last_name: "Lee".to_string(),
        email: format!("{}.lee@school.edu", first.to_lowercase()),
        grade: "10th Grade".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(2009, 4, 12).unwrap(),
        parent_contact: Some("555-0101".to_string()),
        notes: None,
        status: None,
    }
}

async fn create_test_student(server: &TestServer, first: &str) -> Student {
    server
        .post("/api/v1/students")
        .json(&student_input(first))
        .await
        .json::<Student>()
}

async fn create_test_assignment(server: &TestServer, name: &str, category: &str) -> Assignment {
    server
        .post("/api/v1/assignments")
        .json(&CreateAssignmentInput {
            name: name.to_string(),
            category: category.to_string(),
            total_points: 50.0,
            due_date: NaiveDate::from_ymd_opt(2024, 3, 15),
            weight: Some(20.0),
        })
        .await
        .json::<Assignment>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();

        let response = server.get("/api/v1/health").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }
}

mod students {
    use super::*;

    #[tokio::test]
    async fn returns_empty_list_initially() {
        let server = setup();

        let response = server.get("/api/v1/students").await;

        response.assert_status_ok();
        let students: Vec<Student> = response.json();
        assert!(students.is_empty());
    }

    #[tokio::test]
    async fn creates_a_student() {
        let server = setup();

        let response = server
            .post("/api/v1/students")
            .json(&student_input("Ana"))
            .await;

        response.assert_status(StatusCode::CREATED);
        let student: Student = response.json();
        assert!(student.id > 0);
        assert_eq!(student.full_name(), "Ana Lee");
        assert_eq!(student.status, StudentStatus::Active);
    }

    #[tokio::test]
    async fn serialises_status_and_dates_as_plain_strings() {
        let server = setup();
        let student = create_test_student(&server, "Ana").await;

        let body: Value = server
            .get(&format!("/api/v1/students/{}", student.id))
            .await
            .json();

        assert_eq!(body["status"], "active");
        assert_eq!(body["date_of_birth"], "2009-04-12");
    }

    #[tokio::test]
    async fn rejects_missing_required_fields() {
        let server = setup();

        let response = server
            .post("/api/v1/students")
            .json(&CreateStudentInput {
                first_name: String::new(),
                email: "not-an-email".to_string(),
                ..student_input("Ana")
            })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let text = response.text();
        assert!(text.contains("First name is required"));
        assert!(text.contains("Invalid email format"));

        let students: Vec<Student> = server.get("/api/v1/students").await.json();
        assert!(students.is_empty());
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let server = setup();

        let response = server
            .post("/api/v1/students")
            .json(&json!({ "first_name": "Ana" }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn returns_404_for_missing_student() {
        let server = setup();

        let response = server.get("/api/v1/students/999").await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.text(), "Student not found");
    }

    #[tokio::test]
    async fn updates_only_given_fields() {
        let server = setup();
        let student = create_test_student(&server, "Ana").await;

        let response = server
            .put(&format!("/api/v1/students/{}", student.id))
            .json(&UpdateStudentInput {
                status: Some(StudentStatus::Inactive),
                ..Default::default()
            })
            .await;

        response.assert_status_ok();
        let updated: Student = response.json();
        assert_eq!(updated.status, StudentStatus::Inactive);
        assert_eq!(updated.email, student.email);
    }

    #[tokio::test]
    async fn update_validates_present_fields() {
        let server = setup();
        let student = create_test_student(&server, "Ana").await;

        let response = server
            .put(&format!("/api/v1/students/{}", student.id))
            .json(&UpdateStudentInput {
                email: Some("nope".to_string()),
                ..Default::default()
            })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_of_missing_student_returns_404() {
        let server = setup();

        let response = server
            .put("/api/v1/students/999")
            .json(&UpdateStudentInput::default())
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deletes_a_student() {
        let server = setup();
        let student = create_test_student(&server, "Ana").await;

        let response = server
            .delete(&format!("/api/v1/students/{}", student.id))
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = server
            .delete(&format!("/api/v1/students/{}", student.id))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn filters_by_status() {
        let server = setup();
        create_test_student(&server, "Ana").await;
        server
            .post("/api/v1/students")
            .json(&CreateStudentInput {
                status: Some(StudentStatus::Pending),
                ..student_input("Dev")
            })
            .await
            .assert_status(StatusCode::CREATED);

        let pending: Vec<Student> = server
            .get("/api/v1/students")
            .add_query_param("status", "pending")
            .await
            .json();

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].first_name, "Dev");
    }
}

mod assignments {
    use super::*;

    #[tokio::test]
    async fn rejects_non_positive_points() {
        let server = setup();

        let response = server
            .post("/api/v1/assignments")
            .json(&CreateAssignmentInput {
                name: "Quiz".to_string(),
                category: "Mathematics".to_string(),
                total_points: 0.0,
                due_date: None,
                weight: None,
            })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.text().contains("Total points must be greater than zero"));
    }

    #[tokio::test]
    async fn filters_by_category() {
        let server = setup();
        create_test_assignment(&server, "Lab Report", "Science").await;
        create_test_assignment(&server, "Essay", "English").await;

        let science: Vec<Assignment> = server
            .get("/api/v1/assignments")
            .add_query_param("category", "Science")
            .await
            .json();

        assert_eq!(science.len(), 1);
        assert_eq!(science[0].name, "Lab Report");
    }
}

mod grades {
    use super::*;

    #[tokio::test]
    async fn embeds_names_of_existing_references() {
        let server = setup();
        let student = create_test_student(&server, "Ana").await;
        let assignment = create_test_assignment(&server, "Lab Report", "Science").await;

        let response = server
            .post("/api/v1/grades")
            .json(&CreateGradeInput {
                student_id: student.id,
                assignment_id: assignment.id,
                score: 45.0,
                submitted_date: None,
                comments: Some("Neat work".to_string()),
            })
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(
            body["student_id"],
            json!({ "Id": student.id, "Name": "Ana Lee" })
        );
        assert_eq!(
            body["assignment_id"],
            json!({ "Id": assignment.id, "Name": "Lab Report" })
        );
        assert!(body["submitted_date"].is_string());
    }

    #[tokio::test]
    async fn sends_a_bare_id_for_a_dangling_reference() {
        let server = setup();
        let assignment = create_test_assignment(&server, "Lab Report", "Science").await;

        let grade: Value = server
            .post("/api/v1/grades")
            .json(&CreateGradeInput {
                student_id: 42,
                assignment_id: assignment.id,
                score: 30.0,
                submitted_date: None,
                comments: None,
            })
            .await
            .json();

        assert_eq!(grade["student_id"], json!(42));

        let parsed: Grade = serde_json::from_value(grade).expect("grade should parse");
        assert_eq!(parsed.student, Link::bare(42));
    }

    #[tokio::test]
    async fn requires_references() {
        let server = setup();

        let response = server
            .post("/api/v1/grades")
            .json(&CreateGradeInput {
                student_id: 0,
                assignment_id: 0,
                score: 10.0,
                submitted_date: None,
                comments: None,
            })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn filters_by_student() {
        let server = setup();
        let ana = create_test_student(&server, "Ana").await;
        let bob = create_test_student(&server, "Bob").await;
        let assignment = create_test_assignment(&server, "Lab Report", "Science").await;

        for student in [&ana, &bob] {
            server
                .post("/api/v1/grades")
                .json(&CreateGradeInput {
                    student_id: student.id,
                    assignment_id: assignment.id,
                    score: 40.0,
                    submitted_date: None,
                    comments: None,
                })
                .await
                .assert_status(StatusCode::CREATED);
        }

        let grades: Vec<Grade> = server
            .get("/api/v1/grades")
            .add_query_param("student_id", bob.id)
            .await
            .json();

        assert_eq!(grades.len(), 1);
        assert_eq!(grades[0].student, Link::named(bob.id, "Bob Lee"));
    }
}

mod attendance {
    use super::*;

    #[tokio::test]
    async fn defaults_status_and_filters_by_date() {
        let server = setup();
        let student = create_test_student(&server, "Ana").await;

        let first: Attendance = server
            .post("/api/v1/attendance")
            .json(&CreateAttendanceInput {
                student_id: student.id,
                date: NaiveDate::from_ymd_opt(2024, 3, 1),
                status: None,
                notes: None,
            })
            .await
            .json();
        assert_eq!(first.status, AttendanceStatus::Present);

        server
            .post("/api/v1/attendance")
            .json(&CreateAttendanceInput {
                student_id: student.id,
                date: NaiveDate::from_ymd_opt(2024, 3, 2),
                status: Some(AttendanceStatus::Late),
                notes: None,
            })
            .await
            .assert_status(StatusCode::CREATED);

        let records: Vec<Attendance> = server
            .get("/api/v1/attendance")
            .add_query_param("date", "2024-03-02")
            .await
            .json();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AttendanceStatus::Late);
    }
}

mod auth {
    use super::*;
    use classroom::api::{create_router_with_config, ApiConfig};

    fn setup_with_auth(api_key: &str) -> TestServer {
        let db = Database::open_memory().expect("Failed to create database");
        db.migrate().expect("Failed to migrate");
        let app = create_router_with_config(db, ApiConfig::with_api_key(api_key));
        TestServer::new(app).expect("Failed to create test server")
    }

    #[tokio::test]
    async fn health_endpoint_is_accessible_without_auth() {
        let server = setup_with_auth("test-secret-key");

        let response = server.get("/api/v1/health").await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn table_endpoint_requires_auth() {
        let server = setup_with_auth("test-secret-key");

        let response = server.get("/api/v1/students").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn table_endpoint_accepts_valid_bearer_token() {
        let server = setup_with_auth("test-secret-key");

        let response = server
            .get("/api/v1/students")
            .add_header("Authorization", "Bearer test-secret-key")
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn table_endpoint_rejects_invalid_bearer_token() {
        let server = setup_with_auth("test-secret-key");

        let response = server
            .get("/api/v1/grades")
            .add_header("Authorization", "Bearer wrong-key")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn table_endpoint_rejects_malformed_auth_header() {
        let server = setup_with_auth("test-secret-key");

        let response = server
            .get("/api/v1/attendance")
            .add_header("Authorization", "Basic dXNlcjpwYXNz")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn post_endpoint_works_with_valid_auth() {
        let server = setup_with_auth("test-secret-key");

        let response = server
            .post("/api/v1/students")
            .add_header("Authorization", "Bearer test-secret-key")
            .json(&student_input("Ana"))
            .await;

        response.assert_status(StatusCode::CREATED);
    }
}
