//! Route tests driven through `warp::test`.

use std::sync::Arc;

use serde_json::{json, Value};
use warp::http::StatusCode;
use warp::Filter;

use super::routes::handle_rejection;
use super::web_server::WebServer;
use crate::employees::EmployeeService;
use crate::records::RecordService;
use crate::storage::storage_trait::Storage;
use crate::storage::test_support::seeded;
use crate::storage::types::{AcademicRecordEdit, Course, Student};

async fn server() -> WebServer {
    let _ = env_logger::builder().is_test(true).try_init();
    let storage = Arc::new(seeded().await);
    WebServer::new(
        Arc::new(RecordService::new(storage.clone())),
        Arc::new(EmployeeService::new(storage)),
    )
}

fn body<B: AsRef<[u8]>>(res: &warp::http::Response<B>) -> Value {
    serde_json::from_slice(res.body().as_ref()).unwrap()
}

#[tokio::test]
async fn test_index_serves_html() {
    let server = server().await;
    let res = warp::test::request()
        .path("/")
        .reply(&server.routes())
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));

    let css = warp::test::request()
        .path("/assets/style.css")
        .reply(&server.routes())
        .await;
    assert_eq!(css.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_listing_honours_sort_query() {
    let server = server().await;
    let res = warp::test::request()
        .path("/academic-records?sortColumn=Grade&sortDirection=desc")
        .reply(&server.routes())
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let grades: Vec<Value> = body(&res)
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["grade"].clone())
        .collect();
    assert_eq!(grades, vec![Value::Null, json!(90), json!(70)]);
}

#[tokio::test]
async fn test_bulk_edit_status_codes() {
    let server = server().await;
    let routes = server.routes();

    let rejected = warp::test::request()
        .method("PUT")
        .path("/academic-records")
        .json(&json!([
            { "studentId": "S1", "courseCode": "C1", "grade": 105 },
            { "studentId": "S2", "courseCode": "C1", "grade": 80 }
        ]))
        .reply(&routes)
        .await;
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = body(&rejected);
    assert_eq!(payload["errors"][0]["row"], json!(0));
    assert_eq!(payload["errors"][0]["field"], json!("grade"));

    let accepted = warp::test::request()
        .method("PUT")
        .path("/academic-records")
        .json(&json!([
            { "studentId": "S1", "courseCode": "C1", "grade": 100 },
            { "studentId": "S3", "courseCode": "C2" }
        ]))
        .reply(&routes)
        .await;
    assert_eq!(accepted.status(), StatusCode::OK);
    assert_eq!(body(&accepted), json!({ "submitted": 2, "updated": 1 }));
}

#[tokio::test]
async fn test_bulk_edit_reports_oversized_grade_per_row() {
    let server = server().await;
    let routes = server.routes();

    let rejected = warp::test::request()
        .method("PUT")
        .path("/academic-records")
        .json(&json!([
            { "studentId": "S1", "courseCode": "C1", "grade": 3000000000u64 },
            { "studentId": "S2", "courseCode": "C1", "grade": 80 }
        ]))
        .reply(&routes)
        .await;
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = body(&rejected);
    assert_eq!(payload["errors"].as_array().map(Vec::len), Some(1));
    assert_eq!(payload["errors"][0]["row"], json!(0));
    assert_eq!(payload["errors"][0]["field"], json!("grade"));
    assert_eq!(payload["errors"][0]["reason"], json!("grade out of range"));

    let edited = warp::test::request()
        .method("PUT")
        .path("/academic-records/S1/C1")
        .json(&json!({ "studentId": "S1", "courseCode": "C1", "grade": 3000000000u64 }))
        .reply(&routes)
        .await;
    assert_eq!(edited.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body(&edited)["errors"][0]["reason"], json!("grade out of range"));
}

#[tokio::test]
async fn test_record_crud_status_codes() {
    let server = server().await;
    let routes = server.routes();

    let created = warp::test::request()
        .method("POST")
        .path("/academic-records")
        .json(&json!({ "studentId": "S2", "courseCode": "C2", "grade": 61 }))
        .reply(&routes)
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(body(&created)["course"]["title"], json!("Networks"));

    let mismatch = warp::test::request()
        .method("PUT")
        .path("/academic-records/S2/C2")
        .json(&json!({ "studentId": "S1", "courseCode": "C2", "grade": 62 }))
        .reply(&routes)
        .await;
    assert_eq!(mismatch.status(), StatusCode::NOT_FOUND);

    let edited = warp::test::request()
        .method("PUT")
        .path("/academic-records/S2/C2")
        .json(&json!({ "studentId": "S2", "courseCode": "C2", "grade": 62 }))
        .reply(&routes)
        .await;
    assert_eq!(edited.status(), StatusCode::OK);
    assert_eq!(body(&edited)["grade"], json!(62));

    let deleted = warp::test::request()
        .method("DELETE")
        .path("/academic-records/S2/C2")
        .reply(&routes)
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = warp::test::request()
        .path("/academic-records/S2/C2")
        .reply(&routes)
        .await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_employee_routes() {
    let server = server().await;
    let routes = server.routes();

    let created = warp::test::request()
        .method("POST")
        .path("/employees")
        .json(&json!({
            "name": "Ada Lovelace",
            "userName": "alovelace",
            "password": "secret1",
            "selectedRoles": [1, 2]
        }))
        .reply(&routes)
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let employee = body(&created);
    assert!(employee.get("password").is_none());
    let id = employee["id"].as_i64().unwrap();

    let no_roles = warp::test::request()
        .method("PUT")
        .path(&format!("/employees/{}", id))
        .json(&json!({
            "id": id,
            "name": "Ada Lovelace",
            "userName": "alovelace",
            "password": "secret1",
            "selectedRoles": []
        }))
        .reply(&routes)
        .await;
    assert_eq!(no_roles.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body(&no_roles)["errors"][0]["field"], json!("roles"));

    let roles = warp::test::request().path("/roles").reply(&routes).await;
    assert_eq!(body(&roles).as_array().unwrap().len(), 3);

    let deleted = warp::test::request()
        .method("DELETE")
        .path(&format!("/employees/{}", id))
        .reply(&routes)
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_rejections_become_api_errors() {
    let server = server().await;
    let routes = server.routes().recover(handle_rejection);

    let missing = warp::test::request()
        .path("/nowhere")
        .reply(&routes)
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(&missing)["message"], json!("Not found"));

    let malformed = warp::test::request()
        .method("POST")
        .path("/academic-records")
        .header("content-type", "application/json")
        .body("{not json")
        .reply(&routes)
        .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_record_routes_decode_key_segments() {
    let _ = env_logger::builder().is_test(true).try_init();
    let storage = Arc::new(seeded().await);
    storage
        .seed_student(&Student {
            id: "S 4".into(),
            name: "Di Eng".into(),
        })
        .await
        .unwrap();
    storage
        .seed_course(&Course {
            code: "C/3".into(),
            title: "Compilers".into(),
        })
        .await
        .unwrap();
    storage
        .insert_record(&AcademicRecordEdit {
            student_id: "S 4".into(),
            course_code: "C/3".into(),
            grade: Some(64),
        })
        .await
        .unwrap();
    let server = WebServer::new(
        Arc::new(RecordService::new(storage.clone())),
        Arc::new(EmployeeService::new(storage)),
    );
    let routes = server.routes();

    let found = warp::test::request()
        .path("/academic-records/S%204/C%2F3")
        .reply(&routes)
        .await;
    assert_eq!(found.status(), StatusCode::OK);
    assert_eq!(body(&found)["grade"], json!(64));

    let edited = warp::test::request()
        .method("PUT")
        .path("/academic-records/S%204/C%2F3")
        .json(&json!({ "studentId": "S 4", "courseCode": "C/3", "grade": 65 }))
        .reply(&routes)
        .await;
    assert_eq!(edited.status(), StatusCode::OK);
    assert_eq!(body(&edited)["grade"], json!(65));

    let deleted = warp::test::request()
        .method("DELETE")
        .path("/academic-records/S%204/C%2F3")
        .reply(&routes)
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = warp::test::request()
        .path("/academic-records/S%204/C%2F3")
        .reply(&routes)
        .await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}
