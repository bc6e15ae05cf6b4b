use std::convert::Infallible;
use std::sync::Arc;

use log::{debug, error};
use rust_embed::RustEmbed;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::{Filter, Rejection, Reply};

use super::types::{ApiError, EmployeeForm, SortQuery};
use crate::employees::EmployeeService;
use crate::error_handling::types::{EmployeeError, RecordError};
use crate::records::{is_ascending, RecordService};
use crate::storage::types::{AcademicRecordEdit, RecordKey};

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/web/"]
struct Assets;

fn json_reply<T: serde::Serialize>(value: &T, status: StatusCode) -> Response {
    reply::with_status(reply::json(value), status).into_response()
}

fn record_error_reply(err: RecordError) -> Response {
    match err {
        RecordError::Validation(rejection) => json_reply(
            &ApiError::with_errors(
                "The submitted records are invalid",
                rejection.errors.into_iter().map(Into::into).collect(),
            ),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        RecordError::NotFound(key) => json_reply(
            &ApiError::new(format!("Academic record {} not found", key)),
            StatusCode::NOT_FOUND,
        ),
        RecordError::Concurrency(key) => json_reply(
            &ApiError::new(format!(
                "Academic record {} was changed by someone else; reload and try again",
                key
            )),
            StatusCode::CONFLICT,
        ),
        RecordError::Store(e) => {
            error!("Academic record request failed: {}", e);
            json_reply(
                &ApiError::new("Internal storage error"),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

fn employee_error_reply(err: EmployeeError) -> Response {
    match err {
        EmployeeError::Validation { errors, .. } => json_reply(
            &ApiError::with_errors(
                "The submitted employee is invalid",
                errors.into_iter().map(Into::into).collect(),
            ),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        EmployeeError::NotFound(id) => json_reply(
            &ApiError::new(format!("Employee {} not found", id)),
            StatusCode::NOT_FOUND,
        ),
        EmployeeError::Concurrency(id) => json_reply(
            &ApiError::new(format!(
                "Employee {} was changed by someone else; reload and try again",
                id
            )),
            StatusCode::CONFLICT,
        ),
        EmployeeError::Store(e) => {
            error!("Employee request failed: {}", e);
            json_reply(
                &ApiError::new("Internal storage error"),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

fn with_records(
    records: Arc<RecordService>,
) -> impl Filter<Extract = (Arc<RecordService>,), Error = Infallible> + Clone {
    warp::any().map(move || records.clone())
}

fn with_employees(
    employees: Arc<EmployeeService>,
) -> impl Filter<Extract = (Arc<EmployeeService>,), Error = Infallible> + Clone {
    warp::any().map(move || employees.clone())
}

fn embedded(path: &str) -> Option<Response> {
    let asset = Assets::get(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Some(reply::with_header(asset.data.into_owned(), "Content-Type", mime.as_ref()).into_response())
}

/// GET /
pub fn index_route() -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path::end().and(warp::get()).and_then(|| async move {
        embedded("index.html").ok_or_else(warp::reject::not_found)
    })
}

/// GET /assets/<file>
pub fn assets_route() -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path("assets")
        .and(warp::path::tail())
        .and(warp::get())
        .and_then(|tail: warp::path::Tail| async move {
            embedded(tail.as_str()).ok_or_else(warp::reject::not_found)
        })
}

/// GET /academic-records?sortColumn=&sortDirection=
pub fn list_records_route(
    records: Arc<RecordService>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path("academic-records")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<SortQuery>())
        .and(with_records(records))
        .and_then(|query: SortQuery, records: Arc<RecordService>| async move {
            let column = query.sort_column.unwrap_or_default();
            let ascending = is_ascending(query.sort_direction.as_deref());
            let res = match records.list_sorted(&column, ascending).await {
                Ok(list) => json_reply(&list, StatusCode::OK),
                Err(e) => record_error_reply(e),
            };
            Ok::<_, Rejection>(res)
        })
}

/// GET /academic-records/options
pub fn record_options_route(
    records: Arc<RecordService>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("academic-records" / "options")
        .and(warp::get())
        .and(with_records(records))
        .and_then(|records: Arc<RecordService>| async move {
            let res = match records.options().await {
                Ok(options) => json_reply(&options, StatusCode::OK),
                Err(e) => record_error_reply(e),
            };
            Ok::<_, Rejection>(res)
        })
}

/// `/academic-records/:student/:course` with both segments percent-decoded.
fn record_key_path() -> impl Filter<Extract = (RecordKey,), Error = Rejection> + Clone {
    warp::path!("academic-records" / String / String).and_then(
        |student: String, course: String| async move {
            match (urlencoding::decode(&student), urlencoding::decode(&course)) {
                (Ok(student), Ok(course)) => {
                    Ok(RecordKey::new(student.into_owned(), course.into_owned()))
                }
                _ => {
                    debug!("Undecodable record key {}/{}", student, course);
                    Err(warp::reject::not_found())
                }
            }
        },
    )
}

/// GET /academic-records/:student/:course
pub fn record_details_route(
    records: Arc<RecordService>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    record_key_path()
        .and(warp::get())
        .and(with_records(records))
        .and_then(
            |key: RecordKey, records: Arc<RecordService>| async move {
                let res = match records.details(&key).await {
                    Ok(record) => json_reply(&record, StatusCode::OK),
                    Err(e) => record_error_reply(e),
                };
                Ok::<_, Rejection>(res)
            },
        )
}

/// POST /academic-records
pub fn create_record_route(
    records: Arc<RecordService>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path("academic-records")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json::<AcademicRecordEdit>())
        .and(with_records(records))
        .and_then(
            |edit: AcademicRecordEdit, records: Arc<RecordService>| async move {
                let res = match records.create(edit).await {
                    Ok(record) => json_reply(&record, StatusCode::CREATED),
                    Err(e) => record_error_reply(e),
                };
                Ok::<_, Rejection>(res)
            },
        )
}

/// PUT /academic-records/:student/:course
pub fn edit_record_route(
    records: Arc<RecordService>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    record_key_path()
        .and(warp::put())
        .and(warp::body::json::<AcademicRecordEdit>())
        .and(with_records(records))
        .and_then(
            |key: RecordKey, edit: AcademicRecordEdit, records: Arc<RecordService>| async move {
                let res = match records.edit(&key, edit).await {
                    Ok(record) => json_reply(&record, StatusCode::OK),
                    Err(e) => record_error_reply(e),
                };
                Ok::<_, Rejection>(res)
            },
        )
}

/// DELETE /academic-records/:student/:course
pub fn delete_record_route(
    records: Arc<RecordService>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    record_key_path()
        .and(warp::delete())
        .and(with_records(records))
        .and_then(
            |key: RecordKey, records: Arc<RecordService>| async move {
                let res = match records.delete(&key).await {
                    Ok(()) => StatusCode::NO_CONTENT.into_response(),
                    Err(e) => record_error_reply(e),
                };
                Ok::<_, Rejection>(res)
            },
        )
}

/// PUT /academic-records with every row of the edit-all grid
pub fn bulk_edit_route(
    records: Arc<RecordService>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path("academic-records")
        .and(warp::path::end())
        .and(warp::put())
        .and(warp::body::json::<Vec<AcademicRecordEdit>>())
        .and(with_records(records))
        .and_then(
            |rows: Vec<AcademicRecordEdit>, records: Arc<RecordService>| async move {
                let res = match records.bulk_edit(rows).await {
                    Ok(summary) => json_reply(&summary, StatusCode::OK),
                    Err(e) => record_error_reply(e),
                };
                Ok::<_, Rejection>(res)
            },
        )
}

/// GET /employees
pub fn list_employees_route(
    employees: Arc<EmployeeService>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path("employees")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_employees(employees))
        .and_then(|employees: Arc<EmployeeService>| async move {
            let res = match employees.list().await {
                Ok(list) => json_reply(&list, StatusCode::OK),
                Err(e) => employee_error_reply(e),
            };
            Ok::<_, Rejection>(res)
        })
}

/// GET /employees/:id
pub fn employee_details_route(
    employees: Arc<EmployeeService>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("employees" / i32)
        .and(warp::get())
        .and(with_employees(employees))
        .and_then(|id: i32, employees: Arc<EmployeeService>| async move {
            let res = match employees.details(id).await {
                Ok(employee) => json_reply(&employee, StatusCode::OK),
                Err(e) => employee_error_reply(e),
            };
            Ok::<_, Rejection>(res)
        })
}

/// POST /employees
pub fn create_employee_route(
    employees: Arc<EmployeeService>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path("employees")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json::<EmployeeForm>())
        .and(with_employees(employees))
        .and_then(|form: EmployeeForm, employees: Arc<EmployeeService>| async move {
            let res = match employees.create(form.draft, &form.selected_roles).await {
                Ok(employee) => json_reply(&employee, StatusCode::CREATED),
                Err(e) => employee_error_reply(e),
            };
            Ok::<_, Rejection>(res)
        })
}

/// PUT /employees/:id
pub fn edit_employee_route(
    employees: Arc<EmployeeService>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("employees" / i32)
        .and(warp::put())
        .and(warp::body::json::<EmployeeForm>())
        .and(with_employees(employees))
        .and_then(
            |id: i32, form: EmployeeForm, employees: Arc<EmployeeService>| async move {
                let res = match employees
                    .edit(id, form.id, form.draft, &form.selected_roles)
                    .await
                {
                    Ok(employee) => json_reply(&employee, StatusCode::OK),
                    Err(e) => employee_error_reply(e),
                };
                Ok::<_, Rejection>(res)
            },
        )
}

/// DELETE /employees/:id
pub fn delete_employee_route(
    employees: Arc<EmployeeService>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("employees" / i32)
        .and(warp::delete())
        .and(with_employees(employees))
        .and_then(|id: i32, employees: Arc<EmployeeService>| async move {
            let res = match employees.delete(id).await {
                Ok(()) => StatusCode::NO_CONTENT.into_response(),
                Err(e) => employee_error_reply(e),
            };
            Ok::<_, Rejection>(res)
        })
}

/// GET /roles
pub fn roles_route(
    employees: Arc<EmployeeService>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path("roles")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_employees(employees))
        .and_then(|employees: Arc<EmployeeService>| async move {
            let res = match employees.roles().await {
                Ok(roles) => json_reply(&roles, StatusCode::OK),
                Err(e) => employee_error_reply(e),
            };
            Ok::<_, Rejection>(res)
        })
}

/// Turn unmatched routes and unreadable bodies into `ApiError` payloads.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e))
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid query string".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        debug!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unhandled request".to_string(),
        )
    };
    Ok(json_reply(&ApiError::new(message), status))
}
