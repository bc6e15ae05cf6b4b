use serde::{Deserialize, Serialize};

use crate::error_handling::types::{FieldError, RowError};
use crate::storage::types::EmployeeDraft;

/// Error payload returned by every failing route.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorDetail>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_errors(message: impl Into<String>, errors: Vec<ErrorDetail>) -> Self {
        Self {
            message: message.into(),
            errors,
        }
    }
}

/// One field problem; `row` is set for bulk-edit submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub field: String,
    pub reason: String,
}

impl From<RowError> for ErrorDetail {
    fn from(e: RowError) -> Self {
        Self {
            row: Some(e.row),
            field: e.field,
            reason: e.reason,
        }
    }
}

impl From<FieldError> for ErrorDetail {
    fn from(e: FieldError) -> Self {
        Self {
            row: None,
            field: e.field,
            reason: e.reason,
        }
    }
}

/// `?sortColumn=Grade&sortDirection=desc`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortQuery {
    pub sort_column: Option<String>,
    pub sort_direction: Option<String>,
}

/// Employee create/edit body: the employee fields plus the chosen role ids.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeForm {
    #[serde(default)]
    pub id: i32,
    #[serde(flatten)]
    pub draft: EmployeeDraft,
    #[serde(default)]
    pub selected_roles: Vec<i32>,
}
