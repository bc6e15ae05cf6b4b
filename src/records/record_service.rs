use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use crate::error_handling::types::{Rejection, RecordError, RowError, StorageError};
use crate::records::comparator::{sort_records, RecordComparator, SortColumn};
use crate::records::reconciler::{plan_updates, reconcile};
use crate::storage::storage_trait::Storage;
use crate::storage::types::{
    AcademicRecord, AcademicRecordEdit, CommitOutcome, Course, RecordKey, Student, UpdateBatch,
};
use crate::validation::{validate, GRADE_OUT_OF_RANGE};

pub const RECORD_EXISTS: &str = "record already exists";
pub const UNKNOWN_STUDENT: &str = "no such student";
pub const UNKNOWN_COURSE: &str = "no such course";

/// Choices offered by the create form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOptions {
    pub students: Vec<Student>,
    pub courses: Vec<Course>,
}

/// Result of an accepted bulk edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkEditSummary {
    /// Rows in the submission.
    pub submitted: usize,
    /// Rows whose grade was written.
    pub updated: usize,
}

fn row_errors(edit: &AcademicRecordEdit) -> Vec<RowError> {
    validate(edit)
        .into_iter()
        .map(|e| RowError {
            row: 0,
            field: e.field,
            reason: e.reason,
        })
        .collect()
}

fn single_row_rejection(edit: AcademicRecordEdit, field: &str, reason: &str) -> RecordError {
    RecordError::Validation(Rejection {
        rows: vec![edit],
        errors: vec![RowError {
            row: 0,
            field: field.to_string(),
            reason: reason.to_string(),
        }],
    })
}

/// Listing, single-row CRUD and bulk editing of academic records.
///
/// Holds no state between calls; the store is the only shared resource.
pub struct RecordService {
    storage: Arc<dyn Storage>,
}

impl RecordService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Every record, ordered by `column_key` (`"Course"`, `"Student"` or `"Grade"`).
    pub async fn list_sorted(
        &self,
        column_key: &str,
        ascending: bool,
    ) -> Result<Vec<AcademicRecord>, RecordError> {
        let mut records = self.storage.fetch_all_records().await?;
        let comparator = RecordComparator::new(SortColumn::from_key(column_key), ascending);
        sort_records(&mut records, &comparator);
        debug!(
            "Listing {} records by {:?} ({})",
            records.len(),
            column_key,
            if ascending { "asc" } else { "desc" }
        );
        Ok(records)
    }

    pub async fn details(&self, key: &RecordKey) -> Result<AcademicRecord, RecordError> {
        self.storage
            .fetch_record(key)
            .await?
            .ok_or_else(|| RecordError::NotFound(key.clone()))
    }

    pub async fn options(&self) -> Result<RecordOptions, RecordError> {
        Ok(RecordOptions {
            students: self.storage.list_students().await?,
            courses: self.storage.list_courses().await?,
        })
    }

    pub async fn create(&self, edit: AcademicRecordEdit) -> Result<AcademicRecord, RecordError> {
        let mut errors = row_errors(&edit);
        if errors.is_empty() {
            let students = self.storage.list_students().await?;
            if !students.iter().any(|s| s.id == edit.student_id) {
                errors.push(RowError {
                    row: 0,
                    field: "studentId".to_string(),
                    reason: UNKNOWN_STUDENT.to_string(),
                });
            }
            let courses = self.storage.list_courses().await?;
            if !courses.iter().any(|c| c.code == edit.course_code) {
                errors.push(RowError {
                    row: 0,
                    field: "courseCode".to_string(),
                    reason: UNKNOWN_COURSE.to_string(),
                });
            }
        }
        if errors.is_empty() && self.storage.fetch_record(&edit.key()).await?.is_some() {
            return Err(single_row_rejection(edit, "record", RECORD_EXISTS));
        }
        if !errors.is_empty() {
            return Err(RecordError::Validation(Rejection {
                rows: vec![edit],
                errors,
            }));
        }

        match self.storage.insert_record(&edit).await {
            Ok(record) => Ok(record),
            // lost a race with another create for the same key
            Err(StorageError::UniqueViolation(_)) => {
                Err(single_row_rejection(edit, "record", RECORD_EXISTS))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Change the grade of the record at `route_key`.
    ///
    /// The body must name the same record; the key itself is never edited.
    pub async fn edit(
        &self,
        route_key: &RecordKey,
        edit: AcademicRecordEdit,
    ) -> Result<AcademicRecord, RecordError> {
        if edit.key() != *route_key {
            warn!(
                "Edit of {} carried mismatched key {}",
                route_key,
                edit.key()
            );
            return Err(RecordError::NotFound(route_key.clone()));
        }

        let errors = row_errors(&edit);
        if !errors.is_empty() {
            return Err(RecordError::Validation(Rejection {
                rows: vec![edit],
                errors,
            }));
        }

        let grade = match edit.stored_grade() {
            Ok(grade) => grade,
            Err(_) => return Err(single_row_rejection(edit, "grade", GRADE_OUT_OF_RANGE)),
        };

        let current = self.details(route_key).await?;
        if current.grade == grade {
            debug!("Edit of {} changes nothing", route_key);
            return Ok(current);
        }

        let mut batch = UpdateBatch::new();
        batch.mark_updated(&current, grade);
        match self.storage.commit(&batch).await? {
            CommitOutcome::Committed { .. } => {
                info!("Updated grade of {} to {:?}", route_key, grade);
                self.details(route_key).await
            }
            CommitOutcome::Conflict { .. } => Err(self.conflict_or_gone(route_key).await),
        }
    }

    /// Apply a whole "edit all rows" submission, or nothing.
    pub async fn bulk_edit(
        &self,
        submitted: Vec<AcademicRecordEdit>,
    ) -> Result<BulkEditSummary, RecordError> {
        let snapshot = self.storage.fetch_snapshot().await?;
        let resolved = match reconcile(&submitted, &snapshot) {
            Ok(resolved) => resolved,
            Err(rejection) => {
                warn!(
                    "Bulk edit of {} rows rejected with {} error(s)",
                    submitted.len(),
                    rejection.errors.len()
                );
                return Err(RecordError::Validation(rejection));
            }
        };

        let batch = plan_updates(&resolved);
        match self.storage.commit(&batch).await? {
            CommitOutcome::Committed { rows } => {
                info!(
                    "Bulk edit committed {} of {} submitted rows",
                    rows,
                    submitted.len()
                );
                Ok(BulkEditSummary {
                    submitted: submitted.len(),
                    updated: rows,
                })
            }
            CommitOutcome::Conflict { index } => {
                let key = batch
                    .updates()
                    .get(index)
                    .map(|u| u.key.clone())
                    .unwrap_or_else(|| RecordKey::new("", ""));
                warn!("Bulk edit hit a concurrent change on {}", key);
                Err(RecordError::Concurrency(key))
            }
        }
    }

    pub async fn delete(&self, key: &RecordKey) -> Result<(), RecordError> {
        if self.storage.delete_record(key).await? {
            Ok(())
        } else {
            Err(RecordError::NotFound(key.clone()))
        }
    }

    async fn conflict_or_gone(&self, key: &RecordKey) -> RecordError {
        match self.storage.fetch_record(key).await {
            Ok(Some(_)) => RecordError::Concurrency(key.clone()),
            Ok(None) => RecordError::NotFound(key.clone()),
            Err(e) => RecordError::Store(e),
        }
    }
}
