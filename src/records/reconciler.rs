//! Reconciliation of a bulk "edit all rows" submission.
//!
//! Form rows only carry `(studentId, courseCode, grade)`. Each one is
//! validated and matched against the prior snapshot by composite key, which
//! is where it gets its student and course back. Rows are checked
//! independently and every problem is collected; the batch is accepted only
//! if none were found.

use std::collections::{HashMap, HashSet};

use crate::error_handling::types::{Rejection, RowError};
use crate::storage::types::{AcademicRecord, AcademicRecordEdit, RecordKey, UpdateBatch};
use crate::validation::validate;

pub const NO_MATCHING_PRIOR_RECORD: &str = "no matching prior record";
pub const DUPLICATE_ROW: &str = "record submitted more than once";

/// A submitted row joined with the prior record it updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRow {
    /// Prior state, relationships included.
    pub record: AcademicRecord,
    /// Grade as submitted, at column width.
    pub grade: Option<i32>,
}

impl ResolvedRow {
    pub fn is_changed(&self) -> bool {
        self.record.grade != self.grade
    }
}

/// Validate `submitted` against `snapshot` and rehydrate each row's relationships.
///
/// Returns every row resolved, or all rows untouched plus every error found.
pub fn reconcile(
    submitted: &[AcademicRecordEdit],
    snapshot: &[AcademicRecord],
) -> Result<Vec<ResolvedRow>, Rejection> {
    let prior: HashMap<RecordKey, &AcademicRecord> =
        snapshot.iter().map(|r| (r.key(), r)).collect();

    let mut errors = Vec::new();
    let mut resolved = Vec::with_capacity(submitted.len());
    let mut seen: HashSet<RecordKey> = HashSet::new();

    for (row, edit) in submitted.iter().enumerate() {
        errors.extend(validate(edit).into_iter().map(|e| RowError {
            row,
            field: e.field,
            reason: e.reason,
        }));

        let key = edit.key();
        if !seen.insert(key.clone()) {
            errors.push(RowError {
                row,
                field: "record".to_string(),
                reason: DUPLICATE_ROW.to_string(),
            });
            continue;
        }

        match (prior.get(&key), edit.stored_grade()) {
            (Some(record), Ok(grade)) => resolved.push(ResolvedRow {
                record: (*record).clone(),
                grade,
            }),
            // already reported by the grade range rule
            (Some(_), Err(_)) => {}
            (None, _) => errors.push(RowError {
                row,
                field: "record".to_string(),
                reason: NO_MATCHING_PRIOR_RECORD.to_string(),
            }),
        }
    }

    if !errors.is_empty() {
        return Err(Rejection {
            rows: submitted.to_vec(),
            errors,
        });
    }
    Ok(resolved)
}

/// Queue an update for every resolved row whose grade actually changes.
pub fn plan_updates(resolved: &[ResolvedRow]) -> UpdateBatch {
    let mut batch = UpdateBatch::new();
    for row in resolved.iter().filter(|r| r.is_changed()) {
        batch.mark_updated(&row.record, row.grade);
    }
    batch
}
