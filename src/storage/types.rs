//! Plain value types exchanged with storage backends.
//!
//! Nothing here is change-tracked: a value read from a backend is a detached
//! copy, and writes only happen through explicit calls such as
//! [`Storage::commit`](crate::storage::storage_trait::Storage::commit).

use std::fmt;
use std::num::TryFromIntError;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub title: String,
}

/// Composite identity of an academic record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub student_id: String,
    pub course_code: String,
}

impl RecordKey {
    pub fn new<S: Into<String>, C: Into<String>>(student_id: S, course_code: C) -> Self {
        Self {
            student_id: student_id.into(),
            course_code: course_code.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.student_id, self.course_code)
    }
}

/// A grade held by a student for a course, with both relationships attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicRecord {
    pub student: Student,
    pub course: Course,
    pub grade: Option<i32>,
    /// Optimistic concurrency token, bumped by every committed update.
    pub version: i32,
}

impl AcademicRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.student.id.clone(), self.course.code.clone())
    }
}

/// The value-only shape of a record as it comes back from a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicRecordEdit {
    pub student_id: String,
    pub course_code: String,
    /// Wider than the stored column so oversized input reaches validation.
    #[serde(default)]
    pub grade: Option<i64>,
}

impl AcademicRecordEdit {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.student_id.clone(), self.course_code.clone())
    }

    /// The grade at column width. Fails only for values the range rule rejects.
    pub fn stored_grade(&self) -> Result<Option<i32>, TryFromIntError> {
        self.grade.map(i32::try_from).transpose()
    }
}

impl From<&AcademicRecord> for AcademicRecordEdit {
    fn from(record: &AcademicRecord) -> Self {
        Self {
            student_id: record.student.id.clone(),
            course_code: record.course.code.clone(),
            grade: record.grade.map(i64::from),
        }
    }
}

/// One pending grade write, guarded by the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub key: RecordKey,
    pub grade: Option<i32>,
    pub expected_version: i32,
}

/// Explicit unit of work: updates are collected with [`UpdateBatch::mark_updated`]
/// and written together by a single commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBatch {
    updates: Vec<RecordUpdate>,
}

impl UpdateBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `record` to receive `grade`, expecting it to still be at the version it was read at.
    pub fn mark_updated(&mut self, record: &AcademicRecord, grade: Option<i32>) {
        self.updates.push(RecordUpdate {
            key: record.key(),
            grade,
            expected_version: record.version,
        });
    }

    pub fn updates(&self) -> &[RecordUpdate] {
        &self.updates
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Result of a versioned write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { rows: usize },
    /// The update at `index` found its row changed or removed since it was
    /// read; nothing was written.
    Conflict { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i32,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i32,
    pub name: String,
    pub user_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub roles: Vec<Role>,
    pub version: i32,
}

/// Employee fields as submitted by a create or edit form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(student: &str, course: &str, grade: Option<i32>, version: i32) -> AcademicRecord {
        AcademicRecord {
            student: Student {
                id: student.into(),
                name: format!("Student {}", student),
            },
            course: Course {
                code: course.into(),
                title: format!("Course {}", course),
            },
            grade,
            version,
        }
    }

    #[test]
    fn test_mark_updated_captures_read_version() {
        let mut batch = UpdateBatch::new();
        assert!(batch.is_empty());
        batch.mark_updated(&record("S1", "C1", Some(50), 3), Some(75));
        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch.updates()[0],
            RecordUpdate {
                key: RecordKey::new("S1", "C1"),
                grade: Some(75),
                expected_version: 3,
            }
        );
    }

    #[test]
    fn test_edit_deserializes_missing_grade_as_ungraded() {
        let edit: AcademicRecordEdit =
            serde_json::from_str(r#"{"studentId":"S1","courseCode":"C1"}"#).unwrap();
        assert_eq!(edit.grade, None);
        assert_eq!(edit.key().to_string(), "S1/C1");
    }

    #[test]
    fn test_edit_accepts_grade_wider_than_column() {
        let edit: AcademicRecordEdit =
            serde_json::from_str(r#"{"studentId":"S1","courseCode":"C1","grade":3000000000}"#)
                .unwrap();
        assert_eq!(edit.grade, Some(3_000_000_000));
        assert!(edit.stored_grade().is_err());

        let edit = AcademicRecordEdit::from(&record("S1", "C1", Some(88), 0));
        assert_eq!(edit.stored_grade(), Ok(Some(88)));
    }

    #[test]
    fn test_employee_password_is_not_serialized() {
        let employee = Employee {
            id: 1,
            name: "Ada Lovelace".into(),
            user_name: "ada".into(),
            password: "secret".into(),
            roles: vec![],
            version: 0,
        };
        let json = serde_json::to_string(&employee).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("userName"));
    }
}
