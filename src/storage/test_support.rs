//! Fixtures shared by the service scenario suites.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::error_handling::types::StorageError;
use crate::storage::database_storage::DatabaseStorage;
use crate::storage::storage_trait::Storage;
use crate::storage::types::{
    AcademicRecord, AcademicRecordEdit, CommitOutcome, Course, Employee, EmployeeDraft,
    RecordKey, Role, Student, UpdateBatch,
};

pub async fn temp_db() -> DatabaseStorage {
    let dir = TempDir::new().unwrap();
    let path: PathBuf = dir.path().join("test.sqlite3");
    // Keep TempDir alive by leaking it for the test duration
    Box::leak(Box::new(dir));
    DatabaseStorage::new_file(path).await.unwrap()
}

/// Students S1..S3, courses C1 and C2, roles 1..3, and grades
/// S1/C1 = 90, S2/C1 = 70, S3/C2 = none.
pub async fn seeded() -> DatabaseStorage {
    let storage = temp_db().await;
    for (id, name) in [("S1", "Ann Lee"), ("S2", "Bo Chen"), ("S3", "Cy Diaz")] {
        storage
            .seed_student(&Student {
                id: id.into(),
                name: name.into(),
            })
            .await
            .unwrap();
    }
    for (code, title) in [("C1", "Databases"), ("C2", "Networks")] {
        storage
            .seed_course(&Course {
                code: code.into(),
                title: title.into(),
            })
            .await
            .unwrap();
    }
    for (id, title) in [(1, "Instructor"), (2, "Coordinator"), (3, "Chair")] {
        storage
            .seed_role(&Role {
                id,
                title: title.into(),
            })
            .await
            .unwrap();
    }
    for (student, course, grade) in [("S1", "C1", Some(90)), ("S2", "C1", Some(70)), ("S3", "C2", None)] {
        storage
            .insert_record(&AcademicRecordEdit {
                student_id: student.into(),
                course_code: course.into(),
                grade,
            })
            .await
            .unwrap();
    }
    storage
}

/// Delegates to a real store, but the first read of records is followed by
/// a write from "another user" to `target`, so whatever the caller read is
/// already stale.
pub struct RacingStorage {
    inner: Arc<DatabaseStorage>,
    target: Mutex<Option<RecordKey>>,
}

impl RacingStorage {
    pub fn new(inner: Arc<DatabaseStorage>, target: RecordKey) -> Self {
        Self {
            inner,
            target: Mutex::new(Some(target)),
        }
    }

    async fn interfere(&self) -> Result<(), StorageError> {
        let target = self.target.lock().unwrap().take();
        let Some(key) = target else {
            return Ok(());
        };
        if let Some(current) = self.inner.fetch_record(&key).await? {
            let mut batch = UpdateBatch::new();
            batch.mark_updated(&current, Some(1));
            self.inner.commit(&batch).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for RacingStorage {
    async fn fetch_all_records(&self) -> Result<Vec<AcademicRecord>, StorageError> {
        self.inner.fetch_all_records().await
    }

    async fn fetch_record(&self, key: &RecordKey) -> Result<Option<AcademicRecord>, StorageError> {
        let record = self.inner.fetch_record(key).await?;
        self.interfere().await?;
        Ok(record)
    }

    async fn fetch_snapshot(&self) -> Result<Vec<AcademicRecord>, StorageError> {
        let snapshot = self.inner.fetch_snapshot().await?;
        self.interfere().await?;
        Ok(snapshot)
    }

    async fn list_students(&self) -> Result<Vec<Student>, StorageError> {
        self.inner.list_students().await
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        self.inner.list_courses().await
    }

    async fn insert_record(
        &self,
        edit: &AcademicRecordEdit,
    ) -> Result<AcademicRecord, StorageError> {
        self.inner.insert_record(edit).await
    }

    async fn commit(&self, batch: &UpdateBatch) -> Result<CommitOutcome, StorageError> {
        self.inner.commit(batch).await
    }

    async fn delete_record(&self, key: &RecordKey) -> Result<bool, StorageError> {
        self.inner.delete_record(key).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StorageError> {
        self.inner.list_roles().await
    }

    async fn fetch_roles(&self, ids: &[i32]) -> Result<Vec<Role>, StorageError> {
        self.inner.fetch_roles(ids).await
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, StorageError> {
        self.inner.list_employees().await
    }

    async fn fetch_employee(&self, id: i32) -> Result<Option<Employee>, StorageError> {
        self.inner.fetch_employee(id).await
    }

    async fn user_name_taken(
        &self,
        user_name: &str,
        excluding: Option<i32>,
    ) -> Result<bool, StorageError> {
        self.inner.user_name_taken(user_name, excluding).await
    }

    async fn insert_employee(
        &self,
        draft: &EmployeeDraft,
        role_ids: &[i32],
    ) -> Result<Employee, StorageError> {
        self.inner.insert_employee(draft, role_ids).await
    }

    async fn update_employee(
        &self,
        id: i32,
        expected_version: i32,
        draft: &EmployeeDraft,
        role_ids: &[i32],
    ) -> Result<CommitOutcome, StorageError> {
        self.inner
            .update_employee(id, expected_version, draft, role_ids)
            .await
    }

    async fn delete_employee(&self, id: i32) -> Result<bool, StorageError> {
        self.inner.delete_employee(id).await
    }
}
