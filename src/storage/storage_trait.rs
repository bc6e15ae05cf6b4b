//! Storage Trait
//!
//! This module defines the `Storage` trait, the only boundary between the
//! record and employee services and the relational store.
//!
//! Implementors of this trait are responsible for:
//! - Reading academic records together with their student and course
//! - Applying versioned grade updates as a single transaction
//! - Managing employees and their role assignments through the join table
//!
//! All methods return a `Result` to handle potential storage errors. Write
//! conflicts are not errors: they come back as [`CommitOutcome::Conflict`].

use async_trait::async_trait;

use crate::error_handling::types::StorageError;
use crate::storage::types::{
    AcademicRecord, AcademicRecordEdit, CommitOutcome, Course, Employee, EmployeeDraft,
    RecordKey, Role, Student, UpdateBatch,
};

#[async_trait]
pub trait Storage: Send + Sync {
    /// Retrieves every academic record with its student and course attached.
    async fn fetch_all_records(&self) -> Result<Vec<AcademicRecord>, StorageError>;

    /// Retrieves a single academic record by composite key.
    async fn fetch_record(&self, key: &RecordKey) -> Result<Option<AcademicRecord>, StorageError>;

    /// Reads every academic record inside one read transaction.
    ///
    /// The values are detached copies used purely as a lookup source; reading
    /// them never schedules a write.
    async fn fetch_snapshot(&self) -> Result<Vec<AcademicRecord>, StorageError>;

    async fn list_students(&self) -> Result<Vec<Student>, StorageError>;

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;

    /// Inserts a new record at version 0.
    async fn insert_record(&self, edit: &AcademicRecordEdit)
        -> Result<AcademicRecord, StorageError>;

    /// Writes every update in `batch` in one transaction.
    ///
    /// If any row is no longer at its expected version the transaction is
    /// rolled back and the first conflicting key is reported.
    async fn commit(&self, batch: &UpdateBatch) -> Result<CommitOutcome, StorageError>;

    /// Removes a record. Returns `false` if it did not exist.
    async fn delete_record(&self, key: &RecordKey) -> Result<bool, StorageError>;

    async fn list_roles(&self) -> Result<Vec<Role>, StorageError>;

    /// Retrieves the roles among `ids` that exist; unknown ids are skipped.
    async fn fetch_roles(&self, ids: &[i32]) -> Result<Vec<Role>, StorageError>;

    async fn list_employees(&self) -> Result<Vec<Employee>, StorageError>;

    async fn fetch_employee(&self, id: i32) -> Result<Option<Employee>, StorageError>;

    /// Whether another employee already uses `user_name` (exact match).
    async fn user_name_taken(
        &self,
        user_name: &str,
        excluding: Option<i32>,
    ) -> Result<bool, StorageError>;

    /// Inserts an employee and its role links in one transaction.
    async fn insert_employee(
        &self,
        draft: &EmployeeDraft,
        role_ids: &[i32],
    ) -> Result<Employee, StorageError>;

    /// Overwrites an employee's fields and replaces its role links wholesale.
    async fn update_employee(
        &self,
        id: i32,
        expected_version: i32,
        draft: &EmployeeDraft,
        role_ids: &[i32],
    ) -> Result<CommitOutcome, StorageError>;

    /// Removes an employee and its role links. Returns `false` if it did not exist.
    async fn delete_employee(&self, id: i32) -> Result<bool, StorageError>;
}
