//! Storage subsystem
//!
//! This module provides the abstraction and implementation for persisting
//! academic records, employees and their role assignments.
//!
//! Components:
//! - `storage_trait`: the Storage trait defining a uniform API.
//! - `types`: plain value types shared by the services and backends.
//! - `database_storage`: ORM-based SQLite implementation using SeaORM.
//! - `db_entities`: SeaORM entity models for the database backend.

pub mod database_storage;
pub mod db_entities;
pub mod storage_trait;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;

pub use database_storage::DatabaseStorage;
pub use storage_trait::Storage;
