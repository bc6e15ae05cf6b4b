use std::fmt;

use serde::Serialize;

use crate::storage::types::{AcademicRecordEdit, EmployeeDraft, RecordKey};

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    BadIPFormatting(String),
    MissingDatabase(String),
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::BadIPFormatting(e) => write!(f, "IP formatting error: {}", e),
            ConfigError::MissingDatabase(e) => write!(f, "Database configuration error: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    ConnectionFailed,
    WriteFailed,
    ReadFailed,
    /// A unique index rejected the write; carries the offending column.
    UniqueViolation(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionFailed => write!(f, "Storage connection failed"),
            StorageError::WriteFailed => write!(f, "Storage write failed"),
            StorageError::ReadFailed => write!(f, "Storage read failed"),
            StorageError::UniqueViolation(c) => write!(f, "Unique constraint violated: {}", c),
        }
    }
}

impl std::error::Error for StorageError {}

/// A single failed field rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// A field error pinned to the index of the submitted row that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub field: String,
    pub reason: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}: {}", self.row, self.field, self.reason)
    }
}

/// Submitted academic record rows handed back untouched, with everything wrong with them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub rows: Vec<AcademicRecordEdit>,
    pub errors: Vec<RowError>,
}

#[derive(Debug)]
pub enum RecordError {
    Validation(Rejection),
    NotFound(RecordKey),
    Concurrency(RecordKey),
    Store(StorageError),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::Validation(r) => {
                write!(f, "Validation failed with {} error(s)", r.errors.len())
            }
            RecordError::NotFound(k) => write!(f, "Academic record {} not found", k),
            RecordError::Concurrency(k) => {
                write!(f, "Academic record {} was changed by another request", k)
            }
            RecordError::Store(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for RecordError {}

impl From<StorageError> for RecordError {
    fn from(err: StorageError) -> Self {
        RecordError::Store(err)
    }
}

#[derive(Debug)]
pub enum EmployeeError {
    Validation {
        draft: EmployeeDraft,
        errors: Vec<FieldError>,
    },
    NotFound(i32),
    Concurrency(i32),
    Store(StorageError),
}

impl fmt::Display for EmployeeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmployeeError::Validation { errors, .. } => {
                write!(f, "Validation failed with {} error(s)", errors.len())
            }
            EmployeeError::NotFound(id) => write!(f, "Employee {} not found", id),
            EmployeeError::Concurrency(id) => {
                write!(f, "Employee {} was changed by another request", id)
            }
            EmployeeError::Store(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for EmployeeError {}

impl From<StorageError> for EmployeeError {
    fn from(err: StorageError) -> Self {
        EmployeeError::Store(err)
    }
}

#[derive(Debug)]
pub enum WebError {
    BindFailed(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::BindFailed(e) => write!(f, "Web server bind failed: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    StorageError(StorageError),
    WebError(WebError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::StorageError(e) => write!(f, "Storage error: {}", e),
            ControllerError::WebError(e) => write!(f, "Web error: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<StorageError> for ControllerError {
    fn from(err: StorageError) -> Self {
        ControllerError::StorageError(err)
    }
}

impl From<WebError> for ControllerError {
    fn from(err: WebError) -> Self {
        ControllerError::WebError(err)
    }
}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}
