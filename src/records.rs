//! Academic records core.
//!
//! - `comparator`: column ordering for the listing pages, ungraded rows first.
//! - `reconciler`: validation and relationship rehydration for bulk edits.
//! - `record_service`: the operations the web layer calls.
//!
//! Example (non-running):
//! ```ignore
//! use std::sync::Arc;
//! use registrar::records::RecordService;
//! use registrar::storage::DatabaseStorage;
//!
//! let storage = Arc::new(DatabaseStorage::new_file("registrar.sqlite3").await?);
//! let service = RecordService::new(storage);
//! let by_grade = service.list_sorted("Grade", false).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod comparator;
pub mod reconciler;
pub mod record_service;

pub use comparator::{is_ascending, sort_records, RecordComparator, SortColumn};
pub use reconciler::{plan_updates, reconcile, ResolvedRow};
pub use record_service::{BulkEditSummary, RecordOptions, RecordService};
