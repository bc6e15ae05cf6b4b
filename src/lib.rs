//! Student records administration: sorted academic record listings, all-or-nothing
//! bulk grade edits with optimistic concurrency, and employee management, served as
//! a JSON API over SQLite.

pub mod configuration;
pub mod controller;
pub mod employees;
pub mod error_handling;
pub mod records;
pub mod storage;
pub mod validation;
pub mod web_interface;
