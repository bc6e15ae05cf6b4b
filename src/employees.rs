//! Employee administration.
//!
//! Components:
//! - `employee_service`: list, details, create, edit and delete of employees,
//!   with role assignment replaced wholesale on every edit.

pub mod employee_service;
#[cfg(test)]
mod tests;

pub use employee_service::EmployeeService;
