use serde::Deserialize;

use crate::storage::types::{Course, Role, Student};

/// Reference data inserted at startup.
///
/// Rows whose key already exists are left untouched, so the same file can be
/// used on every start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedConfig {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl SeedConfig {
    pub fn is_empty(&self) -> bool {
        self.students.is_empty() && self.courses.is_empty() && self.roles.is_empty()
    }
}
