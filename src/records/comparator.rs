//! Ordering of academic records for the listing and bulk-edit pages.
//!
//! Ungraded records always come before graded ones, whatever the direction.
//! Inside each of those two groups records are ordered by the selected
//! column, reversed when descending. Ties keep their input order because
//! [`sort_records`] uses a stable sort.

use std::cmp::Ordering;

use crate::storage::types::AcademicRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Course,
    Student,
    Grade,
    /// Any unrecognised key: every pair compares equal.
    Unsorted,
}

impl SortColumn {
    pub fn from_key(key: &str) -> Self {
        match key {
            "Course" => SortColumn::Course,
            "Student" => SortColumn::Student,
            "Grade" => SortColumn::Grade,
            _ => SortColumn::Unsorted,
        }
    }
}

/// Only an explicit `"desc"` sorts descending.
pub fn is_ascending(direction: Option<&str>) -> bool {
    direction != Some("desc")
}

/// Ordinal comparison after uppercasing each char.
fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_uppercase)
        .cmp(b.chars().flat_map(char::to_uppercase))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordComparator {
    column: SortColumn,
    ascending: bool,
}

impl RecordComparator {
    pub fn new(column: SortColumn, ascending: bool) -> Self {
        Self { column, ascending }
    }

    pub fn compare(&self, a: &AcademicRecord, b: &AcademicRecord) -> Ordering {
        match (a.grade, b.grade) {
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            _ => {}
        }

        let ordering = match self.column {
            SortColumn::Course => compare_ignore_case(&a.course.code, &b.course.code),
            SortColumn::Student => compare_ignore_case(&a.student.id, &b.student.id),
            SortColumn::Grade => a.grade.cmp(&b.grade),
            SortColumn::Unsorted => Ordering::Equal,
        };

        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

/// Stable in-place sort of `records` under `comparator`.
pub fn sort_records(records: &mut [AcademicRecord], comparator: &RecordComparator) {
    records.sort_by(|a, b| comparator.compare(a, b));
}
