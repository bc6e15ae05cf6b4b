//! Declarative field validation.
//!
//! Each validated type publishes a static rule table (`field -> kind`) and a
//! way to look up a field's value by name. [`validate`] walks the table and
//! reports every failing rule rather than stopping at the first one.

use std::sync::OnceLock;

use regex::Regex;

use crate::error_handling::types::FieldError;
use crate::storage::types::{AcademicRecordEdit, EmployeeDraft};

#[derive(Debug, Clone, Copy)]
pub enum RuleKind {
    /// Text must be non-blank.
    Required,
    /// Text must match the compiled pattern.
    Pattern(fn() -> &'static Regex),
    /// Text length in characters, inclusive bounds.
    Length { min: usize, max: usize },
    /// Number, inclusive bounds. An absent number passes.
    Range { min: i64, max: i64 },
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub kind: RuleKind,
    pub message: &'static str,
}

/// A field value as seen by the rule evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(Option<i64>),
    Missing,
}

pub trait Validate {
    fn rules() -> &'static [FieldRule];
    fn field(&self, name: &str) -> FieldValue<'_>;
}

fn passes(kind: RuleKind, value: FieldValue<'_>) -> bool {
    match (kind, value) {
        (RuleKind::Required, FieldValue::Text(s)) => !s.trim().is_empty(),
        (RuleKind::Required, FieldValue::Number(_)) => true,
        (RuleKind::Required, FieldValue::Missing) => false,
        (RuleKind::Pattern(regex), FieldValue::Text(s)) => {
            // blank text is Required's job
            s.is_empty() || regex().is_match(s)
        }
        (RuleKind::Length { min, max }, FieldValue::Text(s)) => {
            let len = s.chars().count();
            s.is_empty() || (min..=max).contains(&len)
        }
        (RuleKind::Range { min, max }, FieldValue::Number(n)) => {
            n.map_or(true, |n| (min..=max).contains(&n))
        }
        // a rule applied to the wrong kind of field never passes
        _ => false,
    }
}

/// Evaluate every rule in `T`'s table against `value`.
pub fn validate<T: Validate>(value: &T) -> Vec<FieldError> {
    T::rules()
        .iter()
        .filter(|rule| !passes(rule.kind, value.field(rule.field)))
        .map(|rule| FieldError {
            field: rule.field.to_string(),
            reason: rule.message.to_string(),
        })
        .collect()
}

pub const GRADE_OUT_OF_RANGE: &str = "grade out of range";

const RECORD_RULES: &[FieldRule] = &[
    FieldRule {
        field: "studentId",
        kind: RuleKind::Required,
        message: "Student is required.",
    },
    FieldRule {
        field: "courseCode",
        kind: RuleKind::Required,
        message: "Course is required.",
    },
    FieldRule {
        field: "grade",
        kind: RuleKind::Range { min: 0, max: 100 },
        message: GRADE_OUT_OF_RANGE,
    },
];

impl Validate for AcademicRecordEdit {
    fn rules() -> &'static [FieldRule] {
        RECORD_RULES
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "studentId" => FieldValue::Text(&self.student_id),
            "courseCode" => FieldValue::Text(&self.course_code),
            "grade" => FieldValue::Number(self.grade),
            _ => FieldValue::Missing,
        }
    }
}

pub const EMPLOYEE_NAME_PATTERN: &str =
    r"^[A-Za-z]+(?:['-][A-Za-z]+)? [A-Za-z]+(?:['-][A-Za-z]+)?$";

static EMPLOYEE_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn employee_name_regex() -> &'static Regex {
    EMPLOYEE_NAME_RE.get_or_init(|| {
        Regex::new(EMPLOYEE_NAME_PATTERN)
            .unwrap_or_else(|error| panic!("employee name regex failed to compile: {error}"))
    })
}

const EMPLOYEE_RULES: &[FieldRule] = &[
    FieldRule {
        field: "name",
        kind: RuleKind::Required,
        message: "Employee Name is required.",
    },
    FieldRule {
        field: "name",
        kind: RuleKind::Pattern(employee_name_regex),
        message: "Must be in the form of first name followed by last name.",
    },
    FieldRule {
        field: "userName",
        kind: RuleKind::Required,
        message: "Network ID is required.",
    },
    FieldRule {
        field: "userName",
        kind: RuleKind::Length { min: 3, max: 30 },
        message: "Username length should be more than 3 characters.",
    },
    FieldRule {
        field: "password",
        kind: RuleKind::Required,
        message: "Password is required.",
    },
    FieldRule {
        field: "password",
        kind: RuleKind::Length { min: 5, max: 30 },
        message: "Password length should be more than 5 characters.",
    },
];

impl Validate for EmployeeDraft {
    fn rules() -> &'static [FieldRule] {
        EMPLOYEE_RULES
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "name" => FieldValue::Text(&self.name),
            "userName" => FieldValue::Text(&self.user_name),
            "password" => FieldValue::Text(&self.password),
            _ => FieldValue::Missing,
        }
    }
}
