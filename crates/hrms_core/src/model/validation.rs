//! Payload validation primitives shared by every record kind.
//!
//! # Responsibility
//! - Describe field-level rule violations with stable codes.
//! - Collect every violation of one payload before failing.
//!
//! # Invariants
//! - Validation is pure: no storage access, no clock reads.
//! - A `ValidationError` always carries at least one violation.

use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable machine-readable reason attached to a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    /// Required field absent or `null`.
    Missing,
    /// Field present with the wrong JSON type.
    WrongType,
    /// String field blank after trimming.
    Empty,
    /// String field longer than allowed.
    TooLong,
    /// String field does not match the expected shape.
    InvalidFormat,
    /// Enumerated field outside the allowed set.
    UnknownValue,
    /// Date later than the current day.
    FutureDate,
    /// Attempt to change an immutable field.
    Immutable,
}

/// One violated rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub code: ViolationCode,
    pub message: String,
}

/// Structured validation failure listing every violated rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Builds an error carrying a single violation.
    pub fn single(field: &str, code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.to_string(),
                code,
                message: message.into(),
            }],
        }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Returns whether `field` failed with `code`.
    pub fn has(&self, field: &str, code: ViolationCode) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.field == field && violation.code == code)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed: ")?;
        for (index, violation) in self.violations.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", violation.field, violation.message)?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}

/// Accumulates violations while a payload is being checked.
#[derive(Debug, Default)]
pub(crate) struct Violations {
    items: Vec<FieldViolation>,
}

impl Violations {
    pub(crate) fn push(&mut self, field: &str, code: ViolationCode, message: impl Into<String>) {
        self.items.push(FieldViolation {
            field: field.to_string(),
            code,
            message: message.into(),
        });
    }

    pub(crate) fn into_result(self) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                violations: self.items,
            })
        }
    }

    /// Reads a string field, trimming surrounding whitespace.
    ///
    /// Absent and `null` are the same: a violation when `required`, `None`
    /// otherwise.
    pub(crate) fn string_field(
        &mut self,
        object: &Map<String, Value>,
        field: &str,
        required: bool,
    ) -> Option<String> {
        match object.get(field) {
            None | Some(Value::Null) => {
                if required {
                    self.push(field, ViolationCode::Missing, "field is required");
                }
                None
            }
            Some(Value::String(value)) => Some(value.trim().to_string()),
            Some(other) => {
                self.push(
                    field,
                    ViolationCode::WrongType,
                    format!("expected a string, got {}", json_type_name(other)),
                );
                None
            }
        }
    }

    /// Checks non-empty and maximum length. Returns `true` when both hold.
    pub(crate) fn check_text(&mut self, field: &str, value: &str, max_chars: usize) -> bool {
        if value.is_empty() {
            self.push(field, ViolationCode::Empty, "must not be empty");
            return false;
        }
        let chars = value.chars().count();
        if chars > max_chars {
            self.push(
                field,
                ViolationCode::TooLong,
                format!("must be at most {max_chars} characters, got {chars}"),
            );
            return false;
        }
        true
    }
}

/// Borrows the payload as a JSON object or fails on field `body`.
pub(crate) fn payload_object(payload: &Value) -> Result<&Map<String, Value>, ValidationError> {
    payload.as_object().ok_or_else(|| {
        ValidationError::single(
            "body",
            ViolationCode::WrongType,
            format!("expected a JSON object, got {}", json_type_name(payload)),
        )
    })
}

/// Collapses internal whitespace runs into single spaces.
pub(crate) fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
