//! Employee record and its payload schemas.
//!
//! # Invariants
//! - `employee_id` is the natural key: compared case-insensitively, never
//!   changed after creation.
//! - Stored text fields are trimmed; name and department have internal
//!   whitespace collapsed.
//! - `email` is not unique.

use crate::model::validation::{
    collapse_whitespace, payload_object, ValidationError, ViolationCode, Violations,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EMPLOYEE_ID_MAX_CHARS: usize = 20;
pub const FULL_NAME_MAX_CHARS: usize = 100;
pub const DEPARTMENT_MAX_CHARS: usize = 50;
pub const EMAIL_MAX_CHARS: usize = 254;

static EMPLOYEE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid employee id regex"));
static FULL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{M} .'-]+$").expect("valid full name regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("valid email regex")
});

/// Stored employee record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: String,
    pub full_name: String,
    pub email: String,
    pub department: String,
    /// Set once on insert.
    pub created_at: DateTime<Utc>,
    /// Bumped by every non-empty update.
    pub updated_at: DateTime<Utc>,
}

/// Validated create payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub employee_id: String,
    pub full_name: String,
    pub email: String,
    pub department: String,
}

impl NewEmployee {
    /// Validates a raw create payload.
    ///
    /// Every field rule is checked; all violations are returned together.
    pub fn from_payload(payload: &Value) -> Result<Self, ValidationError> {
        let object = payload_object(payload)?;
        let mut violations = Violations::default();

        let employee_id = violations.string_field(object, "employee_id", true);
        let full_name = violations
            .string_field(object, "full_name", true)
            .map(|value| collapse_whitespace(&value));
        let email = violations.string_field(object, "email", true);
        let department = violations
            .string_field(object, "department", true)
            .map(|value| collapse_whitespace(&value));

        if let Some(value) = &employee_id {
            check_employee_id(&mut violations, value);
        }
        if let Some(value) = &full_name {
            check_full_name(&mut violations, value);
        }
        if let Some(value) = &email {
            check_email(&mut violations, value);
        }
        if let Some(value) = &department {
            violations.check_text("department", value, DEPARTMENT_MAX_CHARS);
        }
        violations.into_result()?;

        match (employee_id, full_name, email, department) {
            (Some(employee_id), Some(full_name), Some(email), Some(department)) => Ok(Self {
                employee_id,
                full_name,
                email,
                department,
            }),
            _ => Err(ValidationError::single(
                "body",
                ViolationCode::Missing,
                "incomplete employee payload",
            )),
        }
    }

    /// Re-checks field rules on an already constructed value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Violations::default();
        check_employee_id(&mut violations, &self.employee_id);
        check_full_name(&mut violations, &self.full_name);
        check_email(&mut violations, &self.email);
        violations.check_text("department", &self.department, DEPARTMENT_MAX_CHARS);
        violations.into_result()
    }
}

/// Validated partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeePatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
}

impl EmployeePatch {
    /// Validates a raw update payload for the employee addressed by `path_id`.
    ///
    /// `employee_id` may be echoed back but must match `path_id`
    /// case-insensitively.
    pub fn from_payload(path_id: &str, payload: &Value) -> Result<Self, ValidationError> {
        let object = payload_object(payload)?;
        let mut violations = Violations::default();

        if let Some(echoed) = violations.string_field(object, "employee_id", false) {
            if !same_employee_id(&echoed, path_id) {
                violations.push(
                    "employee_id",
                    ViolationCode::Immutable,
                    "employee_id cannot be changed",
                );
            }
        }

        let full_name = violations
            .string_field(object, "full_name", false)
            .map(|value| collapse_whitespace(&value));
        let email = violations.string_field(object, "email", false);
        let department = violations
            .string_field(object, "department", false)
            .map(|value| collapse_whitespace(&value));

        if let Some(value) = &full_name {
            check_full_name(&mut violations, value);
        }
        if let Some(value) = &email {
            check_email(&mut violations, value);
        }
        if let Some(value) = &department {
            violations.check_text("department", value, DEPARTMENT_MAX_CHARS);
        }
        violations.into_result()?;

        Ok(Self {
            full_name,
            email,
            department,
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Violations::default();
        if let Some(value) = &self.full_name {
            check_full_name(&mut violations, value);
        }
        if let Some(value) = &self.email {
            check_email(&mut violations, value);
        }
        if let Some(value) = &self.department {
            violations.check_text("department", value, DEPARTMENT_MAX_CHARS);
        }
        violations.into_result()
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.email.is_none() && self.department.is_none()
    }

    /// Merges set fields into `employee`. Timestamps are left to the store.
    pub fn apply_to(&self, employee: &mut Employee) {
        if let Some(value) = &self.full_name {
            employee.full_name = value.clone();
        }
        if let Some(value) = &self.email {
            employee.email = value.clone();
        }
        if let Some(value) = &self.department {
            employee.department = value.clone();
        }
    }
}

/// Returns whether two ids name the same employee.
pub fn same_employee_id(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

/// Basic `local@domain.tld` shape check.
pub fn is_valid_email(value: &str) -> bool {
    value.chars().count() <= EMAIL_MAX_CHARS && EMAIL_RE.is_match(value)
}

pub(crate) fn check_employee_id(violations: &mut Violations, value: &str) {
    if violations.check_text("employee_id", value, EMPLOYEE_ID_MAX_CHARS)
        && !EMPLOYEE_ID_RE.is_match(value)
    {
        violations.push(
            "employee_id",
            ViolationCode::InvalidFormat,
            "may only contain letters, digits, hyphens and underscores",
        );
    }
}

fn check_full_name(violations: &mut Violations, value: &str) {
    if violations.check_text("full_name", value, FULL_NAME_MAX_CHARS)
        && !FULL_NAME_RE.is_match(value)
    {
        violations.push(
            "full_name",
            ViolationCode::InvalidFormat,
            "may only contain letters, spaces, hyphens, apostrophes and periods",
        );
    }
}

fn check_email(violations: &mut Violations, value: &str) {
    if value.is_empty() {
        violations.push("email", ViolationCode::Empty, "must not be empty");
    } else if !is_valid_email(value) {
        violations.push(
            "email",
            ViolationCode::InvalidFormat,
            format!("`{value}` is not a valid email address"),
        );
    }
}
