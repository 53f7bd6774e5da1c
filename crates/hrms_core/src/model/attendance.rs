//! Attendance marks and the summaries derived from them.
//!
//! # Invariants
//! - At most one mark per (employee, date).
//! - `date` is never later than the day the mark is recorded.
//! - Marks are append-only; there is no update path.

use crate::model::employee::check_employee_id;
use crate::model::validation::{payload_object, ValidationError, ViolationCode, Violations};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire and storage format of attendance dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

static DATE_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date shape regex"));

/// Attendance state for one employee on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    /// Approved absence.
    Leave,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 3] = [Self::Present, Self::Absent, Self::Leave];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Leave => "leave",
        }
    }

    /// Case-insensitive parse of the wire value.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
    }
}

/// Stored attendance mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Canonical spelling of the referenced employee id.
    pub employee_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub recorded_at: DateTime<Utc>,
}

/// Validated mark payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
    pub employee_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

impl NewAttendance {
    /// Validates a raw mark payload against the caller's notion of `today`.
    pub fn from_payload(payload: &Value, today: NaiveDate) -> Result<Self, ValidationError> {
        let object = payload_object(payload)?;
        let mut violations = Violations::default();

        let employee_id = violations.string_field(object, "employee_id", true);
        if let Some(value) = &employee_id {
            check_employee_id(&mut violations, value);
        }

        let date = violations
            .string_field(object, "date", true)
            .and_then(|raw| match parse_attendance_date(&raw) {
                Some(date) => Some(date),
                None => {
                    violations.push(
                        "date",
                        ViolationCode::InvalidFormat,
                        format!("`{raw}` is not a date in YYYY-MM-DD format"),
                    );
                    None
                }
            });
        if let Some(date) = date {
            check_not_future(&mut violations, date, today);
        }

        let status = violations
            .string_field(object, "status", true)
            .and_then(|raw| match AttendanceStatus::parse(&raw) {
                Some(status) => Some(status),
                None => {
                    violations.push(
                        "status",
                        ViolationCode::UnknownValue,
                        format!("`{raw}` is not one of present|absent|leave"),
                    );
                    None
                }
            });

        violations.into_result()?;

        match (employee_id, date, status) {
            (Some(employee_id), Some(date), Some(status)) => Ok(Self {
                employee_id,
                date,
                status,
            }),
            _ => Err(ValidationError::single(
                "body",
                ViolationCode::Missing,
                "incomplete attendance payload",
            )),
        }
    }

    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        let mut violations = Violations::default();
        check_employee_id(&mut violations, &self.employee_id);
        check_not_future(&mut violations, self.date, today);
        violations.into_result()
    }
}

/// Parses a strict `YYYY-MM-DD` date.
pub fn parse_attendance_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    // chrono also accepts signed years and unpadded fields.
    if !DATE_SHAPE_RE.is_match(trimmed) {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).ok()
}

fn check_not_future(violations: &mut Violations, date: NaiveDate, today: NaiveDate) {
    if date > today {
        violations.push(
            "date",
            ViolationCode::FutureDate,
            format!("cannot mark attendance for future date {date}"),
        );
    }
}

/// Per-employee attendance totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub employee_id: String,
    pub total_days: u32,
    pub present_days: u32,
    pub absent_days: u32,
    pub leave_days: u32,
    /// `present / total * 100`, rounded to 2 decimals; `0.0` with no marks.
    pub attendance_percentage: f64,
}

impl AttendanceSummary {
    pub fn from_counts(employee_id: String, present: u32, absent: u32, leave: u32) -> Self {
        let total = present + absent + leave;
        let attendance_percentage = if total == 0 {
            0.0
        } else {
            (f64::from(present) / f64::from(total) * 10_000.0).round() / 100.0
        };
        Self {
            employee_id,
            total_days: total,
            present_days: present,
            absent_days: absent,
            leave_days: leave,
            attendance_percentage,
        }
    }
}

/// Organisation-wide counts for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_employees: u32,
    pub present: u32,
    pub absent: u32,
    pub leave: u32,
    /// Employees without a mark for `date`.
    pub not_marked: u32,
}

impl DailySummary {
    pub fn from_counts(
        date: NaiveDate,
        total_employees: u32,
        present: u32,
        absent: u32,
        leave: u32,
    ) -> Self {
        let marked = present + absent + leave;
        Self {
            date,
            total_employees,
            present,
            absent,
            leave,
            not_marked: total_employees.saturating_sub(marked),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_attendance_date, AttendanceStatus, AttendanceSummary, DailySummary};
    use chrono::NaiveDate;

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(
            AttendanceStatus::parse("Present"),
            Some(AttendanceStatus::Present)
        );
        assert_eq!(
            AttendanceStatus::parse(" LEAVE "),
            Some(AttendanceStatus::Leave)
        );
        assert_eq!(AttendanceStatus::parse("holiday"), None);
    }

    #[test]
    fn date_parse_requires_padded_iso_format() {
        assert_eq!(
            parse_attendance_date("2024-01-05"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
        assert_eq!(parse_attendance_date("2024-1-5"), None);
        assert_eq!(parse_attendance_date("05/01/2024"), None);
        assert_eq!(parse_attendance_date("2024-02-30"), None);
        assert_eq!(parse_attendance_date("+2024-1-01"), None);
        assert_eq!(parse_attendance_date("2024-01-1 "), None);
        assert_eq!(parse_attendance_date("２０２４-01-01"), None);
    }

    #[test]
    fn summary_percentage_rounds_to_two_decimals() {
        let summary = AttendanceSummary::from_counts("EMP001".to_string(), 2, 1, 0);
        assert_eq!(summary.total_days, 3);
        assert_eq!(summary.attendance_percentage, 66.67);

        let empty = AttendanceSummary::from_counts("EMP002".to_string(), 0, 0, 0);
        assert_eq!(empty.attendance_percentage, 0.0);
    }

    #[test]
    fn daily_summary_counts_unmarked_employees() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let summary = DailySummary::from_counts(date, 5, 2, 1, 1);
        assert_eq!(summary.not_marked, 1);
    }
}
