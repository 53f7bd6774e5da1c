//! Attendance use-case service.
//!
//! # Invariants
//! - "Today" is supplied by the caller; the service never reads the clock
//!   for validation.
//! - Summaries are derived from store counts only.

use crate::model::attendance::{AttendanceRecord, AttendanceSummary, DailySummary, NewAttendance};
use crate::repo::attendance_repo::{AttendanceListQuery, AttendanceRepository};
use crate::repo::RepoResult;
use chrono::NaiveDate;
use log::{info, warn};
use serde_json::Value;

/// Use-case service wrapper for attendance operations.
pub struct AttendanceService<R: AttendanceRepository> {
    repo: R,
}

impl<R: AttendanceRepository> AttendanceService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates a raw mark payload and appends it.
    pub fn mark_attendance(&self, payload: &Value, today: NaiveDate) -> RepoResult<AttendanceRecord> {
        let attendance = NewAttendance::from_payload(payload, today)?;

        match self.repo.create_attendance(&attendance) {
            Ok(record) => {
                info!(
                    "event=attendance_mark module=service status=ok employee_id={} date={} attendance_status={}",
                    record.employee_id,
                    record.date,
                    record.status.as_str()
                );
                Ok(record)
            }
            Err(err) => {
                warn!(
                    "event=attendance_mark module=service status=error employee_id={} date={} error={}",
                    attendance.employee_id, attendance.date, err
                );
                Err(err)
            }
        }
    }

    pub fn list_attendance(&self, query: &AttendanceListQuery) -> RepoResult<Vec<AttendanceRecord>> {
        self.repo.list_attendance(query)
    }

    /// Lists one employee's marks; `NotFound` for an unknown employee.
    pub fn list_for_employee(&self, employee_id: &str) -> RepoResult<Vec<AttendanceRecord>> {
        let records = self.repo.list_attendance_for_employee(employee_id)?;
        info!(
            "event=attendance_list module=service status=ok employee_id={} count={}",
            employee_id.trim(),
            records.len()
        );
        Ok(records)
    }

    pub fn employee_summary(&self, employee_id: &str) -> RepoResult<AttendanceSummary> {
        let (canonical_id, counts) = self.repo.employee_status_counts(employee_id)?;
        Ok(AttendanceSummary::from_counts(
            canonical_id,
            counts.present,
            counts.absent,
            counts.leave,
        ))
    }

    /// Organisation-wide counts for `date`.
    pub fn daily_summary(&self, date: NaiveDate) -> RepoResult<DailySummary> {
        let (total_employees, counts) = self.repo.daily_status_counts(date)?;
        Ok(DailySummary::from_counts(
            date,
            total_employees,
            counts.present,
            counts.absent,
            counts.leave,
        ))
    }
}
