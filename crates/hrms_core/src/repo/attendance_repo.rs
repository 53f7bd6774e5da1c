//! Attendance repository contract and SQLite implementation.
//!
//! # Invariants
//! - A mark is only written when its employee exists, checked inside the
//!   inserting transaction.
//! - `(employee_id, date)` is unique.
//! - Lists come back in insertion order.

use crate::model::attendance::{
    parse_attendance_date, AttendanceRecord, AttendanceStatus, NewAttendance, DATE_FORMAT,
};
use crate::model::validation::{ValidationError, ViolationCode, Violations};
use crate::repo::{
    count_to_u32, ensure_connection_ready, is_foreign_key_violation, is_unique_violation,
    now_timestamp, resolve_employee_id, timestamp_from_millis, RepoError, RepoResult,
};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

pub const ATTENDANCE_LIMIT_MAX: u32 = 500;

const ATTENDANCE_SELECT_SQL: &str = "SELECT
    employee_id,
    date,
    status,
    recorded_at
FROM attendance";

/// Query options for listing attendance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceListQuery {
    pub date: Option<NaiveDate>,
    /// `None` returns every remaining row.
    pub limit: Option<u32>,
    pub offset: u32,
}

impl AttendanceListQuery {
    /// Validates raw query-string values.
    ///
    /// `limit` must be within `1..=500`; `skip` must be a non-negative integer.
    pub fn from_params(
        date: Option<&str>,
        skip: Option<&str>,
        limit: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let mut violations = Violations::default();

        let date = date
            .filter(|raw| !raw.trim().is_empty())
            .and_then(|raw| match parse_attendance_date(raw) {
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

        let offset = match skip.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => 0,
            Some(raw) => raw.parse::<u32>().unwrap_or_else(|_| {
                violations.push(
                    "skip",
                    ViolationCode::InvalidFormat,
                    format!("`{raw}` is not a non-negative integer"),
                );
                0
            }),
        };

        let limit = match limit.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => None,
            Some(raw) => match raw.parse::<u32>() {
                Ok(value) if (1..=ATTENDANCE_LIMIT_MAX).contains(&value) => Some(value),
                _ => {
                    violations.push(
                        "limit",
                        ViolationCode::InvalidFormat,
                        format!("`{raw}` is not an integer between 1 and {ATTENDANCE_LIMIT_MAX}"),
                    );
                    None
                }
            },
        };

        violations.into_result()?;
        Ok(Self {
            date,
            limit,
            offset,
        })
    }
}

/// Per-status mark counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub present: u32,
    pub absent: u32,
    pub leave: u32,
}

/// Repository interface for attendance marks.
pub trait AttendanceRepository {
    /// Appends a mark; `NotFound` for unknown employee, `DuplicateKey` when
    /// the employee is already marked for that date.
    fn create_attendance(&self, attendance: &NewAttendance) -> RepoResult<AttendanceRecord>;
    fn list_attendance(&self, query: &AttendanceListQuery) -> RepoResult<Vec<AttendanceRecord>>;
    /// `NotFound` when the employee does not exist.
    fn list_attendance_for_employee(&self, employee_id: &str)
        -> RepoResult<Vec<AttendanceRecord>>;
    /// Returns the canonical employee id with their counts.
    fn employee_status_counts(&self, employee_id: &str) -> RepoResult<(String, StatusCounts)>;
    /// Returns the total employee count with that day's counts.
    fn daily_status_counts(&self, date: NaiveDate) -> RepoResult<(u32, StatusCounts)>;
}

/// SQLite-backed attendance repository.
pub struct SqliteAttendanceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttendanceRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn status_counts(&self, filter_sql: &str, key: &str) -> RepoResult<StatusCounts> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT status, COUNT(*) FROM attendance WHERE {filter_sql} GROUP BY status;"
        ))?;
        let mut rows = stmt.query([key])?;
        let mut counts = StatusCounts::default();

        while let Some(row) = rows.next()? {
            let status_text: String = row.get(0)?;
            let count = count_to_u32("attendance", row.get(1)?)?;
            match parse_status(&status_text)? {
                AttendanceStatus::Present => counts.present = count,
                AttendanceStatus::Absent => counts.absent = count,
                AttendanceStatus::Leave => counts.leave = count,
            }
        }

        Ok(counts)
    }
}

impl AttendanceRepository for SqliteAttendanceRepository<'_> {
    fn create_attendance(&self, attendance: &NewAttendance) -> RepoResult<AttendanceRecord> {
        let tx = self.conn.unchecked_transaction()?;
        let employee_id = resolve_employee_id(&tx, &attendance.employee_id)?;
        let recorded_at = now_timestamp();
        let date_text = attendance.date.format(DATE_FORMAT).to_string();

        let inserted = tx.execute(
            "INSERT INTO attendance (employee_id, date, status, recorded_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                employee_id.as_str(),
                date_text.as_str(),
                attendance.status.as_str(),
                recorded_at.timestamp_millis(),
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::DuplicateKey {
                    entity: "attendance",
                    key: format!("{employee_id} on {date_text}"),
                });
            }
            Err(err) if is_foreign_key_violation(&err) => {
                return Err(RepoError::employee_not_found(&employee_id));
            }
            Err(err) => return Err(err.into()),
        }
        tx.commit()?;

        Ok(AttendanceRecord {
            employee_id,
            date: attendance.date,
            status: attendance.status,
            recorded_at,
        })
    }

    fn list_attendance(&self, query: &AttendanceListQuery) -> RepoResult<Vec<AttendanceRecord>> {
        let mut sql = format!("{ATTENDANCE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(date) = query.date {
            sql.push_str(" AND date = ?");
            bind_values.push(Value::Text(date.format(DATE_FORMAT).to_string()));
        }

        sql.push_str(" ORDER BY id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(read_attendance_row(row)?);
        }

        Ok(records)
    }

    fn list_attendance_for_employee(
        &self,
        employee_id: &str,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        let canonical_id = resolve_employee_id(self.conn, employee_id)?;
        let mut stmt = self.conn.prepare_cached(&format!(
            "{ATTENDANCE_SELECT_SQL} WHERE employee_id = ?1 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([canonical_id.as_str()])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(read_attendance_row(row)?);
        }

        Ok(records)
    }

    fn employee_status_counts(&self, employee_id: &str) -> RepoResult<(String, StatusCounts)> {
        let canonical_id = resolve_employee_id(self.conn, employee_id)?;
        let counts = self.status_counts("employee_id = ?1", &canonical_id)?;
        Ok((canonical_id, counts))
    }

    fn daily_status_counts(&self, date: NaiveDate) -> RepoResult<(u32, StatusCounts)> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM employees;", [], |row| row.get(0))?;
        let counts = self.status_counts("date = ?1", &date.format(DATE_FORMAT).to_string())?;
        Ok((count_to_u32("employees", total)?, counts))
    }
}

fn parse_status(value: &str) -> RepoResult<AttendanceStatus> {
    AttendanceStatus::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{value}` in attendance.status"))
    })
}

fn read_attendance_row(row: &Row<'_>) -> RepoResult<AttendanceRecord> {
    let date_text: String = row.get("date")?;
    let date = parse_attendance_date(&date_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid date `{date_text}` in attendance.date"))
    })?;

    let status_text: String = row.get("status")?;

    Ok(AttendanceRecord {
        employee_id: row.get("employee_id")?,
        date,
        status: parse_status(&status_text)?,
        recorded_at: timestamp_from_millis("attendance.recorded_at", row.get("recorded_at")?)?,
    })
}
