//! Record store: repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Own every read/write against the `employees` and `attendance` tables.
//! - Translate SQLite failures into semantic errors (`NotFound`,
//!   `DuplicateKey`) the HTTP layer can map.
//!
//! # Invariants
//! - Employee write paths re-validate their input before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Multi-statement writes run inside one transaction.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::validation::ValidationError;
use chrono::{DateTime, Utc};
use rusqlite::{ffi, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod attendance_repo;
pub mod employee_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level failure taxonomy.
#[derive(Debug)]
pub enum RepoError {
    /// Input violated record rules.
    Validation(ValidationError),
    /// Underlying database failure.
    Db(DbError),
    /// Referenced record does not exist.
    NotFound { entity: &'static str, key: String },
    /// Uniqueness constraint violated on write.
    DuplicateKey { entity: &'static str, key: String },
    /// Persisted row does not decode into a valid record.
    InvalidData(String),
    /// Connection has not been migrated to the schema this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl RepoError {
    pub(crate) fn employee_not_found(employee_id: &str) -> Self {
        Self::NotFound {
            entity: "employee",
            key: employee_id.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} `{key}` not found"),
            Self::DuplicateKey { entity, key } => write!(f, "{entity} `{key}` already exists"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

const REQUIRED_TABLES: &[&str] = &["employees", "attendance"];

/// Fails unless `conn` is migrated to the latest schema with all tables.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [*table],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(RepoError::MissingRequiredTable(*table));
        }
    }

    Ok(())
}

/// Resolves an id to the employee's stored spelling, or `NotFound`.
pub(crate) fn resolve_employee_id(conn: &Connection, employee_id: &str) -> RepoResult<String> {
    let mut stmt =
        conn.prepare_cached("SELECT employee_id FROM employees WHERE employee_id = ?1;")?;
    let mut rows = stmt.query([employee_id.trim()])?;
    match rows.next()? {
        Some(row) => Ok(row.get(0)?),
        None => Err(RepoError::employee_not_found(employee_id.trim())),
    }
}

/// Current wall clock truncated to the millisecond precision we persist.
pub(crate) fn now_timestamp() -> DateTime<Utc> {
    let millis = Utc::now().timestamp_millis();
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

pub(crate) fn timestamp_from_millis(column: &str, millis: i64) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid timestamp `{millis}` in {column}")))
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || inner.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

pub(crate) fn count_to_u32(column: &str, value: i64) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("count `{value}` out of range in {column}")))
}
