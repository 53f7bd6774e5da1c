//! Core domain logic for HRMS Lite.
//! This crate owns every employee and attendance invariant; transports
//! only translate.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{
    default_log_level, init_logging, logging_status, parse_log_level, LogSink, LoggingError,
};
pub use model::attendance::{
    AttendanceRecord, AttendanceStatus, AttendanceSummary, DailySummary, NewAttendance,
};
pub use model::employee::{Employee, EmployeePatch, NewEmployee};
pub use model::validation::{FieldViolation, ValidationError, ViolationCode};
pub use repo::attendance_repo::{
    AttendanceListQuery, AttendanceRepository, SqliteAttendanceRepository, StatusCounts,
};
pub use repo::employee_repo::{
    EmployeeDeletion, EmployeeListQuery, EmployeeRepository, SqliteEmployeeRepository,
};
pub use repo::{RepoError, RepoResult};
pub use service::attendance_service::AttendanceService;
pub use service::employee_service::EmployeeService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
