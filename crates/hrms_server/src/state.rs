//! Shared router state: the store handle plus loaded configuration.

use crate::config::ServerConfig;
use crate::error::ApiError;
use hrms_core::{
    AttendanceService, EmployeeService, RepoResult, SqliteAttendanceRepository,
    SqliteEmployeeRepository,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    config: Arc<ServerConfig>,
}

impl AppState {
    /// Takes ownership of an already migrated connection.
    pub fn new(conn: Connection, config: ServerConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs `f` against an employee service on the blocking pool.
    pub async fn with_employee_service<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&EmployeeService<SqliteEmployeeRepository<'_>>) -> RepoResult<T>
            + Send
            + 'static,
    {
        self.with_connection(move |conn| {
            let repo = SqliteEmployeeRepository::try_new(conn)?;
            f(&EmployeeService::new(repo))
        })
        .await
    }

    /// Runs `f` against an attendance service on the blocking pool.
    pub async fn with_attendance_service<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&AttendanceService<SqliteAttendanceRepository<'_>>) -> RepoResult<T>
            + Send
            + 'static,
    {
        self.with_connection(move |conn| {
            let repo = SqliteAttendanceRepository::try_new(conn)?;
            f(&AttendanceService::new(repo))
        })
        .await
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> RepoResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let debug = self.config.debug;

        let joined = tokio::task::spawn_blocking(move || {
            // A panicking holder leaves the connection usable; its open
            // transaction was rolled back on unwind.
            let conn = db.lock().unwrap_or_else(PoisonError::into_inner);
            f(&conn).map_err(|err| ApiError::from_repo(err, debug))
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(err) => Err(ApiError::internal(
                format!("store task failed: {err}"),
                debug,
            )),
        }
    }
}
