//! HTTP surface for HRMS Lite.
//!
//! # Responsibility
//! - Map HTTP verbs and paths onto `hrms_core` services.
//! - Own process lifecycle: config, logging, store, graceful shutdown.
//!
//! # Invariants
//! - Handlers never touch SQL; all store work goes through `AppState`.
//! - Blocking store calls run on tokio's blocking pool.

use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use hrms_core::db::{open_db, open_db_in_memory};
use hrms_core::{init_logging, DbError, LoggingError};
use log::{error, info};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{AllowedOrigins, ConfigError, DatabaseLocation, ServerConfig};
pub use error::ApiError;
pub use state::AppState;

use middleware::request_tracing_middleware;
use routes::{attendance, employees, fallback_handler, health};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging init failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("store open failed: {0}")]
    Store(#[from] DbError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds the full router over `state`.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config().allowed_origins);

    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/api/info", get(health::api_info_handler))
        .route(
            "/employees",
            get(employees::list_employees_handler).post(employees::create_employee_handler),
        )
        .route(
            "/employees/:employee_id",
            get(employees::get_employee_handler)
                .put(employees::update_employee_handler)
                .delete(employees::delete_employee_handler),
        )
        .route(
            "/attendance",
            get(attendance::list_attendance_handler).post(attendance::mark_attendance_handler),
        )
        .route(
            "/attendance/employee/:employee_id",
            get(attendance::employee_attendance_handler),
        )
        .route(
            "/attendance/employee/:employee_id/summary",
            get(attendance::employee_summary_handler),
        )
        .route(
            "/attendance/today/summary",
            get(attendance::today_summary_handler),
        )
        .fallback(fallback_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(from_fn(request_tracing_middleware))
        .with_state(state)
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let allow_origin = match origins {
        AllowedOrigins::Any => AllowOrigin::any(),
        AllowedOrigins::List(list) => AllowOrigin::list(
            list.iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        ),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}

/// Runs the server until Ctrl+C or SIGTERM.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    init_logging(&config.log_level, config.log_dir.as_deref())?;

    let conn = match &config.database {
        DatabaseLocation::Memory => open_db_in_memory()?,
        DatabaseLocation::File(path) => open_db(path)?,
    };

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(
        "event=server_start module=http status=ok addr={} app_name={:?} debug={}",
        listener.local_addr()?,
        config.app_name,
        config.debug
    );

    let app = build_router(AppState::new(conn, config));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=http status=ok");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("event=shutdown_signal module=http signal=ctrl_c"),
            Err(err) => {
                error!("event=shutdown_signal module=http status=error signal=ctrl_c error={err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("event=shutdown_signal module=http signal=sigterm");
            }
            Err(err) => {
                error!("event=shutdown_signal module=http status=error signal=sigterm error={err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
