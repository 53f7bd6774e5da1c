//! HTTP error taxonomy and its JSON rendering.
//!
//! Every failure leaves the server as
//! `{"success": false, "message": ..., "details": ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hrms_core::{RepoError, ValidationError};
use log::error;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// `detail` is only populated in debug mode.
    #[error("Internal server error")]
    Internal { detail: Option<String> },
}

impl ApiError {
    /// Maps a store failure, hiding internals unless `debug` is set.
    pub fn from_repo(err: RepoError, debug: bool) -> Self {
        match err {
            RepoError::Validation(validation) => Self::Validation(validation),
            RepoError::NotFound { .. } => Self::NotFound(err.to_string()),
            RepoError::DuplicateKey { .. } => Self::Conflict(err.to_string()),
            other => Self::internal(other.to_string(), debug),
        }
    }

    pub fn internal(detail: String, debug: bool) -> Self {
        error!("event=store_failure module=http status=error error={detail}");
        Self::Internal {
            detail: debug.then_some(detail),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Value {
        match self {
            Self::Validation(validation) => json!(validation.violations()),
            Self::Internal {
                detail: Some(detail),
            } => json!(detail),
            _ => Value::Null,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "message": self.to_string(),
            "details": self.details(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::http::StatusCode;
    use hrms_core::RepoError;

    #[test]
    fn repo_errors_map_to_http_statuses() {
        let not_found = ApiError::from_repo(
            RepoError::NotFound {
                entity: "employee",
                key: "EMP404".to_string(),
            },
            false,
        );
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "employee `EMP404` not found");

        let duplicate = ApiError::from_repo(
            RepoError::DuplicateKey {
                entity: "employee",
                key: "EMP001".to_string(),
            },
            false,
        );
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn internal_detail_only_in_debug_mode() {
        let hidden = ApiError::from_repo(RepoError::InvalidData("bad row".to_string()), false);
        assert!(matches!(hidden, ApiError::Internal { detail: None }));

        let shown = ApiError::from_repo(RepoError::InvalidData("bad row".to_string()), true);
        match shown {
            ApiError::Internal { detail: Some(detail) } => assert!(detail.contains("bad row")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
