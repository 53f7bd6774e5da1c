//! Route handlers grouped by resource.

pub mod attendance;
pub mod employees;
pub mod health;

use crate::error::ApiError;
use axum::body::Bytes;
use hrms_core::{ValidationError, ViolationCode};
use serde::Serialize;
use serde_json::Value;

/// Envelope for list responses.
#[derive(Debug, Serialize)]
pub struct ListEnvelope<T> {
    pub success: bool,
    pub message: String,
    pub data: Vec<T>,
    /// Number of items in `data`.
    pub total: usize,
}

impl<T> ListEnvelope<T> {
    pub fn new(message: String, data: Vec<T>) -> Self {
        Self {
            success: true,
            message,
            total: data.len(),
            data,
        }
    }
}

/// Parses a request body as JSON without interpreting its shape.
///
/// Empty or undecodable bodies fail validation on field `body`.
pub(crate) fn parse_json_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.is_empty() {
        return Err(malformed_body("request body is empty".to_string()));
    }
    serde_json::from_slice(body).map_err(|err| malformed_body(format!("invalid JSON: {err}")))
}

fn malformed_body(message: String) -> ApiError {
    ApiError::Validation(ValidationError::single(
        "body",
        ViolationCode::InvalidFormat,
        message,
    ))
}

pub async fn fallback_handler() -> ApiError {
    ApiError::NotFound("route not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::parse_json_body;
    use crate::error::ApiError;
    use axum::body::Bytes;
    use axum::http::StatusCode;
    use hrms_core::ViolationCode;

    fn is_body_violation(raw: &'static [u8]) -> bool {
        match parse_json_body(&Bytes::from_static(raw)) {
            Err(ApiError::Validation(validation)) => {
                validation.has("body", ViolationCode::InvalidFormat)
            }
            _ => false,
        }
    }

    #[test]
    fn undecodable_bodies_fail_validation_on_body() {
        assert!(is_body_violation(b"{\"employee_id\":"));
        assert!(is_body_violation(b""));
        assert!(is_body_violation(b"not json"));

        let err = parse_json_body(&Bytes::new()).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn any_json_value_is_passed_through() {
        assert!(parse_json_body(&Bytes::from_static(b"[1, 2]")).is_ok());
        assert!(parse_json_body(&Bytes::from_static(b"{}")).is_ok());
    }
}
