//! `/employees` handlers.

use crate::error::ApiError;
use crate::routes::{parse_json_body, ListEnvelope};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use hrms_core::{Employee, EmployeeDeletion};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct EmployeeListParams {
    pub department: Option<String>,
}

/// Body of a successful delete.
#[derive(Debug, Serialize)]
pub struct DeleteEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub deletion: EmployeeDeletion,
}

pub async fn create_employee_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    let payload = parse_json_body(&body)?;
    let employee = state
        .with_employee_service(move |service| service.create_employee(&payload))
        .await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn list_employees_handler(
    State(state): State<AppState>,
    Query(params): Query<EmployeeListParams>,
) -> Result<Json<ListEnvelope<Employee>>, ApiError> {
    let employees = state
        .with_employee_service(move |service| {
            service.list_employees(params.department.as_deref())
        })
        .await?;
    let message = format!("Retrieved {} employees", employees.len());
    Ok(Json(ListEnvelope::new(message, employees)))
}

pub async fn get_employee_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Result<Json<Employee>, ApiError> {
    let employee = state
        .with_employee_service(move |service| service.get_employee(&employee_id))
        .await?;
    Ok(Json(employee))
}

pub async fn update_employee_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    body: Bytes,
) -> Result<Json<Employee>, ApiError> {
    let payload = parse_json_body(&body)?;
    let employee = state
        .with_employee_service(move |service| service.update_employee(&employee_id, &payload))
        .await?;
    Ok(Json(employee))
}

pub async fn delete_employee_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Result<Json<DeleteEnvelope>, ApiError> {
    let deletion = state
        .with_employee_service(move |service| service.delete_employee(&employee_id))
        .await?;
    Ok(Json(DeleteEnvelope {
        success: true,
        message: format!(
            "Employee {} deleted along with {} attendance records",
            deletion.employee_id, deletion.attendance_records_deleted
        ),
        deletion,
    }))
}
