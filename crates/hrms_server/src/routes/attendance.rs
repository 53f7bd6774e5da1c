//! `/attendance` handlers.

use crate::error::ApiError;
use crate::routes::{parse_json_body, ListEnvelope};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Local, NaiveDate};
use hrms_core::{AttendanceListQuery, AttendanceRecord, AttendanceSummary, DailySummary};
use serde::Deserialize;

/// Raw query string; validated by `AttendanceListQuery::from_params`.
#[derive(Debug, Default, Deserialize)]
pub struct AttendanceListParams {
    pub date: Option<String>,
    pub skip: Option<String>,
    pub limit: Option<String>,
}

/// Server-local calendar day.
fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn mark_attendance_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<AttendanceRecord>), ApiError> {
    let payload = parse_json_body(&body)?;
    let today = today();
    let record = state
        .with_attendance_service(move |service| service.mark_attendance(&payload, today))
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_attendance_handler(
    State(state): State<AppState>,
    Query(params): Query<AttendanceListParams>,
) -> Result<Json<ListEnvelope<AttendanceRecord>>, ApiError> {
    let query = AttendanceListQuery::from_params(
        params.date.as_deref(),
        params.skip.as_deref(),
        params.limit.as_deref(),
    )?;
    let records = state
        .with_attendance_service(move |service| service.list_attendance(&query))
        .await?;
    let message = format!("Retrieved {} attendance records", records.len());
    Ok(Json(ListEnvelope::new(message, records)))
}

pub async fn employee_attendance_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Result<Json<ListEnvelope<AttendanceRecord>>, ApiError> {
    let label = employee_id.trim().to_string();
    let records = state
        .with_attendance_service(move |service| service.list_for_employee(&employee_id))
        .await?;
    let message = format!(
        "Retrieved {} attendance records for {}",
        records.len(),
        records
            .first()
            .map_or(label.as_str(), |record| record.employee_id.as_str())
    );
    Ok(Json(ListEnvelope::new(message, records)))
}

pub async fn employee_summary_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Result<Json<AttendanceSummary>, ApiError> {
    let summary = state
        .with_attendance_service(move |service| service.employee_summary(&employee_id))
        .await?;
    Ok(Json(summary))
}

pub async fn today_summary_handler(
    State(state): State<AppState>,
) -> Result<Json<DailySummary>, ApiError> {
    let today = today();
    let summary = state
        .with_attendance_service(move |service| service.daily_summary(today))
        .await?;
    Ok(Json(summary))
}
