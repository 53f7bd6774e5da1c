//! Service info and liveness endpoints.

use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn root_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": format!("Welcome to {}", state.config().app_name),
        "version": SERVER_VERSION,
        "health": "/health",
    }))
}

pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "healthy",
        "service": state.config().app_name,
        "version": SERVER_VERSION,
    }))
}

pub async fn api_info_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "api_name": state.config().app_name,
        "version": SERVER_VERSION,
        "core_version": hrms_core::core_version(),
        "endpoints": {
            "employees": {
                "create": "POST /employees",
                "list": "GET /employees",
                "get": "GET /employees/{employee_id}",
                "update": "PUT /employees/{employee_id}",
                "delete": "DELETE /employees/{employee_id}",
            },
            "attendance": {
                "mark": "POST /attendance",
                "list": "GET /attendance",
                "by_employee": "GET /attendance/employee/{employee_id}",
                "summary": "GET /attendance/employee/{employee_id}/summary",
                "today": "GET /attendance/today/summary",
            },
        },
    }))
}
