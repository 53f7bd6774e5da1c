use chrono::{Days, Local};
use hrms_core::db::open_db_in_memory;
use hrms_server::{build_router, AppState, ServerConfig};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

async fn spawn_server(overrides: &[(&str, &str)]) -> std::net::SocketAddr {
    let vars: HashMap<String, String> = overrides
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    let config = ServerConfig::from_lookup(|key| vars.get(key).cloned()).expect("config");
    let conn = open_db_in_memory().expect("in-memory store");
    let app = build_router(AppState::new(conn, config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn send_raw(
    addr: std::net::SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    if let Some(body) = body {
        req.push_str("Content-Type: application/json\r\n");
        req.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    req.push_str("\r\n");
    if let Some(body) = body {
        req.push_str(body);
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_string(), body.to_string())
}

async fn send_json(
    addr: std::net::SocketAddr,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (u16, Value) {
    let encoded = body.map(|value| value.to_string());
    let (status, _, body) = send_raw(addr, method, path, &[], encoded.as_deref()).await;
    let json = serde_json::from_str(&body).unwrap_or(Value::Null);
    (status, json)
}

fn employee(id: &str, department: &str) -> Value {
    json!({
        "employee_id": id,
        "full_name": "John Doe",
        "email": "john@company.com",
        "department": department,
    })
}

#[tokio::test]
async fn employee_and_attendance_end_to_end_flow() {
    let addr = spawn_server(&[]).await;

    let (status, created) =
        send_json(addr, "POST", "/employees", Some(employee("EMP001", "Engineering"))).await;
    assert_eq!(status, 201);
    assert_eq!(created["employee_id"], "EMP001");
    assert_eq!(created["department"], "Engineering");

    let (status, fetched) = send_json(addr, "GET", "/employees/emp001", None).await;
    assert_eq!(status, 200);
    assert_eq!(fetched, created);

    let (status, listed) = send_json(addr, "GET", "/employees", None).await;
    assert_eq!(status, 200);
    assert_eq!(listed["success"], true);
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["data"][0]["employee_id"], "EMP001");

    let (status, mark) = send_json(
        addr,
        "POST",
        "/attendance",
        Some(json!({ "employee_id": "EMP001", "date": "2024-01-15", "status": "Present" })),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(mark["date"], "2024-01-15");
    assert_eq!(mark["status"], "present");

    let (status, records) = send_json(addr, "GET", "/attendance/employee/EMP001", None).await;
    assert_eq!(status, 200);
    assert_eq!(records["total"], 1);
    assert_eq!(records["data"][0]["date"], "2024-01-15");

    let (status, summary) =
        send_json(addr, "GET", "/attendance/employee/EMP001/summary", None).await;
    assert_eq!(status, 200);
    assert_eq!(summary["total_days"], 1);
    assert_eq!(summary["present_days"], 1);
    assert_eq!(summary["attendance_percentage"], 100.0);

    let (status, deleted) = send_json(addr, "DELETE", "/employees/EMP001", None).await;
    assert_eq!(status, 200);
    assert_eq!(deleted["success"], true);
    assert_eq!(deleted["employee_id"], "EMP001");
    assert_eq!(deleted["attendance_records_deleted"], 1);

    let (status, missing) = send_json(addr, "GET", "/employees/EMP001", None).await;
    assert_eq!(status, 404);
    assert_eq!(missing["success"], false);

    let (status, attendance) = send_json(addr, "GET", "/attendance", None).await;
    assert_eq!(status, 200);
    assert_eq!(attendance["total"], 0);
}

#[tokio::test]
async fn error_statuses_follow_failure_kind() {
    let addr = spawn_server(&[]).await;

    let (status, _) =
        send_json(addr, "POST", "/employees", Some(employee("EMP001", "Engineering"))).await;
    assert_eq!(status, 201);

    let (status, duplicate) =
        send_json(addr, "POST", "/employees", Some(employee("emp001", "Sales"))).await;
    assert_eq!(status, 409);
    assert_eq!(duplicate["success"], false);

    let (status, invalid) = send_json(
        addr,
        "POST",
        "/employees",
        Some(json!({ "employee_id": "EMP002", "full_name": "", "email": "nope" })),
    )
    .await;
    assert_eq!(status, 422);
    let fields: Vec<&str> = invalid["details"]
        .as_array()
        .expect("violation list")
        .iter()
        .filter_map(|violation| violation["field"].as_str())
        .collect();
    assert!(fields.contains(&"full_name"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"department"));

    let (status, _, body) =
        send_raw(addr, "POST", "/employees", &[], Some("{\"employee_id\": ")).await;
    assert_eq!(status, 422);
    let malformed: Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(malformed["success"], false);
    assert_eq!(malformed["details"][0]["field"], "body");
    assert_eq!(malformed["details"][0]["code"], "invalid_format");

    let (status, _, _) = send_raw(
        addr,
        "PUT",
        "/employees/EMP001",
        &[("Content-Type", "application/json"), ("Content-Length", "0")],
        None,
    )
    .await;
    assert_eq!(status, 422);

    let (status, _) = send_json(
        addr,
        "PUT",
        "/employees/EMP404",
        Some(json!({ "full_name": "Ghost Writer" })),
    )
    .await;
    assert_eq!(status, 404);

    let (status, _) = send_json(
        addr,
        "POST",
        "/attendance",
        Some(json!({ "employee_id": "EMP404", "date": "2024-01-15", "status": "present" })),
    )
    .await;
    assert_eq!(status, 404);

    let (status, listed) = send_json(addr, "GET", "/attendance", None).await;
    assert_eq!(status, 200);
    assert_eq!(listed["total"], 0);

    let (status, _) = send_json(addr, "GET", "/attendance/employee/EMP404", None).await;
    assert_eq!(status, 404);
    let (status, _) = send_json(addr, "GET", "/nowhere", None).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn attendance_rules_are_enforced_over_http() {
    let addr = spawn_server(&[]).await;
    send_json(addr, "POST", "/employees", Some(employee("EMP001", "Engineering"))).await;

    let today = Local::now().date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).expect("tomorrow");

    let (status, _) = send_json(
        addr,
        "POST",
        "/attendance",
        Some(json!({
            "employee_id": "EMP001",
            "date": today.format("%Y-%m-%d").to_string(),
            "status": "leave",
        })),
    )
    .await;
    assert_eq!(status, 201);

    let (status, _) = send_json(
        addr,
        "POST",
        "/attendance",
        Some(json!({
            "employee_id": "emp001",
            "date": today.format("%Y-%m-%d").to_string(),
            "status": "present",
        })),
    )
    .await;
    assert_eq!(status, 409);

    let (status, future) = send_json(
        addr,
        "POST",
        "/attendance",
        Some(json!({
            "employee_id": "EMP001",
            "date": tomorrow.format("%Y-%m-%d").to_string(),
            "status": "present",
        })),
    )
    .await;
    assert_eq!(status, 422);
    assert_eq!(future["details"][0]["code"], "future_date");

    let (status, daily) = send_json(addr, "GET", "/attendance/today/summary", None).await;
    assert_eq!(status, 200);
    assert_eq!(daily["total_employees"], 1);
    assert_eq!(daily["leave"], 1);
    assert_eq!(daily["not_marked"], 0);

    let (status, bad_query) = send_json(addr, "GET", "/attendance?limit=0", None).await;
    assert_eq!(status, 422);
    assert_eq!(bad_query["details"][0]["field"], "limit");
}

#[tokio::test]
async fn update_merges_and_guards_employee_id() {
    let addr = spawn_server(&[]).await;
    send_json(addr, "POST", "/employees", Some(employee("EMP001", "Engineering"))).await;

    let (status, updated) = send_json(
        addr,
        "PUT",
        "/employees/EMP001",
        Some(json!({ "department": "Platform" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(updated["department"], "Platform");
    assert_eq!(updated["full_name"], "John Doe");

    let (status, rejected) = send_json(
        addr,
        "PUT",
        "/employees/EMP001",
        Some(json!({ "employee_id": "EMP002" })),
    )
    .await;
    assert_eq!(status, 422);
    assert_eq!(rejected["details"][0]["code"], "immutable");

    let (status, listed) =
        send_json(addr, "GET", "/employees?department=platform", None).await;
    assert_eq!(status, 200);
    assert_eq!(listed["total"], 1);
}

#[tokio::test]
async fn responses_carry_request_id_and_service_info() {
    let addr = spawn_server(&[("HRMS_APP_NAME", "Acme HR")]).await;

    let (status, head, body) = send_raw(addr, "GET", "/health", &[], None).await;
    assert_eq!(status, 200);
    assert!(head.to_ascii_lowercase().contains("x-request-id:"));
    let health: Value = serde_json::from_str(&body).expect("health json");
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "Acme HR");

    let (_, head, _) = send_raw(
        addr,
        "GET",
        "/employees/EMP404",
        &[("x-request-id", "trace-42")],
        None,
    )
    .await;
    assert!(head.contains("trace-42"));

    let (status, info) = send_json(addr, "GET", "/api/info", None).await;
    assert_eq!(status, 200);
    assert_eq!(info["api_name"], "Acme HR");
    assert!(info["endpoints"]["attendance"]["today"].is_string());

    let (status, root) = send_json(addr, "GET", "/", None).await;
    assert_eq!(status, 200);
    assert_eq!(root["message"], "Welcome to Acme HR");
}
