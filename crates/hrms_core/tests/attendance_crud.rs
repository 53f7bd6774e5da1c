use chrono::NaiveDate;
use hrms_core::db::open_db_in_memory;
use hrms_core::{
    AttendanceListQuery, AttendanceService, AttendanceStatus, EmployeeService, RepoError,
    SqliteAttendanceRepository, SqliteEmployeeRepository, ViolationCode,
};
use rusqlite::Connection;
use serde_json::json;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn attendance(conn: &Connection) -> AttendanceService<SqliteAttendanceRepository<'_>> {
    AttendanceService::new(SqliteAttendanceRepository::try_new(conn).unwrap())
}

fn seed_employees(conn: &Connection, ids: &[&str]) {
    let employees = EmployeeService::new(SqliteEmployeeRepository::try_new(conn).unwrap());
    for id in ids {
        employees
            .create_employee(&json!({
                "employee_id": id,
                "full_name": "Test Person",
                "email": "person@company.com",
                "department": "Engineering",
            }))
            .unwrap();
    }
}

fn mark(
    service: &AttendanceService<SqliteAttendanceRepository<'_>>,
    id: &str,
    date: &str,
    status: &str,
) {
    service
        .mark_attendance(
            &json!({ "employee_id": id, "date": date, "status": status }),
            today(),
        )
        .unwrap();
}

#[test]
fn mark_returns_record_with_canonical_employee_id() {
    let conn = open_db_in_memory().unwrap();
    seed_employees(&conn, &["EMP001"]);
    let service = attendance(&conn);

    let record = service
        .mark_attendance(
            &json!({ "employee_id": "emp001", "date": "2024-03-15", "status": "Present" }),
            today(),
        )
        .unwrap();

    assert_eq!(record.employee_id, "EMP001");
    assert_eq!(record.date, today());
    assert_eq!(record.status, AttendanceStatus::Present);
}

#[test]
fn mark_for_unknown_employee_is_not_found_and_stores_nothing() {
    let conn = open_db_in_memory().unwrap();
    seed_employees(&conn, &["EMP001"]);
    let service = attendance(&conn);
    mark(&service, "EMP001", "2024-03-01", "present");

    let err = service
        .mark_attendance(
            &json!({ "employee_id": "EMP404", "date": "2024-03-01", "status": "present" }),
            today(),
        )
        .unwrap_err();

    assert!(matches!(err, RepoError::NotFound { entity: "employee", .. }));
    assert_eq!(
        service
            .list_attendance(&AttendanceListQuery::default())
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn second_mark_for_same_day_is_duplicate() {
    let conn = open_db_in_memory().unwrap();
    seed_employees(&conn, &["EMP001"]);
    let service = attendance(&conn);
    mark(&service, "EMP001", "2024-03-01", "present");

    let err = service
        .mark_attendance(
            &json!({ "employee_id": "Emp001", "date": "2024-03-01", "status": "absent" }),
            today(),
        )
        .unwrap_err();

    assert!(matches!(err, RepoError::DuplicateKey { entity: "attendance", .. }));
    let records = service.list_for_employee("EMP001").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, AttendanceStatus::Present);
}

#[test]
fn future_dates_and_bad_statuses_are_rejected_together() {
    let conn = open_db_in_memory().unwrap();
    seed_employees(&conn, &["EMP001"]);
    let service = attendance(&conn);

    let err = service
        .mark_attendance(
            &json!({ "employee_id": "EMP001", "date": "2024-03-16", "status": "holiday" }),
            today(),
        )
        .unwrap_err();

    match err {
        RepoError::Validation(validation) => {
            assert!(validation.has("date", ViolationCode::FutureDate));
            assert!(validation.has("status", ViolationCode::UnknownValue));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn list_for_employee_keeps_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    seed_employees(&conn, &["EMP001", "EMP002"]);
    let service = attendance(&conn);
    mark(&service, "EMP001", "2024-03-10", "present");
    mark(&service, "EMP002", "2024-03-10", "absent");
    mark(&service, "EMP001", "2024-03-02", "leave");

    let dates: Vec<NaiveDate> = service
        .list_for_employee("emp001")
        .unwrap()
        .into_iter()
        .map(|record| record.date)
        .collect();
    assert_eq!(dates, vec![day(10), day(2)]);

    assert!(matches!(
        service.list_for_employee("EMP404").unwrap_err(),
        RepoError::NotFound { .. }
    ));
}

#[test]
fn list_filters_by_date_and_paginates() {
    let conn = open_db_in_memory().unwrap();
    seed_employees(&conn, &["EMP001", "EMP002", "EMP003"]);
    let service = attendance(&conn);
    mark(&service, "EMP001", "2024-03-01", "present");
    mark(&service, "EMP002", "2024-03-01", "absent");
    mark(&service, "EMP003", "2024-03-01", "leave");
    mark(&service, "EMP001", "2024-03-02", "present");

    let by_date = AttendanceListQuery::from_params(Some("2024-03-01"), None, None).unwrap();
    assert_eq!(service.list_attendance(&by_date).unwrap().len(), 3);

    let page = AttendanceListQuery::from_params(None, Some("1"), Some("2")).unwrap();
    let ids: Vec<String> = service
        .list_attendance(&page)
        .unwrap()
        .into_iter()
        .map(|record| record.employee_id)
        .collect();
    assert_eq!(ids, vec!["EMP002", "EMP003"]);

    let tail = AttendanceListQuery::from_params(None, Some("3"), None).unwrap();
    let rest = service.list_attendance(&tail).unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].date, day(2));
}

#[test]
fn list_params_are_validated() {
    let err = AttendanceListQuery::from_params(Some("03/01/2024"), Some("-1"), Some("501"))
        .unwrap_err();

    assert!(err.has("date", ViolationCode::InvalidFormat));
    assert!(err.has("skip", ViolationCode::InvalidFormat));
    assert!(err.has("limit", ViolationCode::InvalidFormat));
    let signed = AttendanceListQuery::from_params(Some("+2024-1-01"), None, None).unwrap_err();
    assert!(signed.has("date", ViolationCode::InvalidFormat));
    assert!(AttendanceListQuery::from_params(None, None, Some("0")).is_err());
    assert_eq!(
        AttendanceListQuery::from_params(None, None, Some("500"))
            .unwrap()
            .limit,
        Some(500)
    );
}

#[test]
fn employee_summary_counts_each_status() {
    let conn = open_db_in_memory().unwrap();
    seed_employees(&conn, &["EMP001", "EMP002"]);
    let service = attendance(&conn);
    mark(&service, "EMP001", "2024-03-01", "present");
    mark(&service, "EMP001", "2024-03-02", "present");
    mark(&service, "EMP001", "2024-03-03", "absent");
    mark(&service, "EMP002", "2024-03-01", "leave");

    let summary = service.employee_summary("emp001").unwrap();
    assert_eq!(summary.employee_id, "EMP001");
    assert_eq!(summary.total_days, 3);
    assert_eq!(summary.present_days, 2);
    assert_eq!(summary.absent_days, 1);
    assert_eq!(summary.leave_days, 0);
    assert_eq!(summary.attendance_percentage, 66.67);

    assert!(matches!(
        service.employee_summary("EMP404").unwrap_err(),
        RepoError::NotFound { .. }
    ));
}

#[test]
fn daily_summary_reports_unmarked_employees() {
    let conn = open_db_in_memory().unwrap();
    seed_employees(&conn, &["EMP001", "EMP002", "EMP003", "EMP004"]);
    let service = attendance(&conn);
    mark(&service, "EMP001", "2024-03-15", "present");
    mark(&service, "EMP002", "2024-03-15", "leave");
    mark(&service, "EMP003", "2024-03-14", "absent");

    let summary = service.daily_summary(today()).unwrap();
    assert_eq!(summary.total_employees, 4);
    assert_eq!(summary.present, 1);
    assert_eq!(summary.absent, 0);
    assert_eq!(summary.leave, 1);
    assert_eq!(summary.not_marked, 2);
}
