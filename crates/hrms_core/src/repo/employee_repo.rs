//! Employee repository contract and SQLite implementation.
//!
//! # Invariants
//! - `employee_id` lookups are case-insensitive (`COLLATE NOCASE` key).
//! - `created_at` is written once; `updated_at` moves on every applied patch.
//! - Deleting an employee removes their attendance in the same transaction.

use crate::model::employee::{Employee, EmployeePatch, NewEmployee, DEPARTMENT_MAX_CHARS};
use crate::model::validation::{collapse_whitespace, ValidationError, Violations};
use crate::repo::{
    count_to_u32, ensure_connection_ready, is_unique_violation, now_timestamp,
    resolve_employee_id, timestamp_from_millis, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

const EMPLOYEE_SELECT_SQL: &str = "SELECT
    employee_id,
    full_name,
    email,
    department,
    created_at,
    updated_at
FROM employees";

/// Query options for listing employees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeListQuery {
    /// Case-insensitive exact department match.
    pub department: Option<String>,
}

impl EmployeeListQuery {
    /// Normalizes a raw `department` query value. Blank means no filter.
    pub fn from_params(department: Option<&str>) -> Result<Self, ValidationError> {
        let department = department
            .map(collapse_whitespace)
            .filter(|value| !value.is_empty());

        if let Some(value) = &department {
            let mut violations = Violations::default();
            violations.check_text("department", value, DEPARTMENT_MAX_CHARS);
            violations.into_result()?;
        }

        Ok(Self { department })
    }
}

/// Outcome of a successful employee delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeDeletion {
    pub employee_id: String,
    pub attendance_records_deleted: u32,
}

/// Repository interface for employee CRUD.
pub trait EmployeeRepository {
    /// Inserts a new employee; `DuplicateKey` when the id is taken.
    fn create_employee(&self, employee: &NewEmployee) -> RepoResult<Employee>;
    fn get_employee(&self, employee_id: &str) -> RepoResult<Option<Employee>>;
    /// Lists employees in insertion order.
    fn list_employees(&self, query: &EmployeeListQuery) -> RepoResult<Vec<Employee>>;
    /// Merges `patch` into the stored record; `NotFound` when absent.
    fn update_employee(&self, employee_id: &str, patch: &EmployeePatch) -> RepoResult<Employee>;
    /// Removes the employee and their attendance; `NotFound` when absent.
    fn delete_employee(&self, employee_id: &str) -> RepoResult<EmployeeDeletion>;
    fn count_employees(&self) -> RepoResult<u32>;
}

/// SQLite-backed employee repository.
pub struct SqliteEmployeeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn fetch(conn: &Connection, employee_id: &str) -> RepoResult<Option<Employee>> {
        let mut stmt = conn.prepare_cached(&format!(
            "{EMPLOYEE_SELECT_SQL} WHERE employee_id = ?1;"
        ))?;
        let row = stmt
            .query_row([employee_id.trim()], |row| Ok(read_employee_row(row)))
            .optional()?;
        row.transpose()
    }
}

impl EmployeeRepository for SqliteEmployeeRepository<'_> {
    fn create_employee(&self, employee: &NewEmployee) -> RepoResult<Employee> {
        employee.validate()?;

        let now = now_timestamp();
        let inserted = self.conn.execute(
            "INSERT INTO employees (
                employee_id,
                full_name,
                email,
                department,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5);",
            params![
                employee.employee_id.as_str(),
                employee.full_name.as_str(),
                employee.email.as_str(),
                employee.department.as_str(),
                now.timestamp_millis(),
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::DuplicateKey {
                    entity: "employee",
                    key: employee.employee_id.clone(),
                });
            }
            Err(err) => return Err(err.into()),
        }

        Ok(Employee {
            employee_id: employee.employee_id.clone(),
            full_name: employee.full_name.clone(),
            email: employee.email.clone(),
            department: employee.department.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_employee(&self, employee_id: &str) -> RepoResult<Option<Employee>> {
        Self::fetch(self.conn, employee_id)
    }

    fn list_employees(&self, query: &EmployeeListQuery) -> RepoResult<Vec<Employee>> {
        let mut employees = Vec::new();

        match query.department.as_deref() {
            Some(department) => {
                let mut stmt = self.conn.prepare_cached(&format!(
                    "{EMPLOYEE_SELECT_SQL}
                     WHERE department = ?1 COLLATE NOCASE
                     ORDER BY rowid ASC;"
                ))?;
                let mut rows = stmt.query([department.trim()])?;
                while let Some(row) = rows.next()? {
                    employees.push(read_employee_row(row)?);
                }
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare_cached(&format!("{EMPLOYEE_SELECT_SQL} ORDER BY rowid ASC;"))?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    employees.push(read_employee_row(row)?);
                }
            }
        }

        Ok(employees)
    }

    fn update_employee(&self, employee_id: &str, patch: &EmployeePatch) -> RepoResult<Employee> {
        patch.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let mut employee = Self::fetch(&tx, employee_id)?
            .ok_or_else(|| RepoError::employee_not_found(employee_id.trim()))?;

        if patch.is_empty() {
            return Ok(employee);
        }

        patch.apply_to(&mut employee);
        employee.updated_at = now_timestamp();

        tx.execute(
            "UPDATE employees
             SET
                full_name = ?2,
                email = ?3,
                department = ?4,
                updated_at = ?5
             WHERE employee_id = ?1;",
            params![
                employee.employee_id.as_str(),
                employee.full_name.as_str(),
                employee.email.as_str(),
                employee.department.as_str(),
                employee.updated_at.timestamp_millis(),
            ],
        )?;
        tx.commit()?;

        Ok(employee)
    }

    fn delete_employee(&self, employee_id: &str) -> RepoResult<EmployeeDeletion> {
        let tx = self.conn.unchecked_transaction()?;
        let canonical_id = resolve_employee_id(&tx, employee_id)?;

        let attendance_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM attendance WHERE employee_id = ?1;",
            [canonical_id.as_str()],
            |row| row.get(0),
        )?;
        tx.execute(
            "DELETE FROM employees WHERE employee_id = ?1;",
            [canonical_id.as_str()],
        )?;
        tx.commit()?;

        Ok(EmployeeDeletion {
            employee_id: canonical_id,
            attendance_records_deleted: count_to_u32("attendance", attendance_count)?,
        })
    }

    fn count_employees(&self) -> RepoResult<u32> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM employees;", [], |row| row.get(0))?;
        count_to_u32("employees", count)
    }
}

fn read_employee_row(row: &Row<'_>) -> RepoResult<Employee> {
    let employee = Employee {
        employee_id: row.get("employee_id")?,
        full_name: row.get("full_name")?,
        email: row.get("email")?,
        department: row.get("department")?,
        created_at: timestamp_from_millis("employees.created_at", row.get("created_at")?)?,
        updated_at: timestamp_from_millis("employees.updated_at", row.get("updated_at")?)?,
    };

    let as_new = NewEmployee {
        employee_id: employee.employee_id.clone(),
        full_name: employee.full_name.clone(),
        email: employee.email.clone(),
        department: employee.department.clone(),
    };
    as_new.validate().map_err(|err| {
        RepoError::InvalidData(format!(
            "employee `{}` failed validation: {err}",
            employee.employee_id
        ))
    })?;

    Ok(employee)
}
