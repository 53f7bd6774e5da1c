//! Employee use-case service.
//!
//! # Invariants
//! - No write reaches the repository without passing payload validation.
//! - Missing employees surface as `RepoError::NotFound`, never `Ok(None)`.

use crate::model::employee::{Employee, EmployeePatch, NewEmployee};
use crate::repo::employee_repo::{EmployeeDeletion, EmployeeListQuery, EmployeeRepository};
use crate::repo::{RepoError, RepoResult};
use log::{info, warn};
use serde_json::Value;

/// Use-case service wrapper for employee operations.
pub struct EmployeeService<R: EmployeeRepository> {
    repo: R,
}

impl<R: EmployeeRepository> EmployeeService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates a raw payload and stores a new employee.
    pub fn create_employee(&self, payload: &Value) -> RepoResult<Employee> {
        let employee = NewEmployee::from_payload(payload).inspect_err(|err| {
            warn!("event=employee_create module=service status=rejected reason=validation error={err}");
        })?;

        match self.repo.create_employee(&employee) {
            Ok(created) => {
                info!(
                    "event=employee_create module=service status=ok employee_id={}",
                    created.employee_id
                );
                Ok(created)
            }
            Err(err) => {
                warn!(
                    "event=employee_create module=service status=error employee_id={} error={}",
                    employee.employee_id, err
                );
                Err(err)
            }
        }
    }

    /// Gets one employee; `NotFound` when absent.
    pub fn get_employee(&self, employee_id: &str) -> RepoResult<Employee> {
        self.repo
            .get_employee(employee_id)?
            .ok_or_else(|| RepoError::employee_not_found(employee_id.trim()))
    }

    /// Lists employees, optionally restricted to one department.
    pub fn list_employees(&self, department: Option<&str>) -> RepoResult<Vec<Employee>> {
        let query = EmployeeListQuery::from_params(department)?;
        let employees = self.repo.list_employees(&query)?;
        info!(
            "event=employee_list module=service status=ok count={} department_filter={}",
            employees.len(),
            query.department.is_some()
        );
        Ok(employees)
    }

    /// Validates a partial payload and merges it into the stored employee.
    pub fn update_employee(&self, employee_id: &str, payload: &Value) -> RepoResult<Employee> {
        let patch = EmployeePatch::from_payload(employee_id, payload)?;
        let updated = self.repo.update_employee(employee_id, &patch)?;
        info!(
            "event=employee_update module=service status=ok employee_id={} changed={}",
            updated.employee_id,
            !patch.is_empty()
        );
        Ok(updated)
    }

    /// Deletes an employee together with their attendance.
    pub fn delete_employee(&self, employee_id: &str) -> RepoResult<EmployeeDeletion> {
        let deletion = self.repo.delete_employee(employee_id)?;
        info!(
            "event=employee_delete module=service status=ok employee_id={} attendance_deleted={}",
            deletion.employee_id, deletion.attendance_records_deleted
        );
        Ok(deletion)
    }

    pub fn count_employees(&self) -> RepoResult<u32> {
        self.repo.count_employees()
    }
}
