//! Use-case services over the record store.
//!
//! # Responsibility
//! - Run raw payloads through the validation layer, then the repositories.
//! - Keep HTTP and other callers decoupled from SQL details.

pub mod attendance_service;
pub mod employee_service;
