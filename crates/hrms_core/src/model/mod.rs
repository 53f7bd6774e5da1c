//! Domain records and the validation layer.
//!
//! # Responsibility
//! - Define stored record shapes for employees and attendance.
//! - Turn raw JSON payloads into validated values, reporting every
//!   violated rule at once.
//!
//! # Invariants
//! - Nothing in this module touches storage.

pub mod attendance;
pub mod employee;
pub mod validation;
