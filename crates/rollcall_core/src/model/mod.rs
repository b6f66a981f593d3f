//! Attendance domain model.
//!
//! # Responsibility
//! - Define the canonical record shapes used by store, statistics and merge.
//! - Make invalid field combinations unrepresentable (a leave type only
//!   exists inside a leave status, shift codes are a closed enum).
//!
//! # Invariants
//! - A `DayRecord` with no fields set is never stored; write paths prune it.
//! - `overtime` is strictly positive when present.

pub mod date;
pub mod day;
pub mod subject;
