//! Core domain logic for rollcall, a personal attendance/work-log tracker.
//! This crate is the single source of truth for business invariants: the
//! record model, monthly statistics, snapshot exchange and the peer merge.

pub mod db;
pub mod logging;
mod merge;
pub mod model;
pub mod repo;
pub mod snapshot;
pub mod stats;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::date::{DayDate, MonthKey};
pub use model::day::{DayField, DayKey, DayRecord, DayStatus, LeaveType, Shift};
pub use model::subject::{Subject, SubjectId};
pub use repo::snapshot_repo::{
    MemorySnapshotGateway, PersistenceError, SnapshotGateway, SqliteSnapshotGateway,
};
pub use snapshot::{Snapshot, SnapshotError, SNAPSHOT_VERSION};
pub use stats::{monthly_aggregates, monthly_percentage, LeaveCounts, MonthlyAggregates, ShiftCounts};
pub use store::{AttendanceStore, StoreError, StoreResult, ValidationError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
