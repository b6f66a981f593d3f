//! Per-day attendance facts.
//!
//! # Responsibility
//! - Define the day-level status/shift/overtime/note record and the closed
//!   edit operations that can be applied to it.
//!
//! # Invariants
//! - `DayStatus::Leave` carries its [`LeaveType`]; there is no way to hold a
//!   leave type against any other status.
//! - An all-empty [`DayRecord`] is equivalent to no record at all; the store
//!   removes it from storage on every mutation.

use crate::model::date::DayDate;
use crate::model::subject::SubjectId;

/// Sub-classification for [`DayStatus::Leave`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaveType {
    Privileged,
    Casual,
    Sick,
    Earn,
    /// Catch-all; unknown leave kinds in old payloads decode to this.
    Other,
}

/// Attendance outcome for one subject on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
    Present,
    Absent,
    HalfDay,
    Holiday,
    WeekOff,
    Leave(LeaveType),
}

/// Work shift codes as the user records them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shift {
    Morning,
    Afternoon,
    Night,
    General,
}

impl Shift {
    /// Single-letter code used in payloads and calendar badges.
    pub fn code(self) -> &'static str {
        match self {
            Self::Morning => "M",
            Self::Afternoon => "A",
            Self::Night => "N",
            Self::General => "G",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        match value {
            "M" => Some(Self::Morning),
            "A" => Some(Self::Afternoon),
            "N" => Some(Self::Night),
            "G" => Some(Self::General),
            _ => None,
        }
    }
}

/// All recorded facts for one subject on one calendar day.
///
/// Every field is optional; a record with nothing set must not be stored
/// (the store treats it as identical to a missing record).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DayRecord {
    pub status: Option<DayStatus>,
    pub shift: Option<Shift>,
    /// Overtime hours, strictly greater than zero when present.
    pub overtime: Option<f64>,
    /// Free-text note, non-empty when present.
    pub note: Option<String>,
}

impl DayRecord {
    /// True when no field carries a value, i.e. the record should not exist.
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.shift.is_none() && self.overtime.is_none() && self.note.is_none()
    }
}

/// One field-level edit applied through the store's day setter.
///
/// `None` payloads clear the field. Overtime of `Some(0.0)` is also a clear;
/// zero overtime is never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum DayField {
    Status(Option<DayStatus>),
    Shift(Option<Shift>),
    Overtime(Option<f64>),
    Note(Option<String>),
}

/// Flat composite key for day records: one map, no nested
/// subject -> month -> day bookkeeping. Ordering is subject first, then
/// chronological, so month slices are contiguous ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey {
    pub subject_id: SubjectId,
    pub date: DayDate,
}

impl DayKey {
    pub fn new(subject_id: SubjectId, date: DayDate) -> Self {
        Self { subject_id, date }
    }
}
