//! Calendar keys for day records.
//!
//! Months are zero-based (0 = January) to match the persisted snapshot
//! format, which stores month keys as `"<year>-<month0>"`.

use chrono::NaiveDate;

/// One calendar month of one year. Storage/query partition only; no
/// invariant spans two months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    /// Zero-based month, `0..=11`.
    pub month0: u32,
}

impl MonthKey {
    /// Returns `None` when `month0` is out of range.
    pub fn new(year: i32, month0: u32) -> Option<Self> {
        if month0 > 11 {
            return None;
        }
        Some(Self { year, month0 })
    }
}

/// A concrete calendar day. Field order gives chronological `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayDate {
    pub year: i32,
    /// Zero-based month, `0..=11`.
    pub month0: u32,
    /// One-based day of month.
    pub day: u32,
}

impl DayDate {
    /// Returns `None` unless `(year, month0, day)` names a real calendar
    /// date (day-in-month is checked, e.g. no February 30).
    pub fn new(year: i32, month0: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month0 + 1, day)?;
        Some(Self { year, month0, day })
    }

    /// True when this value would pass [`DayDate::new`].
    pub fn is_valid(&self) -> bool {
        NaiveDate::from_ymd_opt(self.year, self.month0 + 1, self.day).is_some()
    }

    pub fn month(&self) -> MonthKey {
        MonthKey {
            year: self.year,
            month0: self.month0,
        }
    }
}
