//! Monthly statistics over day records.
//!
//! # Responsibility
//! - Compute the attendance percentage and aggregate tallies for one
//!   month-slice of records.
//!
//! # Invariants
//! - Pure and order-independent: no mutation, no I/O, same result for any
//!   iteration order of the input.
//! - One percentage rule for every caller: `holiday`, `weekoff` and `leave`
//!   days never enter the denominator.

use crate::model::day::{DayRecord, DayStatus, LeaveType, Shift};

/// Hours that convert one unit of overtime into a day.
const OVERTIME_DAY_HOURS: f64 = 8.0;

/// Attendance percentage for a month-slice, as an integer `0..=100`.
///
/// Countable days are `present`, `absent` and `halfday`; credit is 1, 0 and
/// 0.5 respectively. Holidays, week-offs, leaves and unmarked days are
/// excluded from the denominator. The percentage is rounded half-up; an
/// empty denominator yields 0.
pub fn monthly_percentage<'a, I>(records: I) -> u32
where
    I: IntoIterator<Item = &'a DayRecord>,
{
    let mut countable = 0u32;
    let mut credit = 0.0f64;

    for record in records {
        match record.status {
            Some(DayStatus::Present) => {
                countable += 1;
                credit += 1.0;
            }
            Some(DayStatus::HalfDay) => {
                countable += 1;
                credit += 0.5;
            }
            Some(DayStatus::Absent) => countable += 1,
            Some(DayStatus::Holiday | DayStatus::WeekOff | DayStatus::Leave(_)) | None => {}
        }
    }

    if countable == 0 {
        return 0;
    }
    (credit / f64::from(countable) * 100.0).round() as u32
}

/// Per-leave-type tallies for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeaveCounts {
    pub privileged: u32,
    pub casual: u32,
    pub sick: u32,
    pub earn: u32,
    pub other: u32,
}

/// Per-shift-code tallies for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShiftCounts {
    pub morning: u32,
    pub afternoon: u32,
    pub night: u32,
    pub general: u32,
}

/// Aggregate tallies for one month-slice of records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthlyAggregates {
    pub present: u32,
    pub absent: u32,
    pub half_day: u32,
    pub holiday: u32,
    pub week_off: u32,
    pub leave: LeaveCounts,
    pub shifts: ShiftCounts,
    /// Sum of overtime hours across the month.
    pub overtime_hours: f64,
}

impl MonthlyAggregates {
    /// Whole overtime days at the standard 8-hour workday.
    pub fn overtime_days(&self) -> u32 {
        (self.overtime_hours / OVERTIME_DAY_HOURS).floor() as u32
    }

    /// Overtime hours left over after whole days are taken out.
    pub fn overtime_remainder_hours(&self) -> f64 {
        self.overtime_hours % OVERTIME_DAY_HOURS
    }
}

/// Tallies statuses, leave kinds, shifts and overtime for a month-slice.
pub fn monthly_aggregates<'a, I>(records: I) -> MonthlyAggregates
where
    I: IntoIterator<Item = &'a DayRecord>,
{
    let mut totals = MonthlyAggregates::default();

    for record in records {
        match record.status {
            Some(DayStatus::Present) => totals.present += 1,
            Some(DayStatus::Absent) => totals.absent += 1,
            Some(DayStatus::HalfDay) => totals.half_day += 1,
            Some(DayStatus::Holiday) => totals.holiday += 1,
            Some(DayStatus::WeekOff) => totals.week_off += 1,
            Some(DayStatus::Leave(kind)) => match kind {
                LeaveType::Privileged => totals.leave.privileged += 1,
                LeaveType::Casual => totals.leave.casual += 1,
                LeaveType::Sick => totals.leave.sick += 1,
                LeaveType::Earn => totals.leave.earn += 1,
                LeaveType::Other => totals.leave.other += 1,
            },
            None => {}
        }

        match record.shift {
            Some(Shift::Morning) => totals.shifts.morning += 1,
            Some(Shift::Afternoon) => totals.shifts.afternoon += 1,
            Some(Shift::Night) => totals.shifts.night += 1,
            Some(Shift::General) => totals.shifts.general += 1,
            None => {}
        }

        if let Some(hours) = record.overtime {
            totals.overtime_hours += hours;
        }
    }

    totals
}
