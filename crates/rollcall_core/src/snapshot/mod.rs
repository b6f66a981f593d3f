//! Snapshot wire format: the single payload shape shared by durable saves,
//! export/import backups and peer merge exchanges.
//!
//! # Responsibility
//! - Translate between the domain model and the versioned JSON document
//!   (`subjects` / `attendanceData` / `version` / `exportDate`).
//! - Reject malformed payloads before any of them reaches a store mutation.
//!
//! # Invariants
//! - Decoding is fail-closed: a payload missing `subjects` or
//!   `attendanceData`, or containing keys/codes that do not parse, yields an
//!   error and no partial result.
//! - Decoded records already satisfy the model invariants: no zero overtime,
//!   no blank notes, no leave type outside a leave status, no empty records.

use crate::model::date::DayDate;
use crate::model::day::{DayKey, DayRecord, DayStatus, LeaveType, Shift};
use crate::model::subject::{Subject, SubjectId};
use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Format tag written into every produced payload.
pub const SNAPSHOT_VERSION: &str = "1.0";

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Malformed-payload errors. All of them mean "nothing was applied".
#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    MissingField(&'static str),
    InvalidSubjectId(String),
    BlankSubjectName(SubjectId),
    InvalidMonthKey(String),
    InvalidDay { month_key: String, day: String },
    UnknownStatus(String),
    UnknownShift(String),
    InvalidOvertime(f64),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "payload is not valid JSON: {err}"),
            Self::MissingField(field) => write!(f, "payload is missing `{field}`"),
            Self::InvalidSubjectId(key) => write!(f, "subject key `{key}` is not an integer id"),
            Self::BlankSubjectName(id) => write!(f, "subject {id} has a blank name"),
            Self::InvalidMonthKey(key) => {
                write!(f, "month key `{key}` is not `<year>-<month0>` with month 0..=11")
            }
            Self::InvalidDay { month_key, day } => {
                write!(f, "day `{day}` is not a real date in month `{month_key}`")
            }
            Self::UnknownStatus(value) => write!(f, "unknown status `{value}`"),
            Self::UnknownShift(value) => write!(f, "unknown shift `{value}`"),
            Self::InvalidOvertime(value) => write!(f, "overtime {value} is not a positive number"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Fully decoded, validated snapshot content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub subjects: Vec<Subject>,
    pub records: BTreeMap<DayKey, DayRecord>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotDoc {
    subjects: Option<Vec<Subject>>,
    #[serde(rename = "attendanceData")]
    attendance_data: Option<BTreeMap<String, BTreeMap<String, BTreeMap<String, DayRecordDoc>>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    /// Informational only; merge and import logic never read it.
    #[serde(rename = "exportDate", skip_serializing_if = "Option::is_none")]
    export_date: Option<String>,
}

#[derive(Serialize, Deserialize, Default)]
struct DayRecordDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(rename = "leaveType", skip_serializing_if = "Option::is_none")]
    leave_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shift: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    overtime: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

impl Snapshot {
    /// Decodes and validates a payload, fail-closed.
    ///
    /// Tolerated oddities from historical data sources: duplicate subject
    /// ids keep the first occurrence, record groups without a matching
    /// subject are dropped, a `leaveType` next to a non-leave status is
    /// ignored, and zero overtime decodes as "no overtime". Everything else
    /// that does not parse is an error.
    pub fn from_json(payload: &str) -> SnapshotResult<Self> {
        let doc: SnapshotDoc = serde_json::from_str(payload)?;
        let subject_docs = doc.subjects.ok_or(SnapshotError::MissingField("subjects"))?;
        let attendance = doc
            .attendance_data
            .ok_or(SnapshotError::MissingField("attendanceData"))?;

        let mut subjects: Vec<Subject> = Vec::with_capacity(subject_docs.len());
        for subject in subject_docs {
            if subject.name.trim().is_empty() {
                return Err(SnapshotError::BlankSubjectName(subject.id));
            }
            if subjects.iter().any(|known| known.id == subject.id) {
                warn!(
                    "event=snapshot_decode module=snapshot status=warn reason=duplicate_subject_id id={}",
                    subject.id
                );
                continue;
            }
            subjects.push(subject);
        }

        let mut records = BTreeMap::new();
        for (subject_key, months) in attendance {
            let subject_id: SubjectId = subject_key
                .parse()
                .map_err(|_| SnapshotError::InvalidSubjectId(subject_key.clone()))?;
            if !subjects.iter().any(|subject| subject.id == subject_id) {
                warn!(
                    "event=snapshot_decode module=snapshot status=warn reason=orphan_records subject_id={}",
                    subject_id
                );
                continue;
            }

            for (month_key, days) in months {
                let (year, month0) = parse_month_key(&month_key)?;
                for (day_key, day_doc) in days {
                    let day: u32 = day_key.parse().map_err(|_| SnapshotError::InvalidDay {
                        month_key: month_key.clone(),
                        day: day_key.clone(),
                    })?;
                    let date =
                        DayDate::new(year, month0, day).ok_or_else(|| SnapshotError::InvalidDay {
                            month_key: month_key.clone(),
                            day: day_key.clone(),
                        })?;

                    let record = decode_record(day_doc)?;
                    if record.is_empty() {
                        continue;
                    }
                    records.insert(DayKey::new(subject_id, date), record);
                }
            }
        }

        Ok(Self { subjects, records })
    }

    /// Encodes this snapshot as the versioned JSON payload, stamped with the
    /// current export time.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut attendance: BTreeMap<String, BTreeMap<String, BTreeMap<String, DayRecordDoc>>> =
            BTreeMap::new();
        for (key, record) in &self.records {
            attendance
                .entry(key.subject_id.to_string())
                .or_default()
                .entry(format!("{}-{}", key.date.year, key.date.month0))
                .or_default()
                .insert(key.date.day.to_string(), encode_record(record));
        }

        let doc = SnapshotDoc {
            subjects: Some(self.subjects.clone()),
            attendance_data: Some(attendance),
            version: Some(SNAPSHOT_VERSION.to_string()),
            export_date: Some(Utc::now().to_rfc3339()),
        };
        serde_json::to_string(&doc)
    }
}

fn parse_month_key(key: &str) -> SnapshotResult<(i32, u32)> {
    let invalid = || SnapshotError::InvalidMonthKey(key.to_string());
    let (year_part, month_part) = key.rsplit_once('-').ok_or_else(invalid)?;
    let year: i32 = year_part.parse().map_err(|_| invalid())?;
    let month0: u32 = month_part.parse().map_err(|_| invalid())?;
    if month0 > 11 {
        return Err(invalid());
    }
    Ok((year, month0))
}

fn decode_record(doc: DayRecordDoc) -> SnapshotResult<DayRecord> {
    let status = match doc.status.as_deref() {
        None => None,
        Some("leave") => Some(DayStatus::Leave(parse_leave_type(doc.leave_type.as_deref()))),
        Some(other) => Some(parse_status(other)?),
    };

    let shift = match doc.shift.as_deref() {
        None => None,
        Some(code) => {
            Some(Shift::from_code(code).ok_or_else(|| SnapshotError::UnknownShift(code.to_string()))?)
        }
    };

    let overtime = match doc.overtime {
        None => None,
        Some(value) if value == 0.0 => None,
        Some(value) if value.is_finite() && value > 0.0 => Some(value),
        Some(value) => return Err(SnapshotError::InvalidOvertime(value)),
    };

    let note = doc
        .note
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    Ok(DayRecord {
        status,
        shift,
        overtime,
        note,
    })
}

fn encode_record(record: &DayRecord) -> DayRecordDoc {
    let (status, leave_type) = match record.status {
        None => (None, None),
        Some(DayStatus::Leave(kind)) => (
            Some("leave".to_string()),
            Some(leave_type_code(kind).to_string()),
        ),
        Some(status) => (Some(status_code(status).to_string()), None),
    };

    DayRecordDoc {
        status,
        leave_type,
        shift: record.shift.map(|shift| shift.code().to_string()),
        overtime: record.overtime,
        note: record.note.clone(),
    }
}

fn status_code(status: DayStatus) -> &'static str {
    match status {
        DayStatus::Present => "present",
        DayStatus::Absent => "absent",
        DayStatus::HalfDay => "halfday",
        DayStatus::Holiday => "holiday",
        DayStatus::WeekOff => "weekoff",
        DayStatus::Leave(_) => "leave",
    }
}

fn parse_status(value: &str) -> SnapshotResult<DayStatus> {
    match value {
        "present" => Ok(DayStatus::Present),
        "absent" => Ok(DayStatus::Absent),
        "halfday" => Ok(DayStatus::HalfDay),
        "holiday" => Ok(DayStatus::Holiday),
        "weekoff" => Ok(DayStatus::WeekOff),
        other => Err(SnapshotError::UnknownStatus(other.to_string())),
    }
}

fn leave_type_code(kind: LeaveType) -> &'static str {
    match kind {
        LeaveType::Privileged => "privileged",
        LeaveType::Casual => "casual",
        LeaveType::Sick => "sick",
        LeaveType::Earn => "earn",
        LeaveType::Other => "other",
    }
}

// Unknown or missing leave kinds fold into Other rather than failing the
// whole payload; old exports did not always write the field.
fn parse_leave_type(value: Option<&str>) -> LeaveType {
    match value {
        Some("privileged") => LeaveType::Privileged,
        Some("casual") => LeaveType::Casual,
        Some("sick") => LeaveType::Sick,
        Some("earn") => LeaveType::Earn,
        _ => LeaveType::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_month_key;

    #[test]
    fn month_key_parses_year_and_zero_based_month() {
        assert_eq!(parse_month_key("2024-0").unwrap(), (2024, 0));
        assert_eq!(parse_month_key("2024-11").unwrap(), (2024, 11));
    }

    #[test]
    fn month_key_rejects_out_of_range_and_garbage() {
        assert!(parse_month_key("2024-12").is_err());
        assert!(parse_month_key("2024").is_err());
        assert!(parse_month_key("march-2024").is_err());
        assert!(parse_month_key("2024-").is_err());
    }
}
