//! Attendance store: the single source of truth for subjects and records.
//!
//! # Responsibility
//! - Own the subject list and the flat day-record map.
//! - Enforce every record invariant on each mutation.
//! - Push a durable save through the snapshot gateway after every change.
//!
//! # Invariants
//! - Mutations either fully apply or leave state untouched; validation and
//!   not-found failures happen before anything changes.
//! - A failed durable save is reported but never rolls back the in-memory
//!   change; the store keeps operating and retries on the next mutation.
//! - Empty day records are pruned as part of the mutation that emptied them.

use crate::merge::merge_into;
use crate::model::date::{DayDate, MonthKey};
use crate::model::day::{DayField, DayKey, DayRecord, DayStatus};
use crate::model::subject::{Subject, SubjectId};
use crate::repo::snapshot_repo::{PersistenceError, SnapshotGateway};
use crate::snapshot::{Snapshot, SnapshotError};
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Recoverable input problems. No state change has happened when one of
/// these is returned.
#[derive(Debug)]
pub enum ValidationError {
    BlankSubjectName,
    InvalidDate { year: i32, month0: u32, day: u32 },
    InvalidOvertime(f64),
    Snapshot(SnapshotError),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankSubjectName => write!(f, "subject name cannot be blank"),
            Self::InvalidDate { year, month0, day } => {
                write!(f, "{year}-{month0}-{day} is not a real calendar date")
            }
            Self::InvalidOvertime(value) => {
                write!(f, "overtime must be a non-negative number, got {value}")
            }
            Self::Snapshot(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Snapshot(err) => Some(err),
            _ => None,
        }
    }
}

/// Store-level error union: validation, unknown subject, or a durable save
/// that failed after the in-memory mutation was committed.
#[derive(Debug)]
pub enum StoreError {
    Validation(ValidationError),
    NotFound(SubjectId),
    Persistence(PersistenceError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "subject not found: {id}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<SnapshotError> for StoreError {
    fn from(value: SnapshotError) -> Self {
        Self::Validation(ValidationError::Snapshot(value))
    }
}

impl From<PersistenceError> for StoreError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

/// Subjects plus their day records, backed by a snapshot gateway.
///
/// Readers (calendar, statistics panel, subject list) go through the
/// accessors; they never see the internal maps.
pub struct AttendanceStore<G: SnapshotGateway> {
    gateway: G,
    subjects: Vec<Subject>,
    records: BTreeMap<DayKey, DayRecord>,
    next_subject_id: SubjectId,
}

impl<G: SnapshotGateway> AttendanceStore<G> {
    /// Opens the store, hydrating from the gateway's stored payload when one
    /// exists. A stored payload that fails to decode is a validation error;
    /// nothing is dropped or overwritten.
    pub fn open(gateway: G) -> StoreResult<Self> {
        let mut store = Self {
            gateway,
            subjects: Vec::new(),
            records: BTreeMap::new(),
            next_subject_id: 1,
        };

        if let Some(payload) = store.gateway.load()? {
            let snapshot = Snapshot::from_json(&payload)?;
            store.subjects = snapshot.subjects;
            store.records = snapshot.records;
            store.next_subject_id = next_id_after(&store.subjects);
            info!(
                "event=store_open module=store status=ok subjects={} days={}",
                store.subjects.len(),
                store.records.len()
            );
        }

        Ok(store)
    }

    /// Creates a subject with a fresh id and appends it to the list.
    pub fn add_subject(&mut self, name: &str) -> StoreResult<Subject> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::BlankSubjectName.into());
        }

        let subject = Subject::new(self.next_subject_id, name);
        self.next_subject_id += 1;
        self.subjects.push(subject.clone());
        self.persist()?;
        Ok(subject)
    }

    /// Renames a subject in place, preserving its position.
    pub fn rename_subject(&mut self, id: SubjectId, new_name: &str) -> StoreResult<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(ValidationError::BlankSubjectName.into());
        }
        let subject = self
            .subjects
            .iter_mut()
            .find(|subject| subject.id == id)
            .ok_or(StoreError::NotFound(id))?;

        subject.name = new_name.to_string();
        self.persist()
    }

    /// Removes a subject and every day record it owns.
    ///
    /// An unknown id is an error, not a no-op; silently succeeding would
    /// hide caller bugs.
    pub fn delete_subject(&mut self, id: SubjectId) -> StoreResult<()> {
        let position = self
            .subjects
            .iter()
            .position(|subject| subject.id == id)
            .ok_or(StoreError::NotFound(id))?;

        self.subjects.remove(position);
        self.records.retain(|key, _| key.subject_id != id);
        self.persist()
    }

    /// Drops all day records for a subject, keeping the subject itself.
    pub fn reset_subject_records(&mut self, id: SubjectId) -> StoreResult<()> {
        self.require_subject(id)?;
        self.records.retain(|key, _| key.subject_id != id);
        self.persist()
    }

    /// Removes every subject and record. Fresh ids restart from 1.
    pub fn clear_all(&mut self) -> StoreResult<()> {
        self.subjects.clear();
        self.records.clear();
        self.next_subject_id = 1;
        self.persist()
    }

    /// Applies one field edit to a day record, upserting or pruning the
    /// record as needed.
    ///
    /// Field side effects:
    /// - setting a shift marks an unmarked day `present`;
    /// - clearing the shift of an unmarked day also drops its overtime;
    /// - overtime of zero is a removal, and positive overtime marks an
    ///   unmarked day `present`;
    /// - notes are trimmed, and a blank note is a removal.
    pub fn set_day_field(
        &mut self,
        subject_id: SubjectId,
        date: DayDate,
        field: DayField,
    ) -> StoreResult<()> {
        self.require_subject(subject_id)?;
        if !date.is_valid() {
            return Err(ValidationError::InvalidDate {
                year: date.year,
                month0: date.month0,
                day: date.day,
            }
            .into());
        }
        if let DayField::Overtime(Some(value)) = field {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidOvertime(value).into());
            }
        }

        let key = DayKey::new(subject_id, date);
        let record = self.records.entry(key).or_default();
        apply_field(record, field);
        if record.is_empty() {
            self.records.remove(&key);
        }
        self.persist()
    }

    /// Deletes the entire day record, whatever it contains.
    pub fn clear_day(&mut self, subject_id: SubjectId, date: DayDate) -> StoreResult<()> {
        self.require_subject(subject_id)?;
        self.records.remove(&DayKey::new(subject_id, date));
        self.persist()
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn find_subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.iter().find(|subject| subject.id == id)
    }

    /// The day record for one date, if any.
    pub fn get_day(&self, subject_id: SubjectId, date: DayDate) -> StoreResult<Option<&DayRecord>> {
        self.require_subject(subject_id)?;
        Ok(self.records.get(&DayKey::new(subject_id, date)))
    }

    /// The month-slice of records for one subject, keyed by day number.
    pub fn month_records(
        &self,
        subject_id: SubjectId,
        month: MonthKey,
    ) -> StoreResult<BTreeMap<u32, DayRecord>> {
        self.require_subject(subject_id)?;

        // Range bounds only; day 31 does not need to exist in this month.
        let start = DayKey::new(
            subject_id,
            DayDate {
                year: month.year,
                month0: month.month0,
                day: 1,
            },
        );
        let end = DayKey::new(
            subject_id,
            DayDate {
                year: month.year,
                month0: month.month0,
                day: 31,
            },
        );

        Ok(self
            .records
            .range(start..=end)
            .map(|(key, record)| (key.date.day, record.clone()))
            .collect())
    }

    /// Serializes the full store state as an export/merge payload.
    pub fn serialize_snapshot(&self) -> StoreResult<String> {
        self.current_snapshot()
            .to_json()
            .map_err(|err| PersistenceError::Encode(err).into())
    }

    /// Combines a foreign snapshot into this store: subject union by id,
    /// field-level union per day record, foreign wins per defined field.
    /// Fail-closed: a malformed payload changes nothing.
    pub fn merge_snapshot(&mut self, payload: &str) -> StoreResult<()> {
        let foreign = Snapshot::from_json(payload)?;
        let outcome = merge_into(&mut self.subjects, &mut self.records, foreign);
        self.next_subject_id = next_id_after(&self.subjects);
        info!(
            "event=merge module=store status=ok subjects_added={} days_touched={}",
            outcome.subjects_added, outcome.days_touched
        );
        self.persist()
    }

    /// Replaces the whole store with an imported backup payload.
    /// Fail-closed: a malformed payload changes nothing.
    pub fn restore_snapshot(&mut self, payload: &str) -> StoreResult<()> {
        let snapshot = Snapshot::from_json(payload)?;
        self.subjects = snapshot.subjects;
        self.records = snapshot.records;
        self.next_subject_id = next_id_after(&self.subjects);
        info!(
            "event=restore module=store status=ok subjects={} days={}",
            self.subjects.len(),
            self.records.len()
        );
        self.persist()
    }

    /// Saves the current state through the gateway. Mutations already save;
    /// this exists for hosts that additionally schedule periodic saves.
    pub fn save(&mut self) -> StoreResult<()> {
        self.persist()
    }

    /// The gateway backing this store. Mainly useful in tests.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    fn require_subject(&self, id: SubjectId) -> StoreResult<()> {
        if self.subjects.iter().any(|subject| subject.id == id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(id))
        }
    }

    fn current_snapshot(&self) -> Snapshot {
        Snapshot {
            subjects: self.subjects.clone(),
            records: self.records.clone(),
        }
    }

    fn persist(&mut self) -> StoreResult<()> {
        let payload = self
            .current_snapshot()
            .to_json()
            .map_err(PersistenceError::Encode)?;
        if let Err(err) = self.gateway.save(&payload) {
            // The in-memory mutation stays committed; the caller surfaces
            // this as a warning and the next mutation retries the save.
            warn!("event=snapshot_save module=store status=error error={err}");
            return Err(err.into());
        }
        Ok(())
    }
}

fn apply_field(record: &mut DayRecord, field: DayField) {
    match field {
        DayField::Status(status) => record.status = status,
        DayField::Shift(Some(shift)) => {
            record.shift = Some(shift);
            if record.status.is_none() {
                record.status = Some(DayStatus::Present);
            }
        }
        DayField::Shift(None) => {
            record.shift = None;
            if record.status.is_none() {
                record.overtime = None;
            }
        }
        DayField::Overtime(value) => {
            let value = value.filter(|hours| *hours > 0.0);
            record.overtime = value;
            if value.is_some() && record.status.is_none() {
                record.status = Some(DayStatus::Present);
            }
        }
        DayField::Note(value) => {
            record.note = value
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty());
        }
    }
}

fn next_id_after(subjects: &[Subject]) -> SubjectId {
    subjects
        .iter()
        .map(|subject| subject.id)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}
