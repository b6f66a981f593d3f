//! One-shot merge of a foreign snapshot into local state.
//!
//! # Responsibility
//! - Union subjects by id and day records field-by-field.
//!
//! # Invariants
//! - Additive only: nothing local is ever removed by a merge.
//! - Per-field conflicts resolve foreign-wins; a field the foreign record
//!   leaves unset keeps its local value.
//! - Idempotent: applying the same foreign snapshot twice equals once.

use crate::model::day::{DayKey, DayRecord};
use crate::model::subject::Subject;
use crate::snapshot::Snapshot;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct MergeOutcome {
    pub subjects_added: usize,
    pub days_touched: usize,
}

/// Applies `foreign` onto the local subject list and record map.
///
/// Unknown foreign subjects are appended after all local ones, preserving
/// their foreign order. For each foreign day record, defined fields
/// overwrite the local record's fields; everything else is left alone.
pub(crate) fn merge_into(
    subjects: &mut Vec<Subject>,
    records: &mut BTreeMap<DayKey, DayRecord>,
    foreign: Snapshot,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    for subject in foreign.subjects {
        if subjects.iter().any(|known| known.id == subject.id) {
            continue;
        }
        subjects.push(subject);
        outcome.subjects_added += 1;
    }

    for (key, foreign_record) in foreign.records {
        let local = records.entry(key).or_default();
        if foreign_record.status.is_some() {
            local.status = foreign_record.status;
        }
        if foreign_record.shift.is_some() {
            local.shift = foreign_record.shift;
        }
        if foreign_record.overtime.is_some() {
            local.overtime = foreign_record.overtime;
        }
        if foreign_record.note.is_some() {
            local.note = foreign_record.note;
        }
        outcome.days_touched += 1;
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::merge_into;
    use crate::model::date::DayDate;
    use crate::model::day::{DayKey, DayRecord, DayStatus, Shift};
    use crate::model::subject::Subject;
    use crate::snapshot::Snapshot;
    use std::collections::BTreeMap;

    fn key(subject_id: i64, day: u32) -> DayKey {
        DayKey::new(subject_id, DayDate::new(2024, 2, day).unwrap())
    }

    #[test]
    fn unions_fields_without_erasing_local_values() {
        let mut subjects = vec![Subject::new(1, "Factory Job")];
        let mut records = BTreeMap::new();
        records.insert(
            key(1, 15),
            DayRecord {
                status: Some(DayStatus::Present),
                ..DayRecord::default()
            },
        );

        let mut foreign = Snapshot {
            subjects: vec![Subject::new(1, "Factory Job")],
            records: BTreeMap::new(),
        };
        foreign.records.insert(
            key(1, 15),
            DayRecord {
                overtime: Some(4.0),
                ..DayRecord::default()
            },
        );

        merge_into(&mut subjects, &mut records, foreign);

        let merged = &records[&key(1, 15)];
        assert_eq!(merged.status, Some(DayStatus::Present));
        assert_eq!(merged.overtime, Some(4.0));
    }

    #[test]
    fn foreign_wins_per_conflicting_field() {
        let mut subjects = vec![Subject::new(1, "a")];
        let mut records = BTreeMap::new();
        records.insert(
            key(1, 3),
            DayRecord {
                status: Some(DayStatus::Absent),
                shift: Some(Shift::Morning),
                ..DayRecord::default()
            },
        );

        let mut foreign = Snapshot::default();
        foreign.records.insert(
            key(1, 3),
            DayRecord {
                status: Some(DayStatus::Present),
                ..DayRecord::default()
            },
        );
        // Foreign subjects list may even be empty for already-known subjects.
        merge_into(&mut subjects, &mut records, foreign);

        let merged = &records[&key(1, 3)];
        assert_eq!(merged.status, Some(DayStatus::Present));
        assert_eq!(merged.shift, Some(Shift::Morning));
    }

    #[test]
    fn appends_unknown_subjects_in_foreign_order() {
        let mut subjects = vec![Subject::new(5, "local")];
        let mut records = BTreeMap::new();

        let foreign = Snapshot {
            subjects: vec![
                Subject::new(9, "first foreign"),
                Subject::new(5, "same id, name ignored"),
                Subject::new(2, "second foreign"),
            ],
            records: BTreeMap::new(),
        };
        let outcome = merge_into(&mut subjects, &mut records, foreign);

        assert_eq!(outcome.subjects_added, 2);
        let ids: Vec<_> = subjects.iter().map(|subject| subject.id).collect();
        assert_eq!(ids, vec![5, 9, 2]);
        assert_eq!(subjects[0].name, "local");
    }
}
