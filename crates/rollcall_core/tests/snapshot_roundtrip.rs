use rollcall_core::{
    AttendanceStore, DayDate, DayField, DayStatus, LeaveType, MemorySnapshotGateway, MonthKey,
    Shift, Snapshot, SnapshotError, StoreError, ValidationError,
};
use serde_json::json;

fn populated_store() -> AttendanceStore<MemorySnapshotGateway> {
    let mut store = AttendanceStore::open(MemorySnapshotGateway::new()).unwrap();
    let job = store.add_subject("Factory Job").unwrap();
    let class = store.add_subject("Evening Class").unwrap();

    let march_15 = DayDate::new(2024, 2, 15).unwrap();
    store
        .set_day_field(job.id, march_15, DayField::Status(Some(DayStatus::Present)))
        .unwrap();
    store
        .set_day_field(job.id, march_15, DayField::Shift(Some(Shift::Morning)))
        .unwrap();
    store
        .set_day_field(job.id, march_15, DayField::Overtime(Some(2.5)))
        .unwrap();
    store
        .set_day_field(job.id, march_15, DayField::Note(Some("audit day".to_string())))
        .unwrap();
    store
        .set_day_field(
            job.id,
            DayDate::new(2024, 3, 2).unwrap(),
            DayField::Status(Some(DayStatus::Leave(LeaveType::Earn))),
        )
        .unwrap();
    store
        .set_day_field(
            class.id,
            DayDate::new(2023, 11, 29).unwrap(),
            DayField::Status(Some(DayStatus::HalfDay)),
        )
        .unwrap();
    store
}

#[test]
fn round_trip_reproduces_the_store_exactly() {
    let store = populated_store();
    let payload = store.serialize_snapshot().unwrap();

    let mut restored = AttendanceStore::open(MemorySnapshotGateway::new()).unwrap();
    restored.restore_snapshot(&payload).unwrap();

    assert_eq!(store.subjects(), restored.subjects());
    for month in [
        MonthKey::new(2024, 2).unwrap(),
        MonthKey::new(2024, 3).unwrap(),
        MonthKey::new(2023, 11).unwrap(),
    ] {
        for subject in store.subjects() {
            assert_eq!(
                store.month_records(subject.id, month).unwrap(),
                restored.month_records(subject.id, month).unwrap(),
                "month {month:?} differs for subject {}",
                subject.id
            );
        }
    }

    // Decoded forms must match field-for-field as well.
    let reserialized = restored.serialize_snapshot().unwrap();
    assert_eq!(
        Snapshot::from_json(&payload).unwrap(),
        Snapshot::from_json(&reserialized).unwrap()
    );
}

#[test]
fn payload_matches_the_wire_format() {
    let store = populated_store();
    let payload = store.serialize_snapshot().unwrap();
    let value: serde_json::Value = serde_json::from_str(&payload).unwrap();

    assert_eq!(value["version"], "1.0");
    assert!(value["exportDate"].is_string());
    assert_eq!(value["subjects"][0]["id"], 1);
    assert_eq!(value["subjects"][0]["name"], "Factory Job");

    // Month keys are zero-based: March 2024 is "2024-2".
    let march_15 = &value["attendanceData"]["1"]["2024-2"]["15"];
    assert_eq!(march_15["status"], "present");
    assert_eq!(march_15["shift"], "M");
    assert_eq!(march_15["overtime"], 2.5);
    assert_eq!(march_15["note"], "audit day");
    assert!(march_15.get("leaveType").is_none());

    let leave_day = &value["attendanceData"]["1"]["2024-3"]["2"];
    assert_eq!(leave_day["status"], "leave");
    assert_eq!(leave_day["leaveType"], "earn");
}

#[test]
fn payloads_missing_required_sections_are_rejected_without_state_change() {
    let mut store = populated_store();
    let before = store.serialize_snapshot().unwrap();

    for bad in [
        json!({ "attendanceData": {}, "version": "1.0" }).to_string(),
        json!({ "subjects": [], "version": "1.0" }).to_string(),
        "not json at all".to_string(),
    ] {
        let err = store.restore_snapshot(&bad).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    let after = store.serialize_snapshot().unwrap();
    assert_eq!(
        Snapshot::from_json(&before).unwrap(),
        Snapshot::from_json(&after).unwrap()
    );
}

#[test]
fn unknown_or_missing_leave_type_decodes_to_other() {
    let payload = json!({
        "subjects": [{ "id": 1, "name": "job" }],
        "attendanceData": {
            "1": { "2024-2": {
                "5": { "status": "leave", "leaveType": "sabbatical" },
                "6": { "status": "leave" }
            } }
        }
    })
    .to_string();

    let snapshot = Snapshot::from_json(&payload).unwrap();
    let records: Vec<_> = snapshot.records.values().collect();
    assert_eq!(records[0].status, Some(DayStatus::Leave(LeaveType::Other)));
    assert_eq!(records[1].status, Some(DayStatus::Leave(LeaveType::Other)));
}

#[test]
fn leave_type_next_to_a_non_leave_status_is_ignored() {
    let payload = json!({
        "subjects": [{ "id": 1, "name": "job" }],
        "attendanceData": {
            "1": { "2024-2": { "5": { "status": "present", "leaveType": "sick" } } }
        }
    })
    .to_string();

    let snapshot = Snapshot::from_json(&payload).unwrap();
    let record = snapshot.records.values().next().unwrap();
    assert_eq!(record.status, Some(DayStatus::Present));
}

#[test]
fn zero_overtime_in_a_payload_is_treated_as_absent() {
    let payload = json!({
        "subjects": [{ "id": 1, "name": "job" }],
        "attendanceData": {
            "1": { "2024-2": { "5": { "overtime": 0.0 } } }
        }
    })
    .to_string();

    let snapshot = Snapshot::from_json(&payload).unwrap();
    // The record had nothing else, so it does not exist at all.
    assert!(snapshot.records.is_empty());
}

#[test]
fn negative_overtime_and_unknown_codes_are_rejected() {
    let negative = json!({
        "subjects": [{ "id": 1, "name": "job" }],
        "attendanceData": { "1": { "2024-2": { "5": { "overtime": -2.0 } } } }
    })
    .to_string();
    assert!(matches!(
        Snapshot::from_json(&negative).unwrap_err(),
        SnapshotError::InvalidOvertime(_)
    ));

    let bad_status = json!({
        "subjects": [{ "id": 1, "name": "job" }],
        "attendanceData": { "1": { "2024-2": { "5": { "status": "vacationing" } } } }
    })
    .to_string();
    assert!(matches!(
        Snapshot::from_json(&bad_status).unwrap_err(),
        SnapshotError::UnknownStatus(_)
    ));

    let bad_shift = json!({
        "subjects": [{ "id": 1, "name": "job" }],
        "attendanceData": { "1": { "2024-2": { "5": { "shift": "X" } } } }
    })
    .to_string();
    assert!(matches!(
        Snapshot::from_json(&bad_shift).unwrap_err(),
        SnapshotError::UnknownShift(_)
    ));
}

#[test]
fn malformed_keys_are_rejected() {
    let bad_month = json!({
        "subjects": [{ "id": 1, "name": "job" }],
        "attendanceData": { "1": { "2024-12": { "5": { "status": "present" } } } }
    })
    .to_string();
    assert!(matches!(
        Snapshot::from_json(&bad_month).unwrap_err(),
        SnapshotError::InvalidMonthKey(_)
    ));

    // February 30 is not a date.
    let bad_day = json!({
        "subjects": [{ "id": 1, "name": "job" }],
        "attendanceData": { "1": { "2024-1": { "30": { "status": "present" } } } }
    })
    .to_string();
    assert!(matches!(
        Snapshot::from_json(&bad_day).unwrap_err(),
        SnapshotError::InvalidDay { .. }
    ));

    let bad_subject_key = json!({
        "subjects": [{ "id": 1, "name": "job" }],
        "attendanceData": { "one": { "2024-1": { "3": { "status": "present" } } } }
    })
    .to_string();
    assert!(matches!(
        Snapshot::from_json(&bad_subject_key).unwrap_err(),
        SnapshotError::InvalidSubjectId(_)
    ));
}

#[test]
fn duplicate_subject_ids_keep_the_first_occurrence() {
    let payload = json!({
        "subjects": [
            { "id": 7, "name": "first" },
            { "id": 7, "name": "second" }
        ],
        "attendanceData": {}
    })
    .to_string();

    let snapshot = Snapshot::from_json(&payload).unwrap();
    assert_eq!(snapshot.subjects.len(), 1);
    assert_eq!(snapshot.subjects[0].name, "first");
}

#[test]
fn record_groups_without_a_subject_are_dropped() {
    let payload = json!({
        "subjects": [{ "id": 1, "name": "job" }],
        "attendanceData": {
            "1": { "2024-2": { "5": { "status": "present" } } },
            "99": { "2024-2": { "6": { "status": "absent" } } }
        }
    })
    .to_string();

    let snapshot = Snapshot::from_json(&payload).unwrap();
    assert_eq!(snapshot.records.len(), 1);
    assert!(snapshot.records.keys().all(|key| key.subject_id == 1));
}

#[test]
fn blank_subject_names_in_a_payload_are_rejected() {
    let payload = json!({
        "subjects": [{ "id": 1, "name": "   " }],
        "attendanceData": {}
    })
    .to_string();

    assert!(matches!(
        Snapshot::from_json(&payload).unwrap_err(),
        SnapshotError::BlankSubjectName(1)
    ));
}

#[test]
fn informational_timestamp_field_is_not_required() {
    let payload = json!({
        "subjects": [{ "id": 1, "name": "job" }],
        "attendanceData": {},
        "version": "1.0",
        "lastSync": "2024-03-15T10:00:00Z"
    })
    .to_string();

    assert!(Snapshot::from_json(&payload).is_ok());
}

#[test]
fn corrupt_stored_payload_is_rejected_at_open() {
    let mut gateway = MemorySnapshotGateway::new();
    use rollcall_core::SnapshotGateway;
    gateway.save("{ truncated").unwrap();

    let err = AttendanceStore::open(gateway).err().unwrap();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::Snapshot(_))
    ));
}
