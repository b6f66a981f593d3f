//! CLI smoke entry point.
//!
//! # Responsibility
//! - Drive the core end-to-end against a throwaway in-memory store for
//!   quick local sanity checks.

use rollcall_core::{
    monthly_aggregates, monthly_percentage, AttendanceStore, DayDate, DayField, DayStatus,
    MemorySnapshotGateway, MonthKey, Shift,
};

fn main() {
    if let Err(err) = run() {
        eprintln!("rollcall smoke run failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("rollcall_core version={}", rollcall_core::core_version());

    let mut store = AttendanceStore::open(MemorySnapshotGateway::new())?;
    let job = store.add_subject("Factory Job")?;

    let march = MonthKey::new(2024, 2).expect("month in range");
    for (day, status) in [
        (11, DayStatus::Present),
        (12, DayStatus::Present),
        (13, DayStatus::Absent),
        (14, DayStatus::HalfDay),
    ] {
        let date = DayDate::new(march.year, march.month0, day).expect("valid demo date");
        store.set_day_field(job.id, date, DayField::Status(Some(status)))?;
    }
    let date = DayDate::new(march.year, march.month0, 15).expect("valid demo date");
    store.set_day_field(job.id, date, DayField::Shift(Some(Shift::Morning)))?;
    store.set_day_field(job.id, date, DayField::Overtime(Some(3.0)))?;

    let month = store.month_records(job.id, march)?;
    let totals = monthly_aggregates(month.values());
    println!(
        "subject=\"{}\" month=2024-03 percentage={}% present={} absent={} halfday={} ot_hours={} ot_days={}",
        job.name,
        monthly_percentage(month.values()),
        totals.present,
        totals.absent,
        totals.half_day,
        totals.overtime_hours,
        totals.overtime_days(),
    );

    let payload = store.serialize_snapshot()?;
    println!("snapshot_bytes={}", payload.len());
    Ok(())
}
