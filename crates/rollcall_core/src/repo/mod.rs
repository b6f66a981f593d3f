//! Persistence gateway contracts and implementations.
//!
//! # Responsibility
//! - Define the durable save/load contract the store mutates through.
//! - Isolate SQLite details from store/business orchestration.
//!
//! # Invariants
//! - Gateway failures are recoverable; the in-memory store never rolls back
//!   a committed mutation because a save failed.

pub mod snapshot_repo;
