//! Snapshot gateway contract plus SQLite and in-memory implementations.
//!
//! The durable unit is the whole serialized snapshot payload, written to a
//! single key/value slot. The historical app persisted one JSON blob per
//! device the same way; keeping that granularity keeps save, export and
//! merge payloads byte-identical in shape.

use crate::db::DbError;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CURRENT_SLOT: &str = "current";

pub type GatewayResult<T> = Result<T, PersistenceError>;

/// Durable save/load failure. Never fatal: callers keep operating on the
/// in-memory state and retry on the next mutation.
#[derive(Debug)]
pub enum PersistenceError {
    Db(DbError),
    /// The payload could not be serialized for storage.
    Encode(serde_json::Error),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "snapshot payload could not be encoded: {err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<DbError> for PersistenceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable storage contract for the serialized snapshot payload.
///
/// The store calls [`SnapshotGateway::save`] after every mutation and
/// [`SnapshotGateway::load`] once at startup.
pub trait SnapshotGateway {
    fn save(&mut self, payload: &str) -> GatewayResult<()>;
    fn load(&self) -> GatewayResult<Option<String>>;
}

/// SQLite-backed gateway writing the payload to the `snapshots` table.
pub struct SqliteSnapshotGateway<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotGateway<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SnapshotGateway for SqliteSnapshotGateway<'_> {
    fn save(&mut self, payload: &str) -> GatewayResult<()> {
        self.conn.execute(
            "INSERT INTO snapshots (slot, payload, saved_at_ms)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(slot) DO UPDATE SET
                payload = excluded.payload,
                saved_at_ms = excluded.saved_at_ms;",
            params![CURRENT_SLOT, payload],
        )?;
        debug!(
            "event=snapshot_save module=repo status=ok bytes={}",
            payload.len()
        );
        Ok(())
    }

    fn load(&self) -> GatewayResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM snapshots WHERE slot = ?1;",
                params![CURRENT_SLOT],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        debug!(
            "event=snapshot_load module=repo status=ok found={}",
            payload.is_some()
        );
        Ok(payload)
    }
}

/// Volatile gateway for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemorySnapshotGateway {
    payload: Option<String>,
}

impl MemorySnapshotGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last payload saved, if any. Lets tests assert on save-on-mutate.
    pub fn last_payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }
}

impl SnapshotGateway for MemorySnapshotGateway {
    fn save(&mut self, payload: &str) -> GatewayResult<()> {
        self.payload = Some(payload.to_string());
        Ok(())
    }

    fn load(&self) -> GatewayResult<Option<String>> {
        Ok(self.payload.clone())
    }
}
