//! Trackable subjects (a class, a job, a contract).

use serde::{Deserialize, Serialize};

/// Stable numeric subject identity.
///
/// Kept as an integer because the snapshot payload format fixes subject ids
/// as JSON integers. Ids are allocated by the store from a monotonic
/// counter, never from wall-clock time.
pub type SubjectId = i64;

/// A named entity whose attendance is logged.
///
/// `id` is immutable for the subject's lifetime and is the sole identity
/// key during merge; `name` is display-only and freely renameable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
}

impl Subject {
    pub fn new(id: SubjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
