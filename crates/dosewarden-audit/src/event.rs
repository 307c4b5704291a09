//! Chained activity entries and the exported log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dosewarden_contracts::activity::ActivityEvent;

/// One link in the activity chain.
///
/// `this_hash` commits to the log id, the position, the previous link and the
/// wrapped event. Editing any of them breaks the chain from that point on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainedActivity {
    /// Position in the chain, starting at 0.
    pub sequence: u64,

    pub log_id: String,

    pub event: ActivityEvent,

    /// `this_hash` of the previous entry, or `GENESIS_HASH` for the first.
    pub prev_hash: String,

    /// Lowercase hex SHA-256, see `chain::hash_activity`.
    pub this_hash: String,
}

impl ChainedActivity {
    /// `prev_hash` of the first entry in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// A snapshot of an activity log taken by `InMemoryActivityLog::export_log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub log_id: String,
    pub entries: Vec<ChainedActivity>,
    pub exported_at: DateTime<Utc>,
    /// `this_hash` of the last entry; empty when the log is empty.
    pub terminal_hash: String,
}

impl ActivityLog {
    /// Entries that belong to one patient, in chain order.
    pub fn for_patient<'a>(&'a self, patient_id: &'a str) -> impl Iterator<Item = &'a ChainedActivity> + 'a {
        self.entries.iter().filter(move |e| e.event.patient_id == patient_id)
    }
}
