//! Hashing and verification for the activity chain.
//!
//! Hash input, in order:
//!   1. log_id as UTF-8
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 (64 hex chars)
//!   4. compact JSON of the event

use sha2::{Digest, Sha256};

use dosewarden_contracts::activity::ActivityEvent;

use crate::event::ChainedActivity;

/// SHA-256 over one entry's fields, as lowercase hex.
pub fn hash_activity(
    log_id: &str,
    sequence: u64,
    event: &ActivityEvent,
    prev_hash: &str,
) -> Result<String, serde_json::Error> {
    let event_json = serde_json::to_vec(event)?;

    let mut hasher = Sha256::new();
    hasher.update(log_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&event_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Check linkage and recompute every hash. An empty chain is valid.
///
/// Sequence numbers must also run 0, 1, 2, ... without gaps, so dropping an
/// entry from the middle and re-linking by hand still fails.
pub fn verify_chain(entries: &[ChainedActivity]) -> bool {
    let mut expected_prev = ChainedActivity::GENESIS_HASH.to_string();

    for (position, entry) in entries.iter().enumerate() {
        if entry.sequence != position as u64 || entry.prev_hash != expected_prev {
            return false;
        }
        match hash_activity(&entry.log_id, entry.sequence, &entry.event, &entry.prev_hash) {
            Ok(recomputed) if recomputed == entry.this_hash => {}
            _ => return false,
        }
        expected_prev = entry.this_hash.clone();
    }

    true
}
