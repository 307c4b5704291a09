//! In-memory `ActivityLogger` backed by a hash chain.
//!
//! `record` never blocks on anything but the internal mutex and never fails
//! the caller. An event that cannot be chained is dropped with a warning.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{info, warn};

use dosewarden_contracts::activity::ActivityEvent;
use dosewarden_core::ActivityLogger;

use crate::{
    chain::{hash_activity, verify_chain},
    event::{ActivityLog, ChainedActivity},
};

// ── Internal state ───────────────────────────────────────────────────────────

pub(crate) struct ChainState {
    pub(crate) entries: Vec<ChainedActivity>,
    pub(crate) last_hash: String,
}

impl ChainState {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            last_hash: ChainedActivity::GENESIS_HASH.to_string(),
        }
    }
}

// ── Public log ───────────────────────────────────────────────────────────────

/// Cloning shares the underlying chain, so one clone can be handed to the
/// engine as `Arc<dyn ActivityLogger>` while another exports it.
#[derive(Clone)]
pub struct InMemoryActivityLog {
    log_id: String,
    pub(crate) state: Arc<Mutex<ChainState>>,
}

impl InMemoryActivityLog {
    pub fn new(log_id: impl Into<String>) -> Self {
        Self {
            log_id: log_id.into(),
            state: Arc::new(Mutex::new(ChainState::new())),
        }
    }

    pub fn log_id(&self) -> &str {
        &self.log_id
    }

    pub fn len(&self) -> usize {
        match self.state.lock() {
            Ok(state) => state.entries.len(),
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every entry recorded so far.
    ///
    /// A poisoned lock yields an empty log rather than a panic.
    pub fn export_log(&self) -> ActivityLog {
        let entries = match self.state.lock() {
            Ok(state) => state.entries.clone(),
            Err(e) => {
                warn!(log_id = %self.log_id, error = %e, "activity log lock poisoned; exporting empty log");
                Vec::new()
            }
        };
        let terminal_hash = entries.last().map(|e| e.this_hash.clone()).unwrap_or_default();

        info!(
            log_id = %self.log_id,
            entry_count = entries.len(),
            terminal_hash = %terminal_hash,
            "activity log exported"
        );

        ActivityLog {
            log_id: self.log_id.clone(),
            entries,
            exported_at: Utc::now(),
            terminal_hash,
        }
    }

    /// `false` if any entry was altered after it was chained.
    pub fn verify_integrity(&self) -> bool {
        match self.state.lock() {
            Ok(state) => verify_chain(&state.entries),
            Err(_) => false,
        }
    }
}

// ── ActivityLogger impl ──────────────────────────────────────────────────────

impl ActivityLogger for InMemoryActivityLog {
    fn record(&self, event: ActivityEvent) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    log_id = %self.log_id,
                    patient_id = %event.patient_id,
                    error = %e,
                    "activity log lock poisoned; event dropped"
                );
                return;
            }
        };

        let sequence = state.entries.len() as u64;
        let prev_hash = state.last_hash.clone();
        let this_hash = match hash_activity(&self.log_id, sequence, &event, &prev_hash) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(
                    log_id = %self.log_id,
                    patient_id = %event.patient_id,
                    error = %e,
                    "activity event could not be serialized; event dropped"
                );
                return;
            }
        };

        state.entries.push(ChainedActivity {
            sequence,
            log_id: self.log_id.clone(),
            event,
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.last_hash = this_hash;
    }
}
