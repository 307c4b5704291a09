//! Activity events emitted by the engine.
//!
//! The engine reports what it did to an injected `ActivityLogger`. One
//! evaluation produces an `EvaluationStarted` event, zero or more
//! `ModuleFault` events, and one `AssessmentCompleted` event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::flag::Severity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityKind {
    EvaluationStarted {
        antimicrobial_count: usize,
        co_medication_count: usize,
    },
    ModuleFault {
        module: String,
        reason: String,
    },
    AssessmentCompleted {
        assessment_id: String,
        flag_count: usize,
        max_severity: Option<Severity>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub patient_id: String,
    #[serde(flatten)]
    pub kind: ActivityKind,
    pub at: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn now(patient_id: impl Into<String>, kind: ActivityKind) -> Self {
        Self {
            patient_id: patient_id.into(),
            kind,
            at: Utc::now(),
        }
    }
}
