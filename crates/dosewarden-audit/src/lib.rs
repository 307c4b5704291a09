//! # dosewarden-audit
//!
//! Append-only, SHA-256 hash-chained activity log for the dosewarden engine.
//!
//! Each `ActivityEvent` the engine emits is wrapped in a `ChainedActivity`
//! that links to the previous entry by hash. Editing a recorded entry breaks
//! the chain and `verify_chain` reports it.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dosewarden_audit::InMemoryActivityLog;
//!
//! let log = InMemoryActivityLog::new("ward-7");
//! let engine = build_engine(&config).with_logger(Arc::new(log.clone()));
//! engine.evaluate(&ctx);
//!
//! assert!(log.verify_integrity());
//! let exported = log.export_log();
//! ```

pub mod chain;
pub mod event;
pub mod memory;

pub use chain::{hash_activity, verify_chain};
pub use event::{ActivityLog, ChainedActivity};
pub use memory::InMemoryActivityLog;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use dosewarden_contracts::{
        activity::{ActivityEvent, ActivityKind},
        error::{DoseError, DoseResult},
        flag::{DoseFlag, FlagType, Severity},
        medication::{DoseUnit, MedicationOrder, Route},
        patient::PatientContext,
    };
    use dosewarden_core::{ActivityLogger, DoseEngine, EngineSettings, ModuleKind, RuleModule};

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn started(patient_id: &str, antimicrobials: usize) -> ActivityEvent {
        ActivityEvent::now(
            patient_id,
            ActivityKind::EvaluationStarted {
                antimicrobial_count: antimicrobials,
                co_medication_count: 0,
            },
        )
    }

    fn log_with_three() -> InMemoryActivityLog {
        let log = InMemoryActivityLog::new("log-test");
        log.record(started("p1", 1));
        log.record(started("p2", 2));
        log.record(started("p1", 3));
        log
    }

    /// Flags every antimicrobial as LOW.
    struct EveryOrder;

    impl RuleModule for EveryOrder {
        fn kind(&self) -> ModuleKind {
            ModuleKind::Route
        }

        fn evaluate(&self, ctx: &PatientContext) -> DoseResult<Vec<DoseFlag>> {
            Ok(ctx
                .antimicrobials
                .iter()
                .map(|o| DoseFlag::new(FlagType::WrongRoute, Severity::Low, o.drug_name.clone(), "check route"))
                .collect())
        }
    }

    struct Broken;

    impl RuleModule for Broken {
        fn kind(&self) -> ModuleKind {
            ModuleKind::Renal
        }

        fn evaluate(&self, _ctx: &PatientContext) -> DoseResult<Vec<DoseFlag>> {
            Err(DoseError::ModuleFault {
                module: "renal".to_string(),
                reason: "table missing".to_string(),
            })
        }
    }

    fn context() -> PatientContext {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        PatientContext::builder("p-logged")
            .antimicrobial(MedicationOrder::new(
                "o1",
                "cefazolin",
                2.0,
                DoseUnit::G,
                "q8h",
                Route::Intravenous,
                start,
            ))
            .captured_at(start)
            .build()
    }

    // ── Chain ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_hash_chain_integrity() {
        assert!(log_with_three().verify_integrity());
    }

    #[test]
    fn test_tamper_detection() {
        let log = log_with_three();
        {
            let mut state = log.state.lock().unwrap();
            state.entries[0].event.patient_id = "someone-else".to_string();
        }
        assert!(!log.verify_integrity());
    }

    #[test]
    fn test_removed_entry_is_detected() {
        let mut exported = log_with_three().export_log();
        exported.entries.remove(1);
        assert!(!verify_chain(&exported.entries));
    }

    #[test]
    fn test_genesis_and_sequence() {
        let exported = log_with_three().export_log();
        assert_eq!(exported.entries[0].prev_hash, ChainedActivity::GENESIS_HASH);
        for (idx, entry) in exported.entries.iter().enumerate() {
            assert_eq!(entry.sequence, idx as u64);
        }
        assert_eq!(exported.terminal_hash, exported.entries[2].this_hash);
    }

    #[test]
    fn test_verify_empty() {
        let log = InMemoryActivityLog::new("empty");
        assert!(log.is_empty());
        assert!(log.verify_integrity());
        assert!(verify_chain(&[]));
        assert_eq!(log.export_log().terminal_hash, "");
    }

    #[test]
    fn test_for_patient_filters_in_order() {
        let exported = log_with_three().export_log();
        let sequences: Vec<u64> = exported.for_patient("p1").map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 2]);
    }

    #[test]
    fn test_exported_log_round_trips_through_json() {
        let exported = log_with_three().export_log();
        let json = serde_json::to_string(&exported).unwrap();
        let back: ActivityLog = serde_json::from_str(&json).unwrap();
        assert!(verify_chain(&back.entries));
    }

    // ── Engine wiring ─────────────────────────────────────────────────────────

    #[test]
    fn test_engine_records_start_and_completion() {
        let log = InMemoryActivityLog::new("engine");
        let engine = DoseEngine::new(vec![Box::new(EveryOrder)], EngineSettings::default())
            .with_logger(Arc::new(log.clone()));

        let assessment = engine.evaluate(&context());

        let exported = log.export_log();
        assert_eq!(exported.entries.len(), 2);
        assert!(matches!(
            exported.entries[0].event.kind,
            ActivityKind::EvaluationStarted { antimicrobial_count: 1, .. }
        ));
        match &exported.entries[1].event.kind {
            ActivityKind::AssessmentCompleted {
                assessment_id,
                flag_count,
                max_severity,
            } => {
                assert_eq!(assessment_id, &assessment.id().0.to_string());
                assert_eq!(*flag_count, 1);
                assert_eq!(*max_severity, Some(Severity::Low));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(log.verify_integrity());
    }

    #[test]
    fn test_module_fault_is_chained_between_start_and_completion() {
        let log = InMemoryActivityLog::new("faults");
        let engine = DoseEngine::new(vec![Box::new(Broken), Box::new(EveryOrder)], EngineSettings::default())
            .with_logger(Arc::new(log.clone()));

        let assessment = engine.evaluate(&context());
        assert_eq!(assessment.flags().len(), 1);

        let exported = log.export_log();
        let kinds: Vec<&ActivityKind> = exported.entries.iter().map(|e| &e.event.kind).collect();
        assert_eq!(kinds.len(), 3);
        assert!(matches!(kinds[1], ActivityKind::ModuleFault { module, .. } if module == "renal"));
        assert!(log.verify_integrity());
    }
}
