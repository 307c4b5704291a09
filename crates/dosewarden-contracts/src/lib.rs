//! # dosewarden-contracts
//!
//! Shared types for the dosewarden antimicrobial dosing-safety engine.
//!
//! All crates in the workspace import from here. Apart from the merge rules
//! that keep a `DoseAssessment` consistent, no clinical logic lives in this
//! crate: only data definitions and error types.

pub mod activity;
pub mod assessment;
pub mod drug;
pub mod error;
pub mod flag;
pub mod medication;
pub mod patient;

pub use activity::{ActivityEvent, ActivityKind};
pub use assessment::{AlertRecord, AssessmentId, DoseAssessment};
pub use drug::{CanonicalDrug, DrugClass};
pub use error::{DoseError, DoseResult};
pub use flag::{DoseFlag, FlagType, Severity};
pub use medication::{DoseUnit, InfusionDuration, MedicationOrder, Route};
pub use patient::{
    AgeGroup, AllergyRecord, AllergySeverity, DialysisModality, PatientContext, Sex,
};

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn context() -> PatientContext {
        PatientContext::builder("p-100")
            .encounter("enc-7")
            .age_years(54.0)
            .weight_kg(70.0)
            .indication("pneumonia")
            .antimicrobial(MedicationOrder::new(
                "o-1",
                "ceftriaxone",
                2.0,
                DoseUnit::G,
                "daily",
                Route::Intravenous,
                Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
            ))
            .build()
    }

    fn flag(drug: &str, kind: FlagType, severity: Severity) -> DoseFlag {
        DoseFlag::new(kind, severity, drug, format!("{kind} on {drug}"))
    }

    // ── DoseAssessment ───────────────────────────────────────────────────────

    #[test]
    fn test_assemble_dedups_ranks_and_sets_max() {
        let ctx = context();
        let assessment = DoseAssessment::assemble(
            &ctx,
            vec![
                flag("ceftriaxone", FlagType::WrongInterval, Severity::Low),
                flag("ceftriaxone", FlagType::AllergyCrossReactivity, Severity::High),
                flag("ceftriaxone", FlagType::AllergyCrossReactivity, Severity::Critical),
                flag("ceftriaxone", FlagType::DurationExcessive, Severity::Moderate),
            ],
            "test",
        );

        let kinds: Vec<FlagType> = assessment.flags().iter().map(|f| f.flag_type).collect();
        assert_eq!(
            kinds,
            vec![
                FlagType::AllergyCrossReactivity,
                FlagType::DurationExcessive,
                FlagType::WrongInterval,
            ]
        );
        assert_eq!(assessment.flags()[0].severity, Severity::Critical);
        assert_eq!(assessment.max_severity(), Some(Severity::Critical));
        assert_eq!(assessment.patient().patient_id, "p-100");
        assert_eq!(assessment.medications().len(), 1);
        assert_eq!(assessment.assessed_by(), "test");
    }

    #[test]
    fn test_empty_assessment_has_no_max_severity() {
        let assessment = DoseAssessment::assemble(&context(), vec![], "test");
        assert!(!assessment.has_flags());
        assert_eq!(assessment.max_severity(), None);
        assert!(assessment.alert_records().is_empty());
    }

    #[test]
    fn test_simulated_copy_leaves_original_untouched() {
        let assessment = DoseAssessment::assemble(
            &context(),
            vec![flag("ceftriaxone", FlagType::WrongInterval, Severity::Low)],
            "test",
        );
        let sim = assessment.simulated(Some(Severity::Critical));
        assert_eq!(assessment.max_severity(), Some(Severity::Low));
        assert!(!assessment.is_simulated());
        assert_eq!(sim.max_severity(), Some(Severity::Critical));
        assert!(sim.is_simulated());
        assert_ne!(sim.id(), assessment.id());
        assert_eq!(sim.flags(), assessment.flags());
    }

    #[test]
    fn test_alert_records_are_keyed_per_flag() {
        let assessment = DoseAssessment::assemble(
            &context(),
            vec![
                flag("ceftriaxone", FlagType::WrongInterval, Severity::Low),
                flag("ceftriaxone", FlagType::DurationExcessive, Severity::Moderate),
            ],
            "test",
        );
        let records = assessment.alert_records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| &r.assessment_id == assessment.id()));
        let keys: std::collections::HashSet<_> = records.iter().map(|r| r.key()).collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_assessment_round_trips_through_json() {
        let assessment = DoseAssessment::assemble(
            &context(),
            vec![flag("ceftriaxone", FlagType::WrongInterval, Severity::Low)],
            "test",
        );
        let json = serde_json::to_string(&assessment).unwrap();
        let decoded: DoseAssessment = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, assessment);
    }

    // ── AssessmentId ─────────────────────────────────────────────────────────

    #[test]
    fn test_assessment_id_new_produces_unique_values() {
        let unique: std::collections::HashSet<String> =
            (0..100).map(|_| AssessmentId::new().0.to_string()).collect();
        assert_eq!(unique.len(), 100);
    }

    // ── DoseError display messages ───────────────────────────────────────────

    #[test]
    fn test_error_module_fault_display() {
        let err = DoseError::ModuleFault {
            module: "renal".to_string(),
            reason: "tier table empty".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("renal"));
        assert!(msg.contains("tier table empty"));
    }

    #[test]
    fn test_error_config_error_display() {
        let err = DoseError::ConfigError {
            reason: "bad tolerance".to_string(),
        };
        assert!(err.to_string().contains("configuration error"));
    }
}
