//! End-to-end runs of the standard engine over realistic patient contexts.

use std::io::Write;

use chrono::{DateTime, Duration, TimeZone, Utc};

use dosewarden_contracts::{
    flag::{FlagType, Severity},
    medication::{DoseUnit, MedicationOrder, Route},
    patient::{AllergyRecord, AllergySeverity, PatientContext, Sex},
};
use dosewarden_core::{notification_tier, DoseEngine, NotificationTier};
use dosewarden_rules::{build_engine, DoseCheckConfig};

// ── Fixtures ─────────────────────────────────────────────────────────────────

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap()
}

fn engine() -> DoseEngine {
    build_engine(&DoseCheckConfig::default())
}

fn order(id: &str, drug: &str, dose: f64, unit: DoseUnit, interval: &str, route: Route) -> MedicationOrder {
    MedicationOrder::new(id, drug, dose, unit, interval, route, now() - Duration::hours(20))
}

fn count(flags: &[dosewarden_contracts::flag::DoseFlag], kind: FlagType) -> usize {
    flags.iter().filter(|f| f.flag_type == kind).count()
}

fn complex_patient() -> PatientContext {
    PatientContext::builder("mrn-4471")
        .encounter("enc-9")
        .age_years(71.0)
        .weight_kg(118.0)
        .height_cm(170.0)
        .sex(Sex::Female)
        .gfr(28.0)
        .indication("hospital-acquired pneumonia with septic shock")
        .allergy(AllergyRecord::new("penicillin", AllergySeverity::Moderate, Some("hives")))
        .antimicrobial(order("o1", "cefepime", 2.0, DoseUnit::G, "q8h", Route::Intravenous))
        .antimicrobial(order("o2", "vancomycin", 1000.0, DoseUnit::Mg, "q12h", Route::Intravenous))
        .antimicrobial(order("o3", "levofloxacin", 750.0, DoseUnit::Mg, "q24h", Route::Intravenous))
        .co_medication(order("c1", "amiodarone", 200.0, DoseUnit::Mg, "daily", Route::Oral))
        .co_medication(order("c2", "warfarin", 5.0, DoseUnit::Mg, "daily", Route::Oral))
        .captured_at(now())
        .build()
}

// ── Reference scenarios ──────────────────────────────────────────────────────

#[test]
fn test_iv_vancomycin_for_c_difficile_is_one_critical_wrong_route() {
    let ctx = PatientContext::builder("p-cdiff")
        .age_years(64.0)
        .indication("c_difficile")
        .antimicrobial(order("o1", "vancomycin", 125.0, DoseUnit::Mg, "q6h", Route::Intravenous))
        .captured_at(now())
        .build();

    let assessment = engine().evaluate(&ctx);
    let wrong_route: Vec<_> = assessment
        .flags()
        .iter()
        .filter(|f| f.flag_type == FlagType::WrongRoute)
        .collect();
    assert_eq!(wrong_route.len(), 1);
    assert_eq!(wrong_route[0].severity, Severity::Critical);
    assert_eq!(assessment.max_severity(), Some(Severity::Critical));
}

#[test]
fn test_severe_sepsis_pip_tazo_short_infusion() {
    let ctx = PatientContext::builder("p-sepsis")
        .age_years(68.0)
        .weight_kg(80.0)
        .indication("severe sepsis")
        .antimicrobial(
            order("o1", "piperacillin-tazobactam", 4.5, DoseUnit::G, "q6h", Route::Intravenous)
                .with_infusion_minutes(30),
        )
        .captured_at(now())
        .build();

    let assessment = engine().evaluate(&ctx);
    assert_eq!(assessment.flags().len(), 1, "unexpected flags: {:?}", assessment.flags());
    let flag = &assessment.flags()[0];
    assert_eq!(flag.flag_type, FlagType::ExtendedInfusionCandidate);
    assert_eq!(flag.severity, Severity::High);
    assert_eq!(flag.drug, "piperacillin-tazobactam");
}

#[test]
fn test_meropenem_at_gfr_42_without_adjustment() {
    let ctx = PatientContext::builder("p-renal")
        .age_years(59.0)
        .gfr(42.0)
        .antimicrobial(order("o1", "meropenem", 1.0, DoseUnit::G, "q8h", Route::Intravenous).with_infusion_minutes(180))
        .captured_at(now())
        .build();

    let assessment = engine().evaluate(&ctx);
    assert_eq!(count(assessment.flags(), FlagType::NoRenalAdjustment), 1);
}

#[test]
fn test_penicillin_anaphylaxis_and_ceftriaxone() {
    let ctx = PatientContext::builder("p-allergy")
        .age_years(45.0)
        .allergy(AllergyRecord::new("Penicillin", AllergySeverity::Unknown, Some("anaphylaxis")))
        .antimicrobial(order("o1", "ceftriaxone", 1.0, DoseUnit::G, "q24h", Route::Intravenous))
        .captured_at(now())
        .build();

    let assessment = engine().evaluate(&ctx);
    let flag = assessment
        .flags()
        .iter()
        .find(|f| f.flag_type == FlagType::AllergyCrossReactivity)
        .expect("cross-reactivity flag");
    assert_eq!(flag.severity, Severity::Critical);
    assert_eq!(notification_tier(assessment.max_severity()), NotificationTier::MessagingAndEmail);
}

#[test]
fn test_no_antimicrobials_no_flags() {
    let ctx = PatientContext::builder("p-empty")
        .age_years(30.0)
        .weight_kg(70.0)
        .indication("sepsis")
        .co_medication(order("c1", "warfarin", 5.0, DoseUnit::Mg, "daily", Route::Oral))
        .captured_at(now())
        .build();

    let assessment = engine().evaluate(&ctx);
    assert!(assessment.flags().is_empty());
    assert_eq!(assessment.max_severity(), None);
    assert_eq!(notification_tier(assessment.max_severity()), NotificationTier::None);
}

// ── Aggregate invariants ─────────────────────────────────────────────────────

#[test]
fn test_flags_are_unique_per_drug_and_kind() {
    let assessment = engine().evaluate(&complex_patient());
    assert!(!assessment.flags().is_empty());

    let mut keys: Vec<_> = assessment.flags().iter().map(|f| f.key()).collect();
    let total = keys.len();
    keys.sort_by(|a, b| a.0.cmp(b.0).then(a.1.as_str().cmp(b.1.as_str())));
    keys.dedup();
    assert_eq!(keys.len(), total);
}

#[test]
fn test_flags_are_ranked_and_max_severity_matches() {
    let assessment = engine().evaluate(&complex_patient());
    let flags = assessment.flags();
    assert!(flags.windows(2).all(|w| w[0].severity >= w[1].severity));

    let highest = flags.iter().map(|f| f.severity).max();
    assert_eq!(assessment.max_severity(), highest);
}

#[test]
fn test_complex_patient_hits_several_modules() {
    let assessment = engine().evaluate(&complex_patient());
    let flags = assessment.flags();

    // Cefepime 2 g q8h at GFR 28 in a penicillin-allergic patient.
    assert!(assessment.flags_for("cefepime").any(|f| f.flag_type == FlagType::NoRenalAdjustment));
    assert!(assessment.flags_for("cefepime").any(|f| f.flag_type == FlagType::AllergyCrossReactivity));
    // Levofloxacin with amiodarone and warfarin collapses to one interaction flag.
    assert_eq!(
        flags
            .iter()
            .filter(|f| f.drug == "levofloxacin" && f.flag_type == FlagType::DrugInteraction)
            .count(),
        1
    );
    assert_eq!(count(flags, FlagType::DrugInteraction), 1);
}

#[test]
fn test_evaluation_is_idempotent() {
    let ctx = complex_patient();
    let engine = engine();
    let first = engine.evaluate(&ctx);
    let second = engine.evaluate(&ctx);

    assert_ne!(first.id(), second.id());
    assert_eq!(
        serde_json::to_value(first.flags()).unwrap(),
        serde_json::to_value(second.flags()).unwrap()
    );
    assert_eq!(first.max_severity(), second.max_severity());
}

#[test]
fn test_parallel_modules_match_sequential() {
    let ctx = complex_patient();
    let sequential = engine().evaluate(&ctx);

    let config = DoseCheckConfig::from_toml_str("[engine]\nparallel_modules = true").unwrap();
    let parallel = build_engine(&config).evaluate(&ctx);

    assert_eq!(sequential.flags(), parallel.flags());
}

#[test]
fn test_batch_preserves_input_order() {
    let contexts: Vec<PatientContext> = ["a", "b", "c"]
        .iter()
        .map(|id| PatientContext::builder(*id).captured_at(now()).build())
        .collect();
    let assessments = engine().evaluate_batch(&contexts);
    let ids: Vec<&str> = assessments.iter().map(|a| a.patient().patient_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

// ── Configuration ────────────────────────────────────────────────────────────

#[test]
fn test_config_file_disables_modules() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[engine]\nassessed_by = \"ward-7\"\ndisabled_modules = [\"extended_infusion\"]").unwrap();
    let config = DoseCheckConfig::from_file(file.path()).unwrap();

    let ctx = PatientContext::builder("p-sepsis")
        .age_years(68.0)
        .weight_kg(80.0)
        .indication("severe sepsis")
        .antimicrobial(order("o1", "piperacillin-tazobactam", 4.5, DoseUnit::G, "q6h", Route::Intravenous))
        .captured_at(now())
        .build();

    let assessment = build_engine(&config).evaluate(&ctx);
    assert!(assessment.flags().is_empty());
    assert_eq!(assessment.assessed_by(), "ward-7");
}

#[test]
fn test_json_context_round_trip_through_engine() {
    let json = serde_json::json!({
        "patient": { "patient_id": "json-1" },
        "demographics": { "age_years": 52.0, "weight_kg": 90.0 },
        "renal": { "gfr": 42.0 },
        "antimicrobials": [{
            "order_id": "o1",
            "drug_name": "Merrem",
            "dose": 1.0,
            "dose_unit": "g",
            "interval": "q8h",
            "route": "iv",
            "start_time": "2026-05-03T13:30:00Z",
            "infusion": 180
        }],
        "co_medications": [],
        "allergies": [],
        "captured_at": "2026-05-04T09:30:00Z"
    });
    let ctx = PatientContext::from_json(&json.to_string()).unwrap();
    let assessment = engine().evaluate(&ctx);
    assert_eq!(count(assessment.flags(), FlagType::NoRenalAdjustment), 1);
}
