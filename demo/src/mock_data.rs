//! Fictional inpatient snapshots for the demo scenarios.
//!
//! Every patient, order and allergy here is made up. Order start times are
//! anchored on the `now` passed in so course lengths stay stable whenever the
//! demo is run.

use chrono::{DateTime, Duration, Utc};

use dosewarden_contracts::{
    medication::{DoseUnit, MedicationOrder, Route},
    patient::{AllergyRecord, AllergySeverity, PatientContext, Sex},
};

fn order(
    id: &str,
    drug: &str,
    dose: f64,
    unit: DoseUnit,
    interval: &str,
    route: Route,
    started: DateTime<Utc>,
) -> MedicationOrder {
    MedicationOrder::new(id, drug, dose, unit, interval, route, started)
}

/// Oral-only indication treated with IV vancomycin.
pub fn c_difficile_iv_vancomycin(now: DateTime<Utc>) -> PatientContext {
    PatientContext::builder("demo-cdiff")
        .encounter("enc-1001")
        .age_years(64.0)
        .indication("c_difficile")
        .antimicrobial(order(
            "ord-1",
            "vancomycin",
            125.0,
            DoseUnit::Mg,
            "q6h",
            Route::Intravenous,
            now - Duration::hours(6),
        ))
        .captured_at(now)
        .build()
}

/// Pip-tazo pushed over 30 minutes in severe sepsis.
pub fn severe_sepsis_short_infusion(now: DateTime<Utc>) -> PatientContext {
    PatientContext::builder("demo-sepsis")
        .encounter("enc-1002")
        .age_years(68.0)
        .weight_kg(80.0)
        .indication("severe sepsis")
        .antimicrobial(
            order(
                "ord-1",
                "piperacillin-tazobactam",
                4.5,
                DoseUnit::G,
                "q6h",
                Route::Intravenous,
                now - Duration::hours(12),
            )
            .with_infusion_minutes(30),
        )
        .captured_at(now)
        .build()
}

/// Full-dose meropenem at an eGFR of 42.
pub fn meropenem_reduced_gfr(now: DateTime<Utc>) -> PatientContext {
    PatientContext::builder("demo-renal")
        .encounter("enc-1003")
        .age_years(59.0)
        .weight_kg(77.0)
        .gfr(42.0)
        .antimicrobial(
            order(
                "ord-1",
                "meropenem",
                1.0,
                DoseUnit::G,
                "q8h",
                Route::Intravenous,
                now - Duration::hours(20),
            )
            .with_infusion_minutes(180),
        )
        .captured_at(now)
        .build()
}

/// Ceftriaxone ordered despite a penicillin anaphylaxis history.
pub fn penicillin_anaphylaxis_ceftriaxone(now: DateTime<Utc>) -> PatientContext {
    PatientContext::builder("demo-allergy")
        .encounter("enc-1004")
        .age_years(45.0)
        .weight_kg(66.0)
        .allergy(AllergyRecord::new("Penicillin", AllergySeverity::Unknown, Some("anaphylaxis")))
        .antimicrobial(order(
            "ord-1",
            "ceftriaxone",
            1.0,
            DoseUnit::G,
            "q24h",
            Route::Intravenous,
            now - Duration::hours(3),
        ))
        .captured_at(now)
        .build()
}

/// Obese, renally impaired ICU patient on three antimicrobials and two
/// interacting co-medications.
pub fn complex_icu_patient(now: DateTime<Utc>) -> PatientContext {
    let started = now - Duration::hours(30);
    PatientContext::builder("demo-icu")
        .encounter("enc-1005")
        .age_years(71.0)
        .weight_kg(118.0)
        .height_cm(170.0)
        .sex(Sex::Female)
        .gfr(28.0)
        .indication("hospital-acquired pneumonia with septic shock")
        .allergy(AllergyRecord::new("penicillin", AllergySeverity::Moderate, Some("hives")))
        .antimicrobial(order("ord-1", "cefepime", 2.0, DoseUnit::G, "q8h", Route::Intravenous, started))
        .antimicrobial(order("ord-2", "vancomycin", 1000.0, DoseUnit::Mg, "q12h", Route::Intravenous, started))
        .antimicrobial(order("ord-3", "levofloxacin", 750.0, DoseUnit::Mg, "q24h", Route::Intravenous, started))
        .co_medication(order("com-1", "amiodarone", 200.0, DoseUnit::Mg, "daily", Route::Oral, started))
        .co_medication(order("com-2", "warfarin", 5.0, DoseUnit::Mg, "daily", Route::Oral, started))
        .captured_at(now)
        .build()
}

/// A correctly dosed cefazolin course for cellulitis.
pub fn appropriate_cefazolin(now: DateTime<Utc>) -> PatientContext {
    PatientContext::builder("demo-clean")
        .encounter("enc-1006")
        .age_years(50.0)
        .weight_kg(80.0)
        .gfr(90.0)
        .indication("cellulitis")
        .antimicrobial(order(
            "ord-1",
            "cefazolin",
            2.0,
            DoseUnit::G,
            "q8h",
            Route::Intravenous,
            now - Duration::days(2),
        ))
        .captured_at(now)
        .build()
}
