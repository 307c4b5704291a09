//! Named demo scenarios.
//!
//! Each scenario builds one patient snapshot, runs it through the configured
//! engine, and prints the resulting assessment and notification plan.

use chrono::{DateTime, Utc};

use dosewarden_contracts::{assessment::DoseAssessment, patient::PatientContext};
use dosewarden_core::{plan_notifications, DoseEngine, Recipient};

use crate::{mock_data, report};

pub struct Scenario {
    pub name: &'static str,
    pub title: &'static str,
    /// What a reviewer should expect to see.
    pub expect: &'static str,
    build: fn(DateTime<Utc>) -> PatientContext,
}

impl Scenario {
    pub fn context(&self, now: DateTime<Utc>) -> PatientContext {
        (self.build)(now)
    }
}

pub static SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "c-diff",
        title: "IV vancomycin for C. difficile",
        expect: "one CRITICAL WRONG_ROUTE: IV vancomycin does not reach the colon",
        build: mock_data::c_difficile_iv_vancomycin,
    },
    Scenario {
        name: "sepsis-infusion",
        title: "Piperacillin-tazobactam over 30 minutes in severe sepsis",
        expect: "one HIGH EXTENDED_INFUSION_CANDIDATE",
        build: mock_data::severe_sepsis_short_infusion,
    },
    Scenario {
        name: "renal",
        title: "Meropenem 1 g q8h at eGFR 42",
        expect: "NO_RENAL_ADJUSTMENT",
        build: mock_data::meropenem_reduced_gfr,
    },
    Scenario {
        name: "allergy",
        title: "Ceftriaxone with penicillin anaphylaxis",
        expect: "ALLERGY_CROSS_REACTIVITY escalated to CRITICAL",
        build: mock_data::penicillin_anaphylaxis_ceftriaxone,
    },
    Scenario {
        name: "complex",
        title: "Obese ICU patient with renal impairment and interacting co-medications",
        expect: "findings from several modules, one per drug and kind",
        build: mock_data::complex_icu_patient,
    },
    Scenario {
        name: "clean",
        title: "Appropriate cefazolin for cellulitis",
        expect: "no findings, no notification",
        build: mock_data::appropriate_cefazolin,
    },
];

pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}

/// Stewardship team destinations used by the demo notification plan.
pub fn demo_recipient() -> Recipient {
    Recipient {
        messaging_channel: "#antimicrobial-stewardship".to_string(),
        email: Some("stewardship@hospital.example".to_string()),
    }
}

pub fn run_scenario(scenario: &Scenario, engine: &DoseEngine, now: DateTime<Utc>) -> DoseAssessment {
    println!("=== {} ===", scenario.title);
    println!("  Expect: {}", scenario.expect);
    println!();

    let assessment = engine.evaluate(&scenario.context(now));
    report::print_assessment(&assessment);
    report::print_plan(&plan_notifications(&assessment, &demo_recipient()));
    assessment
}
