//! Route requirements by drug and indication.

use dosewarden_contracts::{drug::DrugClass, flag::Severity, medication::Route};

use crate::tables::DrugKey;

/// Indications that need systemic drug exposure.
pub static SYSTEMIC_INDICATIONS: &[&str] = &[
    "bacteremia",
    "bloodstream infection",
    "sepsis",
    "severe sepsis",
    "septic shock",
    "pneumonia",
    "endocarditis",
    "meningitis",
    "osteomyelitis",
    "septic arthritis",
    "cellulitis",
    "skin and soft tissue infection",
    "pyelonephritis",
    "mrsa",
];

/// For this drug and indication, only `allowed` routes work.
#[derive(Debug, Clone, Copy)]
pub struct RequiredRoute {
    pub drug: DrugKey,
    pub indications: &'static [&'static str],
    pub allowed: &'static [Route],
    pub severity: Severity,
    pub reason: &'static str,
    pub source: &'static str,
}

/// For this drug and any of these indications, `route` is ineffective.
#[derive(Debug, Clone)]
pub struct ContraindicatedRoute {
    pub drug: DrugKey,
    pub route: Route,
    pub indications: &'static [&'static str],
    pub severity: Severity,
    pub reason: &'static str,
    pub source: &'static str,
}

const C_DIFF: &[&str] = &[
    "c difficile",
    "clostridioides difficile",
    "clostridium difficile",
    "c diff",
    "cdi",
];

pub static REQUIRED_ROUTES: &[RequiredRoute] = &[
    RequiredRoute {
        drug: DrugKey::Drug("vancomycin"),
        indications: C_DIFF,
        allowed: &[Route::Oral, Route::Rectal],
        severity: Severity::Critical,
        reason: "IV vancomycin is not excreted into the colon and does not treat C. difficile",
        source: "IDSA/SHEA C. difficile Guideline Update 2021",
    },
    RequiredRoute {
        drug: DrugKey::Drug("fidaxomicin"),
        indications: C_DIFF,
        allowed: &[Route::Oral],
        severity: Severity::High,
        reason: "fidaxomicin acts only within the gut lumen",
        source: "IDSA/SHEA C. difficile Guideline Update 2021",
    },
    RequiredRoute {
        drug: DrugKey::Drug("nitrofurantoin"),
        indications: &["cystitis", "uncomplicated cystitis", "uti", "uncomplicated uti"],
        allowed: &[Route::Oral],
        severity: Severity::Moderate,
        reason: "nitrofurantoin is only available and active as an oral agent",
        source: "FDA nitrofurantoin labeling",
    },
];

pub static CONTRAINDICATED_ROUTES: &[ContraindicatedRoute] = &[
    ContraindicatedRoute {
        drug: DrugKey::Drug("vancomycin"),
        route: Route::Oral,
        indications: SYSTEMIC_INDICATIONS,
        severity: Severity::Critical,
        reason: "oral vancomycin is not absorbed and gives no systemic exposure",
        source: "Vancocin prescribing information",
    },
    ContraindicatedRoute {
        drug: DrugKey::Drug("vancomycin"),
        route: Route::Rectal,
        indications: SYSTEMIC_INDICATIONS,
        severity: Severity::Critical,
        reason: "rectal vancomycin gives no systemic exposure",
        source: "Vancocin prescribing information",
    },
    ContraindicatedRoute {
        drug: DrugKey::Class(DrugClass::Aminoglycoside),
        route: Route::Oral,
        indications: SYSTEMIC_INDICATIONS,
        severity: Severity::High,
        reason: "oral aminoglycosides are not absorbed",
        source: "Lexicomp drug monographs",
    },
    ContraindicatedRoute {
        drug: DrugKey::Class(DrugClass::Aminoglycoside),
        route: Route::Inhaled,
        indications: SYSTEMIC_INDICATIONS,
        severity: Severity::High,
        reason: "inhaled aminoglycosides do not treat systemic infection",
        source: "Lexicomp drug monographs",
    },
    ContraindicatedRoute {
        drug: DrugKey::Class(DrugClass::Polymyxin),
        route: Route::Inhaled,
        indications: &["bacteremia", "bloodstream infection", "sepsis", "septic shock"],
        severity: Severity::High,
        reason: "inhaled polymyxin gives negligible serum concentrations",
        source: "International Consensus Guidelines for Polymyxins 2019",
    },
];
