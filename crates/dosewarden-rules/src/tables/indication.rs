//! Indication-specific dosing.
//!
//! Indication → drug → age-scoped rows. A `Dose` row is route-scoped; a
//! `NotRecommended` row applies to every route.

use dosewarden_contracts::{flag::Severity, patient::AgeGroup};

use crate::tables::{DoseRule, IntervalRange, RouteScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeScope {
    Any,
    Adult,
    Pediatric,
}

impl AgeScope {
    /// Missing age counts as adult.
    pub fn admits(&self, group: Option<AgeGroup>) -> bool {
        let pediatric = group.map_or(false, |g| g.is_pediatric());
        match self {
            AgeScope::Any => true,
            AgeScope::Adult => !pediatric,
            AgeScope::Pediatric => pediatric,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum IndicationRule {
    Dose {
        routes: RouteScope,
        dose: DoseRule,
        interval: IntervalRange,
    },
    /// The drug is a poor choice for this indication regardless of dose.
    NotRecommended {
        severity: Severity,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct ScopedRule {
    pub age: AgeScope,
    pub rule: IndicationRule,
}

#[derive(Debug, Clone, Copy)]
pub struct DrugDosing {
    pub drug: &'static str,
    pub rules: &'static [ScopedRule],
}

#[derive(Debug, Clone, Copy)]
pub struct IndicationEntry {
    pub keys: &'static [&'static str],
    /// Life-threatening infections: underdosing is a HIGH finding.
    pub serious: bool,
    pub drugs: &'static [DrugDosing],
    pub source: &'static str,
}

impl IndicationEntry {
    pub fn dosing_for(&self, drug: &str) -> Option<&'static DrugDosing> {
        let drugs: &'static [DrugDosing] = self.drugs;
        drugs.iter().find(|d| d.drug == drug)
    }
}

const fn adult(dose: DoseRule, interval: IntervalRange) -> ScopedRule {
    ScopedRule {
        age: AgeScope::Adult,
        rule: IndicationRule::Dose {
            routes: RouteScope::Parenteral,
            dose,
            interval,
        },
    }
}

const fn pediatric(dose: DoseRule, interval: IntervalRange) -> ScopedRule {
    ScopedRule {
        age: AgeScope::Pediatric,
        rule: IndicationRule::Dose {
            routes: RouteScope::Parenteral,
            dose,
            interval,
        },
    }
}

const fn scoped(age: AgeScope, routes: RouteScope, dose: DoseRule, interval: IntervalRange) -> ScopedRule {
    ScopedRule {
        age,
        rule: IndicationRule::Dose { routes, dose, interval },
    }
}

const fn avoid(severity: Severity, reason: &'static str) -> ScopedRule {
    ScopedRule {
        age: AgeScope::Any,
        rule: IndicationRule::NotRecommended { severity, reason },
    }
}

const fn q(min_h: f64, max_h: f64) -> IntervalRange {
    IntervalRange::new(min_h, max_h)
}

// ── Per-drug rows ────────────────────────────────────────────────────────────

static VANCOMYCIN_SYSTEMIC: [ScopedRule; 2] = [
    adult(DoseRule::per_dose(15.0, 20.0, None), q(8.0, 12.0)),
    pediatric(DoseRule::per_dose(15.0, 20.0, None), q(6.0, 8.0)),
];
static DAPTOMYCIN_LUNG: [ScopedRule; 1] =
    [avoid(Severity::High, "daptomycin is inactivated by pulmonary surfactant")];
static TIGECYCLINE_BLOOD: [ScopedRule; 1] =
    [avoid(Severity::High, "tigecycline serum concentrations are too low for bloodstream infection")];
static NITROFURANTOIN_SYSTEMIC: [ScopedRule; 1] =
    [avoid(Severity::High, "nitrofurantoin does not reach therapeutic tissue or serum concentrations")];
static MOXIFLOXACIN_URINARY: [ScopedRule; 1] =
    [avoid(Severity::High, "moxifloxacin does not achieve adequate urinary concentrations")];

// C. difficile
static CDI_VANCOMYCIN: [ScopedRule; 1] = [scoped(
    AgeScope::Any,
    RouteScope::Enteral,
    DoseRule::fixed(125.0, 500.0),
    IntervalRange::exactly(6.0),
)];
static CDI_FIDAXOMICIN: [ScopedRule; 1] = [scoped(
    AgeScope::Adult,
    RouteScope::Enteral,
    DoseRule::fixed(200.0, 200.0),
    IntervalRange::exactly(12.0),
)];

// Meningitis
static MENINGITIS_CEFTRIAXONE: [ScopedRule; 2] = [
    adult(DoseRule::fixed(2000.0, 2000.0), q(12.0, 12.0)),
    pediatric(DoseRule::per_day(100.0, 100.0, Some(4000.0)), q(12.0, 24.0)),
];
static MENINGITIS_AMPICILLIN: [ScopedRule; 2] = [
    adult(DoseRule::fixed(2000.0, 2000.0), q(4.0, 4.0)),
    pediatric(DoseRule::per_day(300.0, 400.0, Some(12000.0)), q(6.0, 8.0)),
];
static MENINGITIS_MEROPENEM: [ScopedRule; 2] = [
    adult(DoseRule::fixed(2000.0, 2000.0), q(8.0, 8.0)),
    pediatric(DoseRule::per_dose(40.0, 40.0, Some(2000.0)), q(8.0, 8.0)),
];
static MENINGITIS_CEFEPIME: [ScopedRule; 1] = [adult(DoseRule::fixed(2000.0, 2000.0), q(8.0, 8.0))];

// Pneumonia
static CAP_CEFTRIAXONE: [ScopedRule; 2] = [
    adult(DoseRule::fixed(1000.0, 2000.0), q(24.0, 24.0)),
    pediatric(DoseRule::per_day(50.0, 100.0, Some(2000.0)), q(12.0, 24.0)),
];
static CAP_AZITHROMYCIN: [ScopedRule; 1] = [scoped(
    AgeScope::Adult,
    RouteScope::Any,
    DoseRule::fixed(500.0, 500.0),
    IntervalRange::exactly(24.0),
)];
static CAP_LEVOFLOXACIN: [ScopedRule; 1] = [scoped(
    AgeScope::Adult,
    RouteScope::Any,
    DoseRule::fixed(750.0, 750.0),
    IntervalRange::exactly(24.0),
)];
static CAP_AMOXICILLIN: [ScopedRule; 2] = [
    scoped(AgeScope::Adult, RouteScope::Enteral, DoseRule::fixed(1000.0, 1000.0), IntervalRange::exactly(8.0)),
    scoped(AgeScope::Pediatric, RouteScope::Enteral, DoseRule::per_day(90.0, 90.0, Some(4000.0)), q(8.0, 12.0)),
];
static HAP_PIP_TAZO: [ScopedRule; 1] = [adult(DoseRule::fixed(4500.0, 4500.0), q(6.0, 6.0))];
static HAP_CEFEPIME: [ScopedRule; 1] = [adult(DoseRule::fixed(2000.0, 2000.0), q(8.0, 8.0))];
static HAP_MEROPENEM: [ScopedRule; 1] = [adult(DoseRule::fixed(1000.0, 2000.0), q(8.0, 8.0))];

// Sepsis
static SEPSIS_PIP_TAZO: [ScopedRule; 2] = [
    adult(DoseRule::fixed(4500.0, 4500.0), q(6.0, 8.0)),
    pediatric(DoseRule::per_dose(90.0, 112.5, Some(4500.0)), q(6.0, 8.0)),
];
static SEPSIS_CEFEPIME: [ScopedRule; 2] = [
    adult(DoseRule::fixed(2000.0, 2000.0), q(8.0, 12.0)),
    pediatric(DoseRule::per_dose(50.0, 50.0, Some(2000.0)), q(8.0, 12.0)),
];
static SEPSIS_MEROPENEM: [ScopedRule; 2] = [
    adult(DoseRule::fixed(1000.0, 2000.0), q(8.0, 8.0)),
    pediatric(DoseRule::per_dose(20.0, 40.0, Some(2000.0)), q(8.0, 8.0)),
];
static SEPSIS_CEFTRIAXONE: [ScopedRule; 1] = [adult(DoseRule::fixed(2000.0, 2000.0), q(24.0, 24.0))];

// Urinary
static CYSTITIS_NITROFURANTOIN: [ScopedRule; 1] = [scoped(
    AgeScope::Adult,
    RouteScope::Enteral,
    DoseRule::fixed(100.0, 100.0),
    IntervalRange::exactly(12.0),
)];
static CYSTITIS_CEPHALEXIN: [ScopedRule; 1] =
    [scoped(AgeScope::Adult, RouteScope::Enteral, DoseRule::fixed(500.0, 500.0), q(6.0, 12.0))];
static PYELO_CEFTRIAXONE: [ScopedRule; 1] = [adult(DoseRule::fixed(1000.0, 2000.0), q(24.0, 24.0))];
static PYELO_CIPROFLOXACIN: [ScopedRule; 1] =
    [scoped(AgeScope::Adult, RouteScope::Any, DoseRule::fixed(400.0, 500.0), IntervalRange::exactly(12.0))];
static PYELO_LEVOFLOXACIN: [ScopedRule; 1] =
    [scoped(AgeScope::Adult, RouteScope::Any, DoseRule::fixed(750.0, 750.0), IntervalRange::exactly(24.0))];

// Bloodstream / endovascular
static BSI_DAPTOMYCIN: [ScopedRule; 1] = [adult(DoseRule::per_dose(6.0, 10.0, None), q(24.0, 24.0))];
static BSI_CEFAZOLIN: [ScopedRule; 1] = [adult(DoseRule::fixed(2000.0, 2000.0), q(8.0, 8.0))];
static ENDO_DAPTOMYCIN: [ScopedRule; 1] = [adult(DoseRule::per_dose(8.0, 12.0, None), q(24.0, 24.0))];
static ENDO_CEFTRIAXONE: [ScopedRule; 1] = [adult(DoseRule::fixed(2000.0, 2000.0), q(24.0, 24.0))];
static ENDO_GENTAMICIN: [ScopedRule; 1] = [adult(DoseRule::per_dose(1.0, 1.0, None), q(8.0, 8.0))];

// Skin
static SSTI_CEFAZOLIN: [ScopedRule; 1] = [adult(DoseRule::fixed(1000.0, 2000.0), q(8.0, 8.0))];
static SSTI_CEPHALEXIN: [ScopedRule; 1] =
    [scoped(AgeScope::Adult, RouteScope::Enteral, DoseRule::fixed(500.0, 500.0), q(6.0, 6.0))];
static SSTI_CLINDAMYCIN: [ScopedRule; 1] =
    [scoped(AgeScope::Adult, RouteScope::Any, DoseRule::fixed(300.0, 600.0), q(6.0, 8.0))];

// Neutropenia / intra-abdominal
static FN_CEFEPIME: [ScopedRule; 1] = [adult(DoseRule::fixed(2000.0, 2000.0), q(8.0, 8.0))];
static FN_PIP_TAZO: [ScopedRule; 1] = [adult(DoseRule::fixed(4500.0, 4500.0), q(6.0, 8.0))];
static FN_MEROPENEM: [ScopedRule; 1] = [adult(DoseRule::fixed(1000.0, 1000.0), q(8.0, 8.0))];
static IAI_PIP_TAZO: [ScopedRule; 1] = [adult(DoseRule::fixed(3375.0, 4500.0), q(6.0, 8.0))];
static IAI_METRONIDAZOLE: [ScopedRule; 1] =
    [scoped(AgeScope::Adult, RouteScope::Any, DoseRule::fixed(500.0, 500.0), q(8.0, 12.0))];
static IAI_ERTAPENEM: [ScopedRule; 1] = [adult(DoseRule::fixed(1000.0, 1000.0), q(24.0, 24.0))];

// ── Indications ──────────────────────────────────────────────────────────────

pub static INDICATION_TABLE: &[IndicationEntry] = &[
    IndicationEntry {
        keys: &["c difficile", "clostridioides difficile", "clostridium difficile", "c diff", "cdi"],
        serious: false,
        drugs: &[
            DrugDosing { drug: "vancomycin", rules: &CDI_VANCOMYCIN },
            DrugDosing { drug: "fidaxomicin", rules: &CDI_FIDAXOMICIN },
        ],
        source: "IDSA/SHEA C. difficile Guideline Update 2021",
    },
    IndicationEntry {
        keys: &["meningitis", "bacterial meningitis"],
        serious: true,
        drugs: &[
            DrugDosing { drug: "ceftriaxone", rules: &MENINGITIS_CEFTRIAXONE },
            DrugDosing { drug: "vancomycin", rules: &VANCOMYCIN_SYSTEMIC },
            DrugDosing { drug: "ampicillin", rules: &MENINGITIS_AMPICILLIN },
            DrugDosing { drug: "meropenem", rules: &MENINGITIS_MEROPENEM },
            DrugDosing { drug: "cefepime", rules: &MENINGITIS_CEFEPIME },
        ],
        source: "IDSA Bacterial Meningitis Guideline 2004",
    },
    IndicationEntry {
        keys: &["community acquired pneumonia", "cap", "pneumonia"],
        serious: false,
        drugs: &[
            DrugDosing { drug: "ceftriaxone", rules: &CAP_CEFTRIAXONE },
            DrugDosing { drug: "azithromycin", rules: &CAP_AZITHROMYCIN },
            DrugDosing { drug: "levofloxacin", rules: &CAP_LEVOFLOXACIN },
            DrugDosing { drug: "amoxicillin", rules: &CAP_AMOXICILLIN },
            DrugDosing { drug: "daptomycin", rules: &DAPTOMYCIN_LUNG },
        ],
        source: "ATS/IDSA Community-Acquired Pneumonia Guideline 2019",
    },
    IndicationEntry {
        keys: &["hospital acquired pneumonia", "hap", "ventilator associated pneumonia", "vap"],
        serious: true,
        drugs: &[
            DrugDosing { drug: "piperacillin-tazobactam", rules: &HAP_PIP_TAZO },
            DrugDosing { drug: "cefepime", rules: &HAP_CEFEPIME },
            DrugDosing { drug: "meropenem", rules: &HAP_MEROPENEM },
            DrugDosing { drug: "vancomycin", rules: &VANCOMYCIN_SYSTEMIC },
            DrugDosing { drug: "daptomycin", rules: &DAPTOMYCIN_LUNG },
        ],
        source: "IDSA/ATS HAP/VAP Guideline 2016",
    },
    IndicationEntry {
        keys: &["sepsis", "severe sepsis", "septic shock"],
        serious: true,
        drugs: &[
            DrugDosing { drug: "piperacillin-tazobactam", rules: &SEPSIS_PIP_TAZO },
            DrugDosing { drug: "cefepime", rules: &SEPSIS_CEFEPIME },
            DrugDosing { drug: "meropenem", rules: &SEPSIS_MEROPENEM },
            DrugDosing { drug: "vancomycin", rules: &VANCOMYCIN_SYSTEMIC },
            DrugDosing { drug: "ceftriaxone", rules: &SEPSIS_CEFTRIAXONE },
            DrugDosing { drug: "nitrofurantoin", rules: &NITROFURANTOIN_SYSTEMIC },
        ],
        source: "Surviving Sepsis Campaign Guidelines 2021",
    },
    IndicationEntry {
        keys: &["uncomplicated cystitis", "cystitis", "uncomplicated uti", "uti", "urinary tract infection"],
        serious: false,
        drugs: &[
            DrugDosing { drug: "nitrofurantoin", rules: &CYSTITIS_NITROFURANTOIN },
            DrugDosing { drug: "cephalexin", rules: &CYSTITIS_CEPHALEXIN },
            DrugDosing { drug: "moxifloxacin", rules: &MOXIFLOXACIN_URINARY },
        ],
        source: "IDSA Uncomplicated Cystitis and Pyelonephritis Guideline 2010",
    },
    IndicationEntry {
        keys: &["pyelonephritis"],
        serious: false,
        drugs: &[
            DrugDosing { drug: "ceftriaxone", rules: &PYELO_CEFTRIAXONE },
            DrugDosing { drug: "ciprofloxacin", rules: &PYELO_CIPROFLOXACIN },
            DrugDosing { drug: "levofloxacin", rules: &PYELO_LEVOFLOXACIN },
            DrugDosing { drug: "nitrofurantoin", rules: &NITROFURANTOIN_SYSTEMIC },
            DrugDosing { drug: "moxifloxacin", rules: &MOXIFLOXACIN_URINARY },
        ],
        source: "IDSA Uncomplicated Cystitis and Pyelonephritis Guideline 2010",
    },
    IndicationEntry {
        keys: &["bacteremia", "bloodstream infection", "bsi"],
        serious: true,
        drugs: &[
            DrugDosing { drug: "vancomycin", rules: &VANCOMYCIN_SYSTEMIC },
            DrugDosing { drug: "daptomycin", rules: &BSI_DAPTOMYCIN },
            DrugDosing { drug: "cefazolin", rules: &BSI_CEFAZOLIN },
            DrugDosing { drug: "tigecycline", rules: &TIGECYCLINE_BLOOD },
            DrugDosing { drug: "nitrofurantoin", rules: &NITROFURANTOIN_SYSTEMIC },
        ],
        source: "IDSA MRSA Guideline 2011",
    },
    IndicationEntry {
        keys: &["endocarditis", "infective endocarditis"],
        serious: true,
        drugs: &[
            DrugDosing { drug: "vancomycin", rules: &VANCOMYCIN_SYSTEMIC },
            DrugDosing { drug: "daptomycin", rules: &ENDO_DAPTOMYCIN },
            DrugDosing { drug: "ceftriaxone", rules: &ENDO_CEFTRIAXONE },
            DrugDosing { drug: "gentamicin", rules: &ENDO_GENTAMICIN },
            DrugDosing { drug: "tigecycline", rules: &TIGECYCLINE_BLOOD },
        ],
        source: "AHA Infective Endocarditis Scientific Statement 2015",
    },
    IndicationEntry {
        keys: &["cellulitis", "erysipelas", "skin and soft tissue infection", "ssti"],
        serious: false,
        drugs: &[
            DrugDosing { drug: "cefazolin", rules: &SSTI_CEFAZOLIN },
            DrugDosing { drug: "cephalexin", rules: &SSTI_CEPHALEXIN },
            DrugDosing { drug: "clindamycin", rules: &SSTI_CLINDAMYCIN },
            DrugDosing { drug: "vancomycin", rules: &VANCOMYCIN_SYSTEMIC },
        ],
        source: "IDSA Skin and Soft Tissue Infection Guideline 2014",
    },
    IndicationEntry {
        keys: &["febrile neutropenia", "neutropenic fever"],
        serious: true,
        drugs: &[
            DrugDosing { drug: "cefepime", rules: &FN_CEFEPIME },
            DrugDosing { drug: "piperacillin-tazobactam", rules: &FN_PIP_TAZO },
            DrugDosing { drug: "meropenem", rules: &FN_MEROPENEM },
        ],
        source: "IDSA Febrile Neutropenia Guideline 2010",
    },
    IndicationEntry {
        keys: &["intra abdominal infection", "intra abdominal", "iai", "peritonitis"],
        serious: false,
        drugs: &[
            DrugDosing { drug: "piperacillin-tazobactam", rules: &IAI_PIP_TAZO },
            DrugDosing { drug: "metronidazole", rules: &IAI_METRONIDAZOLE },
            DrugDosing { drug: "ertapenem", rules: &IAI_ERTAPENEM },
        ],
        source: "SIS/IDSA Intra-abdominal Infection Guideline 2017",
    },
];

#[cfg(test)]
mod tests {
    use crate::matching::best_match;

    use super::*;

    #[test]
    fn test_missing_age_is_adult() {
        assert!(AgeScope::Adult.admits(None));
        assert!(!AgeScope::Pediatric.admits(None));
        assert!(AgeScope::Pediatric.admits(Some(AgeGroup::Child)));
        assert!(AgeScope::Any.admits(Some(AgeGroup::Neonate)));
    }

    #[test]
    fn test_c_difficile_vancomycin_is_enteral_only() {
        let entry = best_match("c_difficile", INDICATION_TABLE, |e| e.keys).unwrap();
        let dosing = entry.dosing_for("vancomycin").unwrap();
        match dosing.rules[0].rule {
            IndicationRule::Dose { routes, .. } => assert_eq!(routes, RouteScope::Enteral),
            IndicationRule::NotRecommended { .. } => panic!("expected a dose row"),
        }
    }

    #[test]
    fn test_severe_sepsis_pip_tazo_accepts_q6h() {
        let entry = best_match("severe sepsis", INDICATION_TABLE, |e| e.keys).unwrap();
        assert!(entry.serious);
        match entry.dosing_for("piperacillin-tazobactam").unwrap().rules[0].rule {
            IndicationRule::Dose { interval, .. } => assert!(interval.contains(6.0, 0.0)),
            IndicationRule::NotRecommended { .. } => panic!("expected a dose row"),
        }
    }
}
