//! Age contraindications and neonatal interval tiers.

use dosewarden_contracts::{
    drug::DrugClass,
    flag::Severity,
    patient::DAYS_PER_YEAR,
};

use crate::{tables::DrugKey, tier::Tier};

/// An age below which a drug is contraindicated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgeLimit {
    Days(f64),
    Years(f64),
}

impl AgeLimit {
    pub fn in_days(&self) -> f64 {
        match self {
            AgeLimit::Days(d) => *d,
            AgeLimit::Years(y) => y * DAYS_PER_YEAR,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AgeLimit::Days(d) => format!("{} days", d),
            AgeLimit::Years(y) => format!("{} years", y),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AgeContraindication {
    pub drug: DrugKey,
    pub below: AgeLimit,
    pub severity: Severity,
    pub reason: &'static str,
    pub source: &'static str,
}

pub static AGE_CONTRAINDICATIONS: &[AgeContraindication] = &[
    AgeContraindication {
        drug: DrugKey::Drug("ceftriaxone"),
        below: AgeLimit::Days(28.0),
        severity: Severity::Critical,
        reason: "bilirubin displacement and calcium-ceftriaxone precipitation in neonates",
        source: "FDA ceftriaxone labeling; AAP Red Book 2024",
    },
    AgeContraindication {
        drug: DrugKey::Drug("sulfamethoxazole-trimethoprim"),
        below: AgeLimit::Days(60.0),
        severity: Severity::Critical,
        reason: "kernicterus risk from bilirubin displacement",
        source: "FDA sulfamethoxazole-trimethoprim labeling",
    },
    AgeContraindication {
        drug: DrugKey::Drug("chloramphenicol"),
        below: AgeLimit::Days(28.0),
        severity: Severity::High,
        reason: "gray baby syndrome from immature glucuronidation",
        source: "AAP Red Book 2024",
    },
    AgeContraindication {
        drug: DrugKey::Drug("nitrofurantoin"),
        below: AgeLimit::Days(30.0),
        severity: Severity::High,
        reason: "hemolytic anemia from immature erythrocyte enzyme systems",
        source: "FDA nitrofurantoin labeling",
    },
    AgeContraindication {
        drug: DrugKey::Drug("doxycycline"),
        below: AgeLimit::Years(8.0),
        severity: Severity::Moderate,
        reason: "dental staining; short courses (≤ 21 days) are acceptable",
        source: "AAP Red Book 2024",
    },
    AgeContraindication {
        drug: DrugKey::Drug("minocycline"),
        below: AgeLimit::Years(8.0),
        severity: Severity::High,
        reason: "permanent tooth discoloration and enamel hypoplasia",
        source: "AAP Red Book 2024",
    },
    AgeContraindication {
        drug: DrugKey::Drug("tetracycline"),
        below: AgeLimit::Years(8.0),
        severity: Severity::High,
        reason: "permanent tooth discoloration and enamel hypoplasia",
        source: "AAP Red Book 2024",
    },
    AgeContraindication {
        drug: DrugKey::Drug("tigecycline"),
        below: AgeLimit::Years(18.0),
        severity: Severity::Moderate,
        reason: "increased all-cause mortality; not approved under 18 years",
        source: "FDA tigecycline boxed warning",
    },
    AgeContraindication {
        drug: DrugKey::Class(DrugClass::Fluoroquinolone),
        below: AgeLimit::Years(18.0),
        severity: Severity::Moderate,
        reason: "musculoskeletal toxicity; reserve for infections without alternatives",
        source: "AAP Clinical Report: Use of Systemic Fluoroquinolones 2016",
    },
];

/// Neonatal interval tiers: postmenstrual-age tiers (weeks), each holding
/// postnatal-age tiers (days) whose value is the dosing interval in hours.
#[derive(Debug, Clone, Copy)]
pub struct NeonatalIntervalRule {
    pub drug: DrugKey,
    /// Severity when the ordered interval is shorter than the tier's.
    pub severity: Severity,
    pub tiers: &'static [Tier<&'static [Tier<f64>]>],
    pub source: &'static str,
}

/// Neonatal tiers only apply under this postmenstrual age.
pub const NEONATAL_PMA_LIMIT_WEEKS: f64 = 45.0;

const NEOFAX: &str = "Neofax / Lexicomp Pediatric & Neonatal Dosage Handbook";

// Postnatal-age tiers (days → hours between doses), one per PMA band.
static AMINOGLYCOSIDE_PMA_UNDER_30: [Tier<f64>; 3] = [
    Tier::below(8.0, 48.0),
    Tier::new(8.0, 29.0, 36.0),
    Tier::at_least(29.0, 24.0),
];
static AMINOGLYCOSIDE_PMA_30_34: [Tier<f64>; 2] = [Tier::below(8.0, 36.0), Tier::at_least(8.0, 24.0)];
static EVERY_24H: [Tier<f64>; 1] = [Tier::at_least(0.0, 24.0)];
static VANCOMYCIN_PMA_UNDER_30: [Tier<f64>; 2] = [Tier::below(15.0, 18.0), Tier::at_least(15.0, 12.0)];
static VANCOMYCIN_PMA_30_36: [Tier<f64>; 2] = [Tier::below(15.0, 12.0), Tier::at_least(15.0, 8.0)];
static VANCOMYCIN_PMA_37_44: [Tier<f64>; 2] = [Tier::below(8.0, 12.0), Tier::at_least(8.0, 8.0)];
static Q12H_THEN_Q8H_AFTER_WEEK_ONE: [Tier<f64>; 2] = [Tier::below(8.0, 12.0), Tier::at_least(8.0, 8.0)];
static EVERY_8H: [Tier<f64>; 1] = [Tier::at_least(0.0, 8.0)];

static AMINOGLYCOSIDE_TIERS: [Tier<&[Tier<f64>]>; 3] = [
    Tier::below(30.0, &AMINOGLYCOSIDE_PMA_UNDER_30),
    Tier::new(30.0, 35.0, &AMINOGLYCOSIDE_PMA_30_34),
    Tier::at_least(35.0, &EVERY_24H),
];
static VANCOMYCIN_TIERS: [Tier<&[Tier<f64>]>; 3] = [
    Tier::below(30.0, &VANCOMYCIN_PMA_UNDER_30),
    Tier::new(30.0, 37.0, &VANCOMYCIN_PMA_30_36),
    Tier::new(37.0, 45.0, &VANCOMYCIN_PMA_37_44),
];
static AMPICILLIN_TIERS: [Tier<&[Tier<f64>]>; 2] = [
    Tier::below(35.0, &Q12H_THEN_Q8H_AFTER_WEEK_ONE),
    Tier::at_least(35.0, &EVERY_8H),
];
static CEFOTAXIME_TIERS: [Tier<&[Tier<f64>]>; 1] = [Tier::at_least(0.0, &Q12H_THEN_Q8H_AFTER_WEEK_ONE)];

pub static NEONATAL_INTERVALS: &[NeonatalIntervalRule] = &[
    NeonatalIntervalRule {
        drug: DrugKey::Class(DrugClass::Aminoglycoside),
        severity: Severity::High,
        tiers: &AMINOGLYCOSIDE_TIERS,
        source: NEOFAX,
    },
    NeonatalIntervalRule {
        drug: DrugKey::Drug("vancomycin"),
        severity: Severity::High,
        tiers: &VANCOMYCIN_TIERS,
        source: NEOFAX,
    },
    NeonatalIntervalRule {
        drug: DrugKey::Drug("ampicillin"),
        severity: Severity::Moderate,
        tiers: &AMPICILLIN_TIERS,
        source: "AAP Red Book 2024",
    },
    NeonatalIntervalRule {
        drug: DrugKey::Drug("cefotaxime"),
        severity: Severity::Moderate,
        tiers: &CEFOTAXIME_TIERS,
        source: "AAP Red Book 2024",
    },
];
