//! Beta-lactam and same-class allergy cross-reactivity.

use dosewarden_contracts::{drug::DrugClass, flag::Severity};

use DrugClass::*;

pub const SOURCE: &str = "AAAAI/ACAAI Drug Allergy Practice Parameter Update 2022";

/// Estimated cross-reactivity between an allergen class and a drug class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CrossRisk {
    /// Below 1%: administer without test dose. Never flagged.
    Minimal,
    Low,
    Moderate,
    High,
}

impl CrossRisk {
    /// Flag severity for this risk, escalated when the index reaction was
    /// severe. `None` means no flag.
    pub fn severity(&self, severe_reaction: bool) -> Option<Severity> {
        let base = match self {
            CrossRisk::Minimal => None,
            CrossRisk::Low => Some(Severity::Low),
            CrossRisk::Moderate => Some(Severity::Moderate),
            CrossRisk::High => Some(Severity::High),
        };
        match (base, severe_reaction) {
            (_, false) => base,
            (None, true) => Some(Severity::Moderate),
            (Some(Severity::Low), true) => Some(Severity::High),
            (Some(_), true) => Some(Severity::Critical),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CrossRisk::Minimal => "minimal",
            CrossRisk::Low => "low",
            CrossRisk::Moderate => "moderate",
            CrossRisk::High => "high",
        }
    }
}

/// Classes that participate in allergy reasoning.
pub const ALLERGY_CLASSES: &[DrugClass] = &[
    Penicillin,
    Cephalosporin,
    Carbapenem,
    Monobactam,
    Aminoglycoside,
    Fluoroquinolone,
    Macrolide,
    Tetracycline,
    Glycopeptide,
    Sulfonamide,
];

/// Unordered class pairs. Same-class pairs cover an allergy to one member
/// and an order for another.
static MATRIX: &[(DrugClass, DrugClass, CrossRisk)] = &[
    (Penicillin, Penicillin, CrossRisk::High),
    (Penicillin, Cephalosporin, CrossRisk::Moderate),
    (Penicillin, Carbapenem, CrossRisk::Low),
    (Penicillin, Monobactam, CrossRisk::Minimal),
    (Cephalosporin, Cephalosporin, CrossRisk::Moderate),
    (Cephalosporin, Carbapenem, CrossRisk::Low),
    (Cephalosporin, Monobactam, CrossRisk::Low),
    (Carbapenem, Carbapenem, CrossRisk::High),
    (Carbapenem, Monobactam, CrossRisk::Minimal),
    (Monobactam, Monobactam, CrossRisk::High),
    (Aminoglycoside, Aminoglycoside, CrossRisk::Moderate),
    (Fluoroquinolone, Fluoroquinolone, CrossRisk::High),
    (Macrolide, Macrolide, CrossRisk::Moderate),
    (Tetracycline, Tetracycline, CrossRisk::High),
    (Glycopeptide, Glycopeptide, CrossRisk::High),
    (Sulfonamide, Sulfonamide, CrossRisk::High),
];

/// Cross-reactivity between an allergen class and a drug class, if listed.
pub fn cross_risk(allergen: DrugClass, drug: DrugClass) -> Option<CrossRisk> {
    MATRIX
        .iter()
        .find(|(a, b, _)| (*a == allergen && *b == drug) || (*a == drug && *b == allergen))
        .map(|(_, _, r)| *r)
}
