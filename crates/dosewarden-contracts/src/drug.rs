//! Shared drug vocabulary.
//!
//! Every rule module reasons about drugs through a `CanonicalDrug`: the
//! normalized generic name plus the pharmacologic classes it belongs to.
//! Raw order text is turned into a `CanonicalDrug` by a resolver (see
//! `dosewarden-core::traits::DrugResolver`), so modules never match on
//! free text themselves.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pharmacologic class membership used by allergy cross-reactivity and
/// interaction matching.
///
/// Antimicrobial classes come first; the remaining variants group
/// co-medications that participate in interaction rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrugClass {
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
    Lipopeptide,
    Oxazolidinone,
    Lincosamide,
    Nitroimidazole,
    Polymyxin,
    Rifamycin,
    AzoleAntifungal,
    Antiviral,
    /// Beta-lactams whose efficacy tracks time above MIC.
    BetaLactam,

    Anticoagulant,
    QtProlonging,
    Statin,
    Ssri,
    Maoi,
    LoopDiuretic,
    PotassiumSparing,
    AceInhibitor,
    CalcineurinInhibitor,
    Antiepileptic,
    PolyvalentCation,
    Nsaid,
}

impl DrugClass {
    /// Display label used in flag messages.
    pub fn label(&self) -> &'static str {
        match self {
            DrugClass::Penicillin => "penicillins",
            DrugClass::Cephalosporin => "cephalosporins",
            DrugClass::Carbapenem => "carbapenems",
            DrugClass::Monobactam => "monobactams",
            DrugClass::Aminoglycoside => "aminoglycosides",
            DrugClass::Fluoroquinolone => "fluoroquinolones",
            DrugClass::Macrolide => "macrolides",
            DrugClass::Tetracycline => "tetracyclines",
            DrugClass::Glycopeptide => "glycopeptides",
            DrugClass::Sulfonamide => "sulfonamides",
            DrugClass::Lipopeptide => "lipopeptides",
            DrugClass::Oxazolidinone => "oxazolidinones",
            DrugClass::Lincosamide => "lincosamides",
            DrugClass::Nitroimidazole => "nitroimidazoles",
            DrugClass::Polymyxin => "polymyxins",
            DrugClass::Rifamycin => "rifamycins",
            DrugClass::AzoleAntifungal => "azole antifungals",
            DrugClass::Antiviral => "antivirals",
            DrugClass::BetaLactam => "beta-lactams",
            DrugClass::Anticoagulant => "anticoagulants",
            DrugClass::QtProlonging => "QT-prolonging agents",
            DrugClass::Statin => "statins",
            DrugClass::Ssri => "serotonergic antidepressants",
            DrugClass::Maoi => "MAO inhibitors",
            DrugClass::LoopDiuretic => "loop diuretics",
            DrugClass::PotassiumSparing => "potassium-sparing agents",
            DrugClass::AceInhibitor => "ACE inhibitors / ARBs",
            DrugClass::CalcineurinInhibitor => "calcineurin inhibitors",
            DrugClass::Antiepileptic => "antiepileptics",
            DrugClass::PolyvalentCation => "polyvalent cations",
            DrugClass::Nsaid => "NSAIDs",
        }
    }
}

impl fmt::Display for DrugClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A drug after name normalization.
///
/// `name` is the generic name every rule table is keyed by (lowercase,
/// hyphen-joined for combinations, e.g. `piperacillin-tazobactam`). A raw
/// name the resolver does not know still yields a `CanonicalDrug` with the
/// cleaned-up text as its name and no classes; `known` records which case
/// applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalDrug {
    pub name: String,
    pub classes: Vec<DrugClass>,
    pub known: bool,
}

impl CanonicalDrug {
    /// A drug the resolver could not place in its formulary.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: Vec::new(),
            known: false,
        }
    }

    /// Return true if the drug belongs to `class`.
    pub fn is(&self, class: DrugClass) -> bool {
        self.classes.contains(&class)
    }

    /// Return true if the canonical name equals `name`.
    pub fn named(&self, name: &str) -> bool {
        self.name == name
    }
}
