//! Findings produced by rule modules, and the merge rules that combine them.
//!
//! `Severity` is an ordered discriminant: comparing two severities is a plain
//! `Ord` comparison, with no lookup table involved. The merge functions at the
//! bottom of this file implement the engine's deduplicate-then-rank contract:
//!
//! 1. Deduplicate by (drug, flag type). The higher severity survives; on a tie
//!    the earlier flag (module order) survives.
//! 2. Stable sort by severity, highest first.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

// ── Severity ─────────────────────────────────────────────────────────────────

/// Clinical severity of a finding. Declaration order is rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low = 0,
    Moderate = 1,
    High = 2,
    Critical = 3,
}

impl Severity {
    /// Numeric rank: CRITICAL=3, HIGH=2, MODERATE=1, LOW=0.
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Moderate => "MODERATE",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    /// One tier up, saturating at CRITICAL.
    pub fn escalate(&self) -> Severity {
        match self {
            Severity::Low => Severity::Moderate,
            Severity::Moderate => Severity::High,
            Severity::High | Severity::Critical => Severity::Critical,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Flag type ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagType {
    AllergyContraindicated,
    AllergyCrossReactivity,
    AgeDoseMismatch,
    Contraindicated,
    NoRenalAdjustment,
    WeightDoseMismatch,
    MaxDoseExceeded,
    DurationInsufficient,
    DurationExcessive,
    ExtendedInfusionCandidate,
    DrugInteraction,
    WrongRoute,
    SubtherapeuticDose,
    SupratherapeuticDose,
    WrongInterval,
}

impl FlagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagType::AllergyContraindicated => "ALLERGY_CONTRAINDICATED",
            FlagType::AllergyCrossReactivity => "ALLERGY_CROSS_REACTIVITY",
            FlagType::AgeDoseMismatch => "AGE_DOSE_MISMATCH",
            FlagType::Contraindicated => "CONTRAINDICATED",
            FlagType::NoRenalAdjustment => "NO_RENAL_ADJUSTMENT",
            FlagType::WeightDoseMismatch => "WEIGHT_DOSE_MISMATCH",
            FlagType::MaxDoseExceeded => "MAX_DOSE_EXCEEDED",
            FlagType::DurationInsufficient => "DURATION_INSUFFICIENT",
            FlagType::DurationExcessive => "DURATION_EXCESSIVE",
            FlagType::ExtendedInfusionCandidate => "EXTENDED_INFUSION_CANDIDATE",
            FlagType::DrugInteraction => "DRUG_INTERACTION",
            FlagType::WrongRoute => "WRONG_ROUTE",
            FlagType::SubtherapeuticDose => "SUBTHERAPEUTIC_DOSE",
            FlagType::SupratherapeuticDose => "SUPRATHERAPEUTIC_DOSE",
            FlagType::WrongInterval => "WRONG_INTERVAL",
        }
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Flag ─────────────────────────────────────────────────────────────────────

/// One safety or optimization finding for one drug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseFlag {
    pub flag_type: FlagType,
    pub severity: Severity,
    /// Canonical name of the affected drug.
    pub drug: String,
    pub message: String,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub actual: Option<String>,
    /// Guideline or reference the rule is drawn from.
    #[serde(default)]
    pub rule_source: Option<String>,
    #[serde(default)]
    pub indication: Option<String>,
    /// Supporting detail. Ordered so equal flags serialize identically.
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl DoseFlag {
    pub fn new(
        flag_type: FlagType,
        severity: Severity,
        drug: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            flag_type,
            severity,
            drug: drug.into(),
            message: message.into(),
            expected: None,
            actual: None,
            rule_source: None,
            indication: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn expected(mut self, text: impl Into<String>) -> Self {
        self.expected = Some(text.into());
        self
    }

    pub fn actual(mut self, text: impl Into<String>) -> Self {
        self.actual = Some(text.into());
        self
    }

    pub fn source(mut self, text: impl Into<String>) -> Self {
        self.rule_source = Some(text.into());
        self
    }

    pub fn indication(mut self, text: Option<&str>) -> Self {
        self.indication = text.map(str::to_string);
        self
    }

    pub fn attr(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// The deduplication key.
    pub fn key(&self) -> (&str, FlagType) {
        (self.drug.as_str(), self.flag_type)
    }
}

// ── Merge ────────────────────────────────────────────────────────────────────

/// Collapse flags that share (drug, flag type).
///
/// The surviving flag keeps the position of the first occurrence, so a later
/// stable sort still reflects module order within a severity tier. A later
/// flag only replaces an earlier one when its severity is strictly higher.
pub fn deduplicate_flags(flags: Vec<DoseFlag>) -> Vec<DoseFlag> {
    let mut survivors: Vec<DoseFlag> = Vec::with_capacity(flags.len());
    let mut index: BTreeMap<(String, FlagType), usize> = BTreeMap::new();

    for flag in flags {
        let key = (flag.drug.clone(), flag.flag_type);
        match index.get(&key) {
            Some(&pos) => {
                if flag.severity > survivors[pos].severity {
                    survivors[pos] = flag;
                }
            }
            None => {
                index.insert(key, survivors.len());
                survivors.push(flag);
            }
        }
    }

    survivors
}

/// Stable sort by severity, highest first.
pub fn rank_flags(mut flags: Vec<DoseFlag>) -> Vec<DoseFlag> {
    flags.sort_by(|a, b| b.severity.cmp(&a.severity));
    flags
}

/// Severity of the top flag of a ranked list.
pub fn max_severity(ranked: &[DoseFlag]) -> Option<Severity> {
    ranked.first().map(|f| f.severity)
}
