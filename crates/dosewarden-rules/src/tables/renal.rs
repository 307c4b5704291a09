//! Renal dose-adjustment tiers and dialysis dosing.
//!
//! Tiers are keyed by clearance in mL/min (GFR when reported, else CrCl) and
//! listed from normal function downwards. A drug with no dialysis entry for
//! the patient's modality is skipped for dialysis patients.

use dosewarden_contracts::{drug::DrugClass, flag::Severity, patient::DialysisModality};

use crate::{tables::DrugKey, tier::Tier};

/// What a renal tier or dialysis row asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenalEffect {
    /// No adjustment needed.
    Standard,
    /// Cap the single dose and/or lengthen the interval.
    Adjust {
        dose_mg: Option<f64>,
        interval_h: Option<f64>,
        note: &'static str,
    },
    Contraindicated { note: &'static str },
}

const fn adjust(dose_mg: Option<f64>, interval_h: Option<f64>, note: &'static str) -> RenalEffect {
    RenalEffect::Adjust { dose_mg, interval_h, note }
}

/// Dialysis-specific dosing. `modality: None` applies to any modality without
/// a more specific row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialysisRule {
    pub modality: Option<DialysisModality>,
    pub effect: RenalEffect,
}

#[derive(Debug, Clone, Copy)]
pub struct RenalRule {
    pub drug: DrugKey,
    /// Severity of a missing adjustment.
    pub severity: Severity,
    pub tiers: &'static [Tier<RenalEffect>],
    pub dialysis: &'static [DialysisRule],
    pub source: &'static str,
}

impl RenalRule {
    /// The dialysis row for `modality`: an exact row first, then a catch-all.
    pub fn dialysis_effect(&self, modality: DialysisModality) -> Option<&'static DialysisRule> {
        let rows: &'static [DialysisRule] = self.dialysis;
        rows.iter()
            .find(|r| r.modality == Some(modality))
            .or_else(|| rows.iter().find(|r| r.modality.is_none()))
    }
}

const HD: Option<DialysisModality> = Some(DialysisModality::Hemodialysis);
const CRRT: Option<DialysisModality> = Some(DialysisModality::Crrt);
const PD: Option<DialysisModality> = Some(DialysisModality::Peritoneal);

const SANFORD: &str = "Sanford Guide 2024, renal dosing tables";
const AFTER_HD: &str = "dose after hemodialysis on dialysis days";

// ── Tiers ────────────────────────────────────────────────────────────────────

static MEROPENEM_TIERS: [Tier<RenalEffect>; 4] = [
    Tier::at_least(51.0, RenalEffect::Standard),
    Tier::new(26.0, 51.0, adjust(Some(1000.0), Some(12.0), "1 g q12h for CrCl 26-50")),
    Tier::new(10.0, 26.0, adjust(Some(500.0), Some(12.0), "500 mg q12h for CrCl 10-25")),
    Tier::below(10.0, adjust(Some(500.0), Some(24.0), "500 mg q24h for CrCl < 10")),
];
static MEROPENEM_DIALYSIS: [DialysisRule; 3] = [
    DialysisRule { modality: HD, effect: adjust(Some(500.0), Some(24.0), AFTER_HD) },
    DialysisRule { modality: CRRT, effect: adjust(Some(1000.0), Some(8.0), "1 g q8-12h on CRRT") },
    DialysisRule { modality: PD, effect: adjust(Some(500.0), Some(24.0), "500 mg q24h on PD") },
];

static CEFEPIME_TIERS: [Tier<RenalEffect>; 4] = [
    Tier::at_least(60.0, RenalEffect::Standard),
    Tier::new(30.0, 60.0, adjust(Some(2000.0), Some(12.0), "2 g q12h for CrCl 30-60")),
    Tier::new(11.0, 30.0, adjust(Some(2000.0), Some(24.0), "2 g q24h for CrCl 11-29")),
    Tier::below(11.0, adjust(Some(1000.0), Some(24.0), "1 g q24h for CrCl ≤ 10; neurotoxicity risk")),
];
static CEFEPIME_DIALYSIS: [DialysisRule; 3] = [
    DialysisRule { modality: HD, effect: adjust(Some(1000.0), Some(24.0), AFTER_HD) },
    DialysisRule { modality: CRRT, effect: adjust(Some(2000.0), Some(12.0), "2 g q12h on CRRT") },
    DialysisRule { modality: PD, effect: adjust(Some(2000.0), Some(48.0), "2 g q48h on PD") },
];

static PIP_TAZO_TIERS: [Tier<RenalEffect>; 3] = [
    Tier::at_least(40.0, RenalEffect::Standard),
    Tier::new(20.0, 40.0, adjust(Some(3375.0), Some(6.0), "3.375 g q6h for CrCl 20-40")),
    Tier::below(20.0, adjust(Some(2250.0), Some(6.0), "2.25 g q6h for CrCl < 20")),
];
static PIP_TAZO_DIALYSIS: [DialysisRule; 2] = [
    DialysisRule { modality: CRRT, effect: adjust(Some(3375.0), Some(6.0), "3.375 g q6h on CRRT") },
    DialysisRule { modality: None, effect: adjust(Some(2250.0), Some(8.0), "2.25 g q8h; extra 0.75 g after HD") },
];

static CEFTAZIDIME_TIERS: [Tier<RenalEffect>; 5] = [
    Tier::at_least(51.0, RenalEffect::Standard),
    Tier::new(31.0, 51.0, adjust(Some(2000.0), Some(12.0), "1-2 g q12h for CrCl 31-50")),
    Tier::new(16.0, 31.0, adjust(Some(2000.0), Some(24.0), "1-2 g q24h for CrCl 16-30")),
    Tier::new(6.0, 16.0, adjust(Some(1000.0), Some(24.0), "0.5-1 g q24h for CrCl 6-15")),
    Tier::below(6.0, adjust(Some(1000.0), Some(48.0), "0.5-1 g q48h for CrCl < 6")),
];
static CEFTAZIDIME_DIALYSIS: [DialysisRule; 1] = [DialysisRule {
    modality: None,
    effect: adjust(Some(1000.0), Some(48.0), "1 g after each hemodialysis"),
}];

static ERTAPENEM_TIERS: [Tier<RenalEffect>; 2] = [
    Tier::at_least(31.0, RenalEffect::Standard),
    Tier::below(31.0, adjust(Some(500.0), Some(24.0), "500 mg q24h for CrCl ≤ 30")),
];
static ERTAPENEM_DIALYSIS: [DialysisRule; 1] = [DialysisRule {
    modality: None,
    effect: adjust(Some(500.0), Some(24.0), "500 mg q24h; supplement 150 mg if given within 6 h before HD"),
}];

static CEFAZOLIN_TIERS: [Tier<RenalEffect>; 3] = [
    Tier::at_least(35.0, RenalEffect::Standard),
    Tier::new(11.0, 35.0, adjust(None, Some(12.0), "usual dose q12h for CrCl 11-34")),
    Tier::below(11.0, adjust(None, Some(24.0), "usual dose q24h for CrCl ≤ 10")),
];
static CEFAZOLIN_DIALYSIS: [DialysisRule; 2] = [
    DialysisRule { modality: CRRT, effect: adjust(Some(2000.0), Some(12.0), "2 g q12h on CRRT") },
    DialysisRule { modality: None, effect: adjust(Some(2000.0), Some(48.0), "2 g after each hemodialysis") },
];

static AMPICILLIN_TIERS: [Tier<RenalEffect>; 3] = [
    Tier::at_least(50.0, RenalEffect::Standard),
    Tier::new(10.0, 50.0, adjust(None, Some(8.0), "usual dose q6-12h for CrCl 10-50")),
    Tier::below(10.0, adjust(None, Some(12.0), "usual dose q12-24h for CrCl < 10")),
];
static AMPICILLIN_DIALYSIS: [DialysisRule; 1] = [DialysisRule {
    modality: None,
    effect: adjust(None, Some(12.0), AFTER_HD),
}];

static LEVOFLOXACIN_TIERS: [Tier<RenalEffect>; 3] = [
    Tier::at_least(50.0, RenalEffect::Standard),
    Tier::new(20.0, 50.0, adjust(Some(750.0), Some(48.0), "750 mg q48h for CrCl 20-49")),
    Tier::below(20.0, adjust(Some(500.0), Some(48.0), "750 mg once, then 500 mg q48h for CrCl < 20")),
];
static LEVOFLOXACIN_DIALYSIS: [DialysisRule; 1] = [DialysisRule {
    modality: None,
    effect: adjust(Some(500.0), Some(48.0), "750 mg once, then 500 mg q48h"),
}];

static CIPROFLOXACIN_TIERS: [Tier<RenalEffect>; 2] = [
    Tier::at_least(30.0, RenalEffect::Standard),
    Tier::below(30.0, adjust(Some(500.0), Some(24.0), "usual dose q18-24h for CrCl < 30")),
];
static CIPROFLOXACIN_DIALYSIS: [DialysisRule; 1] = [DialysisRule {
    modality: None,
    effect: adjust(Some(500.0), Some(24.0), AFTER_HD),
}];

static VANCOMYCIN_TIERS: [Tier<RenalEffect>; 3] = [
    Tier::at_least(50.0, RenalEffect::Standard),
    Tier::new(20.0, 50.0, adjust(None, Some(24.0), "q24h for CrCl 20-49; dose by AUC/levels")),
    Tier::below(20.0, adjust(None, Some(48.0), "q48h or by levels for CrCl < 20")),
];
static VANCOMYCIN_DIALYSIS: [DialysisRule; 2] = [
    DialysisRule { modality: CRRT, effect: adjust(None, Some(24.0), "q24h on CRRT; dose by levels") },
    DialysisRule { modality: None, effect: adjust(None, Some(48.0), "dose after HD by pre-dialysis levels") },
];

static AMINOGLYCOSIDE_TIERS: [Tier<RenalEffect>; 4] = [
    Tier::at_least(60.0, RenalEffect::Standard),
    Tier::new(40.0, 60.0, adjust(None, Some(36.0), "extended interval q36h for CrCl 40-59")),
    Tier::new(20.0, 40.0, adjust(None, Some(48.0), "extended interval q48h for CrCl 20-39")),
    Tier::below(20.0, adjust(None, Some(48.0), "single dose, redose by levels for CrCl < 20")),
];
static AMINOGLYCOSIDE_DIALYSIS: [DialysisRule; 1] = [DialysisRule {
    modality: None,
    effect: adjust(None, Some(48.0), "dose after HD by pre-dialysis levels"),
}];

static SMX_TMP_TIERS: [Tier<RenalEffect>; 2] = [
    Tier::at_least(15.0, RenalEffect::Standard),
    Tier::below(15.0, RenalEffect::Contraindicated { note: "not recommended for CrCl < 15 without dialysis" }),
];

static NITROFURANTOIN_TIERS: [Tier<RenalEffect>; 2] = [
    Tier::at_least(30.0, RenalEffect::Standard),
    Tier::below(
        30.0,
        RenalEffect::Contraindicated { note: "inadequate urinary concentration and accumulation toxicity below CrCl 30" },
    ),
];
static NITROFURANTOIN_DIALYSIS: [DialysisRule; 1] = [DialysisRule {
    modality: None,
    effect: RenalEffect::Contraindicated { note: "avoid in dialysis" },
}];

static DAPTOMYCIN_TIERS: [Tier<RenalEffect>; 2] = [
    Tier::at_least(30.0, RenalEffect::Standard),
    Tier::below(30.0, adjust(None, Some(48.0), "usual mg/kg q48h for CrCl < 30")),
];
static DAPTOMYCIN_DIALYSIS: [DialysisRule; 1] = [DialysisRule {
    modality: None,
    effect: adjust(None, Some(48.0), "q48h, after HD on dialysis days"),
}];

static ACYCLOVIR_TIERS: [Tier<RenalEffect>; 4] = [
    Tier::at_least(51.0, RenalEffect::Standard),
    Tier::new(25.0, 51.0, adjust(None, Some(12.0), "usual dose q12h for CrCl 25-50")),
    Tier::new(10.0, 25.0, adjust(None, Some(24.0), "usual dose q24h for CrCl 10-24")),
    Tier::below(10.0, adjust(None, Some(24.0), "50% dose q24h for CrCl < 10")),
];
static ACYCLOVIR_DIALYSIS: [DialysisRule; 1] = [DialysisRule {
    modality: None,
    effect: adjust(None, Some(24.0), AFTER_HD),
}];

// ── Rules ────────────────────────────────────────────────────────────────────

pub static RENAL_RULES: &[RenalRule] = &[
    RenalRule {
        drug: DrugKey::Drug("meropenem"),
        severity: Severity::Moderate,
        tiers: &MEROPENEM_TIERS,
        dialysis: &MEROPENEM_DIALYSIS,
        source: "Merrem prescribing information; Sanford Guide 2024",
    },
    RenalRule {
        drug: DrugKey::Drug("cefepime"),
        severity: Severity::High,
        tiers: &CEFEPIME_TIERS,
        dialysis: &CEFEPIME_DIALYSIS,
        source: "FDA Drug Safety Communication: cefepime and nonconvulsive status epilepticus",
    },
    RenalRule {
        drug: DrugKey::Drug("piperacillin-tazobactam"),
        severity: Severity::Moderate,
        tiers: &PIP_TAZO_TIERS,
        dialysis: &PIP_TAZO_DIALYSIS,
        source: "Zosyn prescribing information",
    },
    RenalRule {
        drug: DrugKey::Drug("ceftazidime"),
        severity: Severity::Moderate,
        tiers: &CEFTAZIDIME_TIERS,
        dialysis: &CEFTAZIDIME_DIALYSIS,
        source: SANFORD,
    },
    RenalRule {
        drug: DrugKey::Drug("ertapenem"),
        severity: Severity::Moderate,
        tiers: &ERTAPENEM_TIERS,
        dialysis: &ERTAPENEM_DIALYSIS,
        source: "Invanz prescribing information",
    },
    RenalRule {
        drug: DrugKey::Drug("cefazolin"),
        severity: Severity::Moderate,
        tiers: &CEFAZOLIN_TIERS,
        dialysis: &CEFAZOLIN_DIALYSIS,
        source: SANFORD,
    },
    RenalRule {
        drug: DrugKey::Drug("ampicillin"),
        severity: Severity::Low,
        tiers: &AMPICILLIN_TIERS,
        dialysis: &AMPICILLIN_DIALYSIS,
        source: SANFORD,
    },
    RenalRule {
        drug: DrugKey::Drug("levofloxacin"),
        severity: Severity::Moderate,
        tiers: &LEVOFLOXACIN_TIERS,
        dialysis: &LEVOFLOXACIN_DIALYSIS,
        source: "Levaquin prescribing information",
    },
    RenalRule {
        drug: DrugKey::Drug("ciprofloxacin"),
        severity: Severity::Moderate,
        tiers: &CIPROFLOXACIN_TIERS,
        dialysis: &CIPROFLOXACIN_DIALYSIS,
        source: SANFORD,
    },
    RenalRule {
        drug: DrugKey::Drug("vancomycin"),
        severity: Severity::High,
        tiers: &VANCOMYCIN_TIERS,
        dialysis: &VANCOMYCIN_DIALYSIS,
        source: "ASHP/IDSA/PIDS/SIDP Vancomycin Consensus Guideline 2020",
    },
    RenalRule {
        drug: DrugKey::Class(DrugClass::Aminoglycoside),
        severity: Severity::High,
        tiers: &AMINOGLYCOSIDE_TIERS,
        dialysis: &AMINOGLYCOSIDE_DIALYSIS,
        source: "Hartford extended-interval aminoglycoside nomogram",
    },
    RenalRule {
        drug: DrugKey::Drug("sulfamethoxazole-trimethoprim"),
        severity: Severity::Moderate,
        tiers: &SMX_TMP_TIERS,
        dialysis: &[],
        source: "Bactrim prescribing information",
    },
    RenalRule {
        drug: DrugKey::Drug("nitrofurantoin"),
        severity: Severity::High,
        tiers: &NITROFURANTOIN_TIERS,
        dialysis: &NITROFURANTOIN_DIALYSIS,
        source: "AGS Beers Criteria 2023",
    },
    RenalRule {
        drug: DrugKey::Drug("daptomycin"),
        severity: Severity::Moderate,
        tiers: &DAPTOMYCIN_TIERS,
        dialysis: &DAPTOMYCIN_DIALYSIS,
        source: "Cubicin prescribing information",
    },
    RenalRule {
        drug: DrugKey::Drug("acyclovir"),
        severity: Severity::High,
        tiers: &ACYCLOVIR_TIERS,
        dialysis: &ACYCLOVIR_DIALYSIS,
        source: SANFORD,
    },
];

#[cfg(test)]
mod tests {
    use crate::tier::select;

    use super::*;

    fn rule(name: &'static str) -> &'static RenalRule {
        RENAL_RULES
            .iter()
            .find(|r| r.drug == DrugKey::Drug(name))
            .unwrap()
    }

    #[test]
    fn test_meropenem_gfr_42_needs_q12h() {
        let tier = select(rule("meropenem").tiers, 42.0).unwrap();
        match tier.value {
            RenalEffect::Adjust { dose_mg, interval_h, .. } => {
                assert_eq!(dose_mg, Some(1000.0));
                assert_eq!(interval_h, Some(12.0));
            }
            other => panic!("expected Adjust, got {:?}", other),
        }
    }

    #[test]
    fn test_dialysis_prefers_exact_modality() {
        let r = rule("piperacillin-tazobactam");
        let crrt = r.dialysis_effect(DialysisModality::Crrt).unwrap();
        assert_eq!(crrt.modality, Some(DialysisModality::Crrt));
        let hd = r.dialysis_effect(DialysisModality::Hemodialysis).unwrap();
        assert_eq!(hd.modality, None);
        assert!(rule("sulfamethoxazole-trimethoprim")
            .dialysis_effect(DialysisModality::Hemodialysis)
            .is_none());
    }

    #[test]
    fn test_tier_lists_cover_every_clearance() {
        for r in RENAL_RULES {
            for gfr in [0.0, 5.0, 14.9, 25.0, 42.0, 59.9, 60.0, 120.0] {
                assert!(select(r.tiers, gfr).is_some(), "{} has a gap at {}", r.drug.label(), gfr);
            }
        }
    }
}
