//! Weight-based and fixed dosing, hard maximums, dosing weight in obesity.

use dosewarden_contracts::flag::Severity;

use crate::tables::{DoseRule, RouteScope};

/// Which body weight a drug is dosed on in obese patients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DosingWeight {
    Actual,
    Ideal,
    Adjusted,
}

impl DosingWeight {
    pub fn label(&self) -> &'static str {
        match self {
            DosingWeight::Actual => "total body weight",
            DosingWeight::Ideal => "ideal body weight",
            DosingWeight::Adjusted => "adjusted body weight",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WeightRule {
    pub drug: &'static str,
    pub routes: RouteScope,
    pub pediatric: Option<DoseRule>,
    pub adult: Option<DoseRule>,
    pub max_single_mg: Option<f64>,
    pub max_daily_mg: Option<f64>,
    pub obesity: DosingWeight,
    /// Severity of a dose outside the expected range.
    pub severity: Severity,
    pub source: &'static str,
}

const LEXI: &str = "Lexicomp drug monographs";
const REDBOOK: &str = "AAP Red Book 2024; Lexicomp Pediatric Dosage Handbook";

pub static WEIGHT_RULES: &[WeightRule] = &[
    WeightRule {
        drug: "vancomycin",
        routes: RouteScope::Parenteral,
        pediatric: Some(DoseRule::per_dose(10.0, 20.0, None)),
        adult: Some(DoseRule::per_dose(15.0, 20.0, None)),
        max_single_mg: Some(3000.0),
        max_daily_mg: None,
        obesity: DosingWeight::Actual,
        severity: Severity::Moderate,
        source: "ASHP/IDSA/PIDS/SIDP Vancomycin Consensus Guideline 2020",
    },
    WeightRule {
        drug: "gentamicin",
        routes: RouteScope::Parenteral,
        pediatric: Some(DoseRule::per_dose(2.5, 7.5, None)),
        adult: Some(DoseRule::per_dose(1.0, 7.0, None)),
        max_single_mg: None,
        max_daily_mg: None,
        obesity: DosingWeight::Adjusted,
        severity: Severity::High,
        source: "Hartford extended-interval aminoglycoside nomogram",
    },
    WeightRule {
        drug: "tobramycin",
        routes: RouteScope::Parenteral,
        pediatric: Some(DoseRule::per_dose(2.5, 7.5, None)),
        adult: Some(DoseRule::per_dose(1.0, 7.0, None)),
        max_single_mg: None,
        max_daily_mg: None,
        obesity: DosingWeight::Adjusted,
        severity: Severity::High,
        source: "Hartford extended-interval aminoglycoside nomogram",
    },
    WeightRule {
        drug: "amikacin",
        routes: RouteScope::Parenteral,
        pediatric: Some(DoseRule::per_dose(15.0, 22.5, None)),
        adult: Some(DoseRule::per_dose(7.5, 20.0, None)),
        max_single_mg: None,
        max_daily_mg: None,
        obesity: DosingWeight::Adjusted,
        severity: Severity::High,
        source: LEXI,
    },
    WeightRule {
        drug: "daptomycin",
        routes: RouteScope::Parenteral,
        pediatric: Some(DoseRule::per_dose(4.0, 12.0, None)),
        adult: Some(DoseRule::per_dose(4.0, 12.0, None)),
        max_single_mg: None,
        max_daily_mg: None,
        obesity: DosingWeight::Actual,
        severity: Severity::Moderate,
        source: "Cubicin prescribing information",
    },
    WeightRule {
        drug: "acyclovir",
        routes: RouteScope::Parenteral,
        pediatric: Some(DoseRule::per_dose(10.0, 20.0, None)),
        adult: Some(DoseRule::per_dose(5.0, 15.0, None)),
        max_single_mg: None,
        max_daily_mg: None,
        obesity: DosingWeight::Ideal,
        severity: Severity::Moderate,
        source: LEXI,
    },
    WeightRule {
        drug: "piperacillin-tazobactam",
        routes: RouteScope::Parenteral,
        pediatric: Some(DoseRule::per_dose(90.0, 112.5, Some(4500.0))),
        adult: Some(DoseRule::fixed(3375.0, 4500.0)),
        max_single_mg: Some(4500.0),
        max_daily_mg: Some(18000.0),
        obesity: DosingWeight::Actual,
        severity: Severity::Moderate,
        source: "Zosyn prescribing information",
    },
    WeightRule {
        drug: "cefazolin",
        routes: RouteScope::Parenteral,
        pediatric: Some(DoseRule::per_dose(25.0, 50.0, Some(2000.0))),
        adult: Some(DoseRule::fixed(1000.0, 2000.0)),
        max_single_mg: Some(3000.0),
        max_daily_mg: Some(12000.0),
        obesity: DosingWeight::Actual,
        severity: Severity::Moderate,
        source: LEXI,
    },
    WeightRule {
        drug: "ceftriaxone",
        routes: RouteScope::Parenteral,
        pediatric: Some(DoseRule::per_day(50.0, 100.0, Some(4000.0))),
        adult: Some(DoseRule::fixed(1000.0, 2000.0)),
        max_single_mg: Some(2000.0),
        max_daily_mg: Some(4000.0),
        obesity: DosingWeight::Actual,
        severity: Severity::Moderate,
        source: REDBOOK,
    },
    WeightRule {
        drug: "cefepime",
        routes: RouteScope::Parenteral,
        pediatric: Some(DoseRule::per_dose(50.0, 50.0, Some(2000.0))),
        adult: Some(DoseRule::fixed(1000.0, 2000.0)),
        max_single_mg: Some(2000.0),
        max_daily_mg: Some(6000.0),
        obesity: DosingWeight::Actual,
        severity: Severity::Moderate,
        source: LEXI,
    },
    WeightRule {
        drug: "meropenem",
        routes: RouteScope::Parenteral,
        pediatric: Some(DoseRule::per_dose(20.0, 40.0, Some(2000.0))),
        adult: Some(DoseRule::fixed(500.0, 2000.0)),
        max_single_mg: Some(2000.0),
        max_daily_mg: Some(6000.0),
        obesity: DosingWeight::Actual,
        severity: Severity::Moderate,
        source: LEXI,
    },
    WeightRule {
        drug: "ampicillin",
        routes: RouteScope::Parenteral,
        pediatric: Some(DoseRule::per_dose(25.0, 100.0, Some(3000.0))),
        adult: Some(DoseRule::fixed(1000.0, 2000.0)),
        max_single_mg: Some(3000.0),
        max_daily_mg: Some(14000.0),
        obesity: DosingWeight::Actual,
        severity: Severity::Moderate,
        source: REDBOOK,
    },
    WeightRule {
        drug: "amoxicillin",
        routes: RouteScope::Enteral,
        pediatric: Some(DoseRule::per_day(25.0, 90.0, Some(4000.0))),
        adult: Some(DoseRule::fixed(500.0, 2000.0)),
        max_single_mg: Some(2000.0),
        max_daily_mg: Some(4000.0),
        obesity: DosingWeight::Actual,
        severity: Severity::Low,
        source: REDBOOK,
    },
    WeightRule {
        drug: "clindamycin",
        routes: RouteScope::Any,
        pediatric: Some(DoseRule::per_day(20.0, 40.0, Some(2700.0))),
        adult: Some(DoseRule::fixed(300.0, 900.0)),
        max_single_mg: Some(900.0),
        max_daily_mg: Some(4800.0),
        obesity: DosingWeight::Actual,
        severity: Severity::Moderate,
        source: LEXI,
    },
    WeightRule {
        drug: "linezolid",
        routes: RouteScope::Any,
        pediatric: Some(DoseRule::per_dose(10.0, 10.0, Some(600.0))),
        adult: Some(DoseRule::fixed(600.0, 600.0)),
        max_single_mg: Some(600.0),
        max_daily_mg: Some(1200.0),
        obesity: DosingWeight::Actual,
        severity: Severity::Moderate,
        source: "Zyvox prescribing information",
    },
    WeightRule {
        drug: "levofloxacin",
        routes: RouteScope::Any,
        pediatric: Some(DoseRule::per_dose(8.0, 10.0, Some(750.0))),
        adult: Some(DoseRule::fixed(250.0, 750.0)),
        max_single_mg: Some(750.0),
        max_daily_mg: Some(750.0),
        obesity: DosingWeight::Actual,
        severity: Severity::Moderate,
        source: "Levaquin prescribing information",
    },
    WeightRule {
        drug: "ciprofloxacin",
        routes: RouteScope::Any,
        pediatric: Some(DoseRule::per_dose(10.0, 20.0, Some(750.0))),
        adult: Some(DoseRule::fixed(250.0, 750.0)),
        max_single_mg: Some(750.0),
        max_daily_mg: Some(1500.0),
        obesity: DosingWeight::Actual,
        severity: Severity::Moderate,
        source: LEXI,
    },
    WeightRule {
        drug: "azithromycin",
        routes: RouteScope::Any,
        pediatric: Some(DoseRule::per_dose(5.0, 10.0, Some(500.0))),
        adult: Some(DoseRule::fixed(250.0, 500.0)),
        max_single_mg: Some(2000.0),
        max_daily_mg: Some(2000.0),
        obesity: DosingWeight::Actual,
        severity: Severity::Low,
        source: LEXI,
    },
    WeightRule {
        drug: "metronidazole",
        routes: RouteScope::Any,
        pediatric: Some(DoseRule::per_day(22.5, 40.0, Some(2000.0))),
        adult: Some(DoseRule::fixed(250.0, 500.0)),
        max_single_mg: Some(1000.0),
        max_daily_mg: Some(4000.0),
        obesity: DosingWeight::Actual,
        severity: Severity::Low,
        source: LEXI,
    },
    WeightRule {
        drug: "doxycycline",
        routes: RouteScope::Any,
        pediatric: Some(DoseRule::per_dose(2.2, 2.2, Some(100.0))),
        adult: Some(DoseRule::fixed(100.0, 200.0)),
        max_single_mg: Some(200.0),
        max_daily_mg: Some(200.0),
        obesity: DosingWeight::Actual,
        severity: Severity::Low,
        source: LEXI,
    },
];

/// The rule for a canonical drug name, if one exists.
pub fn weight_rule(drug: &str) -> Option<&'static WeightRule> {
    WEIGHT_RULES.iter().find(|r| r.drug == drug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pip_tazo_adult_range_accepts_full_dose() {
        let rule = weight_rule("piperacillin-tazobactam").unwrap();
        let exp = rule.adult.unwrap().expected(Some(80.0)).unwrap();
        assert_eq!(exp.low_mg, 3375.0);
        assert_eq!(exp.high_mg, 4500.0);
    }

    #[test]
    fn test_aminoglycosides_use_adjusted_weight() {
        assert_eq!(weight_rule("gentamicin").unwrap().obesity, DosingWeight::Adjusted);
        assert!(weight_rule("unknownmycin").is_none());
    }
}
