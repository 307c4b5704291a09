//! Weight-based dosing and hard maximums.
//!
//! The expected range comes from the drug's pediatric or adult row (missing
//! age counts as adult). For obese patients on drugs dosed by ideal or
//! adjusted body weight the range is computed on that weight instead of the
//! total body weight, and the order is always flagged for review: either the
//! out-of-range flag carries the obesity detail, or a MODERATE review flag is
//! raised on its own. Maximum single and daily doses are checked on their own
//! and do not depend on the range check.

use std::sync::Arc;

use tracing::debug;

use dosewarden_contracts::{
    error::DoseResult,
    flag::{DoseFlag, FlagType, Severity},
    medication::format_amount,
    patient::{Demographics, PatientContext},
};
use dosewarden_core::{DrugResolver, ModuleKind, RuleModule};

use crate::{
    config::RuleThresholds,
    modules::{resolve_all, Resolved},
    tables::{
        weight::{weight_rule, DosingWeight, WeightRule},
        Deviation,
    },
};

pub struct WeightModule {
    resolver: Arc<dyn DrugResolver>,
    thresholds: RuleThresholds,
}

/// The weight a dose range is computed on.
struct DoseWeight {
    kg: f64,
    kind: DosingWeight,
}

/// Body-size figures for an obese patient on a drug not dosed on total weight.
struct Obesity {
    bmi: f64,
    ibw_kg: Option<f64>,
    adjbw_kg: Option<f64>,
}

impl Obesity {
    fn annotate(&self, mut flag: DoseFlag) -> DoseFlag {
        flag = flag.attr("obesity_review", true).attr("bmi", round1(self.bmi));
        if let Some(ibw) = self.ibw_kg {
            flag = flag.attr("ibw_kg", round1(ibw));
        }
        if let Some(adjbw) = self.adjbw_kg {
            flag = flag.attr("adjbw_kg", round1(adjbw));
        }
        flag
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

impl WeightModule {
    pub fn new(resolver: Arc<dyn DrugResolver>, thresholds: &RuleThresholds) -> Self {
        Self {
            resolver,
            thresholds: thresholds.clone(),
        }
    }

    /// `Some` when the patient is obese and the drug is dosed on ideal or
    /// adjusted body weight.
    fn obesity(&self, rule: &WeightRule, demographics: &Demographics) -> Option<Obesity> {
        if rule.obesity == DosingWeight::Actual {
            return None;
        }
        let bmi = demographics.bmi().filter(|bmi| *bmi >= self.thresholds.obesity_bmi)?;
        Some(Obesity {
            bmi,
            ibw_kg: demographics.ideal_body_weight().filter(|kg| *kg > 0.0),
            adjbw_kg: demographics
                .adjusted_body_weight(self.thresholds.adjusted_weight_factor)
                .filter(|kg| *kg > 0.0),
        })
    }

    fn dosing_weight(&self, rule: &WeightRule, obesity: Option<&Obesity>, total_kg: f64) -> DoseWeight {
        let alternative = obesity.and_then(|o| match rule.obesity {
            DosingWeight::Actual => None,
            DosingWeight::Ideal => o.ibw_kg,
            DosingWeight::Adjusted => o.adjbw_kg,
        });
        match alternative {
            Some(kg) => DoseWeight { kg, kind: rule.obesity },
            None => DoseWeight {
                kg: total_kg,
                kind: DosingWeight::Actual,
            },
        }
    }

    /// Review flag for an obese patient whose dose is not otherwise flagged.
    fn obesity_review(
        &self,
        rule: &WeightRule,
        resolved: &Resolved<'_>,
        pediatric: bool,
        weight: &DoseWeight,
        obesity: &Obesity,
    ) -> DoseFlag {
        let expected = if pediatric { rule.pediatric } else { rule.adult }
            .and_then(|dose_rule| dose_rule.expected(Some(weight.kg)));
        debug!(
            drug = %resolved.drug.name,
            bmi = obesity.bmi,
            dosing_weight_kg = weight.kg,
            "obese patient on a drug not dosed on total body weight"
        );

        let mut flag = DoseFlag::new(
            FlagType::WeightDoseMismatch,
            Severity::Moderate,
            resolved.drug.name.clone(),
            format!(
                "{} in an obese patient (BMI {}): confirm the dose is based on {}",
                resolved.drug.name,
                format_amount(round1(obesity.bmi)),
                rule.obesity.label()
            ),
        )
        .actual(resolved.order.describe())
        .source(rule.source)
        .attr("dosing_weight", weight.kind.label())
        .attr("dosing_weight_kg", round1(weight.kg));
        if let Some(expected) = expected {
            flag = flag.expected(format!("{} on {}", expected.label, weight.kind.label()));
        }
        obesity.annotate(flag)
    }

    fn check_range(
        &self,
        rule: &WeightRule,
        resolved: &Resolved<'_>,
        pediatric: bool,
        weight: &DoseWeight,
        dose_mg: f64,
    ) -> Option<DoseFlag> {
        let dose_rule = if pediatric { rule.pediatric } else { rule.adult }?;
        let tolerance = if dose_rule.is_weight_based() {
            self.thresholds.weight_based_tolerance
        } else {
            self.thresholds.fixed_dose_tolerance
        };
        let expected = dose_rule.expected(Some(weight.kg))?;
        let actual = expected.actual_for(Some(dose_mg), resolved.order.daily_dose_mg)?;

        let direction = match expected.compare(actual, tolerance) {
            Deviation::Within => return None,
            Deviation::Below => "below",
            Deviation::Above => "above",
        };
        debug!(
            drug = %resolved.drug.name,
            dosing_weight_kg = weight.kg,
            actual,
            low_mg = expected.low_mg,
            high_mg = expected.high_mg,
            "weight-based dose out of range"
        );

        let population = if pediatric { "pediatric" } else { "adult" };
        let mut flag = DoseFlag::new(
            FlagType::WeightDoseMismatch,
            rule.severity,
            resolved.drug.name.clone(),
            format!(
                "{} dose is {} the {} range for {}",
                resolved.drug.name,
                direction,
                population,
                weight.kind.label()
            ),
        )
        .expected(expected.label)
        .actual(format!("{} ({} mg)", resolved.order.describe(), format_amount(actual)))
        .source(rule.source)
        .attr("dosing_weight", weight.kind.label())
        .attr("dosing_weight_kg", round1(weight.kg));
        if weight.kind != DosingWeight::Actual {
            flag = flag.attr("obesity_review", true);
        }
        Some(flag)
    }

    fn check_maximums(&self, rule: &WeightRule, resolved: &Resolved<'_>, dose_mg: f64, flags: &mut Vec<DoseFlag>) {
        let limits = [
            ("single", rule.max_single_mg, Some(dose_mg)),
            ("daily", rule.max_daily_mg, resolved.order.daily_dose_mg),
        ];
        for (which, max, actual) in limits {
            let (Some(max), Some(actual)) = (max, actual) else {
                continue;
            };
            if actual <= max {
                continue;
            }
            let severity = if actual >= 2.0 * max {
                Severity::Critical
            } else {
                Severity::High
            };
            flags.push(
                DoseFlag::new(
                    FlagType::MaxDoseExceeded,
                    severity,
                    resolved.drug.name.clone(),
                    format!("{} exceeds the maximum {} dose", resolved.drug.name, which),
                )
                .expected(format!("at most {} mg {}", format_amount(max), which))
                .actual(format!("{} mg {}", format_amount(actual), which))
                .source(rule.source),
            );
        }
    }
}

impl RuleModule for WeightModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Weight
    }

    fn evaluate(&self, ctx: &PatientContext) -> DoseResult<Vec<DoseFlag>> {
        let Some(total_kg) = ctx.demographics.weight_kg.filter(|w| *w > 0.0) else {
            return Ok(Vec::new());
        };
        let pediatric = ctx.age_group().map_or(false, |g| g.is_pediatric());
        let indication = ctx.indication_text();

        let mut flags = Vec::new();
        for resolved in resolve_all(self.resolver.as_ref(), &ctx.antimicrobials) {
            let Some(rule) = weight_rule(&resolved.drug.name) else {
                continue;
            };
            if !rule.routes.admits(&resolved.order.route) {
                continue;
            }
            let Some(dose_mg) = resolved.order.dose_mg() else {
                continue;
            };

            let start = flags.len();
            let obesity = self.obesity(rule, &ctx.demographics);
            let weight = self.dosing_weight(rule, obesity.as_ref(), total_kg);
            let range = self.check_range(rule, &resolved, pediatric, &weight, dose_mg);
            match (range, &obesity) {
                (Some(flag), Some(obesity)) => flags.push(obesity.annotate(flag)),
                (Some(flag), None) => flags.push(flag),
                (None, Some(obesity)) => flags.push(self.obesity_review(rule, &resolved, pediatric, &weight, obesity)),
                (None, None) => {}
            }
            self.check_maximums(rule, &resolved, dose_mg, &mut flags);
            for flag in &mut flags[start..] {
                flag.indication = indication.map(str::to_string);
            }
        }
        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use dosewarden_contracts::{
        medication::{DoseUnit, Route},
        patient::Sex,
    };

    use super::*;
    use crate::modules::testing::{iv_mg, now, order, resolver};

    fn run(ctx: &PatientContext) -> Vec<DoseFlag> {
        WeightModule::new(resolver(), &RuleThresholds::default())
            .evaluate(ctx)
            .unwrap()
    }

    // ── Range checks ─────────────────────────────────────────────────────────

    #[test]
    fn test_vancomycin_underdose_for_weight() {
        // 100 kg adult: 1500-2000 mg expected, 20% band below is 1200 mg.
        let ctx = PatientContext::builder("p1")
            .age_years(50.0)
            .weight_kg(100.0)
            .antimicrobial(iv_mg("vancomycin", 1000.0, "q12h"))
            .captured_at(now())
            .build();
        let flags = run(&ctx);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].flag_type, FlagType::WeightDoseMismatch);
        assert!(flags[0].message.contains("below"));
    }

    #[test]
    fn test_fixed_adult_dose_within_band() {
        let ctx = PatientContext::builder("p1")
            .age_years(68.0)
            .weight_kg(80.0)
            .antimicrobial(order("zosyn", 4.5, DoseUnit::G, "q6h", Route::Intravenous))
            .captured_at(now())
            .build();
        assert!(run(&ctx).is_empty());
    }

    #[test]
    fn test_obese_patient_gentamicin_uses_adjusted_weight() {
        // 70 in male, 140 kg: IBW 73, AdjBW 99.8. 7 mg/kg on AdjBW is ~699 mg;
        // 7 mg/kg on total weight (980 mg) is far above the band.
        let ctx = PatientContext::builder("p1")
            .age_years(45.0)
            .weight_kg(140.0)
            .height_cm(177.8)
            .sex(Sex::Male)
            .antimicrobial(iv_mg("gentamicin", 980.0, "q24h"))
            .captured_at(now())
            .build();
        let flags = run(&ctx);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].severity, Severity::High);
        assert_eq!(flags[0].attributes["dosing_weight"], "adjusted body weight");
        assert_eq!(flags[0].attributes["obesity_review"], true);
    }

    #[test]
    fn test_obese_patient_in_range_on_total_weight_gets_review_flag() {
        // 5 mg/kg on 140 kg total weight; 700 mg is inside the band on AdjBW.
        let ctx = PatientContext::builder("p1")
            .age_years(45.0)
            .weight_kg(140.0)
            .height_cm(177.8)
            .sex(Sex::Male)
            .antimicrobial(iv_mg("gentamicin", 700.0, "q24h"))
            .captured_at(now())
            .build();
        let flags = run(&ctx);
        assert_eq!(flags.len(), 1);
        let flag = &flags[0];
        assert_eq!(flag.flag_type, FlagType::WeightDoseMismatch);
        assert_eq!(flag.severity, Severity::Moderate);
        assert_eq!(flag.attributes["obesity_review"], true);
        assert_eq!(flag.attributes["ibw_kg"], 73.0);
        assert_eq!(flag.attributes["adjbw_kg"], 99.8);
        assert_eq!(flag.attributes["bmi"], 44.3);
        assert!(flag.expected.as_deref().unwrap().contains("adjusted body weight"));
    }

    #[test]
    fn test_obese_patient_on_total_weight_drug_is_not_reviewed() {
        let ctx = PatientContext::builder("p1")
            .age_years(45.0)
            .weight_kg(140.0)
            .height_cm(177.8)
            .sex(Sex::Male)
            .antimicrobial(iv_mg("vancomycin", 2500.0, "q12h"))
            .captured_at(now())
            .build();
        assert!(run(&ctx).is_empty());
    }

    #[test]
    fn test_missing_weight_skips_the_module() {
        let ctx = PatientContext::builder("p1")
            .age_years(50.0)
            .antimicrobial(iv_mg("vancomycin", 5000.0, "q12h"))
            .captured_at(now())
            .build();
        assert!(run(&ctx).is_empty());
    }

    // ── Maximums ─────────────────────────────────────────────────────────────

    #[test]
    fn test_double_the_single_maximum_is_critical() {
        let ctx = PatientContext::builder("p1")
            .age_years(40.0)
            .weight_kg(300.0)
            .antimicrobial(iv_mg("vancomycin", 6000.0, "q24h"))
            .captured_at(now())
            .build();
        let flags = run(&ctx);
        let max: Vec<_> = flags
            .iter()
            .filter(|f| f.flag_type == FlagType::MaxDoseExceeded)
            .collect();
        assert_eq!(max.len(), 1);
        assert_eq!(max[0].severity, Severity::Critical);
    }

    #[test]
    fn test_oral_orders_skip_parenteral_rules() {
        let ctx = PatientContext::builder("p1")
            .age_years(40.0)
            .weight_kg(70.0)
            .antimicrobial(order("vancomycin", 125.0, DoseUnit::Mg, "q6h", Route::Oral))
            .captured_at(now())
            .build();
        assert!(run(&ctx).is_empty());
    }
}
