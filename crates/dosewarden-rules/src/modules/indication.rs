//! Indication-specific dose and interval checks.
//!
//! The indication text selects one table entry (exact key, else the longest
//! key it mentions). Within that entry, the first row whose age scope admits
//! the patient and whose route scope admits the order decides the expected
//! dose and interval.

use std::sync::Arc;

use tracing::debug;

use dosewarden_contracts::{
    error::DoseResult,
    flag::{DoseFlag, FlagType, Severity},
    medication::format_amount,
    patient::{AgeGroup, PatientContext},
};
use dosewarden_core::{DrugResolver, ModuleKind, RuleModule};

use crate::{
    config::RuleThresholds,
    matching::best_match,
    modules::{resolve_all, Resolved},
    tables::{
        indication::{IndicationEntry, IndicationRule, INDICATION_TABLE},
        Deviation, DoseRule, IntervalRange,
    },
};

/// Above this multiple of the range's upper bound an overdose is HIGH even
/// for non-serious indications.
const GROSS_OVERDOSE_FACTOR: f64 = 1.5;

pub struct IndicationModule {
    resolver: Arc<dyn DrugResolver>,
    tolerance: f64,
    interval_slack_hours: f64,
}

impl IndicationModule {
    pub fn new(resolver: Arc<dyn DrugResolver>, thresholds: &RuleThresholds) -> Self {
        Self {
            resolver,
            tolerance: thresholds.indication_tolerance,
            interval_slack_hours: thresholds.interval_slack_hours,
        }
    }

    fn check(
        &self,
        entry: &IndicationEntry,
        resolved: &Resolved<'_>,
        age_group: Option<AgeGroup>,
        weight_kg: Option<f64>,
        indication: &str,
        flags: &mut Vec<DoseFlag>,
    ) {
        let Some(dosing) = entry.dosing_for(&resolved.drug.name) else {
            return;
        };
        let drug = resolved.drug.name.as_str();
        let order = resolved.order;

        for scoped in dosing.rules.iter().filter(|s| s.age.admits(age_group)) {
            match scoped.rule {
                IndicationRule::NotRecommended { severity, reason } => {
                    flags.push(
                        DoseFlag::new(
                            FlagType::Contraindicated,
                            severity,
                            drug,
                            format!("{} is not recommended for {}: {}", drug, indication, reason),
                        )
                        .expected("an agent active at the site of infection")
                        .actual(order.describe())
                        .source(entry.source)
                        .indication(Some(indication)),
                    );
                    return;
                }
                IndicationRule::Dose { routes, dose, interval } => {
                    if !routes.admits(&order.route) {
                        continue;
                    }
                    self.check_dose(entry, resolved, &dose, weight_kg, indication, flags);
                    self.check_interval(entry, resolved, &interval, indication, flags);
                    return;
                }
            }
        }
    }

    fn check_dose(
        &self,
        entry: &IndicationEntry,
        resolved: &Resolved<'_>,
        dose: &DoseRule,
        weight_kg: Option<f64>,
        indication: &str,
        flags: &mut Vec<DoseFlag>,
    ) {
        let order = resolved.order;
        let Some(expected) = dose.expected(weight_kg) else {
            return;
        };
        let Some(actual_mg) = expected.actual_for(order.dose_mg(), order.daily_dose_mg) else {
            return;
        };

        let (kind, severity, word) = match expected.compare(actual_mg, self.tolerance) {
            Deviation::Within => return,
            Deviation::Below => {
                let severity = if entry.serious { Severity::High } else { Severity::Moderate };
                (FlagType::SubtherapeuticDose, severity, "below")
            }
            Deviation::Above => {
                let severity = if entry.serious || actual_mg > expected.high_mg * GROSS_OVERDOSE_FACTOR {
                    Severity::High
                } else {
                    Severity::Moderate
                };
                (FlagType::SupratherapeuticDose, severity, "above")
            }
        };

        debug!(
            drug = %resolved.drug.name,
            indication,
            actual_mg,
            low_mg = expected.low_mg,
            high_mg = expected.high_mg,
            "indication dose {}", word
        );
        flags.push(
            DoseFlag::new(
                kind,
                severity,
                resolved.drug.name.clone(),
                format!("{} dose is {} the recommended range for {}", resolved.drug.name, word, indication),
            )
            .expected(expected.label.clone())
            .actual(format!("{} ({} mg)", order.describe(), format_amount(actual_mg)))
            .source(entry.source)
            .indication(Some(indication))
            .attr("serious_indication", entry.serious),
        );
    }

    fn check_interval(
        &self,
        entry: &IndicationEntry,
        resolved: &Resolved<'_>,
        interval: &IntervalRange,
        indication: &str,
        flags: &mut Vec<DoseFlag>,
    ) {
        let Some(hours) = resolved.order.frequency_hours else {
            return;
        };
        if interval.contains(hours, self.interval_slack_hours) {
            return;
        }
        let severity = if entry.serious { Severity::Moderate } else { Severity::Low };
        flags.push(
            DoseFlag::new(
                FlagType::WrongInterval,
                severity,
                resolved.drug.name.clone(),
                format!(
                    "{} every {} h is outside the recommended interval for {}",
                    resolved.drug.name,
                    format_amount(hours),
                    indication
                ),
            )
            .expected(interval.describe())
            .actual(resolved.order.describe())
            .source(entry.source)
            .indication(Some(indication)),
        );
    }
}

impl RuleModule for IndicationModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Indication
    }

    fn evaluate(&self, ctx: &PatientContext) -> DoseResult<Vec<DoseFlag>> {
        let Some(indication) = ctx.indication_text() else {
            return Ok(Vec::new());
        };
        let Some(entry) = best_match(indication, INDICATION_TABLE, |e| e.keys) else {
            debug!(indication, "no indication dosing entry");
            return Ok(Vec::new());
        };

        let age_group = ctx.age_group();
        let weight_kg = ctx.demographics.weight_kg;
        let mut flags = Vec::new();
        for resolved in resolve_all(self.resolver.as_ref(), &ctx.antimicrobials) {
            self.check(entry, &resolved, age_group, weight_kg, indication, &mut flags);
        }
        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use dosewarden_contracts::medication::{DoseUnit, Route};

    use super::*;
    use crate::modules::testing::{iv_mg, now, order, resolver};

    fn run(ctx: &PatientContext) -> Vec<DoseFlag> {
        IndicationModule::new(resolver(), &RuleThresholds::default())
            .evaluate(ctx)
            .unwrap()
    }

    fn adult(indication: &str) -> dosewarden_contracts::patient::PatientContextBuilder {
        PatientContext::builder("p1")
            .age_years(55.0)
            .weight_kg(75.0)
            .indication(indication)
            .captured_at(now())
    }

    #[test]
    fn test_meningitis_underdose_is_high() {
        let ctx = adult("bacterial meningitis")
            .antimicrobial(iv_mg("ceftriaxone", 1000.0, "q12h"))
            .build();
        let flags = run(&ctx);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].flag_type, FlagType::SubtherapeuticDose);
        assert_eq!(flags[0].severity, Severity::High);
    }

    #[test]
    fn test_cystitis_overdose_is_moderate() {
        let ctx = adult("uncomplicated cystitis")
            .antimicrobial(order("Macrobid", 150.0, DoseUnit::Mg, "q12h", Route::Oral))
            .build();
        let flags = run(&ctx);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].flag_type, FlagType::SupratherapeuticDose);
        assert_eq!(flags[0].severity, Severity::Moderate);
    }

    #[test]
    fn test_wrong_interval_for_sepsis() {
        let ctx = adult("septic shock")
            .antimicrobial(iv_mg("piperacillin-tazobactam", 4500.0, "q12h"))
            .build();
        let flags = run(&ctx);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].flag_type, FlagType::WrongInterval);
        assert_eq!(flags[0].severity, Severity::Moderate);
        assert_eq!(flags[0].expected.as_deref(), Some("q6-8h"));
    }

    #[test]
    fn test_correct_sepsis_dose_is_silent() {
        let ctx = adult("severe sepsis")
            .antimicrobial(order("zosyn", 4.5, DoseUnit::G, "q6h", Route::Intravenous))
            .build();
        assert!(run(&ctx).is_empty());
    }

    #[test]
    fn test_daptomycin_for_pneumonia_is_not_recommended() {
        let ctx = adult("community acquired pneumonia")
            .antimicrobial(iv_mg("daptomycin", 500.0, "q24h"))
            .build();
        let flags = run(&ctx);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].flag_type, FlagType::Contraindicated);
        assert_eq!(flags[0].severity, Severity::High);
    }

    #[test]
    fn test_dose_rows_are_route_scoped() {
        let ctx = adult("c_difficile")
            .antimicrobial(iv_mg("vancomycin", 1000.0, "q12h"))
            .build();
        assert!(run(&ctx).is_empty());
    }

    #[test]
    fn test_pediatric_row_uses_weight() {
        // 20 kg child: 90-112.5 mg/kg/dose, so 1800-2250 mg.
        let ctx = PatientContext::builder("kid")
            .age_years(6.0)
            .weight_kg(20.0)
            .indication("sepsis")
            .antimicrobial(iv_mg("piperacillin-tazobactam", 1000.0, "q8h"))
            .captured_at(now())
            .build();
        let flags = run(&ctx);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].flag_type, FlagType::SubtherapeuticDose);
    }
}
