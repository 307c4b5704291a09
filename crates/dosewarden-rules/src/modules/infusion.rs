//! Extended-infusion candidates.
//!
//! Flags intermittent IV orders of time-dependent beta-lactams infused over
//! less than the recommended extended duration. Continuous infusions are
//! exempt. An order with no stated infusion time is assumed to run over the
//! drug's default.

use std::sync::Arc;

use tracing::debug;

use dosewarden_contracts::{
    error::DoseResult,
    flag::{DoseFlag, FlagType, Severity},
    medication::{InfusionDuration, Route},
    patient::PatientContext,
};
use dosewarden_core::{DrugResolver, ModuleKind, RuleModule};

use crate::{
    matching::mentions_any,
    modules::resolve_all,
    tables::infusion::{extended_infusion_rule, HIGH_ACUITY_INDICATIONS},
};

pub struct ExtendedInfusionModule {
    resolver: Arc<dyn DrugResolver>,
}

impl ExtendedInfusionModule {
    pub fn new(resolver: Arc<dyn DrugResolver>) -> Self {
        Self { resolver }
    }
}

impl RuleModule for ExtendedInfusionModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::ExtendedInfusion
    }

    fn evaluate(&self, ctx: &PatientContext) -> DoseResult<Vec<DoseFlag>> {
        let indication = ctx.indication_text();
        let mut flags = Vec::new();

        for resolved in resolve_all(self.resolver.as_ref(), &ctx.antimicrobials) {
            let Some(rule) = extended_infusion_rule(&resolved.drug.name) else {
                continue;
            };
            if resolved.order.route != Route::Intravenous {
                continue;
            }
            let (current, stated) = match resolved.order.infusion {
                Some(InfusionDuration::Continuous) => continue,
                Some(InfusionDuration::Minutes(m)) => (m, true),
                None => (rule.default_minutes, false),
            };
            if current >= rule.recommended_minutes {
                continue;
            }

            let severity = match indication {
                Some(text) if mentions_any(text, HIGH_ACUITY_INDICATIONS) => Severity::High,
                Some(text) if mentions_any(text, rule.target_indications) => Severity::Moderate,
                _ => Severity::Low,
            };
            debug!(
                drug = %resolved.drug.name,
                current_minutes = current,
                recommended_minutes = rule.recommended_minutes,
                severity = %severity,
                "extended infusion candidate"
            );

            flags.push(
                DoseFlag::new(
                    FlagType::ExtendedInfusionCandidate,
                    severity,
                    resolved.drug.name.clone(),
                    format!(
                        "{} infused over {} min; extended infusion over {} min improves target attainment",
                        resolved.drug.name, current, rule.recommended_minutes
                    ),
                )
                .expected(format!("infusion over {} min or continuous", rule.recommended_minutes))
                .actual(if stated {
                    format!("{} over {} min", resolved.order.describe(), current)
                } else {
                    format!("{} (no infusion time; {} min assumed)", resolved.order.describe(), current)
                })
                .source(rule.source)
                .indication(indication)
                .attr("infusion_minutes", current)
                .attr("recommended_minutes", rule.recommended_minutes),
            );
        }
        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use dosewarden_contracts::medication::DoseUnit;

    use super::*;
    use crate::modules::testing::{iv_mg, now, order, resolver};

    fn run(ctx: &PatientContext) -> Vec<DoseFlag> {
        ExtendedInfusionModule::new(resolver()).evaluate(ctx).unwrap()
    }

    fn with_indication(text: Option<&str>, minutes: Option<u32>) -> PatientContext {
        let mut med = order("piperacillin-tazobactam", 4.5, DoseUnit::G, "q6h", Route::Intravenous);
        if let Some(m) = minutes {
            med = med.with_infusion_minutes(m);
        }
        let mut builder = PatientContext::builder("p1").antimicrobial(med).captured_at(now());
        if let Some(text) = text {
            builder = builder.indication(text);
        }
        builder.build()
    }

    #[test]
    fn test_severe_sepsis_is_high() {
        let flags = run(&with_indication(Some("severe sepsis"), Some(30)));
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].severity, Severity::High);
        assert_eq!(flags[0].flag_type, FlagType::ExtendedInfusionCandidate);
    }

    #[test]
    fn test_target_indication_is_moderate() {
        let flags = run(&with_indication(Some("Pseudomonas pneumonia"), Some(30)));
        assert_eq!(flags[0].severity, Severity::Moderate);
    }

    #[test]
    fn test_other_indication_is_low_and_default_time_assumed() {
        let flags = run(&with_indication(Some("cellulitis"), None));
        assert_eq!(flags[0].severity, Severity::Low);
        assert!(flags[0].actual.as_deref().unwrap().contains("assumed"));
    }

    #[test]
    fn test_already_extended_is_silent() {
        assert!(run(&with_indication(Some("septic shock"), Some(240))).is_empty());
    }

    #[test]
    fn test_continuous_infusion_is_exempt() {
        let ctx = PatientContext::builder("p1")
            .indication("septic shock")
            .antimicrobial(iv_mg("meropenem", 6000.0, "q24h").continuous())
            .captured_at(now())
            .build();
        assert!(run(&ctx).is_empty());
    }

    #[test]
    fn test_non_candidate_drugs_are_ignored() {
        let ctx = PatientContext::builder("p1")
            .indication("septic shock")
            .antimicrobial(iv_mg("vancomycin", 1500.0, "q12h"))
            .captured_at(now())
            .build();
        assert!(run(&ctx).is_empty());
    }
}
