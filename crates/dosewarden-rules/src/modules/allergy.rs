//! Allergy contraindication and cross-reactivity.
//!
//! A direct hit (the allergy names the drug, or the drug's own class) is an
//! ALLERGY_CONTRAINDICATED flag. Without a direct hit, the allergen's classes
//! are checked against the drug's classes in the cross-reactivity matrix.

use std::sync::Arc;

use tracing::debug;

use dosewarden_contracts::{
    drug::DrugClass,
    error::DoseResult,
    flag::{DoseFlag, FlagType, Severity},
    patient::{AllergyRecord, PatientContext},
};
use dosewarden_core::{DrugResolver, ModuleKind, RuleModule};

use crate::{
    matching::{contains_phrase, normalize},
    modules::{resolve_all, Resolved},
    tables::allergy::{cross_risk, CrossRisk, ALLERGY_CLASSES, SOURCE},
};

pub struct AllergyModule {
    resolver: Arc<dyn DrugResolver>,
}

/// The worst cross-reactivity found for one drug.
struct CrossHit<'a> {
    severity: Severity,
    allergy: &'a AllergyRecord,
    allergen_class: DrugClass,
    drug_class: DrugClass,
    risk: CrossRisk,
}

impl AllergyModule {
    pub fn new(resolver: Arc<dyn DrugResolver>) -> Self {
        Self { resolver }
    }

    fn is_direct(&self, allergy: &AllergyRecord, resolved: &Resolved<'_>) -> bool {
        let substance = normalize(&allergy.substance);
        if substance.is_empty() {
            return false;
        }

        let names = [normalize(&resolved.drug.name), normalize(&resolved.order.drug_name)];
        if names
            .iter()
            .any(|n| !n.is_empty() && (contains_phrase(n, &substance) || contains_phrase(&substance, n)))
        {
            return true;
        }

        if let Some(class) = self.resolver.resolve_class(&allergy.substance) {
            if resolved.drug.is(class) {
                return true;
            }
        }

        let allergen = self.resolver.resolve(&allergy.substance);
        allergen.known && allergen.name == resolved.drug.name
    }

    /// Allergy-relevant classes the recorded substance belongs to.
    fn allergen_classes(&self, allergy: &AllergyRecord) -> Vec<DrugClass> {
        let classes = match self.resolver.resolve_class(&allergy.substance) {
            Some(class) => vec![class],
            None => self.resolver.resolve(&allergy.substance).classes,
        };
        classes
            .into_iter()
            .filter(|c| ALLERGY_CLASSES.contains(c))
            .collect()
    }

    fn worst_cross_hit<'a>(&self, allergies: &'a [AllergyRecord], resolved: &Resolved<'_>) -> Option<CrossHit<'a>> {
        let drug_classes: Vec<DrugClass> = resolved
            .drug
            .classes
            .iter()
            .copied()
            .filter(|c| ALLERGY_CLASSES.contains(c))
            .collect();

        let mut worst: Option<CrossHit<'a>> = None;
        for allergy in allergies {
            let severe = allergy.is_severe();
            for allergen_class in self.allergen_classes(allergy) {
                for &drug_class in &drug_classes {
                    let Some(risk) = cross_risk(allergen_class, drug_class) else {
                        continue;
                    };
                    let Some(severity) = risk.severity(severe) else {
                        continue;
                    };
                    if worst.as_ref().map_or(true, |w| severity > w.severity) {
                        worst = Some(CrossHit {
                            severity,
                            allergy,
                            allergen_class,
                            drug_class,
                            risk,
                        });
                    }
                }
            }
        }
        worst
    }
}

impl RuleModule for AllergyModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Allergy
    }

    fn evaluate(&self, ctx: &PatientContext) -> DoseResult<Vec<DoseFlag>> {
        if ctx.allergies.is_empty() {
            return Ok(Vec::new());
        }

        let indication = ctx.indication_text();
        let mut flags = Vec::new();

        for resolved in resolve_all(self.resolver.as_ref(), &ctx.antimicrobials) {
            let direct = ctx
                .allergies
                .iter()
                .filter(|a| self.is_direct(a, &resolved))
                .max_by_key(|a| a.is_severe());

            if let Some(allergy) = direct {
                let severity = if allergy.is_severe() {
                    Severity::Critical
                } else {
                    Severity::High
                };
                debug!(drug = %resolved.drug.name, allergy = %allergy.substance, "direct allergy match");
                flags.push(
                    DoseFlag::new(
                        FlagType::AllergyContraindicated,
                        severity,
                        resolved.drug.name.clone(),
                        format!(
                            "{} ordered for a patient with a documented {} allergy",
                            resolved.drug.name, allergy.substance
                        ),
                    )
                    .expected("avoid the allergen; choose an agent from another class")
                    .actual(format!(
                        "{} allergy ({})",
                        allergy.substance,
                        allergy.reaction.as_deref().unwrap_or("reaction not recorded")
                    ))
                    .source(SOURCE)
                    .indication(indication)
                    .attr("allergy", allergy.substance.clone())
                    .attr("severe_reaction", allergy.is_severe()),
                );
                continue;
            }

            if let Some(hit) = self.worst_cross_hit(&ctx.allergies, &resolved) {
                debug!(
                    drug = %resolved.drug.name,
                    allergen_class = %hit.allergen_class,
                    risk = hit.risk.label(),
                    "allergy cross-reactivity"
                );
                flags.push(
                    DoseFlag::new(
                        FlagType::AllergyCrossReactivity,
                        hit.severity,
                        resolved.drug.name.clone(),
                        format!(
                            "{} allergy: {} cross-reactivity risk with {} ({})",
                            hit.allergy.substance,
                            hit.risk.label(),
                            resolved.drug.name,
                            hit.drug_class
                        ),
                    )
                    .expected(format!(
                        "review {} allergy history before giving a {}",
                        hit.allergen_class, hit.drug_class
                    ))
                    .actual(format!(
                        "{} allergy ({})",
                        hit.allergy.substance,
                        hit.allergy.reaction.as_deref().unwrap_or("reaction not recorded")
                    ))
                    .source(SOURCE)
                    .indication(indication)
                    .attr("allergy", hit.allergy.substance.clone())
                    .attr("cross_risk", hit.risk.label())
                    .attr("severe_reaction", hit.allergy.is_severe()),
                );
            }
        }

        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use dosewarden_contracts::{
        medication::{DoseUnit, Route},
        patient::AllergySeverity,
    };

    use super::*;
    use crate::modules::testing::{iv_mg, now, order, resolver};

    fn run(ctx: &PatientContext) -> Vec<DoseFlag> {
        AllergyModule::new(resolver()).evaluate(ctx).unwrap()
    }

    // ── Direct matches ───────────────────────────────────────────────────────

    #[test]
    fn test_class_allergy_contraindicates_member() {
        let ctx = PatientContext::builder("p1")
            .allergy(AllergyRecord::new("Penicillin", AllergySeverity::Mild, Some("rash")))
            .antimicrobial(order("amoxicillin", 500.0, DoseUnit::Mg, "q8h", Route::Oral))
            .captured_at(now())
            .build();
        let flags = run(&ctx);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].flag_type, FlagType::AllergyContraindicated);
        assert_eq!(flags[0].severity, Severity::High);
    }

    #[test]
    fn test_anaphylaxis_to_the_drug_itself_is_critical() {
        let ctx = PatientContext::builder("p1")
            .allergy(AllergyRecord::new("vancomycin", AllergySeverity::Unknown, Some("Anaphylaxis")))
            .antimicrobial(iv_mg("Vancomycin", 1500.0, "q12h"))
            .captured_at(now())
            .build();
        let flags = run(&ctx);
        assert_eq!(flags[0].flag_type, FlagType::AllergyContraindicated);
        assert_eq!(flags[0].severity, Severity::Critical);
    }

    // ── Cross-reactivity ─────────────────────────────────────────────────────

    #[test]
    fn test_penicillin_anaphylaxis_escalates_cephalosporin_risk() {
        let ctx = PatientContext::builder("p1")
            .allergy(AllergyRecord::new("penicillin", AllergySeverity::Severe, Some("anaphylaxis")))
            .antimicrobial(iv_mg("ceftriaxone", 2000.0, "q24h"))
            .captured_at(now())
            .build();
        let flags = run(&ctx);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].flag_type, FlagType::AllergyCrossReactivity);
        assert_eq!(flags[0].severity, Severity::Critical);
    }

    #[test]
    fn test_mild_penicillin_allergy_and_carbapenem_is_low() {
        let ctx = PatientContext::builder("p1")
            .allergy(AllergyRecord::new("PCN", AllergySeverity::Mild, Some("itching")))
            .antimicrobial(iv_mg("meropenem", 1000.0, "q8h"))
            .captured_at(now())
            .build();
        let flags = run(&ctx);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].severity, Severity::Low);
    }

    #[test]
    fn test_minimal_risk_is_not_flagged_unless_severe() {
        let mild = PatientContext::builder("p1")
            .allergy(AllergyRecord::new("penicillin", AllergySeverity::Mild, None))
            .antimicrobial(iv_mg("aztreonam", 2000.0, "q8h"))
            .captured_at(now())
            .build();
        assert!(run(&mild).is_empty());
    }

    #[test]
    fn test_partial_word_is_not_a_direct_match() {
        let ctx = PatientContext::builder("p1")
            .allergy(AllergyRecord::new("gentian violet", AllergySeverity::Severe, Some("hives")))
            .antimicrobial(iv_mg("gent", 400.0, "q24h"))
            .captured_at(now())
            .build();
        assert!(run(&ctx).is_empty());
    }

    #[test]
    fn test_allergy_naming_the_full_order_text_matches() {
        let ctx = PatientContext::builder("p1")
            .allergy(AllergyRecord::new("penicillin", AllergySeverity::Mild, None))
            .antimicrobial(iv_mg("penicillin G potassium", 2000.0, "q4h"))
            .captured_at(now())
            .build();
        let flags = run(&ctx);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].flag_type, FlagType::AllergyContraindicated);
    }

    #[test]
    fn test_unrelated_allergy_is_silent() {
        let ctx = PatientContext::builder("p1")
            .allergy(AllergyRecord::new("latex", AllergySeverity::Severe, Some("anaphylaxis")))
            .antimicrobial(iv_mg("levofloxacin", 750.0, "q24h"))
            .captured_at(now())
            .build();
        assert!(run(&ctx).is_empty());
    }
}
