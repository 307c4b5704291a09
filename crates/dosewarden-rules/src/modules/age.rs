//! Age-based contraindications and neonatal dosing intervals.

use std::sync::Arc;

use tracing::debug;

use dosewarden_contracts::{
    error::DoseResult,
    flag::{DoseFlag, FlagType, Severity},
    medication::format_amount,
    patient::PatientContext,
};
use dosewarden_core::{DrugResolver, ModuleKind, RuleModule};

use crate::{
    config::RuleThresholds,
    modules::{describe_age, resolve_all, Resolved},
    tables::age::{AGE_CONTRAINDICATIONS, NEONATAL_INTERVALS, NEONATAL_PMA_LIMIT_WEEKS},
    tier::select,
};

pub struct AgeModule {
    resolver: Arc<dyn DrugResolver>,
    interval_slack_hours: f64,
}

impl AgeModule {
    pub fn new(resolver: Arc<dyn DrugResolver>, thresholds: &RuleThresholds) -> Self {
        Self {
            resolver,
            interval_slack_hours: thresholds.interval_slack_hours,
        }
    }

    fn contraindications(&self, resolved: &Resolved<'_>, age_years: f64, pna_days: f64, flags: &mut Vec<DoseFlag>) {
        for rule in AGE_CONTRAINDICATIONS {
            if !rule.drug.matches(&resolved.drug) || pna_days >= rule.below.in_days() {
                continue;
            }
            flags.push(
                DoseFlag::new(
                    FlagType::Contraindicated,
                    rule.severity,
                    resolved.drug.name.clone(),
                    format!(
                        "{} is contraindicated under {}: {}",
                        resolved.drug.name,
                        rule.below.describe(),
                        rule.reason
                    ),
                )
                .expected(format!("age of at least {}", rule.below.describe()))
                .actual(describe_age(age_years))
                .source(rule.source)
                .attr("age_limit_days", rule.below.in_days()),
            );
        }
    }

    fn neonatal_interval(&self, resolved: &Resolved<'_>, pma_weeks: f64, pna_days: f64) -> Option<DoseFlag> {
        let rule = NEONATAL_INTERVALS.iter().find(|r| r.drug.matches(&resolved.drug))?;
        let pma_tier = select(rule.tiers, pma_weeks)?;
        let pna_tier = select(pma_tier.value, pna_days)?;
        let expected_h = pna_tier.value;
        let actual_h = resolved.order.frequency_hours?;

        if (actual_h - expected_h).abs() <= self.interval_slack_hours {
            return None;
        }

        let (severity, direction) = if actual_h < expected_h {
            (rule.severity, "shorter")
        } else {
            (Severity::Moderate, "longer")
        };
        debug!(
            drug = %resolved.drug.name,
            pma_weeks,
            pna_days,
            expected_h,
            actual_h,
            "neonatal interval mismatch"
        );

        Some(
            DoseFlag::new(
                FlagType::AgeDoseMismatch,
                severity,
                resolved.drug.name.clone(),
                format!(
                    "{} interval is {} than recommended for PMA {} weeks, PNA {} days",
                    resolved.drug.name,
                    direction,
                    format_amount(pma_weeks),
                    format_amount(pna_days.round())
                ),
            )
            .expected(format!("q{}h", format_amount(expected_h)))
            .actual(resolved.order.describe())
            .source(rule.source)
            .attr("pma_tier_weeks", pma_tier.describe())
            .attr("pna_tier_days", pna_tier.describe()),
        )
    }
}

impl RuleModule for AgeModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Age
    }

    fn evaluate(&self, ctx: &PatientContext) -> DoseResult<Vec<DoseFlag>> {
        let demographics = &ctx.demographics;
        let (Some(age_years), Some(pna_days)) = (demographics.age_years, demographics.postnatal_age_days()) else {
            return Ok(Vec::new());
        };
        let pma_weeks = demographics
            .postmenstrual_age_weeks()
            .filter(|pma| *pma < NEONATAL_PMA_LIMIT_WEEKS);

        let indication = ctx.indication_text();
        let mut flags = Vec::new();
        for resolved in resolve_all(self.resolver.as_ref(), &ctx.antimicrobials) {
            let start = flags.len();
            self.contraindications(&resolved, age_years, pna_days, &mut flags);
            if let Some(pma) = pma_weeks {
                flags.extend(self.neonatal_interval(&resolved, pma, pna_days));
            }
            for flag in &mut flags[start..] {
                flag.indication = indication.map(str::to_string);
            }
        }
        Ok(flags)
    }
}
