//! Renal dose adjustment.
//!
//! Dialysis overrides clearance: a patient on dialysis is checked only
//! against the drug's dialysis rows, and a drug without a row for the
//! modality is skipped. Otherwise the clearance tier decides.
//!
//! An adjusted tier is satisfied when the order's daily exposure is no higher
//! than the tier's, so 500 mg q6h meets a "1000 mg q12h" tier. When either
//! daily dose cannot be computed the interval and single dose are compared
//! directly.

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
    modules::{resolve_all, Resolved},
    tables::renal::{RenalEffect, RenalRule, RENAL_RULES},
    tier::select,
};

pub struct RenalModule {
    resolver: Arc<dyn DrugResolver>,
    dose_tolerance: f64,
    interval_slack_hours: f64,
}

/// Which branch selected the effect, for flag text.
enum Basis {
    Dialysis(&'static str),
    Clearance { label: &'static str, value: f64, tier: String },
}

impl Basis {
    fn describe(&self) -> String {
        match self {
            Basis::Dialysis(modality) => format!("on {}", modality),
            Basis::Clearance { label, value, tier } => {
                format!("{} {} mL/min, tier {}", label, format_amount(*value), tier)
            }
        }
    }
}

impl RenalModule {
    pub fn new(resolver: Arc<dyn DrugResolver>, thresholds: &RuleThresholds) -> Self {
        Self {
            resolver,
            dose_tolerance: thresholds.fixed_dose_tolerance,
            interval_slack_hours: thresholds.interval_slack_hours,
        }
    }

    fn effect_for(&self, rule: &RenalRule, ctx: &PatientContext) -> Option<(RenalEffect, Basis)> {
        if let Some(modality) = ctx.renal.dialysis() {
            let row = rule.dialysis_effect(modality)?;
            return Some((row.effect, Basis::Dialysis(modality.label())));
        }
        let (measure, value) = ctx.renal.clearance()?;
        let tier = select(rule.tiers, value)?;
        Some((
            tier.value,
            Basis::Clearance {
                label: measure.label(),
                value,
                tier: tier.describe(),
            },
        ))
    }

    /// Return true if the order misses the adjustment.
    fn unadjusted(&self, resolved: &Resolved<'_>, dose_mg: Option<f64>, interval_h: Option<f64>) -> bool {
        let order = resolved.order;
        let interval_short = match (interval_h, order.frequency_hours) {
            (Some(target), Some(actual)) => actual < target - self.interval_slack_hours,
            _ => false,
        };
        let dose_high = match (dose_mg, order.dose_mg()) {
            (Some(target), Some(actual)) => actual > target * (1.0 + self.dose_tolerance),
            _ => false,
        };
        if !interval_short && !dose_high {
            return false;
        }

        let per_dose = dose_mg.or(order.dose_mg());
        let every = interval_h.or(order.frequency_hours).filter(|h| *h > 0.0);
        match (per_dose, every, order.daily_dose_mg) {
            (Some(mg), Some(h), Some(actual_daily)) => {
                let expected_daily = mg * 24.0 / h;
                actual_daily > expected_daily * (1.0 + self.dose_tolerance)
            }
            _ => true,
        }
    }
}

fn describe_adjustment(dose_mg: Option<f64>, interval_h: Option<f64>, note: &str) -> String {
    let mut parts = Vec::new();
    if let Some(mg) = dose_mg {
        parts.push(format!("{} mg", format_amount(mg)));
    }
    if let Some(h) = interval_h {
        parts.push(format!("q{}h", format_amount(h)));
    }
    if parts.is_empty() {
        note.to_string()
    } else {
        format!("{} ({})", parts.join(" "), note)
    }
}

impl RuleModule for RenalModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Renal
    }

    fn evaluate(&self, ctx: &PatientContext) -> DoseResult<Vec<DoseFlag>> {
        if ctx.renal.dialysis().is_none() && ctx.renal.clearance().is_none() {
            return Ok(Vec::new());
        }

        let indication = ctx.indication_text();
        let mut flags = Vec::new();
        for resolved in resolve_all(self.resolver.as_ref(), &ctx.antimicrobials) {
            let Some(rule) = RENAL_RULES.iter().find(|r| r.drug.matches(&resolved.drug)) else {
                continue;
            };
            let Some((effect, basis)) = self.effect_for(rule, ctx) else {
                debug!(drug = %resolved.drug.name, "no renal row for this patient");
                continue;
            };

            match effect {
                RenalEffect::Standard => {}
                RenalEffect::Contraindicated { note } => {
                    flags.push(
                        DoseFlag::new(
                            FlagType::Contraindicated,
                            Severity::Critical,
                            resolved.drug.name.clone(),
                            format!("{} is contraindicated {}: {}", resolved.drug.name, basis.describe(), note),
                        )
                        .expected("avoid; choose a non-renally limited agent")
                        .actual(resolved.order.describe())
                        .source(rule.source)
                        .indication(indication),
                    );
                }
                RenalEffect::Adjust { dose_mg, interval_h, note } => {
                    if !self.unadjusted(&resolved, dose_mg, interval_h) {
                        continue;
                    }
                    debug!(drug = %resolved.drug.name, basis = %basis.describe(), "renal adjustment missing");
                    let mut flag = DoseFlag::new(
                        FlagType::NoRenalAdjustment,
                        rule.severity,
                        resolved.drug.name.clone(),
                        format!("{} not adjusted for renal function ({})", resolved.drug.name, basis.describe()),
                    )
                    .expected(describe_adjustment(dose_mg, interval_h, note))
                    .actual(resolved.order.describe())
                    .source(rule.source)
                    .indication(indication);
                    if let Some(daily) = resolved.order.daily_dose_mg {
                        flag = flag.attr("daily_dose_mg", daily);
                    }
                    flags.push(flag);
                }
            }
        }
        Ok(flags)
    }
}
