//! Antimicrobial × co-medication interactions.

use std::sync::Arc;

use tracing::debug;

use dosewarden_contracts::{
    error::DoseResult,
    flag::{DoseFlag, FlagType},
    patient::PatientContext,
};
use dosewarden_core::{DrugResolver, ModuleKind, RuleModule};

use crate::{modules::resolve_all, tables::interaction::INTERACTIONS};

pub struct InteractionModule {
    resolver: Arc<dyn DrugResolver>,
}

impl InteractionModule {
    pub fn new(resolver: Arc<dyn DrugResolver>) -> Self {
        Self { resolver }
    }
}

impl RuleModule for InteractionModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::DrugInteraction
    }

    fn evaluate(&self, ctx: &PatientContext) -> DoseResult<Vec<DoseFlag>> {
        if ctx.co_medications.is_empty() {
            return Ok(Vec::new());
        }

        let antimicrobials = resolve_all(self.resolver.as_ref(), &ctx.antimicrobials);
        let co_medications = resolve_all(self.resolver.as_ref(), &ctx.co_medications);
        let indication = ctx.indication_text();
        let mut flags = Vec::new();

        for abx in &antimicrobials {
            for comed in &co_medications {
                for row in INTERACTIONS.iter().filter(|r| r.matches(&abx.drug, &comed.drug)) {
                    debug!(
                        antimicrobial = %abx.drug.name,
                        co_medication = %comed.drug.name,
                        severity = %row.severity,
                        "interaction matched"
                    );
                    flags.push(
                        DoseFlag::new(
                            FlagType::DrugInteraction,
                            row.severity,
                            abx.drug.name.clone(),
                            format!("{} with {}: {}", abx.drug.name, comed.drug.name, row.mechanism),
                        )
                        .expected(row.recommendation)
                        .actual(format!("co-medication {}", comed.order.describe()))
                        .source(row.source)
                        .indication(indication)
                        .attr("co_medication", comed.drug.name.clone())
                        .attr("pair", format!("{} / {}", row.a.label(), row.b.label())),
                    );
                }
            }
        }

        Ok(flags)
    }
}
