//! Route appropriateness for the stated indication.

use std::sync::Arc;

use tracing::debug;

use dosewarden_contracts::{
    error::DoseResult,
    flag::{DoseFlag, FlagType},
    patient::PatientContext,
};
use dosewarden_core::{DrugResolver, ModuleKind, RuleModule};

use crate::{
    matching::mentions_any,
    modules::resolve_all,
    tables::route::{CONTRAINDICATED_ROUTES, REQUIRED_ROUTES},
};

pub struct RouteModule {
    resolver: Arc<dyn DrugResolver>,
}

impl RouteModule {
    pub fn new(resolver: Arc<dyn DrugResolver>) -> Self {
        Self { resolver }
    }
}

impl RuleModule for RouteModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Route
    }

    fn evaluate(&self, ctx: &PatientContext) -> DoseResult<Vec<DoseFlag>> {
        let Some(indication) = ctx.indication_text() else {
            return Ok(Vec::new());
        };

        let mut flags = Vec::new();
        for resolved in resolve_all(self.resolver.as_ref(), &ctx.antimicrobials) {
            let route = &resolved.order.route;

            for rule in REQUIRED_ROUTES {
                if !rule.drug.matches(&resolved.drug)
                    || !mentions_any(indication, rule.indications)
                    || rule.allowed.contains(route)
                {
                    continue;
                }
                let allowed: Vec<&str> = rule.allowed.iter().map(|r| r.code()).collect();
                debug!(drug = %resolved.drug.name, route = %route, "route not in required set");
                flags.push(
                    DoseFlag::new(
                        FlagType::WrongRoute,
                        rule.severity,
                        resolved.drug.name.clone(),
                        format!("{} {} for {}: {}", resolved.drug.name, route, indication, rule.reason),
                    )
                    .expected(format!("route {}", allowed.join(" or ")))
                    .actual(resolved.order.describe())
                    .source(rule.source)
                    .indication(Some(indication)),
                );
            }

            for rule in CONTRAINDICATED_ROUTES {
                if rule.route != *route
                    || !rule.drug.matches(&resolved.drug)
                    || !mentions_any(indication, rule.indications)
                {
                    continue;
                }
                debug!(drug = %resolved.drug.name, route = %route, "route ineffective for indication");
                flags.push(
                    DoseFlag::new(
                        FlagType::WrongRoute,
                        rule.severity,
                        resolved.drug.name.clone(),
                        format!("{} {} for {}: {}", resolved.drug.name, route, indication, rule.reason),
                    )
                    .expected("a route with systemic exposure")
                    .actual(resolved.order.describe())
                    .source(rule.source)
                    .indication(Some(indication)),
                );
            }
        }

        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use dosewarden_contracts::{
        flag::Severity,
        medication::{DoseUnit, Route},
    };

    use super::*;
    use crate::modules::testing::{iv_mg, now, order, resolver};

    fn run(ctx: &PatientContext) -> Vec<DoseFlag> {
        RouteModule::new(resolver()).evaluate(ctx).unwrap()
    }

    #[test]
    fn test_iv_vancomycin_for_c_difficile() {
        let ctx = PatientContext::builder("p1")
            .indication("c_difficile")
            .antimicrobial(iv_mg("vancomycin", 125.0, "q6h"))
            .captured_at(now())
            .build();
        let flags = run(&ctx);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].flag_type, FlagType::WrongRoute);
        assert_eq!(flags[0].severity, Severity::Critical);
    }

    #[test]
    fn test_oral_vancomycin_for_c_difficile_is_correct() {
        let ctx = PatientContext::builder("p1")
            .indication("C. diff colitis")
            .antimicrobial(order("vancomycin", 125.0, DoseUnit::Mg, "q6h", Route::Oral))
            .captured_at(now())
            .build();
        assert!(run(&ctx).is_empty());
    }

    #[test]
    fn test_oral_vancomycin_for_bacteremia() {
        let ctx = PatientContext::builder("p1")
            .indication("MRSA bacteremia")
            .antimicrobial(order("vanc", 1000.0, DoseUnit::Mg, "q12h", Route::Oral))
            .captured_at(now())
            .build();
        let flags = run(&ctx);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].severity, Severity::Critical);
    }

    #[test]
    fn test_no_indication_no_route_checks() {
        let ctx = PatientContext::builder("p1")
            .antimicrobial(order("vancomycin", 1000.0, DoseUnit::Mg, "q12h", Route::Oral))
            .captured_at(now())
            .build();
        assert!(run(&ctx).is_empty());
    }
}
