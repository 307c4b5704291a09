//! The nine standard rule modules.
//!
//! Each module owns one rule family and reads its own table from
//! `crate::tables`. All of them resolve order names through the shared
//! `DrugResolver` and read limits from `RuleThresholds`.

use dosewarden_contracts::{drug::CanonicalDrug, medication::MedicationOrder};
use dosewarden_core::DrugResolver;

pub mod age;
pub mod allergy;
pub mod duration;
pub mod indication;
pub mod infusion;
pub mod interaction;
pub mod renal;
pub mod route;
pub mod weight;

pub use age::AgeModule;
pub use allergy::AllergyModule;
pub use duration::DurationModule;
pub use indication::IndicationModule;
pub use infusion::ExtendedInfusionModule;
pub use interaction::InteractionModule;
pub use renal::RenalModule;
pub use route::RouteModule;
pub use weight::WeightModule;

/// An order paired with its canonical drug.
pub(crate) struct Resolved<'a> {
    pub order: &'a MedicationOrder,
    pub drug: CanonicalDrug,
}

pub(crate) fn resolve_all<'a>(resolver: &dyn DrugResolver, orders: &'a [MedicationOrder]) -> Vec<Resolved<'a>> {
    orders
        .iter()
        .map(|order| Resolved {
            order,
            drug: resolver.resolve(&order.drug_name),
        })
        .collect()
}

/// "12 days" below one year, "6.5 years" after.
pub(crate) fn describe_age(age_years: f64) -> String {
    use dosewarden_contracts::{medication::format_amount, patient::DAYS_PER_YEAR};

    if age_years < 1.0 {
        format!("{} days", format_amount((age_years * DAYS_PER_YEAR).round()))
    } else {
        format!("{} years", format_amount(age_years))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for module tests.

    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use dosewarden_contracts::medication::{DoseUnit, MedicationOrder, Route};
    use dosewarden_core::DrugResolver;

    use crate::formulary::FormularyResolver;

    pub fn resolver() -> Arc<dyn DrugResolver> {
        Arc::new(FormularyResolver::new())
    }

    /// Fixed snapshot time so elapsed-day arithmetic is reproducible.
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    pub fn days_ago(days: i64) -> DateTime<Utc> {
        now() - Duration::days(days)
    }

    pub fn order(drug: &str, dose: f64, unit: DoseUnit, interval: &str, route: Route) -> MedicationOrder {
        MedicationOrder::new(format!("ord-{}", drug), drug, dose, unit, interval, route, days_ago(1))
    }

    pub fn iv_mg(drug: &str, dose_mg: f64, interval: &str) -> MedicationOrder {
        order(drug, dose_mg, DoseUnit::Mg, interval, Route::Intravenous)
    }
}
