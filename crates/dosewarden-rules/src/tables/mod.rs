//! Static clinical rule tables.
//!
//! Each submodule holds the data for one rule family. The types here are the
//! vocabulary the tables share: how a row names a drug, which routes a dose
//! row applies to, and how an expected dose is written.

use dosewarden_contracts::{
    drug::{CanonicalDrug, DrugClass},
    medication::{format_amount, Route},
};

pub mod age;
pub mod allergy;
pub mod duration;
pub mod indication;
pub mod infusion;
pub mod interaction;
pub mod renal;
pub mod route;
pub mod weight;

/// How a table row names the drugs it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrugKey {
    /// One canonical generic name.
    Drug(&'static str),
    /// Every drug in a class.
    Class(DrugClass),
}

impl DrugKey {
    pub fn matches(&self, drug: &CanonicalDrug) -> bool {
        match self {
            DrugKey::Drug(name) => drug.named(name),
            DrugKey::Class(class) => drug.is(*class),
        }
    }

    pub fn label(&self) -> String {
        match self {
            DrugKey::Drug(name) => (*name).to_string(),
            DrugKey::Class(class) => class.label().to_string(),
        }
    }
}

/// The routes a dose row applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteScope {
    Any,
    /// IV or IM.
    Parenteral,
    /// PO or PR.
    Enteral,
}

impl RouteScope {
    pub fn admits(&self, route: &Route) -> bool {
        match self {
            RouteScope::Any => true,
            RouteScope::Parenteral => matches!(route, Route::Intravenous | Route::Intramuscular),
            RouteScope::Enteral => matches!(route, Route::Oral | Route::Rectal),
        }
    }
}

/// Whether a weight-based amount is per dose or per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoseBasis {
    PerDose,
    PerDay,
}

/// An expected dose range, as written in a reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DoseRule {
    /// Flat milligram range per dose.
    Fixed { low_mg: f64, high_mg: f64 },
    /// mg/kg range, optionally capped per dose.
    WeightBased {
        low_mg_per_kg: f64,
        high_mg_per_kg: f64,
        basis: DoseBasis,
        cap_mg: Option<f64>,
    },
}

impl DoseRule {
    pub const fn fixed(low_mg: f64, high_mg: f64) -> Self {
        DoseRule::Fixed { low_mg, high_mg }
    }

    pub const fn per_dose(low: f64, high: f64, cap_mg: Option<f64>) -> Self {
        DoseRule::WeightBased {
            low_mg_per_kg: low,
            high_mg_per_kg: high,
            basis: DoseBasis::PerDose,
            cap_mg,
        }
    }

    pub const fn per_day(low: f64, high: f64, cap_mg: Option<f64>) -> Self {
        DoseRule::WeightBased {
            low_mg_per_kg: low,
            high_mg_per_kg: high,
            basis: DoseBasis::PerDay,
            cap_mg,
        }
    }

    pub fn is_weight_based(&self) -> bool {
        matches!(self, DoseRule::WeightBased { .. })
    }

    /// Resolve the rule to milligrams for a dosing weight.
    ///
    /// `None` when the rule is weight-based and no weight is available.
    pub fn expected(&self, weight_kg: Option<f64>) -> Option<ExpectedDose> {
        match *self {
            DoseRule::Fixed { low_mg, high_mg } => Some(ExpectedDose {
                low_mg,
                high_mg,
                basis: DoseBasis::PerDose,
                label: format!("{}-{} mg per dose", format_amount(low_mg), format_amount(high_mg)),
            }),
            DoseRule::WeightBased {
                low_mg_per_kg,
                high_mg_per_kg,
                basis,
                cap_mg,
            } => {
                let w = weight_kg.filter(|w| *w > 0.0)?;
                let cap = cap_mg.unwrap_or(f64::INFINITY);
                let low_mg = (low_mg_per_kg * w).min(cap);
                let high_mg = (high_mg_per_kg * w).min(cap);
                let per = match basis {
                    DoseBasis::PerDose => "dose",
                    DoseBasis::PerDay => "day",
                };
                Some(ExpectedDose {
                    low_mg,
                    high_mg,
                    basis,
                    label: format!(
                        "{}-{} mg/kg/{} ({}-{} mg at {} kg)",
                        format_amount(low_mg_per_kg),
                        format_amount(high_mg_per_kg),
                        per,
                        format_amount(low_mg),
                        format_amount(high_mg),
                        format_amount(w)
                    ),
                })
            }
        }
    }
}

/// A dose range in milligrams, ready to compare against an order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedDose {
    pub low_mg: f64,
    pub high_mg: f64,
    pub basis: DoseBasis,
    pub label: String,
}

/// Where an ordered amount falls relative to an expected range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deviation {
    Below,
    Within,
    Above,
}

impl ExpectedDose {
    /// Compare `actual_mg` (per dose or per day, matching `basis`) with a
    /// relative tolerance applied to both ends of the range.
    pub fn compare(&self, actual_mg: f64, tolerance: f64) -> Deviation {
        if actual_mg < self.low_mg * (1.0 - tolerance) {
            Deviation::Below
        } else if actual_mg > self.high_mg * (1.0 + tolerance) {
            Deviation::Above
        } else {
            Deviation::Within
        }
    }

    /// The order's amount on this range's basis.
    pub fn actual_for(&self, dose_mg: Option<f64>, daily_mg: Option<f64>) -> Option<f64> {
        match self.basis {
            DoseBasis::PerDose => dose_mg,
            DoseBasis::PerDay => daily_mg,
        }
    }
}

/// An acceptable range of dosing intervals, in hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalRange {
    pub min_h: f64,
    pub max_h: f64,
}

impl IntervalRange {
    pub const fn new(min_h: f64, max_h: f64) -> Self {
        Self { min_h, max_h }
    }

    pub const fn exactly(h: f64) -> Self {
        Self { min_h: h, max_h: h }
    }

    pub fn contains(&self, hours: f64, slack_h: f64) -> bool {
        hours >= self.min_h - slack_h && hours <= self.max_h + slack_h
    }

    pub fn describe(&self) -> String {
        if (self.min_h - self.max_h).abs() < f64::EPSILON {
            format!("q{}h", format_amount(self.min_h))
        } else {
            format!("q{}-{}h", format_amount(self.min_h), format_amount(self.max_h))
        }
    }
}
