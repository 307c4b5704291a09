//! Core trait definitions for the dosewarden evaluation pipeline.
//!
//! These three traits define the seams of the engine:
//!
//! - `RuleModule`     : one pure rule family (allergy, renal, ...)
//! - `DrugResolver`   : shared drug-name normalization, injected into modules
//! - `ActivityLogger` : fire-and-forget record of what the engine did
//!
//! The engine owns a fixed-order list of modules and never lets one module's
//! failure affect another's output.

use std::fmt;

use serde::{Deserialize, Serialize};

use dosewarden_contracts::{
    activity::ActivityEvent,
    drug::{CanonicalDrug, DrugClass},
    error::DoseResult,
    flag::DoseFlag,
    patient::PatientContext,
};

/// The rule families, in evaluation order.
///
/// Declaration order is the engine's module order and therefore the
/// deduplication tie-break: on equal severity the flag from the earlier
/// module survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Allergy,
    Age,
    DrugInteraction,
    Route,
    Indication,
    Renal,
    Weight,
    Duration,
    ExtendedInfusion,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 9] = [
        ModuleKind::Allergy,
        ModuleKind::Age,
        ModuleKind::DrugInteraction,
        ModuleKind::Route,
        ModuleKind::Indication,
        ModuleKind::Renal,
        ModuleKind::Weight,
        ModuleKind::Duration,
        ModuleKind::ExtendedInfusion,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModuleKind::Allergy => "allergy",
            ModuleKind::Age => "age",
            ModuleKind::DrugInteraction => "drug_interaction",
            ModuleKind::Route => "route",
            ModuleKind::Indication => "indication",
            ModuleKind::Renal => "renal",
            ModuleKind::Weight => "weight",
            ModuleKind::Duration => "duration",
            ModuleKind::ExtendedInfusion => "extended_infusion",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One independent rule family.
///
/// Implementations must be pure and deterministic: no I/O, no interior
/// mutability, and the same context always yields the same flags in the same
/// order. Missing optional context fields suppress the checks that need them;
/// they are not errors. `Err` is reserved for internal faults, which the
/// engine logs and discards.
pub trait RuleModule: Send + Sync {
    fn kind(&self) -> ModuleKind;

    fn evaluate(&self, ctx: &PatientContext) -> DoseResult<Vec<DoseFlag>>;
}

/// Normalizes raw drug text to a `CanonicalDrug`.
///
/// Total: an unrecognized name still resolves, to a drug with no classes.
pub trait DrugResolver: Send + Sync {
    fn resolve(&self, raw_name: &str) -> CanonicalDrug;

    /// Map a class term ("penicillins", "sulfa drugs") to its class.
    ///
    /// Allergy lists name whole classes as often as single drugs.
    fn resolve_class(&self, _term: &str) -> Option<DrugClass> {
        None
    }
}

/// Receives activity events from the engine.
///
/// Implementations must not block and cannot fail the evaluation: there is
/// no error channel. A logger that cannot record an event drops it.
pub trait ActivityLogger: Send + Sync {
    fn record(&self, event: ActivityEvent);
}

/// The default logger. Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopActivityLogger;

impl ActivityLogger for NoopActivityLogger {
    fn record(&self, _event: ActivityEvent) {}
}
