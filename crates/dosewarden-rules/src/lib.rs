//! dosewarden-rules: the standard antimicrobial dosing rule set.
//!
//! Provides the nine rule modules, the static clinical tables they read, the
//! shared `FormularyResolver`, and `DoseCheckConfig` for loading engine
//! settings and thresholds from TOML.
//!
//! ```rust,ignore
//! use dosewarden_rules::{build_engine, DoseCheckConfig};
//!
//! let config = DoseCheckConfig::from_file(Path::new("dosewarden.toml"))?;
//! let engine = build_engine(&config);
//! let assessment = engine.evaluate(&ctx);
//! ```

use std::sync::Arc;

use dosewarden_core::{DoseEngine, DrugResolver, RuleModule};

pub mod config;
pub mod formulary;
pub mod matching;
pub mod modules;
pub mod tables;
pub mod tier;

pub use config::{DoseCheckConfig, RuleThresholds};
pub use formulary::FormularyResolver;

use modules::{
    AgeModule, AllergyModule, DurationModule, ExtendedInfusionModule, IndicationModule, InteractionModule,
    RenalModule, RouteModule, WeightModule,
};

/// One instance of every standard module, sharing `resolver`.
pub fn standard_modules(resolver: Arc<dyn DrugResolver>, thresholds: &RuleThresholds) -> Vec<Box<dyn RuleModule>> {
    vec![
        Box::new(AllergyModule::new(resolver.clone())),
        Box::new(AgeModule::new(resolver.clone(), thresholds)),
        Box::new(InteractionModule::new(resolver.clone())),
        Box::new(RouteModule::new(resolver.clone())),
        Box::new(IndicationModule::new(resolver.clone(), thresholds)),
        Box::new(RenalModule::new(resolver.clone(), thresholds)),
        Box::new(WeightModule::new(resolver.clone(), thresholds)),
        Box::new(DurationModule::new(resolver.clone(), thresholds)),
        Box::new(ExtendedInfusionModule::new(resolver)),
    ]
}

/// An engine over the standard modules and the built-in formulary.
pub fn build_engine(config: &DoseCheckConfig) -> DoseEngine {
    let resolver: Arc<dyn DrugResolver> = Arc::new(FormularyResolver::new());
    DoseEngine::new(
        standard_modules(resolver, &config.thresholds),
        config.engine.clone(),
    )
}
