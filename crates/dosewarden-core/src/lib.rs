//! # dosewarden-core
//!
//! The deterministic evaluation runtime for dosewarden.
//!
//! This crate provides:
//! - The seams of the pipeline (`RuleModule`, `DrugResolver`, `ActivityLogger`)
//! - The `DoseEngine` that runs the modules and builds a `DoseAssessment`
//! - The severity → notification-tier mapping consumed by external notifiers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dosewarden_core::{DoseEngine, EngineSettings};
//!
//! let engine = DoseEngine::new(modules, EngineSettings::default());
//! let assessment = engine.evaluate(&context);
//! ```

pub mod engine;
pub mod notify;
pub mod traits;

pub use engine::{DoseEngine, EngineSettings};
pub use notify::{notification_tier, plan_notifications, NotificationTier, Recipient};
pub use traits::{ActivityLogger, DrugResolver, ModuleKind, NoopActivityLogger, RuleModule};
