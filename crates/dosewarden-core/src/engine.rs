//! The dosewarden engine: runs every rule module and builds the assessment.
//!
//! The engine enforces the evaluation model:
//!
//!   Context → [Allergy, Age, DrugInteraction, Route, Indication, Renal,
//!              Weight, Duration, ExtendedInfusion] → Deduplicate → Rank → Assessment
//!
//! Every enabled module runs on every call. A module that returns `Err` or
//! panics contributes zero flags for that call; the fault is logged and the
//! remaining modules still run. `evaluate` has no error path.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use dosewarden_contracts::{
    activity::{ActivityEvent, ActivityKind},
    assessment::DoseAssessment,
    flag::DoseFlag,
    patient::PatientContext,
};

use crate::traits::{ActivityLogger, ModuleKind, NoopActivityLogger, RuleModule};

/// Author tag stamped on assessments when none is configured.
pub const DEFAULT_ASSESSED_BY: &str = "dosewarden";

/// Engine-level settings, loaded from the `[engine]` table of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Written to `DoseAssessment::assessed_by`.
    pub assessed_by: String,
    /// Run modules on scoped threads. Results are merged in module order, so
    /// the output is identical to a sequential run.
    pub parallel_modules: bool,
    /// Modules to skip entirely.
    pub disabled_modules: Vec<ModuleKind>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            assessed_by: DEFAULT_ASSESSED_BY.to_string(),
            parallel_modules: false,
            disabled_modules: Vec::new(),
        }
    }
}

/// Runs the rule modules for one patient at a time.
///
/// Stateless between calls: one engine can serve any number of threads.
pub struct DoseEngine {
    modules: Vec<Box<dyn RuleModule>>,
    logger: Arc<dyn ActivityLogger>,
    settings: EngineSettings,
}

impl DoseEngine {
    /// Create an engine over `modules`.
    ///
    /// Modules are re-ordered into `ModuleKind` order (stable for equal kinds)
    /// and disabled kinds are dropped here, once.
    pub fn new(mut modules: Vec<Box<dyn RuleModule>>, settings: EngineSettings) -> Self {
        modules.retain(|m| !settings.disabled_modules.contains(&m.kind()));
        modules.sort_by_key(|m| m.kind());
        Self {
            modules,
            logger: Arc::new(NoopActivityLogger),
            settings,
        }
    }

    /// Attach an activity logger.
    pub fn with_logger(mut self, logger: Arc<dyn ActivityLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Kinds of the active modules, in evaluation order.
    pub fn module_kinds(&self) -> Vec<ModuleKind> {
        self.modules.iter().map(|m| m.kind()).collect()
    }

    /// Evaluate one patient context.
    ///
    /// # Pipeline
    ///
    /// 1. Run every module (sequentially or on scoped threads)
    /// 2. Concatenate their flags in module order
    /// 3. Deduplicate by (drug, flag type), keeping the higher severity
    /// 4. Stable sort by severity, highest first
    /// 5. Build the assessment from copies of the context fields
    pub fn evaluate(&self, ctx: &PatientContext) -> DoseAssessment {
        let patient_id = ctx.patient.patient_id.as_str();

        debug!(
            patient_id = %patient_id,
            antimicrobials = ctx.antimicrobials.len(),
            co_medications = ctx.co_medications.len(),
            modules = self.modules.len(),
            "evaluation starting"
        );
        self.logger.record(ActivityEvent::now(
            patient_id,
            ActivityKind::EvaluationStarted {
                antimicrobial_count: ctx.antimicrobials.len(),
                co_medication_count: ctx.co_medications.len(),
            },
        ));

        let per_module: Vec<Vec<DoseFlag>> = if self.settings.parallel_modules {
            self.run_parallel(ctx)
        } else {
            self.modules
                .iter()
                .map(|m| self.run_module(m.as_ref(), ctx))
                .collect()
        };

        let collected: Vec<DoseFlag> = per_module.into_iter().flatten().collect();
        let collected_count = collected.len();

        let assessment = DoseAssessment::assemble(ctx, collected, &self.settings.assessed_by);

        info!(
            patient_id = %patient_id,
            assessment_id = %assessment.id().0,
            collected = collected_count,
            surviving = assessment.flags().len(),
            max_severity = ?assessment.max_severity(),
            "assessment complete"
        );
        self.logger.record(ActivityEvent::now(
            patient_id,
            ActivityKind::AssessmentCompleted {
                assessment_id: assessment.id().0.to_string(),
                flag_count: assessment.flags().len(),
                max_severity: assessment.max_severity(),
            },
        ));

        assessment
    }

    /// Evaluate many contexts on scoped worker threads.
    ///
    /// Output order matches input order. Contexts share nothing, so the only
    /// coordination is joining the workers.
    pub fn evaluate_batch(&self, contexts: &[PatientContext]) -> Vec<DoseAssessment> {
        if contexts.is_empty() {
            return Vec::new();
        }

        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .clamp(1, contexts.len());
        let chunk_size = contexts.len().div_ceil(workers);

        debug!(contexts = contexts.len(), workers, "batch evaluation starting");

        thread::scope(|scope| {
            let handles: Vec<_> = contexts
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || chunk.iter().map(|c| self.evaluate(c)).collect::<Vec<_>>())
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|h| match h.join() {
                    Ok(assessments) => assessments,
                    Err(payload) => panic::resume_unwind(payload),
                })
                .collect()
        })
    }

    fn run_parallel(&self, ctx: &PatientContext) -> Vec<Vec<DoseFlag>> {
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .modules
                .iter()
                .map(|m| scope.spawn(move || self.run_module(m.as_ref(), ctx)))
                .collect();

            // Joined in spawn order, which is module order.
            handles
                .into_iter()
                .zip(self.modules.iter())
                .map(|(h, m)| {
                    h.join().unwrap_or_else(|_| {
                        self.report_fault(ctx, m.kind(), "worker thread panicked");
                        Vec::new()
                    })
                })
                .collect()
        })
    }

    /// Run one module, converting an `Err` or a panic into zero flags.
    fn run_module(&self, module: &dyn RuleModule, ctx: &PatientContext) -> Vec<DoseFlag> {
        let kind = module.kind();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| module.evaluate(ctx)));

        match outcome {
            Ok(Ok(flags)) => {
                debug!(
                    patient_id = %ctx.patient.patient_id,
                    module = %kind,
                    flags = flags.len(),
                    "module evaluated"
                );
                flags
            }
            Ok(Err(e)) => {
                self.report_fault(ctx, kind, &e.to_string());
                Vec::new()
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                self.report_fault(ctx, kind, &format!("panicked: {reason}"));
                Vec::new()
            }
        }
    }

    fn report_fault(&self, ctx: &PatientContext, kind: ModuleKind, reason: &str) {
        warn!(
            patient_id = %ctx.patient.patient_id,
            module = %kind,
            reason = %reason,
            "rule module faulted; contributing no flags this cycle"
        );
        self.logger.record(ActivityEvent::now(
            ctx.patient.patient_id.as_str(),
            ActivityKind::ModuleFault {
                module: kind.name().to_string(),
                reason: reason.to_string(),
            },
        ));
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
