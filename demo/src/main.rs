//! dosewarden demo CLI.
//!
//! Runs the built-in antimicrobial dose-check scenarios, or evaluates a
//! patient snapshot supplied as JSON. Every run is recorded in a hash-chained
//! activity log whose integrity is checked before the program exits.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- scenario c-diff
//!   cargo run -p demo -- list
//!   cargo run -p demo -- evaluate --patient patient.json [--config dosewarden.toml] [--json]

mod mock_data;
mod report;
mod scenarios;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use dosewarden_audit::InMemoryActivityLog;
use dosewarden_contracts::{
    error::{DoseError, DoseResult},
    patient::PatientContext,
};
use dosewarden_core::{plan_notifications, DoseEngine};
use dosewarden_rules::{build_engine, DoseCheckConfig};

/// Configuration used when `--config` is not given.
const DEFAULT_CONFIG: &str = include_str!("../dosewarden.toml");

// ── CLI definition ────────────────────────────────────────────────────────────

/// dosewarden: antimicrobial dosing-safety checks.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "dosewarden antimicrobial dose-check demo",
    long_about = "Runs dosewarden over built-in clinical scenarios or a JSON patient snapshot,\n\
                  printing ranked findings and the resulting notification plan."
)]
struct Cli {
    /// Engine and threshold configuration (TOML). Defaults to the bundled file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every built-in scenario in sequence.
    RunAll,
    /// Run one built-in scenario by name.
    Scenario {
        /// Scenario name, see `list`.
        name: String,
    },
    /// List the built-in scenarios.
    List,
    /// Evaluate a patient snapshot read from a JSON file.
    Evaluate {
        #[arg(long)]
        patient: PathBuf,
        /// Print the assessment and notification plan as JSON.
        #[arg(long)]
        json: bool,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // RUST_LOG=debug shows every module decision.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> DoseResult<()> {
    let config = load_config(cli.config.as_deref())?;
    let log = InMemoryActivityLog::new(format!("demo-{}", Utc::now().format("%Y%m%dT%H%M%S")));
    let engine = build_engine(&config).with_logger(Arc::new(log.clone()));

    let quiet = matches!(cli.command, Command::Evaluate { json: true, .. } | Command::List);
    match cli.command {
        Command::RunAll => {
            print_banner();
            let now = Utc::now();
            for scenario in scenarios::SCENARIOS {
                scenarios::run_scenario(scenario, &engine, now);
            }
        }
        Command::Scenario { name } => {
            let scenario = scenarios::find(&name).ok_or_else(|| DoseError::InvalidInput {
                reason: format!("unknown scenario '{}'; run `demo list` to see the names", name),
            })?;
            print_banner();
            scenarios::run_scenario(scenario, &engine, Utc::now());
        }
        Command::List => {
            for scenario in scenarios::SCENARIOS {
                println!("{:<16} {}", scenario.name, scenario.title);
            }
        }
        Command::Evaluate { patient, json } => evaluate_file(&engine, &patient, json)?,
    }

    if !quiet {
        print_activity_summary(&log);
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> DoseResult<DoseCheckConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading dose-check config");
            DoseCheckConfig::from_file(path)
        }
        None => DoseCheckConfig::from_toml_str(DEFAULT_CONFIG),
    }
}

fn evaluate_file(engine: &DoseEngine, path: &Path, as_json: bool) -> DoseResult<()> {
    let content = std::fs::read_to_string(path).map_err(|e| DoseError::InvalidInput {
        reason: format!("failed to read patient file '{}': {}", path.display(), e),
    })?;
    let ctx = PatientContext::from_json(&content)?;

    let assessment = engine.evaluate(&ctx);
    let plan = plan_notifications(&assessment, &scenarios::demo_recipient());

    if as_json {
        let out = json!({
            "assessment": assessment,
            "alerts": assessment.alert_records(),
            "notification": plan,
        });
        let text = serde_json::to_string_pretty(&out).map_err(|e| DoseError::InvalidInput {
            reason: format!("failed to serialize assessment: {}", e),
        })?;
        println!("{}", text);
    } else {
        println!("=== {} ===", path.display());
        println!();
        report::print_assessment(&assessment);
        report::print_plan(&plan);
    }
    Ok(())
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_activity_summary(log: &InMemoryActivityLog) {
    let exported = log.export_log();
    println!("Activity log {}", exported.log_id);
    println!("  Entries:       {}", exported.entries.len());
    println!("  Terminal hash: {}", exported.terminal_hash);
    println!(
        "  Chain:         {}",
        if log.verify_integrity() { "verified" } else { "BROKEN" }
    );
    println!();
}

fn print_banner() {
    println!();
    println!("dosewarden: antimicrobial dosing-safety checks");
    println!("==============================================");
    println!();
    println!("Per patient snapshot:");
    println!("  [1] Nine rule modules run in fixed order (allergy ... extended infusion)");
    println!("  [2] Findings deduplicated per (drug, kind), keeping the most severe");
    println!("  [3] Ranked by severity; the highest picks the notification tier");
    println!("  [4] Start, faults and completion chained into the activity log");
    println!();
}

#[cfg(test)]
mod tests {
    use dosewarden_contracts::flag::FlagType;

    use super::*;

    #[test]
    fn test_bundled_config_parses() {
        let config = load_config(None).unwrap();
        assert_eq!(config.engine.assessed_by, "dosewarden-demo");
        assert!(config.engine.disabled_modules.is_empty());
    }

    #[test]
    fn test_sample_patient_file_evaluates() {
        let ctx = PatientContext::from_json(include_str!("../patients/icu_cefepime.json")).unwrap();
        let engine = build_engine(&load_config(None).unwrap());
        let assessment = engine.evaluate(&ctx);

        assert!(assessment
            .flags_for("cefepime")
            .any(|f| f.flag_type == FlagType::NoRenalAdjustment));
        assert!(assessment
            .flags_for("levofloxacin")
            .any(|f| f.flag_type == FlagType::DrugInteraction));
        assert_eq!(assessment.assessed_by(), "dosewarden-demo");
    }
}
