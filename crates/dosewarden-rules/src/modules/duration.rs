//! Course length against guideline duration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
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
    matching::{best_match, mentions_any},
    modules::resolve_all,
    tables::duration::{Course, DurationEntry, DurationRule, DURATION_TABLE},
};

const SECONDS_PER_DAY: f64 = 86_400.0;

pub struct DurationModule {
    resolver: Arc<dyn DrugResolver>,
    grace_days: f64,
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / SECONDS_PER_DAY
}

fn describe_course(course: &Course) -> String {
    if course.min_days == course.max_days {
        format!("{} days", format_amount(course.min_days))
    } else {
        format!("{}-{} days", format_amount(course.min_days), format_amount(course.max_days))
    }
}

impl DurationModule {
    pub fn new(resolver: Arc<dyn DrugResolver>, thresholds: &RuleThresholds) -> Self {
        Self {
            resolver,
            grace_days: thresholds.duration_grace_days,
        }
    }

    /// The course for `text`, and the subtype it was taken from if the entry
    /// is split by subtype. An unnamed subtype falls back to the first.
    fn course_for(entry: &DurationEntry, text: &str) -> Option<(Course, Option<&'static str>)> {
        match entry.rule {
            DurationRule::Flat(course) => Some((course, None)),
            DurationRule::BySubtype(subtypes) => {
                let subtype = subtypes
                    .iter()
                    .find(|s| mentions_any(text, s.keys))
                    .or_else(|| subtypes.first())?;
                Some((subtype.course, subtype.keys.first().copied()))
            }
        }
    }
}

impl RuleModule for DurationModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Duration
    }

    fn evaluate(&self, ctx: &PatientContext) -> DoseResult<Vec<DoseFlag>> {
        let Some(indication) = ctx.indication_text() else {
            return Ok(Vec::new());
        };
        let Some(entry) = best_match(indication, DURATION_TABLE, |e| e.keys) else {
            return Ok(Vec::new());
        };
        let Some((course, subtype)) = Self::course_for(entry, indication) else {
            return Ok(Vec::new());
        };

        let mut flags = Vec::new();
        for resolved in resolve_all(self.resolver.as_ref(), &ctx.antimicrobials) {
            let order = resolved.order;
            let elapsed = days_between(order.start_time, ctx.captured_at).max(0.0);
            let scheduled = order.end_time.map(|end| days_between(order.start_time, end));

            if let Some(planned) = scheduled.filter(|d| *d < course.min_days) {
                debug!(drug = %resolved.drug.name, planned, min_days = course.min_days, "course too short");
                let mut flag = DoseFlag::new(
                    FlagType::DurationInsufficient,
                    Severity::Moderate,
                    resolved.drug.name.clone(),
                    format!(
                        "{} scheduled for {} days, shorter than the recommended course for {}",
                        resolved.drug.name,
                        format_amount(planned),
                        indication
                    ),
                )
                .expected(describe_course(&course))
                .actual(format!("{} days scheduled", format_amount(planned)))
                .source(entry.source)
                .indication(Some(indication));
                if let Some(subtype) = subtype {
                    flag = flag.attr("subtype", subtype);
                }
                flags.push(flag);
            }

            let longest = scheduled.map_or(elapsed, |planned| planned.max(elapsed));
            if longest > course.max_days + self.grace_days {
                debug!(drug = %resolved.drug.name, longest, max_days = course.max_days, "course too long");
                let severity = if longest > 2.0 * course.max_days + self.grace_days {
                    Severity::Moderate
                } else {
                    Severity::Low
                };
                let mut flag = DoseFlag::new(
                    FlagType::DurationExcessive,
                    severity,
                    resolved.drug.name.clone(),
                    format!(
                        "{} course of {} days exceeds the recommended maximum for {}",
                        resolved.drug.name,
                        format_amount(longest.floor()),
                        indication
                    ),
                )
                .expected(describe_course(&course))
                .actual(format!(
                    "{} days elapsed{}",
                    format_amount(elapsed.floor()),
                    scheduled.map_or(String::new(), |d| format!(", {} days scheduled", format_amount(d)))
                ))
                .source(entry.source)
                .indication(Some(indication))
                .attr("grace_days", self.grace_days);
                if let Some(subtype) = subtype {
                    flag = flag.attr("subtype", subtype);
                }
                flags.push(flag);
            }
        }
        Ok(flags)
    }
}
