//! The aggregate result of one evaluation.
//!
//! A `DoseAssessment` is built by `DoseAssessment::assemble`, which
//! deduplicates and ranks the collected flags, or decoded from JSON, which
//! re-checks the result. Either way these invariants hold:
//!
//! - no two flags share (drug, flag type);
//! - flags are ordered non-increasing by severity;
//! - `max_severity` is the top flag's severity, or `None` iff there are no
//!   flags. A `simulated` copy is exempt from this one.
//!
//! Fields are private. Callers read through accessors; a simulated variant is
//! always a new value (`simulated`), never an edit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::DoseError,
    flag::{deduplicate_flags, max_severity, rank_flags, DoseFlag, FlagType, Severity},
    medication::MedicationOrder,
    patient::{Demographics, Indication, PatientContext, PatientRef, RenalFunction},
};

/// Unique identifier for one assessment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssessmentId(pub uuid::Uuid);

impl AssessmentId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for AssessmentId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AssessmentRecord")]
pub struct DoseAssessment {
    id: AssessmentId,
    patient: PatientRef,
    demographics: Demographics,
    renal: RenalFunction,
    medications: Vec<MedicationOrder>,
    indication: Option<Indication>,
    flags: Vec<DoseFlag>,
    max_severity: Option<Severity>,
    assessed_at: DateTime<Utc>,
    assessed_by: String,
    co_medications: Vec<MedicationOrder>,
    #[serde(default)]
    simulated: bool,
}

impl DoseAssessment {
    /// Build an assessment from a context and the flags collected from every
    /// module, in module order.
    ///
    /// The context fields are cloned; the assessment holds no reference back
    /// into `ctx`.
    pub fn assemble(ctx: &PatientContext, collected: Vec<DoseFlag>, assessed_by: &str) -> Self {
        let flags = rank_flags(deduplicate_flags(collected));
        let max_severity = max_severity(&flags);
        Self {
            id: AssessmentId::new(),
            patient: ctx.patient.clone(),
            demographics: ctx.demographics.clone(),
            renal: ctx.renal.clone(),
            medications: ctx.antimicrobials.clone(),
            indication: ctx.indication.clone(),
            flags,
            max_severity,
            assessed_at: Utc::now(),
            assessed_by: assessed_by.to_string(),
            co_medications: ctx.co_medications.clone(),
            simulated: false,
        }
    }

    pub fn id(&self) -> &AssessmentId {
        &self.id
    }

    pub fn patient(&self) -> &PatientRef {
        &self.patient
    }

    pub fn demographics(&self) -> &Demographics {
        &self.demographics
    }

    pub fn renal(&self) -> &RenalFunction {
        &self.renal
    }

    pub fn medications(&self) -> &[MedicationOrder] {
        &self.medications
    }

    pub fn indication(&self) -> Option<&Indication> {
        self.indication.as_ref()
    }

    /// Deduplicated flags, highest severity first.
    pub fn flags(&self) -> &[DoseFlag] {
        &self.flags
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.max_severity
    }

    pub fn assessed_at(&self) -> DateTime<Utc> {
        self.assessed_at
    }

    pub fn assessed_by(&self) -> &str {
        &self.assessed_by
    }

    pub fn co_medications(&self) -> &[MedicationOrder] {
        &self.co_medications
    }

    /// True for copies produced by `simulated`.
    pub fn is_simulated(&self) -> bool {
        self.simulated
    }

    pub fn has_flags(&self) -> bool {
        !self.flags.is_empty()
    }

    /// Flags for one drug, in rank order.
    pub fn flags_for<'a>(&'a self, drug: &'a str) -> impl Iterator<Item = &'a DoseFlag> + 'a {
        self.flags.iter().filter(move |f| f.drug == drug)
    }

    /// A copy of this assessment with `max_severity` overridden, for exercising
    /// notification routing. The copy gets a fresh identifier and is marked
    /// simulated; the original is untouched.
    pub fn simulated(&self, max_severity: Option<Severity>) -> DoseAssessment {
        DoseAssessment {
            id: AssessmentId::new(),
            max_severity,
            simulated: true,
            ..self.clone()
        }
    }

    /// One persistence record per surviving flag.
    pub fn alert_records(&self) -> Vec<AlertRecord> {
        self.flags
            .iter()
            .map(|flag| AlertRecord {
                assessment_id: self.id.clone(),
                patient_id: self.patient.patient_id.clone(),
                drug: flag.drug.clone(),
                flag_type: flag.flag_type,
                severity: flag.severity,
                message: flag.message.clone(),
                expected: flag.expected.clone(),
                actual: flag.actual.clone(),
                rule_source: flag.rule_source.clone(),
                indication: flag.indication.clone(),
                created_at: self.assessed_at,
            })
            .collect()
    }
}

// ── Decoding ─────────────────────────────────────────────────────────────────

/// Wire shape of `DoseAssessment`, validated before it becomes one.
#[derive(Deserialize)]
struct AssessmentRecord {
    id: AssessmentId,
    patient: PatientRef,
    demographics: Demographics,
    renal: RenalFunction,
    medications: Vec<MedicationOrder>,
    indication: Option<Indication>,
    flags: Vec<DoseFlag>,
    max_severity: Option<Severity>,
    assessed_at: DateTime<Utc>,
    assessed_by: String,
    co_medications: Vec<MedicationOrder>,
    #[serde(default)]
    simulated: bool,
}

impl TryFrom<AssessmentRecord> for DoseAssessment {
    type Error = DoseError;

    fn try_from(r: AssessmentRecord) -> Result<Self, Self::Error> {
        let invalid = |reason: String| DoseError::InvalidInput { reason };

        if deduplicate_flags(r.flags.clone()).len() != r.flags.len() {
            return Err(invalid(format!(
                "assessment {} has more than one flag for the same drug and flag type",
                r.id.0
            )));
        }
        if r.flags.windows(2).any(|w| w[0].severity < w[1].severity) {
            return Err(invalid(format!("assessment {} flags are not ranked by severity", r.id.0)));
        }
        if !r.simulated && r.max_severity != max_severity(&r.flags) {
            return Err(invalid(format!(
                "assessment {} max_severity {:?} does not match its flags",
                r.id.0, r.max_severity
            )));
        }

        Ok(Self {
            id: r.id,
            patient: r.patient,
            demographics: r.demographics,
            renal: r.renal,
            medications: r.medications,
            indication: r.indication,
            flags: r.flags,
            max_severity: r.max_severity,
            assessed_at: r.assessed_at,
            assessed_by: r.assessed_by,
            co_medications: r.co_medications,
            simulated: r.simulated,
        })
    }
}

/// The row an external persistence collaborator stores for one flag.
///
/// Unique on (assessment_id, drug, flag_type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub assessment_id: AssessmentId,
    pub patient_id: String,
    pub drug: String,
    pub flag_type: FlagType,
    pub severity: Severity,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub rule_source: Option<String>,
    pub indication: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AlertRecord {
    pub fn key(&self) -> (&AssessmentId, &str, FlagType) {
        (&self.assessment_id, self.drug.as_str(), self.flag_type)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn assessed() -> DoseAssessment {
        let ctx = PatientContext::builder("p-json").indication("sepsis").build();
        let flags = vec![
            DoseFlag::new(FlagType::WrongInterval, Severity::Low, "cefazolin", "interval"),
            DoseFlag::new(FlagType::WrongRoute, Severity::Critical, "vancomycin", "route"),
        ];
        DoseAssessment::assemble(&ctx, flags, "test")
    }

    fn decode(value: Value) -> Result<DoseAssessment, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_assembled_assessment_round_trips() {
        let original = assessed();
        let back = decode(serde_json::to_value(&original).unwrap()).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_duplicate_flags_are_rejected() {
        let mut value = serde_json::to_value(assessed()).unwrap();
        let first = value["flags"][0].clone();
        value["flags"].as_array_mut().unwrap().insert(0, first);
        let err = decode(value).unwrap_err();
        assert!(err.to_string().contains("same drug and flag type"));
    }

    #[test]
    fn test_unranked_flags_are_rejected() {
        let mut value = serde_json::to_value(assessed()).unwrap();
        value["flags"].as_array_mut().unwrap().reverse();
        let err = decode(value).unwrap_err();
        assert!(err.to_string().contains("not ranked"));
    }

    #[test]
    fn test_max_severity_must_match_unless_simulated() {
        let mut value = serde_json::to_value(assessed()).unwrap();
        value["max_severity"] = json!("LOW");
        assert!(decode(value.clone()).is_err());

        value["simulated"] = json!(true);
        let simulated = decode(value).unwrap();
        assert_eq!(simulated.max_severity(), Some(Severity::Low));
        assert!(simulated.is_simulated());
    }
}
