//! Patient context: the read-only input to one evaluation.
//!
//! The external data-acquisition collaborator builds one `PatientContext`
//! per cycle. Rule modules only ever receive `&PatientContext`, so nothing in
//! the evaluation path can mutate it. Every clinical field except the patient
//! identifier is optional: an absent field suppresses the checks that need it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{DoseError, DoseResult},
    medication::MedicationOrder,
};

/// Days per year used when converting between age units.
pub const DAYS_PER_YEAR: f64 = 365.25;

// ── Identifiers ──────────────────────────────────────────────────────────────

/// Identifiers carried through to the assessment and alert records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatientRef {
    pub patient_id: String,
    #[serde(default)]
    pub encounter_id: Option<String>,
}

// ── Demographics ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

/// Coarse age classification used by age-scoped rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    /// Under 28 days.
    Neonate,
    /// 28 days to under 1 year.
    Infant,
    /// 1 to under 12 years.
    Child,
    /// 12 to under 18 years.
    Adolescent,
    Adult,
}

impl AgeGroup {
    /// Classify an age given in years.
    pub fn from_years(age_years: f64) -> AgeGroup {
        let days = age_years * DAYS_PER_YEAR;
        if days < 28.0 {
            AgeGroup::Neonate
        } else if age_years < 1.0 {
            AgeGroup::Infant
        } else if age_years < 12.0 {
            AgeGroup::Child
        } else if age_years < 18.0 {
            AgeGroup::Adolescent
        } else {
            AgeGroup::Adult
        }
    }

    pub fn is_pediatric(&self) -> bool {
        !matches!(self, AgeGroup::Adult)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(default)]
    pub age_years: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    /// Gestational age at birth, for neonatal dosing.
    #[serde(default)]
    pub gestational_age_weeks: Option<f64>,
    #[serde(default)]
    pub bsa_m2: Option<f64>,
    #[serde(default)]
    pub sex: Option<Sex>,
}

impl Demographics {
    pub fn age_group(&self) -> Option<AgeGroup> {
        self.age_years.map(AgeGroup::from_years)
    }

    /// Postnatal age in days.
    pub fn postnatal_age_days(&self) -> Option<f64> {
        self.age_years.map(|y| y * DAYS_PER_YEAR)
    }

    /// Postmenstrual age in weeks: gestational age plus postnatal age.
    pub fn postmenstrual_age_weeks(&self) -> Option<f64> {
        match (self.gestational_age_weeks, self.postnatal_age_days()) {
            (Some(ga), Some(pna)) => Some(ga + pna / 7.0),
            _ => None,
        }
    }

    pub fn bmi(&self) -> Option<f64> {
        match (self.weight_kg, self.height_cm) {
            (Some(w), Some(h)) if h > 0.0 => {
                let m = h / 100.0;
                Some(w / (m * m))
            }
            _ => None,
        }
    }

    /// Recorded body-surface area, else Mosteller from height and weight.
    pub fn bsa(&self) -> Option<f64> {
        self.bsa_m2.or_else(|| match (self.weight_kg, self.height_cm) {
            (Some(w), Some(h)) if w > 0.0 && h > 0.0 => Some((w * h / 3600.0).sqrt()),
            _ => None,
        })
    }

    /// Ideal body weight by the Devine formula.
    pub fn ideal_body_weight(&self) -> Option<f64> {
        let height_in = self.height_cm? / 2.54;
        let base = match self.sex? {
            Sex::Male => 50.0,
            Sex::Female => 45.5,
        };
        Some(base + 2.3 * (height_in - 60.0))
    }

    /// Adjusted body weight: IBW + factor × (TBW − IBW).
    pub fn adjusted_body_weight(&self, factor: f64) -> Option<f64> {
        let ibw = self.ideal_body_weight()?;
        let tbw = self.weight_kg?;
        Some(ibw + factor * (tbw - ibw))
    }
}

// ── Renal ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialysisModality {
    /// Intermittent hemodialysis.
    Hemodialysis,
    Peritoneal,
    /// Continuous renal replacement therapy (CVVH, CVVHD, CVVHDF).
    Crrt,
    Unspecified,
}

impl DialysisModality {
    pub fn label(&self) -> &'static str {
        match self {
            DialysisModality::Hemodialysis => "intermittent hemodialysis",
            DialysisModality::Peritoneal => "peritoneal dialysis",
            DialysisModality::Crrt => "CRRT",
            DialysisModality::Unspecified => "dialysis",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenalFunction {
    /// mg/dL.
    #[serde(default)]
    pub serum_creatinine: Option<f64>,
    /// mL/min/1.73m².
    #[serde(default)]
    pub gfr: Option<f64>,
    /// Creatinine clearance, mL/min.
    #[serde(default)]
    pub crcl: Option<f64>,
    #[serde(default)]
    pub on_dialysis: bool,
    #[serde(default)]
    pub dialysis_modality: Option<DialysisModality>,
}

impl RenalFunction {
    /// The dialysis modality in effect, if the patient is on dialysis.
    pub fn dialysis(&self) -> Option<DialysisModality> {
        if self.on_dialysis || self.dialysis_modality.is_some() {
            Some(self.dialysis_modality.unwrap_or(DialysisModality::Unspecified))
        } else {
            None
        }
    }

    /// The clearance estimate used for tiering: GFR preferred, else CrCl.
    pub fn clearance(&self) -> Option<(RenalMeasure, f64)> {
        self.gfr
            .map(|v| (RenalMeasure::Gfr, v))
            .or_else(|| self.crcl.map(|v| (RenalMeasure::Crcl, v)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenalMeasure {
    Gfr,
    Crcl,
}

impl RenalMeasure {
    pub fn label(&self) -> &'static str {
        match self {
            RenalMeasure::Gfr => "GFR",
            RenalMeasure::Crcl => "CrCl",
        }
    }
}

// ── Allergies ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllergySeverity {
    Mild,
    Moderate,
    Severe,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllergyRecord {
    pub substance: String,
    #[serde(default = "unknown_severity")]
    pub severity: AllergySeverity,
    #[serde(default)]
    pub reaction: Option<String>,
}

fn unknown_severity() -> AllergySeverity {
    AllergySeverity::Unknown
}

/// Reaction keywords that mark an allergy as severe regardless of the
/// recorded severity field.
const SEVERE_REACTIONS: &[&str] = &[
    "anaphyla",
    "angioedema",
    "stevens-johnson",
    "stevens johnson",
    "sjs",
    "toxic epidermal",
    "dress",
    "airway",
    "throat swelling",
];

impl AllergyRecord {
    pub fn new(substance: impl Into<String>, severity: AllergySeverity, reaction: Option<&str>) -> Self {
        Self {
            substance: substance.into(),
            severity,
            reaction: reaction.map(str::to_string),
        }
    }

    /// Return true if the recorded reaction was severe or anaphylactic.
    pub fn is_severe(&self) -> bool {
        if self.severity == AllergySeverity::Severe {
            return true;
        }
        self.reaction
            .as_deref()
            .map(|r| {
                let r = r.to_lowercase();
                SEVERE_REACTIONS.iter().any(|k| r.contains(k))
            })
            .unwrap_or(false)
    }
}

// ── Indication ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicationSource {
    OrderComment,
    ProblemList,
    ClinicalNote,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indication {
    pub text: String,
    /// 0.0–1.0 confidence reported by the extracting collaborator.
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub source: Option<IndicationSource>,
}

impl Indication {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
            source: None,
        }
    }
}

// ── Context ──────────────────────────────────────────────────────────────────

/// Everything the rule modules see for one patient in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientContext {
    pub patient: PatientRef,
    #[serde(default)]
    pub demographics: Demographics,
    #[serde(default)]
    pub renal: RenalFunction,
    /// Active antimicrobial orders, in the order the collaborator supplied them.
    #[serde(default)]
    pub antimicrobials: Vec<MedicationOrder>,
    #[serde(default)]
    pub indication: Option<Indication>,
    /// Non-antimicrobial co-medications, checked for interactions.
    #[serde(default)]
    pub co_medications: Vec<MedicationOrder>,
    #[serde(default)]
    pub allergies: Vec<AllergyRecord>,
    /// Snapshot time; elapsed-time checks measure against this, not the wall clock.
    pub captured_at: DateTime<Utc>,
}

impl PatientContext {
    pub fn builder(patient_id: impl Into<String>) -> PatientContextBuilder {
        PatientContextBuilder::new(patient_id)
    }

    /// Decode a context from JSON and fill in derived order fields.
    pub fn from_json(json: &str) -> DoseResult<Self> {
        let mut ctx: PatientContext =
            serde_json::from_str(json).map_err(|e| DoseError::InvalidInput {
                reason: format!("failed to parse patient context JSON: {}", e),
            })?;
        if ctx.patient.patient_id.trim().is_empty() {
            return Err(DoseError::InvalidInput {
                reason: "patient_id must not be empty".to_string(),
            });
        }
        ctx.derive_orders();
        Ok(ctx)
    }

    pub fn indication_text(&self) -> Option<&str> {
        self.indication.as_ref().map(|i| i.text.as_str())
    }

    pub fn age_group(&self) -> Option<AgeGroup> {
        self.demographics.age_group()
    }

    fn derive_orders(&mut self) {
        let weight = self.demographics.weight_kg;
        for order in self
            .antimicrobials
            .iter_mut()
            .chain(self.co_medications.iter_mut())
        {
            order.derive(weight);
        }
    }
}

/// Builder for `PatientContext`, used by collaborators and tests.
#[derive(Debug, Clone)]
pub struct PatientContextBuilder {
    ctx: PatientContext,
}

impl PatientContextBuilder {
    fn new(patient_id: impl Into<String>) -> Self {
        Self {
            ctx: PatientContext {
                patient: PatientRef {
                    patient_id: patient_id.into(),
                    encounter_id: None,
                },
                demographics: Demographics::default(),
                renal: RenalFunction::default(),
                antimicrobials: Vec::new(),
                indication: None,
                co_medications: Vec::new(),
                allergies: Vec::new(),
                captured_at: Utc::now(),
            },
        }
    }

    pub fn encounter(mut self, id: impl Into<String>) -> Self {
        self.ctx.patient.encounter_id = Some(id.into());
        self
    }

    pub fn age_years(mut self, years: f64) -> Self {
        self.ctx.demographics.age_years = Some(years);
        self
    }

    pub fn age_days(mut self, days: f64) -> Self {
        self.ctx.demographics.age_years = Some(days / DAYS_PER_YEAR);
        self
    }

    pub fn weight_kg(mut self, kg: f64) -> Self {
        self.ctx.demographics.weight_kg = Some(kg);
        self
    }

    pub fn height_cm(mut self, cm: f64) -> Self {
        self.ctx.demographics.height_cm = Some(cm);
        self
    }

    pub fn sex(mut self, sex: Sex) -> Self {
        self.ctx.demographics.sex = Some(sex);
        self
    }

    pub fn gestational_age_weeks(mut self, weeks: f64) -> Self {
        self.ctx.demographics.gestational_age_weeks = Some(weeks);
        self
    }

    pub fn bsa_m2(mut self, bsa: f64) -> Self {
        self.ctx.demographics.bsa_m2 = Some(bsa);
        self
    }

    pub fn serum_creatinine(mut self, scr: f64) -> Self {
        self.ctx.renal.serum_creatinine = Some(scr);
        self
    }

    pub fn gfr(mut self, gfr: f64) -> Self {
        self.ctx.renal.gfr = Some(gfr);
        self
    }

    pub fn crcl(mut self, crcl: f64) -> Self {
        self.ctx.renal.crcl = Some(crcl);
        self
    }

    pub fn dialysis(mut self, modality: DialysisModality) -> Self {
        self.ctx.renal.on_dialysis = true;
        self.ctx.renal.dialysis_modality = Some(modality);
        self
    }

    pub fn antimicrobial(mut self, order: MedicationOrder) -> Self {
        self.ctx.antimicrobials.push(order);
        self
    }

    pub fn co_medication(mut self, order: MedicationOrder) -> Self {
        self.ctx.co_medications.push(order);
        self
    }

    pub fn indication(mut self, text: impl Into<String>) -> Self {
        self.ctx.indication = Some(Indication::new(text));
        self
    }

    pub fn indication_detail(mut self, indication: Indication) -> Self {
        self.ctx.indication = Some(indication);
        self
    }

    pub fn allergy(mut self, record: AllergyRecord) -> Self {
        self.ctx.allergies.push(record);
        self
    }

    pub fn captured_at(mut self, at: DateTime<Utc>) -> Self {
        self.ctx.captured_at = at;
        self
    }

    /// Finish the context, deriving per-kg doses from the recorded weight.
    pub fn build(mut self) -> PatientContext {
        self.ctx.derive_orders();
        self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_groups_follow_pediatric_cutoffs() {
        assert_eq!(AgeGroup::from_years(10.0 / DAYS_PER_YEAR), AgeGroup::Neonate);
        assert_eq!(AgeGroup::from_years(0.5), AgeGroup::Infant);
        assert_eq!(AgeGroup::from_years(6.0), AgeGroup::Child);
        assert_eq!(AgeGroup::from_years(15.0), AgeGroup::Adolescent);
        assert_eq!(AgeGroup::from_years(18.0), AgeGroup::Adult);
        assert!(AgeGroup::Adolescent.is_pediatric());
        assert!(!AgeGroup::Adult.is_pediatric());
    }

    #[test]
    fn test_devine_and_adjusted_weight() {
        let demo = Demographics {
            weight_kg: Some(130.0),
            height_cm: Some(177.8),
            sex: Some(Sex::Male),
            ..Default::default()
        };
        // 70 inches: 50 + 2.3 * 10 = 73 kg.
        let ibw = demo.ideal_body_weight().unwrap();
        assert!((ibw - 73.0).abs() < 0.01);
        let adj = demo.adjusted_body_weight(0.4).unwrap();
        assert!((adj - (73.0 + 0.4 * 57.0)).abs() < 0.01);
        assert!(demo.bmi().unwrap() > 40.0);
    }

    #[test]
    fn test_ideal_weight_needs_sex() {
        let demo = Demographics {
            height_cm: Some(170.0),
            ..Default::default()
        };
        assert_eq!(demo.ideal_body_weight(), None);
    }

    #[test]
    fn test_postmenstrual_age_adds_postnatal_weeks() {
        let demo = Demographics {
            age_years: Some(14.0 / DAYS_PER_YEAR),
            gestational_age_weeks: Some(30.0),
            ..Default::default()
        };
        let pma = demo.postmenstrual_age_weeks().unwrap();
        assert!((pma - 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_gfr_is_preferred_over_crcl() {
        let renal = RenalFunction {
            gfr: Some(42.0),
            crcl: Some(55.0),
            ..Default::default()
        };
        assert_eq!(renal.clearance(), Some((RenalMeasure::Gfr, 42.0)));
        let renal = RenalFunction {
            crcl: Some(55.0),
            ..Default::default()
        };
        assert_eq!(renal.clearance(), Some((RenalMeasure::Crcl, 55.0)));
    }

    #[test]
    fn test_dialysis_flag_without_modality_is_unspecified() {
        let renal = RenalFunction {
            on_dialysis: true,
            ..Default::default()
        };
        assert_eq!(renal.dialysis(), Some(DialysisModality::Unspecified));
        assert_eq!(RenalFunction::default().dialysis(), None);
    }

    #[test]
    fn test_anaphylaxis_reaction_is_severe() {
        let record = AllergyRecord::new("penicillin", AllergySeverity::Unknown, Some("Anaphylaxis"));
        assert!(record.is_severe());
        let record = AllergyRecord::new("penicillin", AllergySeverity::Mild, Some("rash"));
        assert!(!record.is_severe());
    }

    #[test]
    fn test_context_from_json_derives_order_fields() {
        let json = r#"{
            "patient": { "patient_id": "p-1" },
            "demographics": { "weight_kg": 50.0 },
            "antimicrobials": [{
                "order_id": "o-1",
                "drug_name": "cefazolin",
                "dose": 2,
                "dose_unit": "g",
                "interval": "q8h",
                "route": "IV",
                "start_time": "2026-03-01T08:00:00Z"
            }],
            "captured_at": "2026-03-02T08:00:00Z"
        }"#;
        let ctx = PatientContext::from_json(json).unwrap();
        let order = &ctx.antimicrobials[0];
        assert_eq!(order.daily_dose_mg, Some(6000.0));
        assert_eq!(order.daily_dose_mg_per_kg, Some(120.0));
    }

    #[test]
    fn test_context_from_json_rejects_garbage() {
        match PatientContext::from_json("{ not json") {
            Err(DoseError::InvalidInput { reason }) => {
                assert!(reason.contains("failed to parse patient context JSON"));
            }
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }
}
