//! Medication order types.
//!
//! A `MedicationOrder` carries the order as written (dose, unit, interval
//! label, route) plus the fields derived from it: the interval normalized to
//! hours and the daily dose in milligrams (and per kilogram when the patient's
//! weight is known). Derived fields are computed once, when the owning
//! `PatientContext` is built, and are read-only afterwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw infusion-duration value that denotes a continuous infusion.
pub const CONTINUOUS_INFUSION_MINUTES: i64 = -1;

// ── Units ────────────────────────────────────────────────────────────────────

/// Unit of a single ordered dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseUnit {
    #[serde(alias = "microgram", alias = "ug")]
    Mcg,
    #[serde(alias = "milligram")]
    Mg,
    #[serde(alias = "gram", alias = "gm")]
    G,
    /// International units (penicillin G, polymyxin B). Not convertible to mass.
    #[serde(alias = "unit", alias = "iu")]
    Units,
}

impl DoseUnit {
    /// Parse a free-text unit label. Returns `None` for anything unrecognized.
    pub fn parse(label: &str) -> Option<DoseUnit> {
        match label.trim().to_lowercase().as_str() {
            "mcg" | "ug" | "µg" | "microgram" | "micrograms" => Some(DoseUnit::Mcg),
            "mg" | "milligram" | "milligrams" => Some(DoseUnit::Mg),
            "g" | "gm" | "gram" | "grams" => Some(DoseUnit::G),
            "unit" | "units" | "iu" => Some(DoseUnit::Units),
            _ => None,
        }
    }

    /// Multiplier that converts a value in this unit to milligrams.
    pub fn to_mg_factor(&self) -> Option<f64> {
        match self {
            DoseUnit::Mcg => Some(0.001),
            DoseUnit::Mg => Some(1.0),
            DoseUnit::G => Some(1000.0),
            DoseUnit::Units => None,
        }
    }
}

impl fmt::Display for DoseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DoseUnit::Mcg => "mcg",
            DoseUnit::Mg => "mg",
            DoseUnit::G => "g",
            DoseUnit::Units => "units",
        };
        f.write_str(s)
    }
}

// ── Route ────────────────────────────────────────────────────────────────────

/// Administration route.
///
/// Serialized as its short code ("IV", "PO", ...). Unrecognized routes are
/// kept verbatim in `Other` so no input is lost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Route {
    Intravenous,
    Oral,
    Intramuscular,
    Subcutaneous,
    Rectal,
    Inhaled,
    Topical,
    Intrathecal,
    Other(String),
}

impl Route {
    /// Parse a route label. Enteral tubes (NG, PEG) count as oral.
    pub fn parse(label: &str) -> Route {
        let normalized = label.trim().to_lowercase().replace(['.', '_'], "");
        match normalized.as_str() {
            "iv" | "ivpb" | "intravenous" | "ivp" | "iv push" | "iv piggyback" => Route::Intravenous,
            "po" | "oral" | "by mouth" | "ng" | "og" | "peg" | "gt" | "enteral" => Route::Oral,
            "im" | "intramuscular" => Route::Intramuscular,
            "sc" | "sq" | "subq" | "subcut" | "subcutaneous" => Route::Subcutaneous,
            "pr" | "rectal" | "per rectum" | "retention enema" | "enema" => Route::Rectal,
            "inh" | "inhaled" | "inhalation" | "neb" | "nebulized" => Route::Inhaled,
            "top" | "topical" => Route::Topical,
            "it" | "intrathecal" | "intraventricular" => Route::Intrathecal,
            _ => Route::Other(label.trim().to_string()),
        }
    }

    /// Short code used in messages and on the wire.
    pub fn code(&self) -> &str {
        match self {
            Route::Intravenous => "IV",
            Route::Oral => "PO",
            Route::Intramuscular => "IM",
            Route::Subcutaneous => "SC",
            Route::Rectal => "PR",
            Route::Inhaled => "INH",
            Route::Topical => "TOP",
            Route::Intrathecal => "IT",
            Route::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for Route {
    fn from(s: String) -> Self {
        Route::parse(&s)
    }
}

impl From<Route> for String {
    fn from(r: Route) -> Self {
        r.code().to_string()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ── Infusion duration ────────────────────────────────────────────────────────

/// How long each dose is infused.
///
/// On the wire this is a plain minute count, with
/// `CONTINUOUS_INFUSION_MINUTES` reserved for a continuous infusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum InfusionDuration {
    Minutes(u32),
    Continuous,
}

impl InfusionDuration {
    /// Minutes per dose, or `None` for a continuous infusion.
    pub fn minutes(&self) -> Option<u32> {
        match self {
            InfusionDuration::Minutes(m) => Some(*m),
            InfusionDuration::Continuous => None,
        }
    }
}

impl TryFrom<i64> for InfusionDuration {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        if raw == CONTINUOUS_INFUSION_MINUTES {
            return Ok(InfusionDuration::Continuous);
        }
        u32::try_from(raw)
            .map(InfusionDuration::Minutes)
            .map_err(|_| format!("invalid infusion duration {raw} minutes"))
    }
}

impl From<InfusionDuration> for i64 {
    fn from(d: InfusionDuration) -> Self {
        match d {
            InfusionDuration::Minutes(m) => i64::from(m),
            InfusionDuration::Continuous => CONTINUOUS_INFUSION_MINUTES,
        }
    }
}

// ── Interval parsing ─────────────────────────────────────────────────────────

/// Normalize an interval label ("q8h", "BID", "daily", "every 12 hours") to
/// hours between doses.
///
/// Returns `None` for one-time, continuous or unrecognized labels.
pub fn parse_interval_hours(label: &str) -> Option<f64> {
    let s = label.trim().to_lowercase();
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();

    let named = match compact.as_str() {
        "daily" | "qd" | "qday" | "oncedaily" | "q24" | "q24h" | "q24hr" | "q24hrs" => Some(24.0),
        "bid" | "twicedaily" => Some(12.0),
        "tid" | "threetimesdaily" => Some(8.0),
        "qid" | "fourtimesdaily" => Some(6.0),
        "qod" | "everyotherday" => Some(48.0),
        "weekly" | "qweek" | "qwk" => Some(168.0),
        "once" | "x1" | "stat" | "continuous" | "prn" => return None,
        _ => None,
    };
    if named.is_some() {
        return named;
    }

    // "q8h", "q8hr", "q12hrs", "q6-8h" (lower bound wins), "every8hours".
    let body = compact
        .strip_prefix("every")
        .or_else(|| compact.strip_prefix('q'))?;
    let digits: String = body
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let rest = &body[digits.len()..];
    let is_hours = rest.is_empty()
        || rest.starts_with('h')
        || rest.starts_with('-')
        || rest.starts_with("to");
    if !is_hours {
        return None;
    }
    digits.parse::<f64>().ok().filter(|h| *h > 0.0)
}

// ── Order ────────────────────────────────────────────────────────────────────

/// One active medication order.
///
/// Construct with `MedicationOrder::new` and the `with_*` helpers; the
/// derived fields (`frequency_hours`, `daily_dose_mg`, `daily_dose_mg_per_kg`)
/// are filled automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationOrder {
    /// Identifier assigned by the ordering system.
    pub order_id: String,
    /// Drug name as written on the order.
    pub drug_name: String,
    /// Single dose value in `dose_unit`.
    pub dose: f64,
    pub dose_unit: DoseUnit,
    /// Interval label as written ("q8h", "BID").
    pub interval: String,
    pub route: Route,
    /// Hours between doses, normalized from `interval`.
    #[serde(default)]
    pub frequency_hours: Option<f64>,
    /// Total daily dose in milligrams, when both mass unit and interval are known.
    #[serde(default)]
    pub daily_dose_mg: Option<f64>,
    /// `daily_dose_mg` divided by patient weight.
    #[serde(default)]
    pub daily_dose_mg_per_kg: Option<f64>,
    pub start_time: DateTime<Utc>,
    /// Scheduled stop, when the prescriber entered one.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub infusion: Option<InfusionDuration>,
}

impl MedicationOrder {
    /// Create an order and derive its interval and daily dose.
    pub fn new(
        order_id: impl Into<String>,
        drug_name: impl Into<String>,
        dose: f64,
        dose_unit: DoseUnit,
        interval: impl Into<String>,
        route: Route,
        start_time: DateTime<Utc>,
    ) -> Self {
        let mut order = Self {
            order_id: order_id.into(),
            drug_name: drug_name.into(),
            dose,
            dose_unit,
            interval: interval.into(),
            route,
            frequency_hours: None,
            daily_dose_mg: None,
            daily_dose_mg_per_kg: None,
            start_time,
            end_time: None,
            infusion: None,
        };
        order.derive(None);
        order
    }

    /// Set the per-dose infusion time in minutes.
    pub fn with_infusion_minutes(mut self, minutes: u32) -> Self {
        self.infusion = Some(InfusionDuration::Minutes(minutes));
        self
    }

    /// Mark the order as a continuous infusion.
    pub fn continuous(mut self) -> Self {
        self.infusion = Some(InfusionDuration::Continuous);
        self
    }

    /// Set a scheduled stop time.
    pub fn ending_at(mut self, end: DateTime<Utc>) -> Self {
        self.end_time = Some(end);
        self
    }

    /// Override the normalized frequency when the interval label is unusual.
    pub fn with_frequency_hours(mut self, hours: f64) -> Self {
        self.frequency_hours = Some(hours);
        self.derive(None);
        self
    }

    /// Single dose converted to milligrams, if the unit is a mass unit.
    pub fn dose_mg(&self) -> Option<f64> {
        self.dose_unit.to_mg_factor().map(|f| self.dose * f)
    }

    /// Doses per 24 hours, if the interval is known.
    pub fn doses_per_day(&self) -> Option<f64> {
        self.frequency_hours.filter(|h| *h > 0.0).map(|h| 24.0 / h)
    }

    /// The infusion duration as set on the order, if any.
    pub fn infusion_minutes(&self) -> Option<InfusionDuration> {
        self.infusion
    }

    /// Fill in derived fields. Called once when the owning context is built.
    ///
    /// An explicit `frequency_hours` is kept; otherwise it is parsed from the
    /// interval label.
    pub fn derive(&mut self, weight_kg: Option<f64>) {
        if self.frequency_hours.is_none() {
            self.frequency_hours = parse_interval_hours(&self.interval);
        }
        self.daily_dose_mg = match (self.dose_mg(), self.doses_per_day()) {
            (Some(mg), Some(n)) => Some(mg * n),
            _ => None,
        };
        self.daily_dose_mg_per_kg = match (self.daily_dose_mg, weight_kg) {
            (Some(daily), Some(w)) if w > 0.0 => Some(daily / w),
            _ => None,
        };
    }

    /// "4.5 g IV q6h" style summary used in flag `actual` text.
    pub fn describe(&self) -> String {
        format!(
            "{} {} {} {}",
            format_amount(self.dose),
            self.dose_unit,
            self.route,
            self.interval
        )
    }
}

/// Format a dose amount without a trailing ".0".
pub fn format_amount(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_interval_labels_normalize_to_hours() {
        assert_eq!(parse_interval_hours("q8h"), Some(8.0));
        assert_eq!(parse_interval_hours("Q12H"), Some(12.0));
        assert_eq!(parse_interval_hours("q6hr"), Some(6.0));
        assert_eq!(parse_interval_hours("every 12 hours"), Some(12.0));
        assert_eq!(parse_interval_hours("q6-8h"), Some(6.0));
        assert_eq!(parse_interval_hours("BID"), Some(12.0));
        assert_eq!(parse_interval_hours("daily"), Some(24.0));
        assert_eq!(parse_interval_hours("q48h"), Some(48.0));
        assert_eq!(parse_interval_hours("once"), None);
        assert_eq!(parse_interval_hours("continuous"), None);
        assert_eq!(parse_interval_hours("qam"), None);
    }

    #[test]
    fn test_daily_dose_is_derived_in_milligrams() {
        let order = MedicationOrder::new(
            "o-1",
            "piperacillin-tazobactam",
            4.5,
            DoseUnit::G,
            "q6h",
            Route::Intravenous,
            start(),
        );
        assert_eq!(order.frequency_hours, Some(6.0));
        assert_eq!(order.dose_mg(), Some(4500.0));
        assert_eq!(order.daily_dose_mg, Some(18000.0));
        assert_eq!(order.daily_dose_mg_per_kg, None);
    }

    #[test]
    fn test_per_kg_dose_requires_weight() {
        let mut order = MedicationOrder::new(
            "o-2",
            "vancomycin",
            1000.0,
            DoseUnit::Mg,
            "q12h",
            Route::Intravenous,
            start(),
        );
        order.derive(Some(80.0));
        assert_eq!(order.daily_dose_mg_per_kg, Some(25.0));
    }

    #[test]
    fn test_unit_doses_have_no_mass() {
        let order = MedicationOrder::new(
            "o-3",
            "penicillin g",
            4_000_000.0,
            DoseUnit::Units,
            "q4h",
            Route::Intravenous,
            start(),
        );
        assert_eq!(order.dose_mg(), None);
        assert_eq!(order.daily_dose_mg, None);
    }

    #[test]
    fn test_continuous_infusion_uses_sentinel_on_the_wire() {
        let json = serde_json::to_string(&InfusionDuration::Continuous).unwrap();
        assert_eq!(json, "-1");
        let decoded: InfusionDuration = serde_json::from_str("30").unwrap();
        assert_eq!(decoded, InfusionDuration::Minutes(30));
        assert!(serde_json::from_str::<InfusionDuration>("-5").is_err());
    }

    #[test]
    fn test_routes_parse_common_labels() {
        assert_eq!(Route::parse("IV"), Route::Intravenous);
        assert_eq!(Route::parse("p.o."), Route::Oral);
        assert_eq!(Route::parse("NG"), Route::Oral);
        assert_eq!(Route::parse("per rectum"), Route::Rectal);
        assert_eq!(Route::parse("nebulized"), Route::Inhaled);
        assert_eq!(Route::parse("intravitreal"), Route::Other("intravitreal".into()));
    }

    #[test]
    fn test_describe_reads_like_an_order_line() {
        let order = MedicationOrder::new(
            "o-4",
            "meropenem",
            1.0,
            DoseUnit::G,
            "q8h",
            Route::Intravenous,
            start(),
        );
        assert_eq!(order.describe(), "1 g IV q8h");
        assert_eq!(format_amount(337.5), "337.5");
    }
}
