//! Range-keyed rule tiers.
//!
//! Renal, neonatal and pediatric tables all select a row by where a measured
//! value (clearance, postmenstrual age, postnatal age) falls. A `Tier` covers
//! `[min, max)`; the first tier containing the value wins.

/// One row of a range-keyed table. `min` is inclusive, `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier<T> {
    pub min: f64,
    pub max: f64,
    pub value: T,
}

impl<T> Tier<T> {
    pub const fn new(min: f64, max: f64, value: T) -> Self {
        Self { min, max, value }
    }

    /// `[min, ∞)`.
    pub const fn at_least(min: f64, value: T) -> Self {
        Self::new(min, f64::INFINITY, value)
    }

    /// `(-∞, max)`.
    pub const fn below(max: f64, value: T) -> Self {
        Self::new(f64::NEG_INFINITY, max, value)
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.min && x < self.max
    }

    /// Human-readable range, e.g. "26-50", "≥ 51", "< 10".
    pub fn describe(&self) -> String {
        match (self.min.is_finite(), self.max.is_finite()) {
            (true, true) => format!("{}-{}", self.min, self.max),
            (true, false) => format!("≥ {}", self.min),
            (false, true) => format!("< {}", self.max),
            (false, false) => "any".to_string(),
        }
    }
}

/// The first tier whose range contains `x`.
pub fn select<T>(tiers: &'static [Tier<T>], x: f64) -> Option<&'static Tier<T>> {
    if x.is_nan() {
        return None;
    }
    tiers.iter().find(|t| t.contains(x))
}
