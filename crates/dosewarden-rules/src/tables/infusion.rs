//! Extended-infusion candidates among time-dependent beta-lactams.

#[derive(Debug, Clone, Copy)]
pub struct ExtendedInfusionRule {
    pub drug: &'static str,
    /// Infusion time assumed when the order does not state one.
    pub default_minutes: u32,
    pub recommended_minutes: u32,
    /// Indications where extended infusion is specifically recommended.
    pub target_indications: &'static [&'static str],
    pub source: &'static str,
}

/// Indications that make any extended-infusion candidate a HIGH finding.
pub static HIGH_ACUITY_INDICATIONS: &[&str] = &[
    "septic shock",
    "severe sepsis",
    "sepsis",
    "shock",
    "critically ill",
    "critical illness",
    "icu",
];

const GRAM_NEGATIVE_TARGETS: &[&str] = &[
    "pseudomonas",
    "hospital acquired pneumonia",
    "hap",
    "ventilator associated pneumonia",
    "vap",
    "febrile neutropenia",
    "neutropenic fever",
    "gram negative",
];

pub static EXTENDED_INFUSION_RULES: &[ExtendedInfusionRule] = &[
    ExtendedInfusionRule {
        drug: "piperacillin-tazobactam",
        default_minutes: 30,
        recommended_minutes: 240,
        target_indications: &[
            "pseudomonas",
            "hospital acquired pneumonia",
            "hap",
            "ventilator associated pneumonia",
            "vap",
            "febrile neutropenia",
            "neutropenic fever",
            "intra abdominal",
            "gram negative",
        ],
        source: "Lodise et al. CID 2007; Surviving Sepsis Campaign 2021",
    },
    ExtendedInfusionRule {
        drug: "meropenem",
        default_minutes: 30,
        recommended_minutes: 180,
        target_indications: &[
            "pseudomonas",
            "esbl",
            "hospital acquired pneumonia",
            "hap",
            "ventilator associated pneumonia",
            "vap",
            "febrile neutropenia",
            "neutropenic fever",
        ],
        source: "BLING III trial 2024; Surviving Sepsis Campaign 2021",
    },
    ExtendedInfusionRule {
        drug: "cefepime",
        default_minutes: 30,
        recommended_minutes: 180,
        target_indications: GRAM_NEGATIVE_TARGETS,
        source: "Bauer et al. AAC 2013; Surviving Sepsis Campaign 2021",
    },
    ExtendedInfusionRule {
        drug: "ceftazidime",
        default_minutes: 30,
        recommended_minutes: 180,
        target_indications: GRAM_NEGATIVE_TARGETS,
        source: "Surviving Sepsis Campaign 2021",
    },
];

pub fn extended_infusion_rule(drug: &str) -> Option<&'static ExtendedInfusionRule> {
    EXTENDED_INFUSION_RULES.iter().find(|r| r.drug == drug)
}
