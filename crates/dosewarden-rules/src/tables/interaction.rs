//! Antimicrobial / co-medication interaction pairs.
//!
//! Each side is a drug or a class. Pairs are unordered: a row matches when
//! the antimicrobial satisfies either side and the co-medication the other.

use dosewarden_contracts::{drug::{CanonicalDrug, DrugClass}, flag::Severity};

use crate::tables::DrugKey::{self, Class, Drug};

use DrugClass::*;

#[derive(Debug, Clone, Copy)]
pub struct Interaction {
    pub a: DrugKey,
    pub b: DrugKey,
    pub severity: Severity,
    pub mechanism: &'static str,
    pub recommendation: &'static str,
    pub source: &'static str,
}

impl Interaction {
    pub fn matches(&self, antimicrobial: &CanonicalDrug, co_medication: &CanonicalDrug) -> bool {
        (self.a.matches(antimicrobial) && self.b.matches(co_medication))
            || (self.b.matches(antimicrobial) && self.a.matches(co_medication))
    }
}

const LEXI: &str = "Lexicomp Drug Interactions";

pub static INTERACTIONS: &[Interaction] = &[
    Interaction {
        a: Drug("linezolid"),
        b: Class(Maoi),
        severity: Severity::Critical,
        mechanism: "additive MAO inhibition; hypertensive crisis and serotonin syndrome",
        recommendation: "avoid combination; choose an alternative to linezolid",
        source: LEXI,
    },
    Interaction {
        a: Drug("linezolid"),
        b: Class(Ssri),
        severity: Severity::High,
        mechanism: "linezolid is a reversible MAO inhibitor; serotonin syndrome risk",
        recommendation: "avoid if possible; otherwise monitor for serotonin toxicity for 2 weeks",
        source: "FDA Drug Safety Communication 2011: linezolid and serotonergic drugs",
    },
    Interaction {
        a: Drug("ciprofloxacin"),
        b: Drug("tizanidine"),
        severity: Severity::Critical,
        mechanism: "CYP1A2 inhibition raises tizanidine exposure ~10-fold; hypotension, sedation",
        recommendation: "contraindicated; use another antimicrobial",
        source: "Cipro prescribing information",
    },
    Interaction {
        a: Drug("clarithromycin"),
        b: Drug("simvastatin"),
        severity: Severity::Critical,
        mechanism: "strong CYP3A4 inhibition; rhabdomyolysis",
        recommendation: "contraindicated; hold the statin during therapy or use azithromycin",
        source: LEXI,
    },
    Interaction {
        a: Drug("clarithromycin"),
        b: Drug("lovastatin"),
        severity: Severity::Critical,
        mechanism: "strong CYP3A4 inhibition; rhabdomyolysis",
        recommendation: "contraindicated; hold the statin during therapy or use azithromycin",
        source: LEXI,
    },
    Interaction {
        a: Drug("erythromycin"),
        b: Drug("simvastatin"),
        severity: Severity::Critical,
        mechanism: "CYP3A4 inhibition; rhabdomyolysis",
        recommendation: "contraindicated; hold the statin during therapy",
        source: LEXI,
    },
    Interaction {
        a: Class(Carbapenem),
        b: Drug("valproic acid"),
        severity: Severity::Critical,
        mechanism: "carbapenems cut valproate levels by 60-100% within 24 h; breakthrough seizures",
        recommendation: "avoid; use a non-carbapenem or add an alternative antiepileptic",
        source: "Merrem prescribing information; Lexicomp",
    },
    Interaction {
        a: Drug("sulfamethoxazole-trimethoprim"),
        b: Drug("methotrexate"),
        severity: Severity::Critical,
        mechanism: "additive antifolate effect and reduced renal clearance; pancytopenia",
        recommendation: "avoid combination",
        source: LEXI,
    },
    Interaction {
        a: Drug("sulfamethoxazole-trimethoprim"),
        b: Drug("warfarin"),
        severity: Severity::High,
        mechanism: "CYP2C9 inhibition and protein-binding displacement; INR rise",
        recommendation: "prefer an alternative; otherwise reduce warfarin and check INR within 3-5 days",
        source: "ACCP Antithrombotic Therapy Guidelines; Lexicomp",
    },
    Interaction {
        a: Drug("metronidazole"),
        b: Drug("warfarin"),
        severity: Severity::High,
        mechanism: "CYP2C9 inhibition; INR rise and bleeding",
        recommendation: "reduce warfarin dose 25-35% and monitor INR",
        source: LEXI,
    },
    Interaction {
        a: Drug("fluconazole"),
        b: Drug("warfarin"),
        severity: Severity::High,
        mechanism: "CYP2C9 inhibition; INR rise",
        recommendation: "monitor INR closely; empiric warfarin reduction",
        source: LEXI,
    },
    Interaction {
        a: Drug("voriconazole"),
        b: Drug("warfarin"),
        severity: Severity::High,
        mechanism: "CYP2C9/3A4 inhibition; INR rise",
        recommendation: "monitor INR closely",
        source: LEXI,
    },
    Interaction {
        a: Drug("rifampin"),
        b: Drug("warfarin"),
        severity: Severity::High,
        mechanism: "potent CYP induction; loss of anticoagulation",
        recommendation: "expect large warfarin dose increases; monitor INR twice weekly",
        source: LEXI,
    },
    Interaction {
        a: Class(Fluoroquinolone),
        b: Drug("warfarin"),
        severity: Severity::Moderate,
        mechanism: "altered gut flora and CYP1A2 inhibition; INR rise",
        recommendation: "monitor INR",
        source: LEXI,
    },
    Interaction {
        a: Class(QtProlonging),
        b: Class(QtProlonging),
        severity: Severity::High,
        mechanism: "additive QTc prolongation; torsades de pointes",
        recommendation: "obtain baseline ECG and correct K/Mg, or choose a non-QT-prolonging agent",
        source: "CredibleMeds QTdrugs list",
    },
    Interaction {
        a: Drug("sulfamethoxazole-trimethoprim"),
        b: Class(PotassiumSparing),
        severity: Severity::High,
        mechanism: "trimethoprim blocks ENaC; additive hyperkalemia",
        recommendation: "monitor potassium within 3 days or avoid combination",
        source: "Antoniou et al. BMJ 2011",
    },
    Interaction {
        a: Drug("sulfamethoxazole-trimethoprim"),
        b: Class(AceInhibitor),
        severity: Severity::Moderate,
        mechanism: "trimethoprim blocks ENaC; hyperkalemia",
        recommendation: "monitor potassium",
        source: "Antoniou et al. BMJ 2011",
    },
    Interaction {
        a: Drug("rifampin"),
        b: Class(CalcineurinInhibitor),
        severity: Severity::High,
        mechanism: "CYP3A4 induction; subtherapeutic immunosuppression and rejection",
        recommendation: "avoid; if unavoidable, increase dose with daily levels",
        source: LEXI,
    },
    Interaction {
        a: Drug("clarithromycin"),
        b: Class(CalcineurinInhibitor),
        severity: Severity::High,
        mechanism: "CYP3A4 inhibition; calcineurin inhibitor toxicity",
        recommendation: "use azithromycin or reduce dose with close level monitoring",
        source: LEXI,
    },
    Interaction {
        a: Class(AzoleAntifungal),
        b: Class(CalcineurinInhibitor),
        severity: Severity::High,
        mechanism: "CYP3A4 inhibition; nephrotoxicity and neurotoxicity",
        recommendation: "empiric dose reduction with level monitoring",
        source: LEXI,
    },
    Interaction {
        a: Class(Aminoglycoside),
        b: Class(LoopDiuretic),
        severity: Severity::Moderate,
        mechanism: "additive ototoxicity and nephrotoxicity",
        recommendation: "monitor renal function and hearing; avoid volume depletion",
        source: LEXI,
    },
    Interaction {
        a: Class(Aminoglycoside),
        b: Class(CalcineurinInhibitor),
        severity: Severity::Moderate,
        mechanism: "additive nephrotoxicity",
        recommendation: "monitor creatinine and drug levels",
        source: LEXI,
    },
    Interaction {
        a: Drug("vancomycin"),
        b: Class(CalcineurinInhibitor),
        severity: Severity::Moderate,
        mechanism: "additive nephrotoxicity",
        recommendation: "monitor creatinine and trough or AUC",
        source: LEXI,
    },
    Interaction {
        a: Class(Fluoroquinolone),
        b: Class(PolyvalentCation),
        severity: Severity::Moderate,
        mechanism: "chelation reduces oral absorption by up to 90%",
        recommendation: "give the quinolone 2 h before or 6 h after the cation",
        source: LEXI,
    },
    Interaction {
        a: Class(Tetracycline),
        b: Class(PolyvalentCation),
        severity: Severity::Moderate,
        mechanism: "chelation reduces oral absorption",
        recommendation: "separate administration by at least 2-3 h",
        source: LEXI,
    },
    Interaction {
        a: Drug("daptomycin"),
        b: Class(Statin),
        severity: Severity::Moderate,
        mechanism: "additive myopathy; CPK elevation",
        recommendation: "consider holding the statin; check CPK weekly",
        source: "Cubicin prescribing information",
    },
    Interaction {
        a: Drug("metronidazole"),
        b: Drug("disulfiram"),
        severity: Severity::High,
        mechanism: "acute psychosis and confusion",
        recommendation: "avoid within 2 weeks of disulfiram",
        source: LEXI,
    },
    Interaction {
        a: Class(Fluoroquinolone),
        b: Class(Nsaid),
        severity: Severity::Low,
        mechanism: "GABA antagonism; lowered seizure threshold",
        recommendation: "monitor in patients with seizure history",
        source: LEXI,
    },
];
