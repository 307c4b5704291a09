//! Guideline course lengths by indication.

/// Course length in days, inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Course {
    pub min_days: f64,
    pub max_days: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Subtype {
    pub keys: &'static [&'static str],
    pub course: Course,
}

#[derive(Debug, Clone, Copy)]
pub enum DurationRule {
    Flat(Course),
    /// Subtypes in priority order; the first is the representative course
    /// when the indication text names none of them.
    BySubtype(&'static [Subtype]),
}

#[derive(Debug, Clone, Copy)]
pub struct DurationEntry {
    pub keys: &'static [&'static str],
    pub rule: DurationRule,
    pub source: &'static str,
}

const fn course(min_days: f64, max_days: f64) -> Course {
    Course { min_days, max_days }
}

static BACTEREMIA_SUBTYPES: [Subtype; 4] = [
    Subtype { keys: &["gram negative", "gnr", "e coli", "klebsiella"], course: course(7.0, 14.0) },
    Subtype { keys: &["staphylococcus aureus", "s aureus", "mrsa", "mssa"], course: course(14.0, 42.0) },
    Subtype { keys: &["coagulase negative", "cons"], course: course(5.0, 7.0) },
    Subtype { keys: &["enterococcus", "enterococcal"], course: course(7.0, 14.0) },
];

static ENDOCARDITIS_SUBTYPES: [Subtype; 2] = [
    Subtype { keys: &["native valve"], course: course(28.0, 42.0) },
    Subtype { keys: &["prosthetic valve"], course: course(42.0, 56.0) },
];

pub static DURATION_TABLE: &[DurationEntry] = &[
    DurationEntry {
        keys: &["uncomplicated cystitis", "cystitis", "uncomplicated uti", "uti", "urinary tract infection"],
        rule: DurationRule::Flat(course(3.0, 7.0)),
        source: "IDSA Uncomplicated Cystitis and Pyelonephritis Guideline 2010",
    },
    DurationEntry {
        keys: &["complicated uti", "cauti", "catheter associated uti"],
        rule: DurationRule::Flat(course(7.0, 14.0)),
        source: "IDSA CAUTI Guideline 2009",
    },
    DurationEntry {
        keys: &["pyelonephritis"],
        rule: DurationRule::Flat(course(5.0, 14.0)),
        source: "IDSA Uncomplicated Cystitis and Pyelonephritis Guideline 2010",
    },
    DurationEntry {
        keys: &["community acquired pneumonia", "cap", "pneumonia"],
        rule: DurationRule::Flat(course(5.0, 7.0)),
        source: "ATS/IDSA Community-Acquired Pneumonia Guideline 2019",
    },
    DurationEntry {
        keys: &["hospital acquired pneumonia", "hap", "ventilator associated pneumonia", "vap"],
        rule: DurationRule::Flat(course(7.0, 8.0)),
        source: "IDSA/ATS HAP/VAP Guideline 2016",
    },
    DurationEntry {
        keys: &["cellulitis", "erysipelas"],
        rule: DurationRule::Flat(course(5.0, 10.0)),
        source: "IDSA Skin and Soft Tissue Infection Guideline 2014",
    },
    DurationEntry {
        keys: &["skin and soft tissue infection", "ssti", "abscess"],
        rule: DurationRule::Flat(course(5.0, 14.0)),
        source: "IDSA Skin and Soft Tissue Infection Guideline 2014",
    },
    DurationEntry {
        keys: &["bacteremia", "bloodstream infection", "bsi"],
        rule: DurationRule::BySubtype(&BACTEREMIA_SUBTYPES),
        source: "IDSA MRSA Guideline 2011; Yahav et al. CID 2019",
    },
    DurationEntry {
        keys: &["endocarditis", "infective endocarditis"],
        rule: DurationRule::BySubtype(&ENDOCARDITIS_SUBTYPES),
        source: "AHA Infective Endocarditis Scientific Statement 2015",
    },
    DurationEntry {
        keys: &["osteomyelitis"],
        rule: DurationRule::Flat(course(42.0, 56.0)),
        source: "IDSA Vertebral Osteomyelitis Guideline 2015",
    },
    DurationEntry {
        keys: &["septic arthritis"],
        rule: DurationRule::Flat(course(14.0, 28.0)),
        source: "IDSA Bone and Joint Infection references",
    },
    DurationEntry {
        keys: &["meningitis", "bacterial meningitis"],
        rule: DurationRule::Flat(course(7.0, 21.0)),
        source: "IDSA Bacterial Meningitis Guideline 2004",
    },
    DurationEntry {
        keys: &["intra abdominal infection", "intra abdominal", "iai", "peritonitis"],
        rule: DurationRule::Flat(course(4.0, 7.0)),
        source: "SIS/IDSA Intra-abdominal Infection Guideline 2017; STOP-IT trial",
    },
    DurationEntry {
        keys: &["c difficile", "clostridioides difficile", "clostridium difficile", "c diff", "cdi"],
        rule: DurationRule::Flat(course(10.0, 10.0)),
        source: "IDSA/SHEA C. difficile Guideline Update 2021",
    },
    DurationEntry {
        keys: &["sepsis", "severe sepsis", "septic shock"],
        rule: DurationRule::Flat(course(7.0, 10.0)),
        source: "Surviving Sepsis Campaign Guidelines 2021",
    },
    DurationEntry {
        keys: &["febrile neutropenia", "neutropenic fever"],
        rule: DurationRule::Flat(course(7.0, 14.0)),
        source: "IDSA Febrile Neutropenia Guideline 2010",
    },
    DurationEntry {
        keys: &["surgical prophylaxis", "perioperative prophylaxis"],
        rule: DurationRule::Flat(course(0.0, 1.0)),
        source: "ASHP/IDSA/SIS/SHEA Surgical Prophylaxis Guideline 2013",
    },
    DurationEntry {
        keys: &["strep pharyngitis", "streptococcal pharyngitis", "pharyngitis"],
        rule: DurationRule::Flat(course(10.0, 10.0)),
        source: "IDSA Group A Streptococcal Pharyngitis Guideline 2012",
    },
    DurationEntry {
        keys: &["acute otitis media", "otitis media"],
        rule: DurationRule::Flat(course(5.0, 10.0)),
        source: "AAP Acute Otitis Media Guideline 2013",
    },
    DurationEntry {
        keys: &["sinusitis", "acute bacterial rhinosinusitis"],
        rule: DurationRule::Flat(course(5.0, 7.0)),
        source: "IDSA Acute Bacterial Rhinosinusitis Guideline 2012",
    },
];

#[cfg(test)]
mod tests {
    use crate::matching::best_match;

    use super::*;

    #[test]
    fn test_specific_keys_beat_generic_ones() {
        let hap = best_match("ventilator-associated pneumonia", DURATION_TABLE, |e| e.keys).unwrap();
        assert!(hap.keys.contains(&"vap"));
        let cap = best_match("pneumonia", DURATION_TABLE, |e| e.keys).unwrap();
        assert!(cap.keys.contains(&"community acquired pneumonia"));
    }

    #[test]
    fn test_subtype_table_lists_representative_first() {
        match best_match("bacteremia", DURATION_TABLE, |e| e.keys).unwrap().rule {
            DurationRule::BySubtype(subtypes) => assert_eq!(subtypes[0].course, course(7.0, 14.0)),
            DurationRule::Flat(_) => panic!("bacteremia should be split by subtype"),
        }
    }
}
