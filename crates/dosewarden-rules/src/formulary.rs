//! Drug-name normalization.
//!
//! `FormularyResolver` maps order text ("Zosyn 4.5 g", "pip/tazo", "VANC")
//! to the generic names the rule tables are keyed by, together with the
//! classes each drug belongs to. The formulary is a static table indexed
//! once on first use.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use dosewarden_contracts::drug::{CanonicalDrug, DrugClass};
use dosewarden_core::traits::DrugResolver;

use crate::matching::{contains_phrase, normalize};

use DrugClass::*;

struct FormularyEntry {
    name: &'static str,
    classes: &'static [DrugClass],
    aliases: &'static [&'static str],
}

const fn entry(
    name: &'static str,
    classes: &'static [DrugClass],
    aliases: &'static [&'static str],
) -> FormularyEntry {
    FormularyEntry { name, classes, aliases }
}

static FORMULARY: &[FormularyEntry] = &[
    // ── Penicillins ──────────────────────────────────────────────────────────
    entry("penicillin g", &[Penicillin, BetaLactam], &["benzylpenicillin", "pen g", "pfizerpen", "bicillin"]),
    entry("penicillin v", &[Penicillin, BetaLactam], &["penicillin vk", "pen vk", "phenoxymethylpenicillin"]),
    entry("amoxicillin", &[Penicillin, BetaLactam], &["amoxil", "amox"]),
    entry(
        "amoxicillin-clavulanate",
        &[Penicillin, BetaLactam],
        &["augmentin", "amox clav", "amoxicillin clavulanic acid", "co amoxiclav"],
    ),
    entry("ampicillin", &[Penicillin, BetaLactam], &[]),
    entry("ampicillin-sulbactam", &[Penicillin, BetaLactam], &["unasyn", "amp sulbactam"]),
    entry("nafcillin", &[Penicillin, BetaLactam], &[]),
    entry("oxacillin", &[Penicillin, BetaLactam], &[]),
    entry("dicloxacillin", &[Penicillin, BetaLactam], &[]),
    entry(
        "piperacillin-tazobactam",
        &[Penicillin, BetaLactam],
        &["zosyn", "tazocin", "pip tazo", "piptazo", "pip tazobactam"],
    ),
    // ── Cephalosporins ───────────────────────────────────────────────────────
    entry("cefazolin", &[Cephalosporin, BetaLactam], &["ancef", "kefzol"]),
    entry("cephalexin", &[Cephalosporin, BetaLactam], &["keflex", "cefalexin"]),
    entry("cefuroxime", &[Cephalosporin, BetaLactam], &["zinacef", "ceftin"]),
    entry("cefoxitin", &[Cephalosporin, BetaLactam], &["mefoxin"]),
    entry("ceftriaxone", &[Cephalosporin, BetaLactam], &["rocephin", "ctx"]),
    entry("cefotaxime", &[Cephalosporin, BetaLactam], &["claforan"]),
    entry("ceftazidime", &[Cephalosporin, BetaLactam], &["fortaz", "tazicef"]),
    entry("ceftazidime-avibactam", &[Cephalosporin, BetaLactam], &["avycaz"]),
    entry("cefepime", &[Cephalosporin, BetaLactam], &["maxipime"]),
    entry("ceftaroline", &[Cephalosporin, BetaLactam], &["teflaro"]),
    entry("ceftolozane-tazobactam", &[Cephalosporin, BetaLactam], &["zerbaxa"]),
    // ── Carbapenems / monobactams ────────────────────────────────────────────
    entry("meropenem", &[Carbapenem, BetaLactam], &["merrem"]),
    entry("imipenem-cilastatin", &[Carbapenem, BetaLactam], &["imipenem", "primaxin"]),
    entry("ertapenem", &[Carbapenem, BetaLactam], &["invanz"]),
    entry("aztreonam", &[Monobactam, BetaLactam], &["azactam", "cayston"]),
    // ── Aminoglycosides ──────────────────────────────────────────────────────
    entry("gentamicin", &[Aminoglycoside], &["garamycin", "gent"]),
    entry("tobramycin", &[Aminoglycoside], &["tobi", "nebcin", "tobra"]),
    entry("amikacin", &[Aminoglycoside], &["amikin"]),
    // ── Fluoroquinolones ─────────────────────────────────────────────────────
    entry("ciprofloxacin", &[Fluoroquinolone, QtProlonging], &["cipro"]),
    entry("levofloxacin", &[Fluoroquinolone, QtProlonging], &["levaquin", "levo"]),
    entry("moxifloxacin", &[Fluoroquinolone, QtProlonging], &["avelox", "moxi"]),
    // ── Macrolides ───────────────────────────────────────────────────────────
    entry("azithromycin", &[Macrolide, QtProlonging], &["zithromax", "z pak", "azithro"]),
    entry("clarithromycin", &[Macrolide, QtProlonging], &["biaxin"]),
    entry("erythromycin", &[Macrolide, QtProlonging], &["ery tab", "erythrocin"]),
    // ── Tetracyclines ────────────────────────────────────────────────────────
    entry("doxycycline", &[Tetracycline], &["vibramycin", "doxy"]),
    entry("minocycline", &[Tetracycline], &["minocin"]),
    entry("tetracycline", &[Tetracycline], &[]),
    entry("tigecycline", &[Tetracycline], &["tygacil"]),
    // ── Other antibacterials ─────────────────────────────────────────────────
    entry("vancomycin", &[Glycopeptide], &["vancocin", "vanc", "vanco", "firvanq"]),
    entry(
        "sulfamethoxazole-trimethoprim",
        &[Sulfonamide],
        &[
            "bactrim",
            "bactrim ds",
            "septra",
            "smx tmp",
            "tmp smx",
            "co trimoxazole",
            "cotrimoxazole",
            "trimethoprim sulfamethoxazole",
        ],
    ),
    entry("daptomycin", &[Lipopeptide], &["cubicin", "dapto"]),
    entry("linezolid", &[Oxazolidinone], &["zyvox"]),
    entry("clindamycin", &[Lincosamide], &["cleocin", "clinda"]),
    entry("metronidazole", &[Nitroimidazole], &["flagyl"]),
    entry("nitrofurantoin", &[], &["macrobid", "macrodantin"]),
    entry("fidaxomicin", &[], &["dificid"]),
    entry("chloramphenicol", &[], &[]),
    entry("colistin", &[Polymyxin], &["colistimethate", "coly mycin"]),
    entry("polymyxin b", &[Polymyxin], &[]),
    entry("rifampin", &[Rifamycin], &["rifampicin", "rifadin"]),
    // ── Antifungals / antivirals ─────────────────────────────────────────────
    entry("fluconazole", &[AzoleAntifungal, QtProlonging], &["diflucan"]),
    entry("voriconazole", &[AzoleAntifungal, QtProlonging], &["vfend"]),
    entry("acyclovir", &[Antiviral], &["zovirax", "aciclovir"]),
    // ── Co-medications ───────────────────────────────────────────────────────
    entry("warfarin", &[Anticoagulant], &["coumadin", "jantoven"]),
    entry("apixaban", &[Anticoagulant], &["eliquis"]),
    entry("rivaroxaban", &[Anticoagulant], &["xarelto"]),
    entry("amiodarone", &[QtProlonging], &["cordarone", "pacerone"]),
    entry("sotalol", &[QtProlonging], &["betapace"]),
    entry("dofetilide", &[QtProlonging], &["tikosyn"]),
    entry("haloperidol", &[QtProlonging], &["haldol"]),
    entry("ondansetron", &[QtProlonging], &["zofran"]),
    entry("methadone", &[QtProlonging], &[]),
    entry("quetiapine", &[QtProlonging], &["seroquel"]),
    entry("citalopram", &[Ssri, QtProlonging], &["celexa"]),
    entry("escitalopram", &[Ssri, QtProlonging], &["lexapro"]),
    entry("sertraline", &[Ssri], &["zoloft"]),
    entry("fluoxetine", &[Ssri], &["prozac"]),
    entry("paroxetine", &[Ssri], &["paxil"]),
    entry("venlafaxine", &[Ssri], &["effexor"]),
    entry("duloxetine", &[Ssri], &["cymbalta"]),
    entry("phenelzine", &[Maoi], &["nardil"]),
    entry("selegiline", &[Maoi], &["emsam"]),
    entry("simvastatin", &[Statin], &["zocor"]),
    entry("lovastatin", &[Statin], &["mevacor"]),
    entry("atorvastatin", &[Statin], &["lipitor"]),
    entry("rosuvastatin", &[Statin], &["crestor"]),
    entry("furosemide", &[LoopDiuretic], &["lasix"]),
    entry("bumetanide", &[LoopDiuretic], &["bumex"]),
    entry("spironolactone", &[PotassiumSparing], &["aldactone"]),
    entry("eplerenone", &[PotassiumSparing], &["inspra"]),
    entry("amiloride", &[PotassiumSparing], &[]),
    entry("potassium chloride", &[PotassiumSparing], &["kcl", "klor con"]),
    entry("lisinopril", &[AceInhibitor], &["zestril", "prinivil"]),
    entry("enalapril", &[AceInhibitor], &["vasotec"]),
    entry("losartan", &[AceInhibitor], &["cozaar"]),
    entry("tacrolimus", &[CalcineurinInhibitor], &["prograf", "envarsus"]),
    entry("cyclosporine", &[CalcineurinInhibitor], &["neoral", "sandimmune", "ciclosporin"]),
    entry("valproic acid", &[Antiepileptic], &["valproate", "depakote", "divalproex", "depakene"]),
    entry("phenytoin", &[Antiepileptic], &["dilantin"]),
    entry("calcium carbonate", &[PolyvalentCation], &["tums", "os cal"]),
    entry("ferrous sulfate", &[PolyvalentCation], &["iron sulfate", "feosol"]),
    entry("magnesium oxide", &[PolyvalentCation], &["mag ox"]),
    entry("aluminum hydroxide", &[PolyvalentCation], &["amphojel"]),
    entry("sevelamer", &[PolyvalentCation], &["renvela", "renagel"]),
    entry("ibuprofen", &[Nsaid], &["motrin", "advil"]),
    entry("naproxen", &[Nsaid], &["naprosyn", "aleve"]),
    entry("ketorolac", &[Nsaid], &["toradol"]),
    entry("tizanidine", &[], &["zanaflex"]),
    entry("methotrexate", &[], &["trexall"]),
    entry("disulfiram", &[], &["antabuse"]),
];

/// Terms an allergy list uses for a whole class.
static CLASS_TERMS: &[(&str, DrugClass)] = &[
    ("penicillin", Penicillin),
    ("penicillins", Penicillin),
    ("pcn", Penicillin),
    ("cephalosporin", Cephalosporin),
    ("cephalosporins", Cephalosporin),
    ("carbapenem", Carbapenem),
    ("carbapenems", Carbapenem),
    ("monobactam", Monobactam),
    ("monobactams", Monobactam),
    ("aminoglycoside", Aminoglycoside),
    ("aminoglycosides", Aminoglycoside),
    ("quinolone", Fluoroquinolone),
    ("quinolones", Fluoroquinolone),
    ("fluoroquinolone", Fluoroquinolone),
    ("fluoroquinolones", Fluoroquinolone),
    ("macrolide", Macrolide),
    ("macrolides", Macrolide),
    ("tetracyclines", Tetracycline),
    ("glycopeptide", Glycopeptide),
    ("glycopeptides", Glycopeptide),
    ("sulfa", Sulfonamide),
    ("sulfa drugs", Sulfonamide),
    ("sulfonamide", Sulfonamide),
    ("sulfonamides", Sulfonamide),
    ("beta lactam", BetaLactam),
    ("beta lactams", BetaLactam),
];

struct Index {
    /// Normalized name or alias → formulary position.
    exact: HashMap<String, usize>,
    /// Same keys, longest first, for phrase search inside longer order text.
    by_length: Vec<(String, usize)>,
}

static INDEX: Lazy<Index> = Lazy::new(|| {
    let mut exact = HashMap::new();
    for (i, e) in FORMULARY.iter().enumerate() {
        for key in std::iter::once(&e.name).chain(e.aliases.iter()) {
            exact.entry(normalize(key)).or_insert(i);
        }
    }
    let mut by_length: Vec<(String, usize)> = exact.iter().map(|(k, v)| (k.clone(), *v)).collect();
    // Length first, then text, so the search order does not depend on hash order.
    by_length.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
    Index { exact, by_length }
});

/// The built-in formulary resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormularyResolver;

impl FormularyResolver {
    pub fn new() -> Self {
        Self
    }

    fn canonical(i: usize) -> CanonicalDrug {
        let e = &FORMULARY[i];
        CanonicalDrug {
            name: e.name.to_string(),
            classes: e.classes.to_vec(),
            known: true,
        }
    }
}

impl DrugResolver for FormularyResolver {
    /// Exact name or alias first, then the longest known name appearing as a
    /// phrase in the text ("vancomycin 125 mg capsule" → vancomycin).
    fn resolve(&self, raw_name: &str) -> CanonicalDrug {
        let text = normalize(raw_name);
        if let Some(&i) = INDEX.exact.get(&text) {
            return Self::canonical(i);
        }
        INDEX
            .by_length
            .iter()
            .find(|(key, _)| contains_phrase(&text, key))
            .map(|(_, i)| Self::canonical(*i))
            .unwrap_or_else(|| CanonicalDrug::unknown(text))
    }

    fn resolve_class(&self, term: &str) -> Option<DrugClass> {
        let text = normalize(term);
        let text = text.strip_suffix(" allergy").unwrap_or(&text);
        CLASS_TERMS
            .iter()
            .find(|(t, _)| *t == text)
            .map(|(_, c)| *c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(raw: &str) -> CanonicalDrug {
        FormularyResolver.resolve(raw)
    }

    #[test]
    fn test_aliases_resolve_to_generic_names() {
        assert_eq!(resolve("Zosyn").name, "piperacillin-tazobactam");
        assert_eq!(resolve("pip/tazo").name, "piperacillin-tazobactam");
        assert_eq!(resolve("piperacillin/tazobactam").name, "piperacillin-tazobactam");
        assert_eq!(resolve("VANC").name, "vancomycin");
        assert_eq!(resolve("Bactrim DS").name, "sulfamethoxazole-trimethoprim");
        assert_eq!(resolve("TMP-SMX").name, "sulfamethoxazole-trimethoprim");
    }

    #[test]
    fn test_longest_name_in_free_text_wins() {
        assert_eq!(resolve("ampicillin-sulbactam 3 g").name, "ampicillin-sulbactam");
        assert_eq!(resolve("vancomycin 125 mg capsule").name, "vancomycin");
        assert_eq!(resolve("ceftazidime avibactam").name, "ceftazidime-avibactam");
    }

    #[test]
    fn test_classes_come_with_the_drug() {
        let d = resolve("ceftriaxone");
        assert!(d.known);
        assert!(d.is(Cephalosporin));
        assert!(d.is(BetaLactam));
        assert!(resolve("levofloxacin").is(QtProlonging));
        assert!(resolve("citalopram").is(Ssri));
    }

    #[test]
    fn test_unknown_names_resolve_without_classes() {
        let d = resolve("Mystery-Mycin 500");
        assert!(!d.known);
        assert!(d.classes.is_empty());
        assert_eq!(d.name, "mystery mycin 500");
    }

    #[test]
    fn test_aliases_do_not_match_inside_words() {
        // "amox" must not be found inside "amoxapine".
        assert!(!resolve("amoxapine").known);
    }

    #[test]
    fn test_class_terms_resolve() {
        assert_eq!(FormularyResolver.resolve_class("Penicillins"), Some(Penicillin));
        assert_eq!(FormularyResolver.resolve_class("sulfa"), Some(Sulfonamide));
        assert_eq!(FormularyResolver.resolve_class("PCN allergy"), Some(Penicillin));
        assert_eq!(FormularyResolver.resolve_class("amoxicillin"), None);
    }
}
