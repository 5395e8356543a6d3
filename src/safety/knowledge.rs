//! Curated offline reference data: pairwise interaction rules, drug-class
//! families for allergy cross-matching, and the vocabulary searched for in
//! remote label narratives.
//!
//! Sources: ONC High-Priority DDI list, FDA drug labels, clinical references.
//! General reference information, not medical advice.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use super::matcher::{lowered_refers, names_refer};
use super::types::{SafetyError, Severity};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Unordered pair of generic-name terms with severity and guidance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionRule {
    pub drug1: String,
    pub drug2: String,
    pub severity: Severity,
    pub description: String,
    pub guidance: String,
}

impl InteractionRule {
    /// True when the two names hit the rule in either orientation.
    pub fn matches(&self, a: &str, b: &str) -> bool {
        (names_refer(a, &self.drug1) && names_refer(b, &self.drug2))
            || (names_refer(a, &self.drug2) && names_refer(b, &self.drug1))
    }

    /// If one side of the rule refers to `name`, the term on the other side.
    pub fn counterpart(&self, name: &str) -> Option<&str> {
        if names_refer(name, &self.drug1) {
            Some(&self.drug2)
        } else if names_refer(name, &self.drug2) {
            Some(&self.drug1)
        } else {
            None
        }
    }
}

/// Named drug class with brand and generic member terms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrugClassFamily {
    pub name: String,
    pub members: Vec<String>,
}

impl DrugClassFamily {
    pub fn contains(&self, name: &str) -> bool {
        let lowered = name.trim().to_lowercase();
        self.members
            .iter()
            .any(|m| lowered_refers(&lowered, &m.trim().to_lowercase()))
    }
}

/// Two families known to cross-react despite distinct members.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrossReactivePair {
    pub class_a: String,
    pub class_b: String,
}

impl CrossReactivePair {
    /// The other family of the pair, if `family` is one of its sides.
    pub fn partner(&self, family: &str) -> Option<&str> {
        if self.class_a.eq_ignore_ascii_case(family) {
            Some(&self.class_b)
        } else if self.class_b.eq_ignore_ascii_case(family) {
            Some(&self.class_a)
        } else {
            None
        }
    }
}

/// Immutable reference data consumed by the evaluators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub rules: Vec<InteractionRule>,
    pub families: Vec<DrugClassFamily>,
    pub cross_reactive: Vec<CrossReactivePair>,
    #[serde(default = "builtin_vocabulary")]
    pub label_vocabulary: Vec<String>,
}

static BUILTIN: LazyLock<Arc<KnowledgeBase>> = LazyLock::new(|| Arc::new(KnowledgeBase::build()));

impl KnowledgeBase {
    /// Shared built-in knowledge base.
    pub fn builtin() -> Arc<KnowledgeBase> {
        Arc::clone(&BUILTIN)
    }

    fn build() -> Self {
        let rules = INTERACTION_RULES
            .iter()
            .map(|&(drug1, drug2, severity, description, guidance)| InteractionRule {
                drug1: drug1.into(),
                drug2: drug2.into(),
                severity,
                description: description.into(),
                guidance: guidance.into(),
            })
            .collect();

        let families = DRUG_CLASS_FAMILIES
            .iter()
            .map(|&(name, members)| DrugClassFamily {
                name: name.into(),
                members: members.iter().map(|m| m.to_string()).collect(),
            })
            .collect();

        let cross_reactive = CROSS_REACTIVE_CLASSES
            .iter()
            .map(|&(a, b)| CrossReactivePair {
                class_a: a.into(),
                class_b: b.into(),
            })
            .collect();

        Self {
            rules,
            families,
            cross_reactive,
            label_vocabulary: builtin_vocabulary(),
        }
    }

    /// Load a knowledge base from a JSON file with the same shape.
    pub fn load(path: &Path) -> Result<Self, SafetyError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SafetyError::KnowledgeBaseLoad(path.display().to_string(), e.to_string())
        })?;
        let mut kb: KnowledgeBase = serde_json::from_str(&json).map_err(|e| {
            SafetyError::KnowledgeBaseParse(path.display().to_string(), e.to_string())
        })?;
        kb.normalize();
        kb.validate()?;
        tracing::info!(
            path = %path.display(),
            rules = kb.rules.len(),
            families = kb.families.len(),
            "Loaded knowledge base"
        );
        Ok(kb)
    }

    /// Trim and lowercase every matching term so hand-edited files behave
    /// like the built-in tables.
    pub fn normalize(&mut self) {
        fn fold(term: &mut String) {
            *term = term.trim().to_lowercase();
        }
        for rule in &mut self.rules {
            fold(&mut rule.drug1);
            fold(&mut rule.drug2);
        }
        for family in &mut self.families {
            family.members.iter_mut().for_each(fold);
        }
        self.label_vocabulary.iter_mut().for_each(fold);
    }

    /// Reject data the evaluators cannot use: blank terms, empty families,
    /// duplicate family names, cross-reactive pairs naming unknown families.
    pub fn validate(&self) -> Result<(), SafetyError> {
        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.drug1.trim().is_empty() || rule.drug2.trim().is_empty() {
                return Err(SafetyError::InvalidKnowledgeBase(format!(
                    "rule {idx} has an empty drug term"
                )));
            }
        }

        let mut names = HashSet::new();
        for family in &self.families {
            if family.members.iter().all(|m| m.trim().is_empty()) {
                return Err(SafetyError::InvalidKnowledgeBase(format!(
                    "family '{}' has no members",
                    family.name
                )));
            }
            if !names.insert(family.name.to_lowercase()) {
                return Err(SafetyError::InvalidKnowledgeBase(format!(
                    "duplicate family '{}'",
                    family.name
                )));
            }
        }

        for pair in &self.cross_reactive {
            for side in [&pair.class_a, &pair.class_b] {
                if !names.contains(&side.to_lowercase()) {
                    return Err(SafetyError::InvalidKnowledgeBase(format!(
                        "cross-reactive pair names unknown family '{side}'"
                    )));
                }
            }
        }

        Ok(())
    }

    /// First family whose member list name-matches `name`.
    pub fn family_of(&self, name: &str) -> Option<&DrugClassFamily> {
        self.families.iter().find(|f| f.contains(name))
    }

    /// Family by its class name.
    pub fn family(&self, class_name: &str) -> Option<&DrugClassFamily> {
        self.families
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(class_name))
    }

    /// Families listed as cross-reactive with `class_name`.
    pub fn cross_reactive_with<'a>(
        &'a self,
        class_name: &'a str,
    ) -> impl Iterator<Item = &'a DrugClassFamily> + 'a {
        self.cross_reactive
            .iter()
            .filter_map(move |pair| pair.partner(class_name))
            .filter_map(move |partner| self.family(partner))
    }

    /// First rule hit by the pair, in table order.
    pub fn find_rule(&self, a: &str, b: &str) -> Option<&InteractionRule> {
        self.rules.iter().find(|r| r.matches(a, b))
    }
}

fn builtin_vocabulary() -> Vec<String> {
    LABEL_VOCABULARY.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Built-in tables
// ---------------------------------------------------------------------------

use Severity::{Major, Moderate};

const BLEEDING_NSAID: &str = "NSAIDs may increase bleeding risk with warfarin.";
const NSAID_GUIDANCE: &str = "Discuss alternative pain relievers with your provider.";
const POTASSIUM_RISE: &str = "May increase potassium levels, which could affect heart function.";
const POTASSIUM_GUIDANCE: &str = "Your provider should monitor potassium levels if taking both.";
const BP_NSAID: &str = "NSAIDs may reduce effectiveness of blood pressure medications.";
const BP_NSAID_GUIDANCE: &str = "Ask your pharmacist about alternative pain relievers.";
const STATIN_MACROLIDE: &str = "Clarithromycin may greatly increase statin levels, risking muscle damage.";
const SLOW_HEART: &str =
    "Both slow heart rate and combining them may cause dangerously slow heartbeat.";
const SLOW_HEART_GUIDANCE: &str = "This combination requires close cardiac monitoring.";
const SEROTONIN_TRAMADOL: &str =
    "Combining SSRIs with tramadol may increase risk of serotonin syndrome.";
const SEROTONIN_GUIDANCE: &str = "Watch for agitation, rapid heartbeat, fever, or muscle rigidity.";
const SEROTONIN_TRIPTAN: &str = "SSRIs with triptans may increase serotonin syndrome risk.";
const TRIPTAN_GUIDANCE: &str = "Report any unusual symptoms to your provider immediately.";
const OPIOID_BENZO: &str =
    "Combining opioids with benzodiazepines may cause dangerous sedation and breathing problems.";
const OPIOID_BENZO_GUIDANCE: &str = "FDA warns against combining these medications when possible.";
const AZOLE_DOAC_GUIDANCE: &str =
    "This combination should generally be avoided. Consult your provider.";

type RuleRow = (&'static str, &'static str, Severity, &'static str, &'static str);

const INTERACTION_RULES: &[RuleRow] = &[
    // Anticoagulants (bleeding risk)
    ("warfarin", "aspirin", Major, "May significantly increase bleeding risk when combined.", "Consult your healthcare provider about taking these together."),
    ("warfarin", "ibuprofen", Major, BLEEDING_NSAID, NSAID_GUIDANCE),
    ("warfarin", "naproxen", Major, BLEEDING_NSAID, NSAID_GUIDANCE),
    ("warfarin", "fluconazole", Major, "Fluconazole may increase warfarin levels, raising bleeding risk.", "Your provider may need to adjust warfarin dosage and monitor INR closely."),
    ("warfarin", "amiodarone", Major, "Amiodarone may increase warfarin levels significantly.", "Warfarin dose may need to be reduced. Close INR monitoring required."),
    ("warfarin", "metronidazole", Major, "Metronidazole may increase warfarin effect and bleeding risk.", "INR should be monitored closely during and after treatment."),
    ("warfarin", "amoxicillin", Moderate, "Some antibiotics, including amoxicillin, may increase warfarin effect and bleeding risk.", "INR may need closer monitoring during antibiotic treatment."),
    ("warfarin", "omeprazole", Moderate, "Omeprazole may affect warfarin metabolism.", "Monitor INR when starting or stopping omeprazole."),
    ("apixaban", "ketoconazole", Major, "Ketoconazole may significantly increase apixaban levels.", AZOLE_DOAC_GUIDANCE),
    ("rivaroxaban", "ketoconazole", Major, "Ketoconazole may significantly increase rivaroxaban levels.", AZOLE_DOAC_GUIDANCE),
    // ACE inhibitors / ARBs
    ("lisinopril", "losartan", Major, "Combining an ACE inhibitor with an ARB may increase risk of kidney problems, high potassium, and low blood pressure.", "This combination is generally not recommended. Ask your provider before taking both."),
    ("lisinopril", "spironolactone", Major, POTASSIUM_RISE, POTASSIUM_GUIDANCE),
    ("lisinopril", "potassium", Major, "ACE inhibitors with potassium supplements may cause dangerously high potassium.", "Do not take potassium supplements without your provider's guidance."),
    ("lisinopril", "ibuprofen", Moderate, BP_NSAID, BP_NSAID_GUIDANCE),
    ("lisinopril", "naproxen", Moderate, BP_NSAID, BP_NSAID_GUIDANCE),
    ("losartan", "spironolactone", Major, POTASSIUM_RISE, POTASSIUM_GUIDANCE),
    ("losartan", "potassium", Major, "ARBs with potassium supplements may cause dangerously high potassium.", "Do not take potassium supplements without your provider's guidance."),
    ("enalapril", "spironolactone", Major, POTASSIUM_RISE, POTASSIUM_GUIDANCE),
    // Statins
    ("simvastatin", "amlodipine", Moderate, "Amlodipine may increase simvastatin levels in the body.", "Your doctor may adjust dosages. Report any unusual muscle pain."),
    ("simvastatin", "amiodarone", Major, "Amiodarone may significantly increase simvastatin levels, raising risk of muscle damage.", "Simvastatin dose should not exceed 20mg with amiodarone."),
    ("simvastatin", "clarithromycin", Major, STATIN_MACROLIDE, "This combination should generally be avoided during antibiotic treatment."),
    ("atorvastatin", "clarithromycin", Major, STATIN_MACROLIDE, "Your provider may temporarily pause the statin during antibiotic treatment."),
    ("lovastatin", "erythromycin", Major, "Erythromycin may greatly increase statin levels, risking muscle damage.", "This combination should generally be avoided."),
    // Diabetes
    ("metformin", "contrast dye", Major, "Metformin may need to be stopped before procedures involving contrast dye.", "Inform your doctor and radiologist if you take metformin."),
    ("metformin", "alcohol", Moderate, "Alcohol may increase certain risks when combined with metformin.", "Discuss alcohol consumption with your healthcare provider."),
    ("glipizide", "fluconazole", Major, "Fluconazole may increase glipizide levels, causing dangerously low blood sugar.", "Blood sugar should be monitored closely during treatment."),
    ("insulin", "glipizide", Moderate, "Using both may increase risk of low blood sugar.", "Monitor blood sugar closely and know signs of hypoglycemia."),
    // Cardiac
    ("digoxin", "furosemide", Moderate, "Furosemide may lower potassium, increasing digoxin toxicity risk.", "Your provider may monitor potassium and digoxin levels."),
    ("digoxin", "amiodarone", Major, "Amiodarone may increase digoxin levels significantly.", "Digoxin dose typically needs to be reduced by half."),
    ("digoxin", "verapamil", Major, "Verapamil may increase digoxin levels.", "Your provider should monitor digoxin levels closely."),
    ("metoprolol", "verapamil", Major, SLOW_HEART, SLOW_HEART_GUIDANCE),
    ("atenolol", "verapamil", Major, SLOW_HEART, SLOW_HEART_GUIDANCE),
    // SSRIs
    ("sertraline", "tramadol", Major, SEROTONIN_TRAMADOL, SEROTONIN_GUIDANCE),
    ("fluoxetine", "tramadol", Major, SEROTONIN_TRAMADOL, SEROTONIN_GUIDANCE),
    ("sertraline", "sumatriptan", Moderate, SEROTONIN_TRIPTAN, TRIPTAN_GUIDANCE),
    ("fluoxetine", "sumatriptan", Moderate, SEROTONIN_TRIPTAN, TRIPTAN_GUIDANCE),
    ("fluoxetine", "warfarin", Moderate, "Fluoxetine may increase warfarin levels and bleeding risk.", "INR should be monitored when starting or stopping fluoxetine."),
    // Opioids
    ("oxycodone", "alprazolam", Major, OPIOID_BENZO, OPIOID_BENZO_GUIDANCE),
    ("hydrocodone", "alprazolam", Major, OPIOID_BENZO, OPIOID_BENZO_GUIDANCE),
    ("oxycodone", "diazepam", Major, OPIOID_BENZO, OPIOID_BENZO_GUIDANCE),
    ("tramadol", "alprazolam", Major, "Combining tramadol with benzodiazepines may cause dangerous sedation.", OPIOID_BENZO_GUIDANCE),
    // Antibiotics
    ("ciprofloxacin", "tizanidine", Major, "Ciprofloxacin may dramatically increase tizanidine levels, causing severe low blood pressure.", "This combination should be avoided."),
    ("ciprofloxacin", "theophylline", Major, "Ciprofloxacin may increase theophylline levels to toxic range.", "Theophylline levels should be monitored closely."),
    ("metronidazole", "alcohol", Major, "Alcohol with metronidazole may cause severe nausea, vomiting, and flushing.", "Avoid all alcohol during treatment and for 3 days after."),
    // Thyroid
    ("levothyroxine", "calcium", Moderate, "Calcium may reduce levothyroxine absorption.", "Take levothyroxine at least 4 hours apart from calcium supplements."),
    ("levothyroxine", "omeprazole", Moderate, "Omeprazole may reduce levothyroxine absorption.", "Thyroid levels may need monitoring when starting omeprazole."),
    ("levothyroxine", "iron", Moderate, "Iron supplements may reduce levothyroxine absorption.", "Take levothyroxine at least 4 hours apart from iron supplements."),
];

/// Class name and member terms (generic and brand). Order matters:
/// an allergen resolves to the first family that matches it.
const DRUG_CLASS_FAMILIES: &[(&str, &[&str])] = &[
    ("penicillin", &[
        "penicillin", "amoxicillin", "ampicillin", "piperacillin", "oxacillin", "nafcillin",
        "dicloxacillin", "flucloxacillin", "amoxil", "augmentin",
    ]),
    ("cephalosporin", &[
        "cephalosporin", "cephalexin", "cefazolin", "ceftriaxone", "cefuroxime", "cefixime",
        "cefpodoxime", "ceftazidime", "cefdinir", "keflex",
    ]),
    ("carbapenem", &["carbapenem", "imipenem", "meropenem", "ertapenem", "doripenem"]),
    ("sulfonamide", &[
        "sulfonamide", "sulfamethoxazole", "sulfasalazine", "sulfadiazine",
        "trimethoprim-sulfamethoxazole", "sulfisoxazole", "bactrim",
    ]),
    ("nsaid", &[
        "nsaid", "ibuprofen", "naproxen", "diclofenac", "indomethacin", "piroxicam", "meloxicam",
        "celecoxib", "aspirin", "advil", "motrin", "aleve",
    ]),
    ("statin", &[
        "atorvastatin", "rosuvastatin", "simvastatin", "pravastatin", "lovastatin", "fluvastatin",
        "pitavastatin", "lipitor", "zocor", "crestor",
    ]),
    ("ace inhibitor", &[
        "ace inhibitor", "lisinopril", "enalapril", "ramipril", "captopril", "benazepril",
        "fosinopril", "quinapril", "perindopril", "zestril", "prinivil",
    ]),
    ("arb", &[
        "angiotensin receptor blocker", "losartan", "valsartan", "irbesartan", "candesartan",
        "olmesartan", "telmisartan", "cozaar", "diovan",
    ]),
    ("opioid", &[
        "opioid", "morphine", "codeine", "hydrocodone", "oxycodone", "tramadol", "fentanyl",
        "methadone", "hydromorphone",
    ]),
    ("fluoroquinolone", &[
        "fluoroquinolone", "ciprofloxacin", "levofloxacin", "moxifloxacin", "norfloxacin",
        "ofloxacin", "cipro", "levaquin",
    ]),
    ("macrolide", &["macrolide", "azithromycin", "clarithromycin", "erythromycin", "zithromax"]),
    ("tetracycline", &["tetracycline", "doxycycline", "minocycline"]),
    ("benzodiazepine", &[
        "benzodiazepine", "alprazolam", "diazepam", "lorazepam", "clonazepam", "xanax", "valium",
        "ativan", "klonopin",
    ]),
    ("ssri", &[
        "ssri", "sertraline", "fluoxetine", "paroxetine", "citalopram", "escitalopram", "zoloft",
        "prozac", "lexapro",
    ]),
    ("beta blocker", &[
        "beta blocker", "metoprolol", "atenolol", "propranolol", "carvedilol", "bisoprolol",
        "nadolol", "labetalol",
    ]),
];

const CROSS_REACTIVE_CLASSES: &[(&str, &str)] = &[
    ("penicillin", "cephalosporin"),
    ("penicillin", "carbapenem"),
];

/// Well-known generic names searched for in label interaction narratives.
const LABEL_VOCABULARY: &[&str] = &[
    "warfarin", "aspirin", "ibuprofen", "naproxen", "acetaminophen",
    "metformin", "insulin", "glipizide", "glyburide",
    "lisinopril", "enalapril", "losartan", "valsartan", "amlodipine",
    "metoprolol", "atenolol", "propranolol", "carvedilol",
    "simvastatin", "atorvastatin", "rosuvastatin", "lovastatin", "pravastatin",
    "omeprazole", "pantoprazole", "esomeprazole", "lansoprazole",
    "sertraline", "fluoxetine", "paroxetine", "citalopram", "escitalopram",
    "amiodarone", "digoxin", "verapamil", "diltiazem",
    "furosemide", "hydrochlorothiazide", "spironolactone",
    "alprazolam", "diazepam", "lorazepam", "clonazepam",
    "oxycodone", "hydrocodone", "tramadol", "morphine", "codeine",
    "gabapentin", "pregabalin", "carbamazepine", "phenytoin", "valproic acid",
    "ciprofloxacin", "levofloxacin", "azithromycin", "amoxicillin",
    "clarithromycin", "erythromycin", "metronidazole", "fluconazole",
    "ketoconazole", "itraconazole",
    "prednisone", "prednisolone", "dexamethasone",
    "levothyroxine", "lithium", "theophylline", "cyclosporine",
    "rivaroxaban", "apixaban", "dabigatran", "clopidogrel",
    "sumatriptan", "tizanidine",
];

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_validates() {
        let kb = KnowledgeBase::builtin();
        kb.validate().unwrap();
        assert!(kb.rules.len() >= 45);
        assert!(kb.label_vocabulary.len() >= 70);
    }

    #[test]
    fn builtin_is_shared() {
        assert!(Arc::ptr_eq(&KnowledgeBase::builtin(), &KnowledgeBase::builtin()));
    }

    #[test]
    fn rule_matches_both_orientations() {
        let kb = KnowledgeBase::builtin();
        let rule = kb.find_rule("Warfarin 5mg", "Aspirin 81mg").unwrap();
        assert_eq!(rule.severity, Severity::Major);
        let reversed = kb.find_rule("Aspirin 81mg", "Warfarin 5mg").unwrap();
        assert_eq!(rule, reversed);
    }

    #[test]
    fn ace_arb_rule_present() {
        let kb = KnowledgeBase::builtin();
        let rule = kb.find_rule("Lisinopril 10mg", "Losartan 50mg").unwrap();
        assert_eq!(rule.severity, Severity::Major);
    }

    #[test]
    fn no_rule_for_unrelated_pair() {
        let kb = KnowledgeBase::builtin();
        assert!(kb.find_rule("Metformin 500mg", "Atorvastatin 20mg").is_none());
    }

    #[test]
    fn counterpart_returns_other_side() {
        let rule = InteractionRule {
            drug1: "warfarin".into(),
            drug2: "amoxicillin".into(),
            severity: Severity::Moderate,
            description: String::new(),
            guidance: String::new(),
        };
        assert_eq!(rule.counterpart("Amoxicillin"), Some("warfarin"));
        assert_eq!(rule.counterpart("Warfarin 5mg"), Some("amoxicillin"));
        assert_eq!(rule.counterpart("Metformin"), None);
    }

    #[test]
    fn family_resolution() {
        let kb = KnowledgeBase::builtin();
        assert_eq!(kb.family_of("Penicillin").unwrap().name, "penicillin");
        assert_eq!(kb.family_of("Amoxicillin 500mg").unwrap().name, "penicillin");
        assert_eq!(kb.family_of("Keflex").unwrap().name, "cephalosporin");
        assert_eq!(kb.family_of("NSAIDs").unwrap().name, "nsaid");
        assert!(kb.family_of("Latex").is_none());
    }

    #[test]
    fn cross_reactive_lookup() {
        let kb = KnowledgeBase::builtin();
        let partners: Vec<&str> = kb
            .cross_reactive_with("penicillin")
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(partners, vec!["cephalosporin", "carbapenem"]);
        let back: Vec<&str> = kb
            .cross_reactive_with("cephalosporin")
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(back, vec!["penicillin"]);
        assert_eq!(kb.cross_reactive_with("statin").count(), 0);
    }

    #[test]
    fn validate_rejects_unknown_cross_family() {
        let mut kb = (*KnowledgeBase::builtin()).clone();
        kb.cross_reactive.push(CrossReactivePair {
            class_a: "penicillin".into(),
            class_b: "monobactam".into(),
        });
        assert!(matches!(
            kb.validate(),
            Err(SafetyError::InvalidKnowledgeBase(_))
        ));
    }

    #[test]
    fn validate_rejects_blank_rule_term() {
        let mut kb = (*KnowledgeBase::builtin()).clone();
        kb.rules[0].drug2 = "  ".into();
        assert!(kb.validate().is_err());
    }

    #[test]
    fn load_from_json_file() {
        let json = r#"{
            "rules": [{"drug1": "warfarin", "drug2": "aspirin", "severity": "major",
                       "description": "Bleeding.", "guidance": "Ask."}],
            "families": [{"name": "penicillin", "members": ["penicillin", "amoxicillin"]},
                         {"name": "cephalosporin", "members": ["cephalexin"]}],
            "cross_reactive": [{"class_a": "penicillin", "class_b": "cephalosporin"}]
        }"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let kb = KnowledgeBase::load(file.path()).unwrap();
        assert_eq!(kb.rules.len(), 1);
        assert_eq!(kb.families.len(), 2);
        assert_eq!(kb.label_vocabulary.len(), LABEL_VOCABULARY.len());
    }

    #[test]
    fn load_folds_mixed_case_terms() {
        let json = r#"{
            "rules": [{"drug1": " Warfarin", "drug2": "ASPIRIN", "severity": "major",
                       "description": "Bleeding.", "guidance": "Ask."}],
            "families": [{"name": "Penicillin", "members": ["Penicillin", " Amoxicillin "]},
                         {"name": "Cephalosporin", "members": ["Cephalexin"]}],
            "cross_reactive": [{"class_a": "Penicillin", "class_b": "Cephalosporin"}],
            "label_vocabulary": ["Aspirin", "DIGOXIN"]
        }"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let kb = KnowledgeBase::load(file.path()).unwrap();
        assert_eq!(kb.families[0].members, vec!["penicillin", "amoxicillin"]);
        assert_eq!(kb.label_vocabulary, vec!["aspirin", "digoxin"]);
        assert_eq!(kb.rules[0].drug1, "warfarin");

        let family = kb.family_of("Amoxicillin 500mg").unwrap();
        assert_eq!(family.name, "Penicillin");
        let cross: Vec<&str> = kb
            .cross_reactive_with(&family.name)
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(cross, vec!["Cephalosporin"]);
        assert!(kb.family_of("Cephalexin 250mg").is_some());
    }

    #[test]
    fn family_contains_ignores_member_case() {
        let family = DrugClassFamily {
            name: "Penicillin".into(),
            members: vec!["Penicillin".into(), "Amoxicillin".into()],
        };
        assert!(family.contains("amoxicillin 500mg"));
        assert!(family.contains("PENICILLIN"));
        assert!(!family.contains("Cephalexin"));
    }

    #[test]
    fn load_missing_file_errors() {
        let result = KnowledgeBase::load(Path::new("/nonexistent/kb.json"));
        assert!(matches!(result, Err(SafetyError::KnowledgeBaseLoad(_, _))));
    }

    #[test]
    fn load_malformed_json_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        let result = KnowledgeBase::load(file.path());
        assert!(matches!(result, Err(SafetyError::KnowledgeBaseParse(_, _))));
    }
}
