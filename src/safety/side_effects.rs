//! Side-effect profiles: a curated table for frequently prescribed drugs,
//! with a fallback that mines the adverse-reactions section of the public
//! drug label.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use moka::sync::Cache;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::label::LabelSource;
use super::matcher::generic_term;

/// Side effects grouped by how often they occur.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SideEffectProfile {
    /// More than 10% of patients.
    pub common: Vec<String>,
    /// 1-10% of patients.
    pub less_common: Vec<String>,
    /// Under 1% but notable.
    pub rare: Vec<String>,
    /// Seek medical attention.
    pub serious: Vec<String>,
}

// ---------------------------------------------------------------------------
// Curated table
// ---------------------------------------------------------------------------

type ProfileRow = (&'static str, [&'static [&'static str]; 4]);

const CURATED_PROFILES: &[ProfileRow] = &[
    ("lisinopril", [
        &["Dry cough", "Dizziness", "Headache", "Fatigue"],
        &["Nausea", "Diarrhea", "Low blood pressure", "Rash"],
        &["Angioedema (face/lip swelling)", "High potassium"],
        &["Severe swelling of face/throat", "Difficulty breathing", "Chest pain"],
    ]),
    ("amlodipine", [
        &["Swelling in ankles/feet", "Dizziness", "Flushing", "Fatigue"],
        &["Headache", "Nausea", "Palpitations", "Drowsiness"],
        &["Gum overgrowth", "Mood changes"],
        &["Severe dizziness", "Rapid/irregular heartbeat", "Fainting"],
    ]),
    ("losartan", [
        &["Dizziness", "Fatigue", "Nasal congestion"],
        &["Back pain", "Diarrhea", "Low blood pressure"],
        &["High potassium", "Kidney function changes"],
        &["Severe dizziness/fainting", "Signs of high potassium"],
    ]),
    ("metoprolol", [
        &["Fatigue", "Dizziness", "Slow heartbeat", "Diarrhea"],
        &["Cold hands/feet", "Depression", "Shortness of breath", "Weight gain"],
        &["Wheezing", "Vivid dreams", "Hair loss"],
        &["Very slow heartbeat", "Severe dizziness", "Difficulty breathing"],
    ]),
    ("atorvastatin", [
        &["Muscle aches", "Joint pain", "Diarrhea", "Nausea"],
        &["Headache", "Insomnia", "Cold symptoms", "Gas"],
        &["Liver enzyme elevation", "Memory issues", "Increased blood sugar"],
        &["Severe muscle pain/weakness (rhabdomyolysis)", "Dark urine", "Yellowing skin"],
    ]),
    ("metformin", [
        &["Nausea", "Diarrhea", "Stomach upset", "Metallic taste"],
        &["Bloating", "Gas", "Loss of appetite", "Headache"],
        &["Vitamin B12 deficiency", "Lactic acidosis"],
        &["Severe nausea/vomiting", "Muscle pain", "Difficulty breathing", "Unusual fatigue"],
    ]),
    ("omeprazole", [
        &["Headache", "Stomach pain", "Nausea", "Diarrhea"],
        &["Gas", "Constipation", "Dizziness"],
        &["Vitamin B12 deficiency", "Magnesium deficiency", "Bone fracture risk"],
        &["Severe diarrhea (C. diff)", "Kidney problems", "Lupus-like symptoms"],
    ]),
    ("sertraline", [
        &["Nausea", "Diarrhea", "Insomnia", "Drowsiness", "Dry mouth"],
        &["Dizziness", "Tremor", "Decreased appetite", "Sexual dysfunction", "Sweating"],
        &["Serotonin syndrome", "Bleeding", "Low sodium"],
        &["Suicidal thoughts (especially in young adults)", "Serotonin syndrome", "Severe allergic reaction"],
    ]),
    ("alprazolam", [
        &["Drowsiness", "Dizziness", "Fatigue", "Memory impairment"],
        &["Slurred speech", "Blurred vision", "Appetite changes", "Constipation"],
        &["Paradoxical agitation", "Depression"],
        &["Severe drowsiness", "Difficulty breathing", "Dependence/withdrawal"],
    ]),
    ("levothyroxine", [
        &["Headache", "Insomnia", "Nervousness (if dose too high)"],
        &["Tremor", "Increased appetite", "Weight loss", "Sweating"],
        &["Hair loss (temporary)", "Chest pain", "Irregular heartbeat"],
        &["Chest pain", "Rapid/irregular heartbeat", "Signs of thyroid storm"],
    ]),
    ("warfarin", [
        &["Bleeding (bruising easily)", "Nausea"],
        &["Stomach pain", "Bloating", "Altered taste", "Hair loss"],
        &["Skin necrosis", "Purple toe syndrome"],
        &["Severe/uncontrollable bleeding", "Blood in urine/stool", "Coughing blood"],
    ]),
    ("amoxicillin", [
        &["Diarrhea", "Nausea", "Stomach upset", "Rash"],
        &["Vomiting", "Headache", "Vaginal yeast infection"],
        &["C. diff colitis", "Liver problems", "Seizures"],
        &["Severe allergic reaction (anaphylaxis)", "Severe diarrhea", "Yellowing skin"],
    ]),
    ("prednisone", [
        &["Increased appetite", "Weight gain", "Insomnia", "Mood changes"],
        &["Stomach upset", "Increased blood sugar", "Acne", "Fluid retention"],
        &["Osteoporosis (long-term)", "Cataracts", "Adrenal suppression"],
        &["Severe infection signs", "Vision changes", "Severe mood swings"],
    ]),
    ("tramadol", [
        &["Nausea", "Dizziness", "Constipation", "Headache", "Drowsiness"],
        &["Vomiting", "Sweating", "Dry mouth", "Fatigue"],
        &["Seizures", "Serotonin syndrome", "Respiratory depression"],
        &["Seizures", "Difficulty breathing", "Serotonin syndrome", "Dependence"],
    ]),
];

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn profile_from_row(row: &ProfileRow) -> SideEffectProfile {
    let [common, less_common, rare, serious] = row.1;
    SideEffectProfile {
        common: to_strings(common),
        less_common: to_strings(less_common),
        rare: to_strings(rare),
        serious: to_strings(serious),
    }
}

/// Curated profile for a display name: exact key, then first word, then
/// substring either way ("Lisinopril 10mg", brand/generic spellings).
pub fn curated_profile(name: &str) -> Option<SideEffectProfile> {
    let key = name.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }

    if let Some(row) = CURATED_PROFILES.iter().find(|(drug, _)| *drug == key) {
        return Some(profile_from_row(row));
    }

    let first_word = key.split_whitespace().next().unwrap_or_default();
    if let Some(row) = CURATED_PROFILES.iter().find(|(drug, _)| *drug == first_word) {
        return Some(profile_from_row(row));
    }

    CURATED_PROFILES
        .iter()
        .find(|(drug, _)| key.contains(drug) || drug.contains(key.as_str()))
        .map(profile_from_row)
}

// ---------------------------------------------------------------------------
// Label parsing
// ---------------------------------------------------------------------------

static RE_COMMON_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:most common|most frequent|commonly reported|common adverse|≥\s*\d+%)[^.]*?(?:include|are|were|:)\s*([^.]+)",
    )
    .unwrap()
});
static RE_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-zA-Z][a-zA-Z\s/]+?)\s*\(\s*\d+\.?\d*\s*%").unwrap());
static RE_BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-•]\s*([A-Za-z][^,\n]{2,40})").unwrap());
static RE_LIST_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",|;|\band\b").unwrap());
static RE_PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());

/// Upper-case first letter, lower-case the rest.
fn sentence_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Pull side-effect names out of free-text adverse-reactions narrative.
/// The first six become `common`, the next six `less_common`.
pub fn parse_adverse_reactions(text: &str) -> Option<SideEffectProfile> {
    if text.chars().count() < 20 {
        return None;
    }

    let mut effects: Vec<String> = Vec::new();

    for caps in RE_COMMON_PHRASE.captures_iter(text) {
        let list = &caps[1];
        effects.extend(
            RE_LIST_SPLIT
                .split(list)
                .map(|item| RE_PARENTHETICAL.replace_all(item, "").trim().to_string())
                .filter(|item| {
                    let len = item.chars().count();
                    len > 2 && len < 60 && !item.starts_with(|c: char| c.is_ascii_digit())
                }),
        );
    }

    for caps in RE_PERCENT.captures_iter(text) {
        let item = caps[1].trim();
        let len = item.chars().count();
        if len > 2 && len < 50 {
            effects.push(item.to_string());
        }
    }

    if effects.is_empty() {
        effects.extend(
            RE_BULLET
                .captures_iter(text)
                .map(|caps| caps[1].trim().to_string()),
        );
    }

    let mut seen = HashSet::new();
    let unique: Vec<String> = effects
        .iter()
        .map(|e| sentence_case(e))
        .filter(|e| seen.insert(e.clone()))
        .collect();

    if unique.is_empty() {
        return None;
    }

    Some(SideEffectProfile {
        common: unique.iter().take(6).cloned().collect(),
        less_common: unique.iter().skip(6).take(6).cloned().collect(),
        rare: Vec::new(),
        serious: Vec::new(),
    })
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Best available side-effect profile per medication, memoized.
pub struct SideEffectService {
    source: Arc<dyn LabelSource>,
    cache: Cache<String, Option<SideEffectProfile>>,
}

impl SideEffectService {
    pub fn new(source: Arc<dyn LabelSource>, capacity: u64) -> Self {
        Self {
            source,
            cache: Cache::new(capacity),
        }
    }

    /// Curated profile first; otherwise the parsed label adverse reactions.
    /// Lookup failures and unparsable labels yield `None` and are cached.
    pub async fn side_effects(&self, name: &str) -> Option<SideEffectProfile> {
        let key = name.trim().to_lowercase();
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let profile = match curated_profile(name) {
            Some(profile) => Some(profile),
            None => self.from_label(name).await,
        };

        self.cache.insert(key, profile.clone());
        profile
    }

    async fn from_label(&self, name: &str) -> Option<SideEffectProfile> {
        let generic = generic_term(name);
        if generic.is_empty() {
            return None;
        }

        match self.source.fetch_label(&generic).await {
            Ok(Some(label)) => parse_adverse_reactions(&label.adverse_reactions),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(drug = %generic, error = %e, "Side-effect label lookup failed");
                None
            }
        }
    }
}
