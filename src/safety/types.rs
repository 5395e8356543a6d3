use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Medication;

// ---------------------------------------------------------------------------
// Severity & Provenance
// ---------------------------------------------------------------------------

/// Interaction severity, ordered so `Major` sorts above `Moderate`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Moderate,
    Major,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moderate => "moderate",
            Self::Major => "major",
        }
    }
}

/// Where an interaction finding came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Curated offline knowledge base.
    #[serde(rename = "reference_database")]
    ReferenceDatabase,
    /// Best-effort match against a public drug label's interaction narrative.
    #[serde(rename = "openfda")]
    RemoteLabel,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReferenceDatabase => "reference_database",
            Self::RemoteLabel => "openfda",
        }
    }
}

// ---------------------------------------------------------------------------
// Interaction
// ---------------------------------------------------------------------------

/// One drug-drug safety finding. Names are the medications' display names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interaction {
    pub med1: String,
    pub med2: String,
    pub severity: Severity,
    pub description: String,
    pub guidance: String,
    pub provenance: Provenance,
}

// ---------------------------------------------------------------------------
// AllergyConflict
// ---------------------------------------------------------------------------

/// Why an allergy conflict was raised.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictReason {
    /// Medication and allergen names refer to each other.
    Direct,
    /// Medication belongs to the allergen's drug class.
    SameClass,
    /// Medication belongs to a class that cross-reacts with the allergen's class.
    CrossReactive,
    /// A curated rule links the allergen to the medication.
    TransitiveInteraction { description: String },
}

impl ConflictReason {
    /// Reason category without payload; one finding per category per pair.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::SameClass => "same_class",
            Self::CrossReactive => "cross_reactive",
            Self::TransitiveInteraction { .. } => "transitive_interaction",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllergyConflict {
    pub medication: String,
    /// Allergen as the patient entered it.
    pub allergy: String,
    pub reason: ConflictReason,
}

impl AllergyConflict {
    /// Allergen text annotated with the reason, as shown to the patient.
    pub fn annotated_allergy(&self) -> String {
        match &self.reason {
            ConflictReason::Direct => self.allergy.clone(),
            ConflictReason::SameClass => format!("{} (same drug class)", self.allergy),
            ConflictReason::CrossReactive => format!("{} (cross-reactivity)", self.allergy),
            ConflictReason::TransitiveInteraction { description } => {
                format!("{} (known interaction: {})", self.allergy, description)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RefillStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpcomingRefill {
    pub medication: Medication,
    pub days_until: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverdueRefill {
    pub medication: Medication,
    pub days_overdue: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RefillStatus {
    pub upcoming: Vec<UpcomingRefill>,
    pub overdue: Vec<OverdueRefill>,
}

impl RefillStatus {
    pub fn is_empty(&self) -> bool {
        self.upcoming.is_empty() && self.overdue.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Knowledge base load failed ({0}): {1}")]
    KnowledgeBaseLoad(String, String),

    #[error("Knowledge base parse failed ({0}): {1}")]
    KnowledgeBaseParse(String, String),

    #[error("Invalid knowledge base: {0}")]
    InvalidKnowledgeBase(String),

    #[error("Invalid configuration value for {key}: {value}")]
    Config { key: String, value: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

/// Failures at the remote label boundary. Never surfaced past the augmenter.
#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Label service unreachable at {0}")]
    Connection(String),

    #[error("Label request timed out after {0}s")]
    Timeout(u64),

    #[error("Label service returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Label response parsing error: {0}")]
    ResponseParsing(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}
