use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::LabelError;

/// Public label text for one drug. Absent sections are empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DrugLabel {
    pub description: String,
    pub indications_and_usage: String,
    pub dosage_and_administration: String,
    pub warnings: String,
    pub adverse_reactions: String,
    pub drug_interactions: String,
}

impl DrugLabel {
    /// Label with only the interaction narrative set.
    pub fn with_interactions(text: impl Into<String>) -> Self {
        Self {
            drug_interactions: text.into(),
            ..Self::default()
        }
    }

    pub fn has_interactions(&self) -> bool {
        !self.drug_interactions.trim().is_empty()
    }
}

/// Remote drug-label lookup keyed by generic name.
///
/// `Ok(None)` means no matching record; errors cover transport, status and
/// payload failures. Callers in this crate treat both as "no information".
#[async_trait]
pub trait LabelSource: Send + Sync {
    async fn fetch_label(&self, generic_name: &str) -> Result<Option<DrugLabel>, LabelError>;
}

/// Canned outcome for one drug in [`MockLabelSource`].
enum MockOutcome {
    Label(DrugLabel),
    Status(u16),
    Unreachable,
}

/// Mock label source for testing: canned labels and failures per drug,
/// with a call counter.
pub struct MockLabelSource {
    outcomes: HashMap<String, MockOutcome>,
    fail_all: bool,
    calls: AtomicUsize,
}

impl MockLabelSource {
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
            fail_all: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every lookup fails with a connection error.
    pub fn unreachable() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    pub fn with_label(mut self, generic_name: &str, label: DrugLabel) -> Self {
        self.outcomes
            .insert(generic_name.to_lowercase(), MockOutcome::Label(label));
        self
    }

    pub fn with_interactions(self, generic_name: &str, text: &str) -> Self {
        self.with_label(generic_name, DrugLabel::with_interactions(text))
    }

    pub fn with_status(mut self, generic_name: &str, status: u16) -> Self {
        self.outcomes
            .insert(generic_name.to_lowercase(), MockOutcome::Status(status));
        self
    }

    pub fn with_unreachable(mut self, generic_name: &str) -> Self {
        self.outcomes
            .insert(generic_name.to_lowercase(), MockOutcome::Unreachable);
        self
    }

    /// Number of lookups performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockLabelSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LabelSource for MockLabelSource {
    async fn fetch_label(&self, generic_name: &str) -> Result<Option<DrugLabel>, LabelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_all {
            return Err(LabelError::Connection("mock://labels".into()));
        }

        match self.outcomes.get(&generic_name.to_lowercase()) {
            Some(MockOutcome::Label(label)) => Ok(Some(label.clone())),
            Some(MockOutcome::Status(status)) => Err(LabelError::Status {
                status: *status,
                body: String::new(),
            }),
            Some(MockOutcome::Unreachable) => {
                Err(LabelError::Connection("mock://labels".into()))
            }
            None => Ok(None),
        }
    }
}
