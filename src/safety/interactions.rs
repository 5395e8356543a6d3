use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::models::Medication;

use super::augmenter::LabelAugmenter;
use super::knowledge::KnowledgeBase;
use super::matcher::{names_refer, pair_key};
use super::types::{Interaction, Provenance, Severity};

const LABEL_GUIDANCE: &str =
    "Review the full drug label or ask your pharmacist for details about this interaction.";

/// Pairwise drug-drug interaction evaluation.
///
/// Phase 1 checks every unordered pair against the curated rules. Phase 2
/// (only when an augmenter is configured) asks the remote label source which
/// known drugs each medication's label mentions and adds `moderate` findings
/// for pairs phase 1 did not cover. Phase 2 can only append.
pub struct InteractionEvaluator {
    knowledge: Arc<KnowledgeBase>,
    augmenter: Option<LabelAugmenter>,
}

impl InteractionEvaluator {
    pub fn new(knowledge: Arc<KnowledgeBase>, augmenter: LabelAugmenter) -> Self {
        Self {
            knowledge,
            augmenter: Some(augmenter),
        }
    }

    /// Knowledge-base only; never touches the network.
    pub fn offline(knowledge: Arc<KnowledgeBase>) -> Self {
        Self {
            knowledge,
            augmenter: None,
        }
    }

    /// All findings for `medications`: reference findings in pair order,
    /// then label-derived findings.
    pub async fn evaluate(&self, medications: &[Medication]) -> Vec<Interaction> {
        if medications.len() < 2 {
            return Vec::new();
        }

        let start = Instant::now();
        let mut found = HashSet::new();
        let mut interactions = self.reference_pass(medications, &mut found);
        let reference_count = interactions.len();

        if let Some(augmenter) = &self.augmenter {
            self.label_pass(augmenter, medications, &mut found, &mut interactions)
                .await;
        }

        tracing::info!(
            medications = medications.len(),
            reference = reference_count,
            label = interactions.len() - reference_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Interaction evaluation complete"
        );

        interactions
    }

    /// Phase 1 only. Synchronous, deterministic, no network.
    pub fn reference_findings(&self, medications: &[Medication]) -> Vec<Interaction> {
        let mut found = HashSet::new();
        self.reference_pass(medications, &mut found)
    }

    fn reference_pass(
        &self,
        medications: &[Medication],
        found: &mut HashSet<String>,
    ) -> Vec<Interaction> {
        let mut interactions = Vec::new();

        for (i, a) in medications.iter().enumerate() {
            for b in &medications[i + 1..] {
                let key = pair_key(&a.name, &b.name);
                if found.contains(&key) {
                    continue;
                }
                if let Some(rule) = self.knowledge.find_rule(&a.name, &b.name) {
                    found.insert(key);
                    interactions.push(Interaction {
                        med1: a.name.clone(),
                        med2: b.name.clone(),
                        severity: rule.severity,
                        description: rule.description.clone(),
                        guidance: rule.guidance.clone(),
                        provenance: Provenance::ReferenceDatabase,
                    });
                }
            }
        }

        interactions
    }

    async fn label_pass(
        &self,
        augmenter: &LabelAugmenter,
        medications: &[Medication],
        found: &mut HashSet<String>,
        interactions: &mut Vec<Interaction>,
    ) {
        for (i, a) in medications.iter().enumerate() {
            let mentioned = augmenter.mentioned_drugs(&a.name).await;
            if mentioned.is_empty() {
                continue;
            }

            for (j, b) in medications.iter().enumerate() {
                if i == j {
                    continue;
                }
                let key = pair_key(&a.name, &b.name);
                if found.contains(&key) {
                    continue;
                }
                if mentioned.iter().any(|drug| names_refer(&b.name, drug)) {
                    found.insert(key);
                    interactions.push(Interaction {
                        med1: a.name.clone(),
                        med2: b.name.clone(),
                        severity: Severity::Moderate,
                        description: format!(
                            "FDA labeling for {} mentions a potential interaction with {}.",
                            a.name, b.name
                        ),
                        guidance: LABEL_GUIDANCE.into(),
                        provenance: Provenance::RemoteLabel,
                    });
                }
            }
        }
    }
}
