use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{Allergy, Medication};

use super::knowledge::{DrugClassFamily, KnowledgeBase};
use super::matcher::names_refer;
use super::types::{AllergyConflict, ConflictReason};

/// Allergy-vs-medication evaluation. Purely local.
///
/// Three passes, each able to raise one finding per (medication, allergy):
/// direct name match, drug-class membership (same class or a cross-reactive
/// class), and transitive relevance through a curated interaction rule.
pub struct AllergyConflictEvaluator {
    knowledge: Arc<KnowledgeBase>,
}

/// Dedup key: lowercased medication, lowercased allergen, reason category.
type SeenKey = (String, String, &'static str);

impl AllergyConflictEvaluator {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    pub fn evaluate(&self, medications: &[Medication], allergies: &[Allergy]) -> Vec<AllergyConflict> {
        let mut conflicts = Vec::new();
        if medications.is_empty() || allergies.is_empty() {
            return conflicts;
        }

        let mut seen: HashSet<SeenKey> = HashSet::new();
        self.direct_pass(medications, allergies, &mut seen, &mut conflicts);
        self.class_pass(medications, allergies, &mut seen, &mut conflicts);
        self.transitive_pass(medications, allergies, &mut seen, &mut conflicts);

        tracing::debug!(
            medications = medications.len(),
            allergies = allergies.len(),
            conflicts = conflicts.len(),
            "Allergy evaluation complete"
        );

        conflicts
    }

    fn direct_pass(
        &self,
        medications: &[Medication],
        allergies: &[Allergy],
        seen: &mut HashSet<SeenKey>,
        conflicts: &mut Vec<AllergyConflict>,
    ) {
        for med in medications {
            for allergy in allergies {
                if names_refer(&med.name, &allergy.name) {
                    push_unique(seen, conflicts, med, allergy, ConflictReason::Direct);
                }
            }
        }
    }

    fn class_pass(
        &self,
        medications: &[Medication],
        allergies: &[Allergy],
        seen: &mut HashSet<SeenKey>,
        conflicts: &mut Vec<AllergyConflict>,
    ) {
        for allergy in allergies {
            let Some(family) = self.knowledge.family_of(&allergy.name) else {
                continue;
            };

            // Members other than the ones naming the allergen itself.
            let siblings: Vec<&str> = family
                .members
                .iter()
                .map(String::as_str)
                .filter(|m| !names_refer(m, &allergy.name))
                .collect();
            let cross: Vec<&DrugClassFamily> =
                self.knowledge.cross_reactive_with(&family.name).collect();

            for med in medications {
                if siblings.iter().any(|m| names_refer(&med.name, m)) {
                    push_unique(seen, conflicts, med, allergy, ConflictReason::SameClass);
                }
                if cross.iter().any(|f| f.contains(&med.name)) {
                    push_unique(seen, conflicts, med, allergy, ConflictReason::CrossReactive);
                }
            }
        }
    }

    fn transitive_pass(
        &self,
        medications: &[Medication],
        allergies: &[Allergy],
        seen: &mut HashSet<SeenKey>,
        conflicts: &mut Vec<AllergyConflict>,
    ) {
        for allergy in allergies {
            for med in medications.iter().filter(|m| m.is_current()) {
                if let Some(rule) = self.knowledge.find_rule(&allergy.name, &med.name) {
                    let reason = ConflictReason::TransitiveInteraction {
                        description: rule.description.clone(),
                    };
                    push_unique(seen, conflicts, med, allergy, reason);
                }
            }
        }
    }
}

fn push_unique(
    seen: &mut HashSet<SeenKey>,
    conflicts: &mut Vec<AllergyConflict>,
    med: &Medication,
    allergy: &Allergy,
    reason: ConflictReason,
) {
    let key = (
        med.name.trim().to_lowercase(),
        allergy.name.trim().to_lowercase(),
        reason.category(),
    );
    if seen.insert(key) {
        conflicts.push(AllergyConflict {
            medication: med.name.clone(),
            allergy: allergy.name.clone(),
            reason,
        });
    }
}
