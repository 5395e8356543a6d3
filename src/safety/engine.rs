use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::{Allergy, Medication};

use super::allergies::AllergyConflictEvaluator;
use super::augmenter::LabelAugmenter;
use super::cache::LruMentionCache;
use super::interactions::InteractionEvaluator;
use super::knowledge::KnowledgeBase;
use super::label::LabelSource;
use super::openfda::OpenFdaClient;
use super::refills::RefillEvaluator;
use super::side_effects::{SideEffectProfile, SideEffectService};
use super::types::{AllergyConflict, Interaction, RefillStatus, SafetyError};

/// Everything one evaluation produced, stamped with its generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyReport {
    pub generation: u64,
    pub interactions: Vec<Interaction>,
    pub allergy_conflicts: Vec<AllergyConflict>,
    pub refills: RefillStatus,
}

/// Entry point for safety evaluation.
///
/// Each [`SafetyEngine::evaluate`] call takes the next generation number.
/// Callers that evaluate on every edit use [`SafetyEngine::is_latest`] (or
/// [`SafetyEngine::evaluate_latest`]) to drop results that finished after a
/// newer evaluation had already started.
pub struct SafetyEngine {
    knowledge: Arc<KnowledgeBase>,
    interactions: InteractionEvaluator,
    allergies: AllergyConflictEvaluator,
    refills: RefillEvaluator,
    side_effects: SideEffectService,
    generation: AtomicU64,
}

impl SafetyEngine {
    /// Built-in knowledge base with the openFDA client described by `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, SafetyError> {
        let client = OpenFdaClient::new(&config.openfda_base_url, config.request_timeout_secs)?;
        tracing::info!(
            base_url = %config.openfda_base_url,
            cache_capacity = config.cache_capacity,
            refill_window_days = config.refill_window_days,
            "Safety engine configured"
        );
        Ok(Self::with_source(config, KnowledgeBase::builtin(), Arc::new(client)))
    }

    pub fn with_source(
        config: &EngineConfig,
        knowledge: Arc<KnowledgeBase>,
        source: Arc<dyn LabelSource>,
    ) -> Self {
        let cache = Arc::new(LruMentionCache::new(config.cache_capacity, config.cache_ttl()));
        let augmenter = LabelAugmenter::new(source.clone(), cache, knowledge.clone());

        Self {
            interactions: InteractionEvaluator::new(knowledge.clone(), augmenter),
            allergies: AllergyConflictEvaluator::new(knowledge.clone()),
            refills: RefillEvaluator::new(config.refill_window_days),
            side_effects: SideEffectService::new(source, config.cache_capacity),
            knowledge,
            generation: AtomicU64::new(0),
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub async fn evaluate_interactions(&self, medications: &[Medication]) -> Vec<Interaction> {
        self.interactions.evaluate(medications).await
    }

    pub fn evaluate_allergy_conflicts(
        &self,
        medications: &[Medication],
        allergies: &[Allergy],
    ) -> Vec<AllergyConflict> {
        self.allergies.evaluate(medications, allergies)
    }

    pub fn evaluate_refill_status(&self, medications: &[Medication]) -> RefillStatus {
        self.refills.evaluate(medications)
    }

    pub async fn side_effects(&self, medication_name: &str) -> Option<SideEffectProfile> {
        self.side_effects.side_effects(medication_name).await
    }

    /// Run all three evaluators over one snapshot of the patient's lists.
    pub async fn evaluate(&self, medications: &[Medication], allergies: &[Allergy]) -> SafetyReport {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let start = Instant::now();

        let interactions = self.evaluate_interactions(medications).await;
        let allergy_conflicts = self.evaluate_allergy_conflicts(medications, allergies);
        let refills = self.evaluate_refill_status(medications);

        tracing::info!(
            generation,
            interactions = interactions.len(),
            allergy_conflicts = allergy_conflicts.len(),
            upcoming_refills = refills.upcoming.len(),
            overdue_refills = refills.overdue.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Safety evaluation complete"
        );

        SafetyReport {
            generation,
            interactions,
            allergy_conflicts,
            refills,
        }
    }

    /// True when no evaluation started after `report`'s.
    pub fn is_latest(&self, report: &SafetyReport) -> bool {
        report.generation == self.generation.load(Ordering::SeqCst)
    }

    /// Like [`Self::evaluate`], but `None` if a newer evaluation started
    /// before this one finished.
    pub async fn evaluate_latest(
        &self,
        medications: &[Medication],
        allergies: &[Allergy],
    ) -> Option<SafetyReport> {
        let report = self.evaluate(medications, allergies).await;
        if self.is_latest(&report) {
            Some(report)
        } else {
            tracing::debug!(generation = report.generation, "Discarding superseded safety report");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{Days, Local};

    use super::*;
    use crate::safety::label::{DrugLabel, MockLabelSource};
    use crate::safety::types::{ConflictReason, LabelError, Provenance, Severity};

    /// Label source that stalls on one drug.
    struct StallingSource {
        stall_on: &'static str,
    }

    #[async_trait]
    impl LabelSource for StallingSource {
        async fn fetch_label(&self, generic_name: &str) -> Result<Option<DrugLabel>, LabelError> {
            if generic_name == self.stall_on {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Ok(None)
        }
    }

    fn engine(source: Arc<dyn LabelSource>) -> SafetyEngine {
        SafetyEngine::with_source(&EngineConfig::default(), KnowledgeBase::builtin(), source)
    }

    fn meds(names: &[&str]) -> Vec<Medication> {
        names.iter().map(|n| Medication::new(*n)).collect()
    }

    #[test]
    fn from_config_builds_with_defaults() {
        let engine = SafetyEngine::from_config(&EngineConfig::default()).unwrap();
        assert!(!engine.knowledge().rules.is_empty());
    }

    #[tokio::test]
    async fn full_report() {
        let engine = engine(Arc::new(MockLabelSource::new()));
        let refill = Local::now()
            .date_naive()
            .checked_add_days(Days::new(2))
            .unwrap();
        let list = vec![
            Medication::new("Warfarin 5mg").with_refill_date(refill),
            Medication::new("Aspirin 81mg"),
            Medication::new("Amoxicillin 500mg"),
        ];
        let allergies = vec![Allergy::new("Penicillin")];

        let report = engine.evaluate(&list, &allergies).await;

        assert_eq!(report.generation, 1);
        assert!(report
            .interactions
            .iter()
            .any(|i| i.severity == Severity::Major && i.provenance == Provenance::ReferenceDatabase));
        assert!(report
            .allergy_conflicts
            .iter()
            .any(|c| c.medication == "Amoxicillin 500mg" && c.reason == ConflictReason::SameClass));
        assert_eq!(report.refills.upcoming.len(), 1);
        assert_eq!(report.refills.upcoming[0].days_until, 2);
        assert!(engine.is_latest(&report));
    }

    #[tokio::test]
    async fn generations_increase() {
        let engine = engine(Arc::new(MockLabelSource::new()));
        let first = engine.evaluate(&[], &[]).await;
        let second = engine.evaluate(&[], &[]).await;

        assert!(second.generation > first.generation);
        assert!(!engine.is_latest(&first));
        assert!(engine.is_latest(&second));
    }

    #[tokio::test]
    async fn superseded_evaluation_is_discarded() {
        let engine = engine(Arc::new(StallingSource { stall_on: "digoxin" }));
        let slow = meds(&["Digoxin 0.125mg", "Warfarin 5mg"]);
        let fast = meds(&["Metformin 500mg", "Lisinopril 10mg"]);

        let (stale, fresh) = tokio::join!(
            engine.evaluate_latest(&slow, &[]),
            engine.evaluate_latest(&fast, &[]),
        );

        assert!(stale.is_none());
        let fresh = fresh.unwrap();
        assert_eq!(fresh.generation, 2);
    }

    #[tokio::test]
    async fn remote_outage_does_not_fail_evaluation() {
        let engine = engine(Arc::new(MockLabelSource::unreachable()));
        let report = engine
            .evaluate(&meds(&["Warfarin 5mg", "Aspirin 81mg"]), &[])
            .await;
        assert_eq!(report.interactions.len(), 1);
    }

    #[tokio::test]
    async fn side_effects_through_engine() {
        let engine = engine(Arc::new(MockLabelSource::new()));
        assert!(engine.side_effects("Atorvastatin 20mg").await.is_some());
        assert!(engine.side_effects("Unlisted").await.is_none());
    }
}
