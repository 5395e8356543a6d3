use std::sync::Arc;

use super::cache::MentionCache;
use super::knowledge::KnowledgeBase;
use super::label::LabelSource;
use super::matcher::generic_term;

/// Finds which well-known drugs a medication's public label mentions in its
/// interaction narrative. Never fails: any lookup problem yields an empty
/// list, which is cached like a real answer.
pub struct LabelAugmenter {
    source: Arc<dyn LabelSource>,
    cache: Arc<dyn MentionCache>,
    knowledge: Arc<KnowledgeBase>,
}

impl LabelAugmenter {
    pub fn new(
        source: Arc<dyn LabelSource>,
        cache: Arc<dyn MentionCache>,
        knowledge: Arc<KnowledgeBase>,
    ) -> Self {
        Self {
            source,
            cache,
            knowledge,
        }
    }

    /// Vocabulary terms mentioned by the label of `name`, in vocabulary order.
    pub async fn mentioned_drugs(&self, name: &str) -> Vec<String> {
        let key = name.trim().to_lowercase();
        if key.is_empty() {
            return Vec::new();
        }

        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(drug = %key, mentions = cached.len(), "Label mention cache hit");
            return cached;
        }

        let generic = generic_term(name);
        let mentions = if generic.is_empty() {
            Vec::new()
        } else {
            self.lookup(&generic).await
        };

        self.cache.put(key, mentions.clone());
        mentions
    }

    async fn lookup(&self, generic: &str) -> Vec<String> {
        match self.source.fetch_label(generic).await {
            Ok(Some(label)) if label.has_interactions() => {
                let mentions = extract_mentions(
                    &label.drug_interactions,
                    generic,
                    &self.knowledge.label_vocabulary,
                );
                tracing::debug!(
                    drug = %generic,
                    mentions = mentions.len(),
                    "Extracted label interaction mentions"
                );
                mentions
            }
            Ok(Some(_)) => {
                tracing::debug!(drug = %generic, "Label has no interaction section");
                Vec::new()
            }
            Ok(None) => {
                tracing::debug!(drug = %generic, "No label found");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(drug = %generic, error = %e, "Label lookup failed, skipping augmentation");
                Vec::new()
            }
        }
    }
}

/// Vocabulary terms contained in `narrative`, excluding the queried drug.
pub fn extract_mentions(narrative: &str, queried: &str, vocabulary: &[String]) -> Vec<String> {
    let text = narrative.to_lowercase();
    let queried = queried.trim().to_lowercase();
    vocabulary
        .iter()
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty() && *term != queried && text.contains(term.as_str()))
        .collect()
}
