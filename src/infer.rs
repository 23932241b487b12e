//! Relationship inference engine.
//!
//! Scores one content item against a candidate pool and returns a bounded,
//! capped set of outbound relationships plus the reciprocals that must exist
//! for them. Pure with respect to its inputs: no persistence side effects,
//! and malformed input is reported through the outcome rather than panicking
//! across the boundary.

use std::sync::Arc;

use crate::content::ContentItem;
use crate::relationship::Relationship;
use crate::score::{RelationshipScorer, WeightedOverlapScorer};

/// Configuration for the inference engine.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Minimum strength for a scored pair to survive.
    pub min_strength: f32,
    /// Cap used when the caller does not supply one.
    pub default_cap: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            min_strength: 0.3,
            default_cap: 10,
        }
    }
}

/// Result of one inference pass.
#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    /// Outbound relationships, strongest first, at most `cap` of them.
    pub relationships: Vec<Relationship>,
    /// Reciprocal records that must exist for the outbound set.
    ///
    /// The caller persists these with create-if-absent semantics so a
    /// reciprocal never overwrites the endpoint's own computed relationship.
    pub reciprocals: Vec<Relationship>,
    /// False when the input was malformed; the lists are empty in that case.
    pub success: bool,
}

impl InferenceOutcome {
    fn failed() -> Self {
        Self {
            relationships: Vec::new(),
            reciprocals: Vec::new(),
            success: false,
        }
    }
}

/// Computes pairwise relationships for one item against a candidate pool.
pub struct InferenceEngine {
    config: InferenceConfig,
    scorer: Arc<dyn RelationshipScorer>,
}

impl InferenceEngine {
    /// Create an engine with the default overlap scorer.
    pub fn new(config: InferenceConfig) -> Self {
        Self {
            config,
            scorer: Arc::new(WeightedOverlapScorer::default()),
        }
    }

    /// Create an engine with a custom scorer.
    pub fn with_scorer(config: InferenceConfig, scorer: Arc<dyn RelationshipScorer>) -> Self {
        Self { config, scorer }
    }

    /// The configured default cap.
    pub fn default_cap(&self) -> usize {
        self.config.default_cap
    }

    /// Infer outbound relationships for `item` against `pool`.
    ///
    /// Scores every other candidate, discards pairs below the minimum
    /// strength, sorts survivors by strength descending (ties keep candidate
    /// pool order), and truncates to `cap`. Self-relationships and candidates
    /// without an id are skipped. An `item` without an id fails the pass.
    pub fn infer(&self, item: &ContentItem, pool: &[ContentItem], cap: usize) -> InferenceOutcome {
        if item.id.is_empty() {
            tracing::warn!("inference input has no content id, failing the pass");
            return InferenceOutcome::failed();
        }

        let mut relationships: Vec<Relationship> = Vec::new();
        for (idx, candidate) in pool.iter().enumerate() {
            if candidate.id.is_empty() {
                tracing::warn!(index = idx, "candidate without id skipped");
                continue;
            }
            if candidate.id == item.id {
                continue;
            }
            let Some(s) = self.scorer.score(item, candidate) else {
                continue;
            };
            if s.strength < self.config.min_strength {
                continue;
            }
            relationships.push(Relationship::new(
                &item.id,
                &candidate.id,
                s.kind,
                s.strength,
                s.confidence,
            ));
        }

        // Stable sort: ties keep candidate pool order, making the truncation
        // deterministic for fixed input.
        relationships.sort_by(|a, b| {
            b.strength
                .partial_cmp(&a.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        relationships.truncate(cap);

        let reciprocals = relationships.iter().map(Relationship::reciprocal).collect();

        InferenceOutcome {
            relationships,
            reciprocals,
            success: true,
        }
    }
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationship::RelationKind;

    fn item(id: &str, concepts: &[&str]) -> ContentItem {
        ContentItem::new(id, id).with_concepts(concepts.iter().copied())
    }

    fn engine() -> InferenceEngine {
        InferenceEngine::new(InferenceConfig::default())
    }

    #[test]
    fn infers_against_pool() {
        let a = item("a", &["rust", "ownership"]);
        let pool = vec![
            a.clone(),
            item("b", &["rust", "ownership"]),
            item("c", &["gardening"]),
        ];
        let outcome = engine().infer(&a, &pool, 10);
        assert!(outcome.success);
        assert_eq!(outcome.relationships.len(), 1);
        assert_eq!(outcome.relationships[0].target_id, "b");
        assert_eq!(outcome.relationships[0].kind, RelationKind::Similar);
    }

    #[test]
    fn self_relationship_rejected() {
        let a = item("a", &["rust"]);
        let outcome = engine().infer(&a, &[a.clone()], 10);
        assert!(outcome.success);
        assert!(outcome.relationships.is_empty());
    }

    #[test]
    fn missing_id_fails_without_panicking() {
        let mut a = item("a", &["rust"]);
        a.id = String::new();
        let outcome = engine().infer(&a, &[item("b", &["rust"])], 10);
        assert!(!outcome.success);
        assert!(outcome.relationships.is_empty());
        assert!(outcome.reciprocals.is_empty());
    }

    #[test]
    fn cap_truncates_strongest_first() {
        let a = item("a", &["rust", "async", "tokio"]);
        let pool = vec![
            item("weak", &["rust", "x", "y"]),
            item("strong", &["rust", "async", "tokio"]),
            item("mid", &["rust", "async", "z"]),
        ];
        let outcome = engine().infer(&a, &pool, 2);
        assert_eq!(outcome.relationships.len(), 2);
        assert_eq!(outcome.relationships[0].target_id, "strong");
        assert_eq!(outcome.relationships[1].target_id, "mid");
    }

    #[test]
    fn ties_break_by_pool_order() {
        let a = item("a", &["rust"]);
        let pool = vec![item("first", &["rust"]), item("second", &["rust"])];
        let outcome = engine().infer(&a, &pool, 1);
        assert_eq!(outcome.relationships.len(), 1);
        assert_eq!(outcome.relationships[0].target_id, "first");
    }

    #[test]
    fn below_threshold_discarded() {
        // Category-only match scores 0.2, below the 0.3 default threshold.
        let a = ContentItem::new("a", "a").with_category("tutorial");
        let pool = vec![ContentItem::new("b", "b").with_category("tutorial")];
        let outcome = engine().infer(&a, &pool, 10);
        assert!(outcome.success);
        assert!(outcome.relationships.is_empty());
    }

    #[test]
    fn reciprocal_emitted_per_retained_relationship() {
        let a = item("a", &["rust"]);
        let pool = vec![item("b", &["rust"]), item("c", &["rust"])];
        let outcome = engine().infer(&a, &pool, 10);
        assert_eq!(outcome.relationships.len(), outcome.reciprocals.len());
        for (rel, rev) in outcome.relationships.iter().zip(&outcome.reciprocals) {
            assert_eq!(rel.source_id, rev.target_id);
            assert_eq!(rel.target_id, rev.source_id);
        }
    }

    #[test]
    fn candidate_without_id_skipped() {
        let a = item("a", &["rust"]);
        let bad = item("", &["rust"]);
        let pool = vec![bad, item("b", &["rust"])];
        let outcome = engine().infer(&a, &pool, 10);
        assert!(outcome.success);
        assert_eq!(outcome.relationships.len(), 1);
        assert_eq!(outcome.relationships[0].target_id, "b");
    }
}
