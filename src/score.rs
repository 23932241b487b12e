//! Pluggable relationship scoring.
//!
//! The inference engine delegates the "how related are these two items"
//! question to a [`RelationshipScorer`]. The built-in
//! [`WeightedOverlapScorer`] works from content attributes alone
//! (shared concepts, shared tags, category equality); richer scorers backed
//! by AI-generated summaries can be plugged in through the same trait.
//!
//! Contract: scores are in [0.0, 1.0] and deterministic for fixed input.

use std::collections::HashSet;

use crate::content::ContentItem;
use crate::relationship::RelationKind;

/// A scored candidate relationship, before thresholding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRelation {
    /// Chosen relationship kind.
    pub kind: RelationKind,
    /// Strength in [0.0, 1.0].
    pub strength: f32,
    /// Confidence in [0.0, 1.0], reflecting how many signals agreed.
    pub confidence: f32,
}

/// Scores a pair of content items.
///
/// Returns `None` when the pair shares no signal at all.
pub trait RelationshipScorer: Send + Sync {
    fn score(&self, item: &ContentItem, candidate: &ContentItem) -> Option<ScoredRelation>;
}

/// Default scorer: weighted overlap of concepts, tags, and category.
///
/// Overlap for concepts and tags is the overlap coefficient
/// (`|A ∩ B| / min(|A|, |B|)`), so a short concept list fully contained in a
/// longer one still scores 1.0. Kinds are chosen by a fixed rule over the
/// signals; only symmetric kinds are emitted so that reciprocals carry the
/// same kind.
#[derive(Debug, Clone)]
pub struct WeightedOverlapScorer {
    /// Weight of concept overlap in the strength sum.
    pub concept_weight: f32,
    /// Weight of tag overlap in the strength sum.
    pub tag_weight: f32,
    /// Weight of category equality in the strength sum.
    pub category_weight: f32,
}

impl Default for WeightedOverlapScorer {
    fn default() -> Self {
        Self {
            concept_weight: 0.5,
            tag_weight: 0.3,
            category_weight: 0.2,
        }
    }
}

/// Overlap coefficient of two string sets.
fn overlap(a: &[String], b: &[String]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let set: HashSet<&str> = a.iter().map(String::as_str).collect();
    let shared = b.iter().filter(|s| set.contains(s.as_str())).count();
    shared as f32 / a.len().min(b.len()) as f32
}

impl RelationshipScorer for WeightedOverlapScorer {
    fn score(&self, item: &ContentItem, candidate: &ContentItem) -> Option<ScoredRelation> {
        let concept_score = overlap(&item.concepts, &candidate.concepts);
        let tag_score = overlap(&item.tags, &candidate.tags);
        let category_score = match (&item.category, &candidate.category) {
            (Some(a), Some(b)) if a == b => 1.0,
            _ => 0.0,
        };

        let signals = [concept_score, tag_score, category_score]
            .iter()
            .filter(|s| **s > 0.0)
            .count();
        if signals == 0 {
            return None;
        }

        let strength = (self.concept_weight * concept_score
            + self.tag_weight * tag_score
            + self.category_weight * category_score)
            .clamp(0.0, 1.0);
        let confidence = signals as f32 / 3.0;

        let kind = if concept_score >= 0.5 {
            RelationKind::Similar
        } else if tag_score >= 0.5 {
            RelationKind::References
        } else {
            RelationKind::Related
        };

        Some(ScoredRelation {
            kind,
            strength,
            confidence,
        })
    }
}
