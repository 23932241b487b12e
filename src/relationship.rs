//! Relationship model.
//!
//! A [`Relationship`] is a directed, typed, weighted link between two content
//! items. Relationship ids are deterministic functions of the endpoint pair,
//! so re-inference supersedes the existing record in place and the reciprocal
//! id is derivable without an index lookup.

use serde::{Deserialize, Serialize};

/// Semantic type of a relationship between two content items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Substantially overlapping subject matter.
    Similar,
    /// The source extends or continues the target.
    BuildsOn,
    /// The source disputes the target.
    Contradicts,
    /// The source cites or links the target.
    References,
    /// Weaker topical association.
    Related,
}

impl RelationKind {
    /// All kinds, in declaration order.
    pub const ALL: [RelationKind; 5] = [
        RelationKind::Similar,
        RelationKind::BuildsOn,
        RelationKind::Contradicts,
        RelationKind::References,
        RelationKind::Related,
    ];

    /// Stable label used in serialized form and diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            RelationKind::Similar => "similar",
            RelationKind::BuildsOn => "builds_on",
            RelationKind::Contradicts => "contradicts",
            RelationKind::References => "references",
            RelationKind::Related => "related",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Deterministic relationship id for a source → target pair.
pub fn relationship_id(source_id: &str, target_id: &str) -> String {
    format!("rel:{source_id}->{target_id}")
}

/// A directed relationship between two content items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Deterministic id (`rel:<source>-><target>`).
    pub id: String,
    /// Content id of the source item.
    pub source_id: String,
    /// Content id of the target item.
    pub target_id: String,
    /// Semantic type.
    pub kind: RelationKind,
    /// Strength in [0.0, 1.0].
    pub strength: f32,
    /// Confidence in [0.0, 1.0].
    pub confidence: f32,
    /// Creation timestamp (seconds since UNIX epoch).
    pub created_at: u64,
    /// Last update timestamp (seconds since UNIX epoch).
    pub last_updated: u64,
}

impl Relationship {
    /// Create a relationship with clamped scores and current timestamps.
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        kind: RelationKind,
        strength: f32,
        confidence: f32,
    ) -> Self {
        let source_id = source_id.into();
        let target_id = target_id.into();
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            id: relationship_id(&source_id, &target_id),
            source_id,
            target_id,
            kind,
            strength: strength.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            created_at: now,
            last_updated: now,
        }
    }

    /// The reverse relationship, carrying the same kind and scores.
    pub fn reciprocal(&self) -> Relationship {
        Relationship::new(
            self.target_id.clone(),
            self.source_id.clone(),
            self.kind,
            self.strength,
            self.confidence,
        )
    }

    /// Whether the given content id is either endpoint.
    pub fn touches(&self, content_id: &str) -> bool {
        self.source_id == content_id || self.target_id == content_id
    }
}
