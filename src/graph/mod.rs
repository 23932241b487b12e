//! Knowledge graph: nodes, edges, and clusters derived from saved content.
//!
//! Every [`GraphNode`] mirrors exactly one live content item and every
//! [`GraphEdge`] mirrors one live relationship — both are derived records,
//! never independently authored. [`ContentCluster`]s are ephemeral groupings
//! recomputed on demand.
//!
//! - **Engine** ([`engine::KnowledgeGraphEngine`]): arena-owned state with
//!   insertion/removal and filtered traversal
//! - **Queries** ([`query`]): ANDed node/edge filters with sorting
//! - **Clustering** ([`cluster`]): dominant-concept grouping
//! - **Layout** ([`layout`]): force-directed position refinement
//! - **Snapshots** ([`snapshot`]): lossless export/import
//! - **Statistics** ([`stats`]): degree, weight, and frequency summaries

pub mod cluster;
pub mod engine;
pub mod layout;
pub mod query;
pub mod snapshot;
pub mod stats;

use serde::{Deserialize, Serialize};

use crate::relationship::RelationKind;

/// Deterministic node id for a content id.
pub fn node_id_for(content_id: &str) -> String {
    format!("node:{content_id}")
}

/// Deterministic edge id for a relationship id.
pub fn edge_id_for(relationship_id: &str) -> String {
    format!("edge:{relationship_id}")
}

/// 2-D position on the layout canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Euclidean distance to another position.
    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A graph node derived from one content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Deterministic id (`node:<content-id>`).
    pub id: String,
    /// Back-reference to the content item.
    pub content_id: String,
    /// Title copied from the content item.
    pub title: String,
    /// Category copied from the content item.
    pub category: Option<String>,
    /// Concepts copied from the content item.
    pub concepts: Vec<String>,
    /// Tags copied from the content item.
    pub tags: Vec<String>,
    /// Current layout position.
    pub position: Position,
    /// Render size, derived from importance and access count.
    pub size: f32,
    /// Render color, deterministic in the category.
    pub color: String,
    /// Importance copied from the content item.
    pub importance: f32,
    /// Access count copied from the content item.
    pub access_count: u64,
    /// Creation timestamp (seconds since UNIX epoch).
    pub created_at: u64,
    /// Last update timestamp (seconds since UNIX epoch).
    pub updated_at: u64,
}

/// A graph edge derived from one relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Deterministic id (`edge:<relationship-id>`).
    pub id: String,
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Back-reference to the relationship record.
    pub relationship_id: String,
    /// Relationship kind.
    pub kind: RelationKind,
    /// Edge weight (= relationship strength).
    pub weight: f32,
    /// Relationship confidence.
    pub confidence: f32,
    /// Creation timestamp (seconds since UNIX epoch).
    pub created_at: u64,
    /// Last update timestamp (seconds since UNIX epoch).
    pub updated_at: u64,
}

/// An ephemeral cluster of nodes sharing a dominant concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentCluster {
    /// Deterministic id (`cluster:<concept>`).
    pub id: String,
    /// Member node ids.
    pub node_ids: Vec<String>,
    /// Defining concept(s).
    pub concepts: Vec<String>,
    /// Mean member position.
    pub centroid: Position,
    /// Max member distance to the centroid plus padding.
    pub radius: f32,
    /// Render color, deterministic in the defining concept.
    pub color: String,
    /// Majority category of the members, if any member has one.
    pub category: Option<String>,
}

// ---------------------------------------------------------------------------
// Derived render attributes
// ---------------------------------------------------------------------------

const NODE_SIZE_BASE: f32 = 10.0;
const NODE_SIZE_IMPORTANCE_SPAN: f32 = 12.0;
const NODE_SIZE_ACCESS_SPAN: f32 = 8.0;
/// Access counts past this contribute with rapidly diminishing returns.
const NODE_SIZE_ACCESS_HALFWAY: f32 = 20.0;

/// Node render size: increasing in importance, saturating in access count.
pub fn node_size(importance: f32, access_count: u64) -> f32 {
    let importance = importance.clamp(0.0, 1.0);
    let access = access_count as f32;
    let access_term = access / (access + NODE_SIZE_ACCESS_HALFWAY);
    NODE_SIZE_BASE + importance * NODE_SIZE_IMPORTANCE_SPAN + access_term * NODE_SIZE_ACCESS_SPAN
}

/// FNV-1a 64-bit hash, used to derive stable hues from labels.
fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in s.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Deterministic color for a node category. Uncategorized nodes are gray.
pub fn category_color(category: Option<&str>) -> String {
    match category {
        Some(c) => hsl_to_hex((fnv1a(c) % 360) as f32, 0.55, 0.50),
        None => "#9aa0a6".to_string(),
    }
}

/// Deterministic color for a cluster's defining concept.
pub fn concept_color(concept: &str) -> String {
    hsl_to_hex((fnv1a(concept) % 360) as f32, 0.45, 0.62)
}

/// Convert HSL (h in degrees, s/l in [0,1]) to a `#rrggbb` hex string.
fn hsl_to_hex(h: f32, s: f32, l: f32) -> String {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_byte = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    format!("#{:02x}{:02x}{:02x}", to_byte(r1), to_byte(g1), to_byte(b1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_deterministic() {
        assert_eq!(node_id_for("c1"), "node:c1");
        assert_eq!(edge_id_for("rel:a->b"), "edge:rel:a->b");
    }

    #[test]
    fn size_increases_with_importance() {
        let low = node_size(0.1, 0);
        let high = node_size(0.9, 0);
        assert!(high > low);
    }

    #[test]
    fn size_saturates_in_access_count() {
        let few = node_size(0.5, 10);
        let many = node_size(0.5, 10_000);
        let more = node_size(0.5, 100_000);
        assert!(many > few);
        // Growth past saturation is negligible.
        assert!(more - many < 0.01);
        assert!(more <= NODE_SIZE_BASE + NODE_SIZE_IMPORTANCE_SPAN + NODE_SIZE_ACCESS_SPAN);
    }

    #[test]
    fn category_color_is_stable() {
        let a = category_color(Some("tutorial"));
        let b = category_color(Some("tutorial"));
        assert_eq!(a, b);
        assert_ne!(a, category_color(Some("reference")));
        assert_eq!(category_color(None), "#9aa0a6");
    }

    #[test]
    fn colors_are_hex_rgb() {
        for label in ["tutorial", "video", "note", "x"] {
            let color = category_color(Some(label));
            assert_eq!(color.len(), 7);
            assert!(color.starts_with('#'));
            assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Position { x: 0.0, y: 0.0 };
        let b = Position { x: 3.0, y: 4.0 };
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }
}
