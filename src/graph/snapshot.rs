//! Graph snapshots: lossless export/import of the full in-memory state.
//!
//! A snapshot is a self-contained serialization of nodes, edges, clusters,
//! and layout configuration, suitable for wholesale restore. The `version`
//! field is carried through untouched — there is no migration logic.

use serde::{Deserialize, Serialize};

use super::engine::KnowledgeGraphEngine;
use super::layout::LayoutConfig;
use super::{ContentCluster, GraphEdge, GraphNode};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A full, self-contained serialization of the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Format version, carried through untouched.
    pub version: u32,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub clusters: Vec<ContentCluster>,
    pub layout: LayoutConfig,
    /// When the snapshot was exported (seconds since UNIX epoch).
    pub last_updated: u64,
}

impl GraphSnapshot {
    /// Whether the snapshot carries no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl KnowledgeGraphEngine {
    /// Export the full graph state. Nodes and edges are id-sorted so equal
    /// states export byte-identical snapshots.
    pub fn export_snapshot(&self) -> GraphSnapshot {
        let mut nodes: Vec<GraphNode> = self.nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        let mut edges: Vec<GraphEdge> = self.edges.values().cloned().collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));

        GraphSnapshot {
            version: self.snapshot_version,
            nodes,
            edges,
            clusters: self.clusters.clone(),
            layout: self.config.layout.clone(),
            last_updated: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }

    /// Replace the graph state with a snapshot's contents.
    ///
    /// Clears existing state first, then rebuilds the content index and the
    /// adjacency index from the snapshot. Edges referencing missing nodes are
    /// skipped with a warning rather than imported dangling.
    pub fn import_snapshot(&mut self, snapshot: GraphSnapshot) {
        self.clear();
        self.snapshot_version = snapshot.version;
        self.config.layout = snapshot.layout;

        for node in snapshot.nodes {
            self.content_index
                .insert(node.content_id.clone(), node.id.clone());
            self.adjacency.entry(node.id.clone()).or_default();
            self.nodes.insert(node.id.clone(), node);
        }

        for edge in snapshot.edges {
            if !self.nodes.contains_key(&edge.source) || !self.nodes.contains_key(&edge.target) {
                tracing::warn!(edge = %edge.id, "snapshot edge references missing node, skipped");
                continue;
            }
            self.adjacency
                .entry(edge.source.clone())
                .or_default()
                .insert(edge.id.clone());
            self.adjacency
                .entry(edge.target.clone())
                .or_default()
                .insert(edge.id.clone());
            self.edges.insert(edge.id.clone(), edge);
        }

        self.clusters = snapshot.clusters;
    }
}
