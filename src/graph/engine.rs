//! In-memory knowledge graph engine.
//!
//! Owns the node/edge/cluster arenas plus two indices: content id → node id,
//! and node id → incident-edge-id set. Records reference each other by id
//! only — no live references — and every mutation keeps both indices
//! consistent. Mutation is `&mut self`; callers provide exclusion.

use std::collections::{HashMap, HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::content::ContentItem;
use crate::relationship::{RelationKind, Relationship};

use super::layout::LayoutConfig;
use super::{
    ContentCluster, GraphEdge, GraphNode, Position, category_color, edge_id_for, node_id_for,
    node_size,
};

/// Configuration for the knowledge graph engine.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Layout simulation parameters and canvas bounds.
    pub layout: LayoutConfig,
    /// Padding added to each cluster radius.
    pub cluster_padding: f32,
    /// Seed for node start positions. `None` uses entropy.
    pub layout_seed: Option<u64>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            cluster_padding: 40.0,
            layout_seed: None,
        }
    }
}

/// Options for [`KnowledgeGraphEngine::find_related`].
#[derive(Debug, Clone)]
pub struct RelatedOptions {
    /// Maximum traversal depth from the start node.
    pub max_depth: usize,
    /// Skip edges below this weight.
    pub min_weight: f32,
    /// Only follow edges of these kinds (empty = all kinds).
    pub include_kinds: Vec<RelationKind>,
    /// Never follow edges of these kinds.
    pub exclude_kinds: Vec<RelationKind>,
}

impl Default for RelatedOptions {
    fn default() -> Self {
        Self {
            max_depth: 2,
            min_weight: 0.0,
            include_kinds: Vec::new(),
            exclude_kinds: Vec::new(),
        }
    }
}

/// One traversal hit: a node, its hop distance, and the best incident weight.
#[derive(Debug, Clone)]
pub struct RelatedNode {
    pub node: GraphNode,
    pub distance: usize,
    pub weight: f32,
}

/// The in-memory knowledge graph.
pub struct KnowledgeGraphEngine {
    pub(super) nodes: HashMap<String, GraphNode>,
    pub(super) edges: HashMap<String, GraphEdge>,
    pub(super) clusters: Vec<ContentCluster>,
    /// Content id → node id.
    pub(super) content_index: HashMap<String, String>,
    /// Node id → incident edge ids.
    pub(super) adjacency: HashMap<String, HashSet<String>>,
    pub(super) config: GraphConfig,
    /// Snapshot format version, carried through import/export untouched.
    pub(super) snapshot_version: u32,
    rng: StdRng,
}

impl KnowledgeGraphEngine {
    /// Create an empty engine.
    pub fn new(config: GraphConfig) -> Self {
        let rng = match config.layout_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            clusters: Vec::new(),
            content_index: HashMap::new(),
            adjacency: HashMap::new(),
            config,
            snapshot_version: super::snapshot::SNAPSHOT_VERSION,
            rng,
        }
    }

    /// Create or replace the node for a content item. Always succeeds.
    ///
    /// A replaced node keeps its layout position; a new node starts at a
    /// random position inside the canvas bounds.
    pub fn add_content(&mut self, item: &ContentItem) -> &GraphNode {
        let node_id = node_id_for(&item.id);
        let position = match self.nodes.get(&node_id) {
            Some(existing) => existing.position,
            None => Position {
                x: self.rng.gen_range(0.0..self.config.layout.width),
                y: self.rng.gen_range(0.0..self.config.layout.height),
            },
        };
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let node = GraphNode {
            id: node_id.clone(),
            content_id: item.id.clone(),
            title: item.title.clone(),
            category: item.category.clone(),
            concepts: item.concepts.clone(),
            tags: item.tags.clone(),
            position,
            size: node_size(item.importance, item.access_count),
            color: category_color(item.category.as_deref()),
            importance: item.importance,
            access_count: item.access_count,
            created_at: item.created_at,
            updated_at: now,
        };

        self.content_index.insert(item.id.clone(), node_id.clone());
        self.adjacency.entry(node_id.clone()).or_default();
        self.nodes.insert(node_id.clone(), node);
        self.nodes.get(&node_id).expect("node just inserted")
    }

    /// Create or replace the edge for a relationship.
    ///
    /// Returns `None` when either endpoint node is absent — a reported
    /// no-op, not an error.
    pub fn add_relationship(&mut self, rel: &Relationship) -> Option<&GraphEdge> {
        let source = match self.content_index.get(&rel.source_id) {
            Some(id) => id.clone(),
            None => {
                tracing::debug!(
                    relationship = %rel.id,
                    missing = %rel.source_id,
                    "edge endpoint not in graph, skipping"
                );
                return None;
            }
        };
        let target = match self.content_index.get(&rel.target_id) {
            Some(id) => id.clone(),
            None => {
                tracing::debug!(
                    relationship = %rel.id,
                    missing = %rel.target_id,
                    "edge endpoint not in graph, skipping"
                );
                return None;
            }
        };

        let edge_id = edge_id_for(&rel.id);
        let edge = GraphEdge {
            id: edge_id.clone(),
            source: source.clone(),
            target: target.clone(),
            relationship_id: rel.id.clone(),
            kind: rel.kind,
            weight: rel.strength,
            confidence: rel.confidence,
            created_at: rel.created_at,
            updated_at: rel.last_updated,
        };

        self.adjacency.entry(source).or_default().insert(edge_id.clone());
        self.adjacency.entry(target).or_default().insert(edge_id.clone());
        self.edges.insert(edge_id.clone(), edge);
        self.edges.get(&edge_id)
    }

    /// Remove the node for a content id and every incident edge.
    ///
    /// Returns false if the content id has no node.
    pub fn remove_content(&mut self, content_id: &str) -> bool {
        let Some(node_id) = self.content_index.remove(content_id) else {
            return false;
        };
        self.nodes.remove(&node_id);
        if let Some(edge_ids) = self.adjacency.remove(&node_id) {
            for edge_id in edge_ids {
                if let Some(edge) = self.edges.remove(&edge_id) {
                    let other = if edge.source == node_id {
                        edge.target
                    } else {
                        edge.source
                    };
                    if let Some(set) = self.adjacency.get_mut(&other) {
                        set.remove(&edge_id);
                    }
                }
            }
        }
        true
    }

    /// Remove the edge for a relationship id. Returns false if unknown.
    pub fn remove_relationship(&mut self, relationship_id: &str) -> bool {
        let edge_id = edge_id_for(relationship_id);
        let Some(edge) = self.edges.remove(&edge_id) else {
            return false;
        };
        for endpoint in [&edge.source, &edge.target] {
            if let Some(set) = self.adjacency.get_mut(endpoint) {
                set.remove(&edge_id);
            }
        }
        true
    }

    /// Depth-bounded traversal from the node for `content_id`.
    ///
    /// Visits neighbors over incident edges in either direction, skipping
    /// edges below `min_weight` or filtered out by kind. Each visited node
    /// (except the start) is recorded with its hop distance and the best
    /// weight seen at that distance; results order by ascending distance,
    /// then descending weight, then node id, truncated to `max_results`.
    /// An unknown content id yields an empty list.
    pub fn find_related(
        &self,
        content_id: &str,
        max_results: usize,
        options: &RelatedOptions,
    ) -> Vec<RelatedNode> {
        let Some(start) = self.content_index.get(content_id) else {
            return Vec::new();
        };

        // Node id → (distance, best incident weight at that distance).
        let mut found: HashMap<String, (usize, f32)> = HashMap::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        queue.push_back((start.clone(), 0));

        while let Some((node_id, depth)) = queue.pop_front() {
            if depth >= options.max_depth {
                continue;
            }
            let Some(edge_ids) = self.adjacency.get(&node_id) else {
                continue;
            };
            for edge_id in edge_ids {
                let Some(edge) = self.edges.get(edge_id) else {
                    continue;
                };
                if edge.weight < options.min_weight {
                    continue;
                }
                if !options.include_kinds.is_empty() && !options.include_kinds.contains(&edge.kind)
                {
                    continue;
                }
                if options.exclude_kinds.contains(&edge.kind) {
                    continue;
                }
                let neighbor = if edge.source == node_id {
                    &edge.target
                } else {
                    &edge.source
                };
                if neighbor == start {
                    continue;
                }
                match found.entry(neighbor.clone()) {
                    std::collections::hash_map::Entry::Vacant(slot) => {
                        slot.insert((depth + 1, edge.weight));
                        queue.push_back((neighbor.clone(), depth + 1));
                    }
                    std::collections::hash_map::Entry::Occupied(mut slot) => {
                        let (d, w) = slot.get_mut();
                        if *d == depth + 1 && edge.weight > *w {
                            *w = edge.weight;
                        }
                    }
                }
            }
        }

        let mut results: Vec<RelatedNode> = found
            .into_iter()
            .filter_map(|(node_id, (distance, weight))| {
                self.nodes.get(&node_id).map(|node| RelatedNode {
                    node: node.clone(),
                    distance,
                    weight,
                })
            })
            .collect();
        results.sort_by(|a, b| {
            a.distance
                .cmp(&b.distance)
                .then(
                    b.weight
                        .partial_cmp(&a.weight)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(a.node.id.cmp(&b.node.id))
        });
        results.truncate(max_results);
        results
    }

    /// Drop all nodes, edges, clusters, and indices.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.clusters.clear();
        self.content_index.clear();
        self.adjacency.clear();
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of clusters from the last [`create_clusters`] pass.
    ///
    /// [`create_clusters`]: KnowledgeGraphEngine::create_clusters
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Look up a node by node id.
    pub fn get_node(&self, node_id: &str) -> Option<&GraphNode> {
        self.nodes.get(node_id)
    }

    /// Look up the node for a content id.
    pub fn get_node_by_content(&self, content_id: &str) -> Option<&GraphNode> {
        self.content_index
            .get(content_id)
            .and_then(|node_id| self.nodes.get(node_id))
    }

    /// Whether a content id has a node.
    pub fn contains_content(&self, content_id: &str) -> bool {
        self.content_index.contains_key(content_id)
    }

    /// Iterate over all nodes (arbitrary order).
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Iterate over all edges (arbitrary order).
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values()
    }

    /// Clusters from the last [`create_clusters`] pass.
    ///
    /// [`create_clusters`]: KnowledgeGraphEngine::create_clusters
    pub fn clusters(&self) -> &[ContentCluster] {
        &self.clusters
    }

    /// The engine configuration.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }
}

impl std::fmt::Debug for KnowledgeGraphEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeGraphEngine")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .field("clusters", &self.cluster_count())
            .finish()
    }
}
