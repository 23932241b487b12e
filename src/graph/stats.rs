//! Graph statistics: degree, weight, and frequency summaries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::relationship::RelationKind;

use super::engine::KnowledgeGraphEngine;

/// How many results the top-N lists carry.
const TOP_N: usize = 10;

/// Degree entry for one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDegree {
    pub node_id: String,
    pub title: String,
    pub degree: usize,
}

/// Weight entry for one edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopEdge {
    pub edge_id: String,
    pub source: String,
    pub target: String,
    pub kind: RelationKind,
    pub weight: f32,
}

/// Size entry for one cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSize {
    pub cluster_id: String,
    pub size: usize,
}

/// Summary statistics over the whole graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub cluster_count: usize,
    /// Mean degree; each edge counts once per endpoint.
    pub average_degree: f32,
    /// Up to ten nodes by descending degree.
    pub top_nodes_by_degree: Vec<NodeDegree>,
    /// Up to ten edges by descending weight.
    pub top_edges_by_weight: Vec<TopEdge>,
    pub cluster_sizes: Vec<ClusterSize>,
    /// Node count per category.
    pub category_counts: BTreeMap<String, usize>,
    /// Occurrence count per concept.
    pub concept_frequency: BTreeMap<String, usize>,
}

impl KnowledgeGraphEngine {
    /// Compute summary statistics for the current graph state.
    pub fn stats(&self) -> GraphStats {
        let node_count = self.node_count();
        let edge_count = self.edge_count();

        let mut degrees: Vec<NodeDegree> = self
            .nodes
            .values()
            .map(|node| NodeDegree {
                node_id: node.id.clone(),
                title: node.title.clone(),
                degree: self.adjacency.get(&node.id).map_or(0, |set| set.len()),
            })
            .collect();
        let degree_sum: usize = degrees.iter().map(|d| d.degree).sum();
        let average_degree = if node_count == 0 {
            0.0
        } else {
            degree_sum as f32 / node_count as f32
        };
        degrees.sort_by(|a, b| b.degree.cmp(&a.degree).then(a.node_id.cmp(&b.node_id)));
        degrees.truncate(TOP_N);

        let mut top_edges: Vec<TopEdge> = self
            .edges
            .values()
            .map(|edge| TopEdge {
                edge_id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                kind: edge.kind,
                weight: edge.weight,
            })
            .collect();
        top_edges.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.edge_id.cmp(&b.edge_id))
        });
        top_edges.truncate(TOP_N);

        let cluster_sizes = self
            .clusters
            .iter()
            .map(|c| ClusterSize {
                cluster_id: c.id.clone(),
                size: c.node_ids.len(),
            })
            .collect();

        let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut concept_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for node in self.nodes.values() {
            if let Some(cat) = &node.category {
                *category_counts.entry(cat.clone()).or_insert(0) += 1;
            }
            for concept in &node.concepts {
                *concept_frequency.entry(concept.clone()).or_insert(0) += 1;
            }
        }

        GraphStats {
            node_count,
            edge_count,
            cluster_count: self.cluster_count(),
            average_degree,
            top_nodes_by_degree: degrees,
            top_edges_by_weight: top_edges,
            cluster_sizes,
            category_counts,
            concept_frequency,
        }
    }
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "knowledge graph stats")?;
        writeln!(f, "  nodes:       {}", self.node_count)?;
        writeln!(f, "  edges:       {}", self.edge_count)?;
        writeln!(f, "  clusters:    {}", self.cluster_count)?;
        writeln!(f, "  avg degree:  {:.2}", self.average_degree)?;
        writeln!(f, "  categories:  {}", self.category_counts.len())?;
        writeln!(f, "  concepts:    {}", self.concept_frequency.len())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentItem;
    use crate::graph::engine::GraphConfig;
    use crate::graph::node_id_for;
    use crate::relationship::Relationship;

    fn engine() -> KnowledgeGraphEngine {
        KnowledgeGraphEngine::new(GraphConfig {
            layout_seed: Some(9),
            ..Default::default()
        })
    }

    fn star() -> KnowledgeGraphEngine {
        // hub connects to s1..s3.
        let mut kg = engine();
        kg.add_content(
            &ContentItem::new("hub", "Hub")
                .with_category("tutorial")
                .with_concepts(["rust"]),
        );
        for i in 1..=3 {
            kg.add_content(
                &ContentItem::new(format!("s{i}"), "Spoke").with_concepts(["rust"]),
            );
            kg.add_relationship(&Relationship::new(
                "hub",
                format!("s{i}"),
                RelationKind::Similar,
                0.5 + i as f32 * 0.1,
                0.5,
            ));
        }
        kg
    }

    #[test]
    fn counts_and_average_degree() {
        let kg = star();
        let stats = kg.stats();
        assert_eq!(stats.node_count, 4);
        assert_eq!(stats.edge_count, 3);
        // Each edge counts once per endpoint: 2 * 3 / 4.
        assert!((stats.average_degree - 1.5).abs() < 1e-6);
    }

    #[test]
    fn hub_tops_degree_list() {
        let kg = star();
        let stats = kg.stats();
        assert_eq!(stats.top_nodes_by_degree[0].node_id, node_id_for("hub"));
        assert_eq!(stats.top_nodes_by_degree[0].degree, 3);
    }

    #[test]
    fn edges_ordered_by_weight_desc() {
        let kg = star();
        let stats = kg.stats();
        let weights: Vec<f32> = stats.top_edges_by_weight.iter().map(|e| e.weight).collect();
        assert!(weights.windows(2).all(|w| w[0] >= w[1]));
        assert!((weights[0] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn category_and_concept_maps() {
        let kg = star();
        let stats = kg.stats();
        assert_eq!(stats.category_counts.get("tutorial"), Some(&1));
        assert_eq!(stats.concept_frequency.get("rust"), Some(&4));
    }

    #[test]
    fn cluster_sizes_follow_last_cluster_pass() {
        let mut kg = star();
        kg.create_clusters();
        let stats = kg.stats();
        assert_eq!(stats.cluster_count, 1);
        assert_eq!(stats.cluster_sizes[0].size, 4);
    }

    #[test]
    fn empty_graph_stats() {
        let kg = engine();
        let stats = kg.stats();
        assert_eq!(stats.node_count, 0);
        assert!(stats.average_degree.abs() < f32::EPSILON);
        assert!(stats.top_nodes_by_degree.is_empty());
    }
}
