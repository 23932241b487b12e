//! Filtered graph queries.
//!
//! Node filters AND together, edge filters AND together, and the returned
//! edges are restricted to pairs whose endpoints both survived the node
//! filters. Sorting and the optional limit apply to nodes first; the limit is
//! then re-applied to the edge list.

use serde::{Deserialize, Serialize};

use crate::relationship::RelationKind;

use super::engine::KnowledgeGraphEngine;
use super::{GraphEdge, GraphNode};

/// Node-level filters. Empty lists and `None` fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeFilters {
    /// Keep nodes whose category is one of these.
    pub categories: Vec<String>,
    /// Keep nodes sharing at least one of these concepts.
    pub concepts: Vec<String>,
    /// Keep nodes sharing at least one of these tags.
    pub tags: Vec<String>,
    /// Keep nodes with at least this importance.
    pub min_importance: Option<f32>,
    /// Keep nodes with at least this access count.
    pub min_access_count: Option<u64>,
    /// Keep nodes created at or after this timestamp.
    pub created_after: Option<u64>,
    /// Keep nodes created at or before this timestamp.
    pub created_before: Option<u64>,
}

/// Edge-level filters. Empty lists and `None` fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeFilters {
    /// Keep edges of one of these kinds.
    pub kinds: Vec<RelationKind>,
    /// Keep edges with at least this weight.
    pub min_weight: Option<f32>,
    /// Keep edges with at least this confidence.
    pub min_confidence: Option<f32>,
}

/// Sort key for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Sort nodes by importance.
    Importance,
    /// Sort nodes by access count.
    AccessCount,
    /// Sort nodes by creation time.
    CreatedAt,
    /// Sort edges by weight.
    Weight,
}

/// Sort direction. Defaults to descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// A graph query: filters, optional sort, optional limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphQuery {
    pub node_filters: NodeFilters,
    pub edge_filters: EdgeFilters,
    pub sort_by: Option<SortKey>,
    pub direction: SortDirection,
    pub limit: Option<usize>,
}

/// Nodes and edges surviving a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

fn intersects(values: &[String], filter: &[String]) -> bool {
    filter.is_empty() || values.iter().any(|v| filter.contains(v))
}

fn node_matches(node: &GraphNode, filters: &NodeFilters) -> bool {
    if !filters.categories.is_empty() {
        match &node.category {
            Some(cat) if filters.categories.contains(cat) => {}
            _ => return false,
        }
    }
    if !intersects(&node.concepts, &filters.concepts) {
        return false;
    }
    if !intersects(&node.tags, &filters.tags) {
        return false;
    }
    if let Some(min) = filters.min_importance {
        if node.importance < min {
            return false;
        }
    }
    if let Some(min) = filters.min_access_count {
        if node.access_count < min {
            return false;
        }
    }
    if let Some(after) = filters.created_after {
        if node.created_at < after {
            return false;
        }
    }
    if let Some(before) = filters.created_before {
        if node.created_at > before {
            return false;
        }
    }
    true
}

fn edge_matches(edge: &GraphEdge, filters: &EdgeFilters) -> bool {
    if !filters.kinds.is_empty() && !filters.kinds.contains(&edge.kind) {
        return false;
    }
    if let Some(min) = filters.min_weight {
        if edge.weight < min {
            return false;
        }
    }
    if let Some(min) = filters.min_confidence {
        if edge.confidence < min {
            return false;
        }
    }
    true
}

impl KnowledgeGraphEngine {
    /// Run a filtered query over the graph.
    pub fn query_graph(&self, query: &GraphQuery) -> QueryResult {
        let mut nodes: Vec<GraphNode> = self
            .nodes()
            .filter(|n| node_matches(n, &query.node_filters))
            .cloned()
            .collect();
        // Id order first so sorts are deterministic under equal keys.
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        if let Some(key) = query.sort_by {
            let ordering = |a: &GraphNode, b: &GraphNode| match key {
                SortKey::Importance => a
                    .importance
                    .partial_cmp(&b.importance)
                    .unwrap_or(std::cmp::Ordering::Equal),
                SortKey::AccessCount => a.access_count.cmp(&b.access_count),
                SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                // Weight orders edges, not nodes.
                SortKey::Weight => std::cmp::Ordering::Equal,
            };
            match query.direction {
                SortDirection::Ascending => nodes.sort_by(ordering),
                SortDirection::Descending => nodes.sort_by(|a, b| ordering(b, a)),
            }
        }
        if let Some(limit) = query.limit {
            nodes.truncate(limit);
        }

        let surviving: std::collections::HashSet<&str> =
            nodes.iter().map(|n| n.id.as_str()).collect();
        let mut edges: Vec<GraphEdge> = self
            .edges()
            .filter(|e| {
                edge_matches(e, &query.edge_filters)
                    && surviving.contains(e.source.as_str())
                    && surviving.contains(e.target.as_str())
            })
            .cloned()
            .collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));

        if query.sort_by == Some(SortKey::Weight) {
            match query.direction {
                SortDirection::Ascending => edges.sort_by(|a, b| {
                    a.weight
                        .partial_cmp(&b.weight)
                        .unwrap_or(std::cmp::Ordering::Equal)
                }),
                SortDirection::Descending => edges.sort_by(|a, b| {
                    b.weight
                        .partial_cmp(&a.weight)
                        .unwrap_or(std::cmp::Ordering::Equal)
                }),
            }
        }
        if let Some(limit) = query.limit {
            edges.truncate(limit);
        }

        QueryResult { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentItem;
    use crate::graph::engine::GraphConfig;
    use crate::relationship::Relationship;

    fn engine() -> KnowledgeGraphEngine {
        KnowledgeGraphEngine::new(GraphConfig {
            layout_seed: Some(3),
            ..Default::default()
        })
    }

    fn seed(kg: &mut KnowledgeGraphEngine) {
        kg.add_content(
            &ContentItem::new("t1", "Intro")
                .with_category("tutorial")
                .with_concepts(["rust"])
                .with_importance(0.9),
        );
        kg.add_content(
            &ContentItem::new("t2", "Advanced")
                .with_category("tutorial")
                .with_concepts(["rust", "async"])
                .with_importance(0.4),
        );
        kg.add_content(
            &ContentItem::new("v1", "Talk")
                .with_category("video")
                .with_concepts(["rust"])
                .with_importance(0.7),
        );
        kg.add_content(&ContentItem::new("n1", "Note").with_importance(0.1));
        kg.add_relationship(&Relationship::new("t1", "t2", RelationKind::Similar, 0.9, 0.8));
        kg.add_relationship(&Relationship::new("t1", "v1", RelationKind::Related, 0.5, 0.4));
    }

    #[test]
    fn category_filter_restricts_nodes_and_edges() {
        let mut kg = engine();
        seed(&mut kg);
        let result = kg.query_graph(&GraphQuery {
            node_filters: NodeFilters {
                categories: vec!["tutorial".into()],
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(result.nodes.len(), 2);
        // Only the t1—t2 edge has both endpoints among the survivors.
        assert_eq!(result.edges.len(), 1);
        assert_eq!(result.edges[0].kind, RelationKind::Similar);
    }

    #[test]
    fn node_filters_are_anded() {
        let mut kg = engine();
        seed(&mut kg);
        let result = kg.query_graph(&GraphQuery {
            node_filters: NodeFilters {
                categories: vec!["tutorial".into()],
                min_importance: Some(0.5),
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].content_id, "t1");
    }

    #[test]
    fn concept_filter_intersects() {
        let mut kg = engine();
        seed(&mut kg);
        let result = kg.query_graph(&GraphQuery {
            node_filters: NodeFilters {
                concepts: vec!["async".into()],
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].content_id, "t2");
    }

    #[test]
    fn sort_by_importance_desc() {
        let mut kg = engine();
        seed(&mut kg);
        let result = kg.query_graph(&GraphQuery {
            sort_by: Some(SortKey::Importance),
            ..Default::default()
        });
        let order: Vec<&str> = result.nodes.iter().map(|n| n.content_id.as_str()).collect();
        assert_eq!(order, vec!["t1", "v1", "t2", "n1"]);
    }

    #[test]
    fn limit_applies_to_nodes_then_edges() {
        let mut kg = engine();
        seed(&mut kg);
        let result = kg.query_graph(&GraphQuery {
            sort_by: Some(SortKey::Importance),
            limit: Some(3),
            ..Default::default()
        });
        assert_eq!(result.nodes.len(), 3);
        assert!(result.edges.len() <= 3);
        // n1 was truncated away; no edge may reference it.
        assert!(result.edges.iter().all(|e| {
            result.nodes.iter().any(|n| n.id == e.source)
                && result.nodes.iter().any(|n| n.id == e.target)
        }));
    }

    #[test]
    fn edge_filters_are_anded() {
        let mut kg = engine();
        seed(&mut kg);
        let result = kg.query_graph(&GraphQuery {
            edge_filters: EdgeFilters {
                kinds: vec![RelationKind::Similar, RelationKind::Related],
                min_weight: Some(0.6),
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(result.edges.len(), 1);
        assert_eq!(result.edges[0].weight, 0.9);
    }

    #[test]
    fn weight_sort_orders_edges() {
        let mut kg = engine();
        seed(&mut kg);
        let result = kg.query_graph(&GraphQuery {
            sort_by: Some(SortKey::Weight),
            direction: SortDirection::Ascending,
            ..Default::default()
        });
        let weights: Vec<f32> = result.edges.iter().map(|e| e.weight).collect();
        assert_eq!(weights, vec![0.5, 0.9]);
    }

    #[test]
    fn empty_query_returns_everything() {
        let mut kg = engine();
        seed(&mut kg);
        let result = kg.query_graph(&GraphQuery::default());
        assert_eq!(result.nodes.len(), 4);
        assert_eq!(result.edges.len(), 2);
    }
}
