//! Concept clustering.
//!
//! Groups nodes by their dominant concept: the node's concept with the
//! highest frequency across the whole graph, ties broken by lexicographic
//! order. Single-member groups are discarded. Clusters are ephemeral and
//! rebuilt wholesale on every call; they are never maintained incrementally.

use std::collections::BTreeMap;

use super::engine::KnowledgeGraphEngine;
use super::{ContentCluster, GraphNode, Position, concept_color, node_id_for};

/// Pick the node's concept with the highest global frequency.
///
/// Ties resolve to the lexicographically smallest concept, never to
/// insertion order.
fn dominant_concept<'a>(
    node: &'a GraphNode,
    frequency: &BTreeMap<&str, usize>,
) -> Option<&'a str> {
    let mut best: Option<(&str, usize)> = None;
    for concept in &node.concepts {
        let count = frequency.get(concept.as_str()).copied().unwrap_or(0);
        match best {
            None => best = Some((concept, count)),
            Some((chosen, chosen_count)) => {
                if count > chosen_count || (count == chosen_count && concept.as_str() < chosen) {
                    best = Some((concept, count));
                }
            }
        }
    }
    best.map(|(concept, _)| concept)
}

impl KnowledgeGraphEngine {
    /// Rebuild all clusters from scratch and return them.
    pub fn create_clusters(&mut self) -> &[ContentCluster] {
        let mut frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for node in self.nodes.values() {
            for concept in &node.concepts {
                *frequency.entry(concept.as_str()).or_insert(0) += 1;
            }
        }

        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for node in self.nodes.values() {
            if let Some(concept) = dominant_concept(node, &frequency) {
                groups.entry(concept.to_string()).or_default().push(node.id.clone());
            }
        }

        let padding = self.config.cluster_padding;
        let mut clusters = Vec::new();
        for (concept, mut node_ids) in groups {
            if node_ids.len() < 2 {
                continue;
            }
            node_ids.sort_unstable();

            let members: Vec<&GraphNode> = node_ids
                .iter()
                .filter_map(|id| self.nodes.get(id))
                .collect();
            let count = members.len() as f32;
            let centroid = Position {
                x: members.iter().map(|n| n.position.x).sum::<f32>() / count,
                y: members.iter().map(|n| n.position.y).sum::<f32>() / count,
            };
            let radius = members
                .iter()
                .map(|n| n.position.distance(&centroid))
                .fold(0.0f32, f32::max)
                + padding;

            // Most frequent member category; ascending iteration means ties
            // resolve to the lexicographically smallest.
            let mut category_counts: BTreeMap<&str, usize> = BTreeMap::new();
            for node in &members {
                if let Some(cat) = node.category.as_deref() {
                    *category_counts.entry(cat).or_insert(0) += 1;
                }
            }
            let mut category: Option<&str> = None;
            let mut category_best = 0;
            for (cat, n) in category_counts {
                if n > category_best {
                    category = Some(cat);
                    category_best = n;
                }
            }

            clusters.push(ContentCluster {
                id: format!("cluster:{concept}"),
                node_ids,
                concepts: vec![concept.clone()],
                centroid,
                radius,
                color: concept_color(&concept),
                category: category.map(str::to_string),
            });
        }

        self.clusters = clusters;
        &self.clusters
    }

    /// The cluster containing the node for `content_id`, if any.
    ///
    /// Clusters are recomputed on demand; an unknown or unclustered content
    /// id yields `None`.
    pub fn get_content_cluster(&mut self, content_id: &str) -> Option<ContentCluster> {
        let node_id = node_id_for(content_id);
        self.create_clusters();
        self.clusters
            .iter()
            .find(|c| c.node_ids.contains(&node_id))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentItem;
    use crate::graph::engine::GraphConfig;

    fn engine() -> KnowledgeGraphEngine {
        KnowledgeGraphEngine::new(GraphConfig {
            layout_seed: Some(11),
            ..Default::default()
        })
    }

    fn item(id: &str, concepts: &[&str]) -> ContentItem {
        ContentItem::new(id, id).with_concepts(concepts.iter().copied())
    }

    #[test]
    fn shared_dominant_concept_forms_one_cluster() {
        let mut kg = engine();
        kg.add_content(&item("a", &["js", "web"]));
        kg.add_content(&item("b", &["js", "web"]));
        kg.add_content(&item("c", &["python"]));

        let clusters = kg.create_clusters().to_vec();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].node_ids.len(), 2);
        assert_eq!(clusters[0].concepts, vec!["js"]);
        assert!(!clusters[0].node_ids.contains(&node_id_for("c")));
    }

    #[test]
    fn no_cluster_below_two_members() {
        let mut kg = engine();
        kg.add_content(&item("a", &["rust"]));
        kg.add_content(&item("b", &["python"]));
        kg.add_content(&item("c", &[]));
        assert!(kg.create_clusters().is_empty());
    }

    #[test]
    fn repeated_calls_cover_the_same_nodes() {
        let mut kg = engine();
        for i in 0..6 {
            kg.add_content(&item(&format!("c{i}"), &["rust", "systems"]));
        }
        let first: Vec<Vec<String>> = kg
            .create_clusters()
            .iter()
            .map(|c| c.node_ids.clone())
            .collect();
        let second: Vec<Vec<String>> = kg
            .create_clusters()
            .iter()
            .map(|c| c.node_ids.clone())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn tie_breaks_lexicographically() {
        // Both concepts appear twice; "alpha" < "beta" wins for both nodes.
        let mut kg = engine();
        kg.add_content(&item("a", &["beta", "alpha"]));
        kg.add_content(&item("b", &["alpha", "beta"]));
        let clusters = kg.create_clusters();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].concepts, vec!["alpha"]);
    }

    #[test]
    fn majority_category_and_radius() {
        let mut kg = engine();
        kg.add_content(&item("a", &["rust"]).with_category("tutorial"));
        kg.add_content(&item("b", &["rust"]).with_category("tutorial"));
        kg.add_content(&item("c", &["rust"]).with_category("video"));

        let padding = kg.config().cluster_padding;
        let clusters = kg.create_clusters();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].category.as_deref(), Some("tutorial"));
        assert!(clusters[0].radius >= padding);
    }

    #[test]
    fn category_undefined_when_no_member_has_one() {
        let mut kg = engine();
        kg.add_content(&item("a", &["rust"]));
        kg.add_content(&item("b", &["rust"]));
        let clusters = kg.create_clusters();
        assert_eq!(clusters.len(), 1);
        assert!(clusters[0].category.is_none());
    }

    #[test]
    fn content_cluster_lookup() {
        let mut kg = engine();
        kg.add_content(&item("a", &["rust"]));
        kg.add_content(&item("b", &["rust"]));
        kg.add_content(&item("lone", &["perl"]));

        let cluster = kg.get_content_cluster("a").unwrap();
        assert!(cluster.node_ids.contains(&node_id_for("a")));
        assert!(kg.get_content_cluster("lone").is_none());
        assert!(kg.get_content_cluster("ghost").is_none());
    }
}
