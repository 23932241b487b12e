//! Force-directed layout.
//!
//! A fixed-iteration simulation over the whole graph: every node pair repels
//! with force ∝ 1/distance² (O(n²) per iteration), every edge attracts its
//! endpoints with force ∝ distance × weight, net forces are applied scaled by
//! damping, and positions are clamped to the canvas. Node and edge iteration
//! is id-sorted, so the pass is deterministic given fixed start positions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Position;
use super::engine::KnowledgeGraphEngine;

/// Layout simulation parameters and canvas bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Canvas width; x positions stay in [0, width].
    pub width: f32,
    /// Canvas height; y positions stay in [0, height].
    pub height: f32,
    /// Repulsion constant (force = repulsion / distance²).
    pub repulsion: f32,
    /// Attraction constant (force = attraction × distance × weight).
    pub attraction: f32,
    /// Fraction of the net force applied per iteration.
    pub damping: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 1600.0,
            height: 1200.0,
            repulsion: 8000.0,
            attraction: 0.06,
            damping: 0.1,
        }
    }
}

impl KnowledgeGraphEngine {
    /// Run `iterations` steps of the force simulation.
    pub fn update_layout(&mut self, iterations: usize) {
        let mut node_ids: Vec<String> = self.nodes.keys().cloned().collect();
        node_ids.sort_unstable();
        let n = node_ids.len();
        if n == 0 {
            return;
        }

        let index: HashMap<&str, usize> = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let mut positions: Vec<(f32, f32)> = node_ids
            .iter()
            .map(|id| {
                let p = self.nodes[id].position;
                (p.x, p.y)
            })
            .collect();

        let mut edge_ids: Vec<&String> = self.edges.keys().collect();
        edge_ids.sort_unstable();
        let springs: Vec<(usize, usize, f32)> = edge_ids
            .iter()
            .filter_map(|id| {
                let edge = &self.edges[*id];
                let s = *index.get(edge.source.as_str())?;
                let t = *index.get(edge.target.as_str())?;
                Some((s, t, edge.weight))
            })
            .collect();

        let cfg = self.config.layout.clone();
        for _ in 0..iterations {
            let mut forces = vec![(0.0f32, 0.0f32); n];

            // Pairwise repulsion.
            for i in 0..n {
                for j in (i + 1)..n {
                    let dx = positions[i].0 - positions[j].0;
                    let dy = positions[i].1 - positions[j].1;
                    let dist_sq = (dx * dx + dy * dy).max(0.01);
                    let dist = dist_sq.sqrt();
                    let force = cfg.repulsion / dist_sq;
                    let fx = dx / dist * force;
                    let fy = dy / dist * force;
                    forces[i].0 += fx;
                    forces[i].1 += fy;
                    forces[j].0 -= fx;
                    forces[j].1 -= fy;
                }
            }

            // Edge attraction.
            for &(s, t, weight) in &springs {
                let dx = positions[t].0 - positions[s].0;
                let dy = positions[t].1 - positions[s].1;
                let dist = (dx * dx + dy * dy).sqrt().max(0.1);
                let force = cfg.attraction * dist * weight;
                let fx = dx / dist * force;
                let fy = dy / dist * force;
                forces[s].0 += fx;
                forces[s].1 += fy;
                forces[t].0 -= fx;
                forces[t].1 -= fy;
            }

            // Apply damped forces and clamp to the canvas.
            for i in 0..n {
                positions[i].0 = (positions[i].0 + forces[i].0 * cfg.damping).clamp(0.0, cfg.width);
                positions[i].1 =
                    (positions[i].1 + forces[i].1 * cfg.damping).clamp(0.0, cfg.height);
            }
        }

        for (i, id) in node_ids.iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(id) {
                node.position = Position {
                    x: positions[i].0,
                    y: positions[i].1,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentItem;
    use crate::graph::engine::GraphConfig;
    use crate::graph::node_id_for;
    use crate::relationship::{RelationKind, Relationship};

    fn engine() -> KnowledgeGraphEngine {
        KnowledgeGraphEngine::new(GraphConfig {
            layout_seed: Some(7),
            ..Default::default()
        })
    }

    fn place(kg: &mut KnowledgeGraphEngine, content_id: &str, x: f32, y: f32) {
        let node = kg.nodes.get_mut(&node_id_for(content_id)).unwrap();
        node.position = Position { x, y };
    }

    #[test]
    fn positions_stay_in_bounds() {
        let mut kg = engine();
        for i in 0..12 {
            kg.add_content(&ContentItem::new(format!("c{i}"), "t"));
        }
        for iterations in [0, 1, 10, 50] {
            kg.update_layout(iterations);
            let cfg = kg.config().layout.clone();
            for node in kg.nodes() {
                assert!(node.position.x >= 0.0 && node.position.x <= cfg.width);
                assert!(node.position.y >= 0.0 && node.position.y <= cfg.height);
            }
        }
    }

    #[test]
    fn connected_nodes_pull_together() {
        let mut kg = engine();
        kg.add_content(&ContentItem::new("a", "a"));
        kg.add_content(&ContentItem::new("b", "b"));
        place(&mut kg, "a", 100.0, 600.0);
        place(&mut kg, "b", 1500.0, 600.0);
        kg.add_relationship(&Relationship::new("a", "b", RelationKind::Similar, 1.0, 1.0));

        let before = kg
            .get_node_by_content("a")
            .unwrap()
            .position
            .distance(&kg.get_node_by_content("b").unwrap().position);
        kg.update_layout(20);
        let after = kg
            .get_node_by_content("a")
            .unwrap()
            .position
            .distance(&kg.get_node_by_content("b").unwrap().position);
        assert!(after < before);
    }

    #[test]
    fn crowded_nodes_push_apart() {
        let mut kg = engine();
        kg.add_content(&ContentItem::new("a", "a"));
        kg.add_content(&ContentItem::new("b", "b"));
        place(&mut kg, "a", 800.0, 600.0);
        place(&mut kg, "b", 801.0, 600.0);

        kg.update_layout(5);
        let dist = kg
            .get_node_by_content("a")
            .unwrap()
            .position
            .distance(&kg.get_node_by_content("b").unwrap().position);
        assert!(dist > 1.0);
    }

    #[test]
    fn deterministic_for_fixed_starts() {
        let build = || {
            let mut kg = engine();
            for i in 0..5 {
                kg.add_content(&ContentItem::new(format!("c{i}"), "t"));
            }
            kg.add_relationship(&Relationship::new("c0", "c1", RelationKind::Similar, 0.9, 0.9));
            kg.add_relationship(&Relationship::new("c1", "c2", RelationKind::Related, 0.5, 0.5));
            kg.update_layout(15);
            let mut positions: Vec<(String, f32, f32)> = kg
                .nodes()
                .map(|n| (n.id.clone(), n.position.x, n.position.y))
                .collect();
            positions.sort_by(|a, b| a.0.cmp(&b.0));
            positions
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn empty_graph_is_a_no_op() {
        let mut kg = engine();
        kg.update_layout(10);
        assert_eq!(kg.node_count(), 0);
    }
}
