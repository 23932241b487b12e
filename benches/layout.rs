//! Benchmarks for the force-directed layout loop.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use recollect::content::ContentItem;
use recollect::graph::engine::{GraphConfig, KnowledgeGraphEngine};
use recollect::relationship::{RelationKind, Relationship};

fn build_graph(nodes: usize) -> KnowledgeGraphEngine {
    let mut kg = KnowledgeGraphEngine::new(GraphConfig {
        layout_seed: Some(0),
        ..Default::default()
    });
    for i in 0..nodes {
        kg.add_content(&ContentItem::new(format!("c{i}"), "item").with_concepts(["rust"]));
    }
    // Chain plus a few long-range links for a realistic edge mix.
    for i in 0..nodes.saturating_sub(1) {
        kg.add_relationship(&Relationship::new(
            format!("c{i}"),
            format!("c{}", i + 1),
            RelationKind::Similar,
            0.8,
            0.7,
        ));
    }
    for i in (0..nodes.saturating_sub(10)).step_by(10) {
        kg.add_relationship(&Relationship::new(
            format!("c{i}"),
            format!("c{}", i + 10),
            RelationKind::Related,
            0.4,
            0.4,
        ));
    }
    kg
}

fn bench_layout_small(c: &mut Criterion) {
    let mut kg = build_graph(50);
    c.bench_function("layout_50_nodes_10_iters", |bench| {
        bench.iter(|| black_box(kg.update_layout(10)))
    });
}

fn bench_layout_medium(c: &mut Criterion) {
    let mut kg = build_graph(200);
    c.bench_function("layout_200_nodes_10_iters", |bench| {
        bench.iter(|| black_box(kg.update_layout(10)))
    });
}

fn bench_clusters(c: &mut Criterion) {
    let mut kg = build_graph(200);
    c.bench_function("clusters_200_nodes", |bench| {
        bench.iter(|| {
            let clusters = kg.create_clusters();
            black_box(clusters.len())
        })
    });
}

criterion_group!(benches, bench_layout_small, bench_layout_medium, bench_clusters);
criterion_main!(benches);
