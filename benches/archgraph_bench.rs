// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Benchmarks for graph construction and validation

use archgraph::entity::{Component, Container, EntityTree, System};
use archgraph::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tokio::runtime::Runtime;

/// `systems` systems of four containers with ten components each. Every
/// component depends on the next two in its container and on one component
/// of the neighbouring container.
fn make_tree(systems: usize) -> EntityTree {
    let systems = (0..systems)
        .map(|s| System {
            id: format!("sys{s}"),
            name: format!("System {s}"),
            description: String::new(),
            containers: (0..4)
                .map(|c| Container {
                    id: format!("c{c}"),
                    name: format!("Container {c}"),
                    description: String::new(),
                    technology: None,
                    components: (0..10)
                        .map(|n| Component {
                            id: format!("s{s}c{c}n{n}"),
                            name: format!("Component {n}"),
                            relationships: [
                                format!("s{s}c{c}n{}", (n + 1) % 10),
                                format!("s{s}c{c}n{}", (n + 2) % 10),
                                format!("s{s}c{}n{n}", (c + 1) % 4),
                            ]
                            .into_iter()
                            .map(|t| (t, "uses".to_string()))
                            .collect(),
                            ..Component::default()
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();
    EntityTree::new(systems)
}

fn bench_build(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("build_graph");

    for size in [1, 10, 50] {
        let tree = make_tree(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &tree, |b, tree| {
            b.iter(|| {
                rt.block_on(async {
                    let graph = build_graph(tree, None, &BuildOptions::default()).await.unwrap();
                    black_box(graph.edge_count())
                })
            });
        });
    }
    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let tree = make_tree(10);
    let graph = rt
        .block_on(build_graph(&tree, None, &BuildOptions::default()))
        .unwrap();

    c.bench_function("validate_architecture", |b| {
        b.iter(|| black_box(validate_architecture(&graph, &tree).issues.len()));
    });
    c.bench_function("analyze_dependencies", |b| {
        b.iter(|| black_box(analyze_dependencies(&graph).total_edges));
    });
    c.bench_function("detect_drift", |b| {
        b.iter(|| black_box(detect_drift(&tree, None, "d2").issues.len()));
    });
}

criterion_group!(benches, bench_build, bench_analysis);
criterion_main!(benches);
