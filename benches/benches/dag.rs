// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use choreo_dag::Dag;
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn below(&mut self, upper: u32) -> u32 {
        if upper == 0 { 0 } else { self.next_u32() % upper }
    }
}

/// Edges only run from lower to higher ids, so the graph is acyclic.
fn build_dag(n: u32, edges_per_node: u32, seed: u64) -> Dag<u32> {
    let mut dag = Dag::new();
    let mut rng = Lcg(seed);
    for child in 1..n {
        for _ in 0..edges_per_node.min(child) {
            dag.add_edge(rng.below(child), child);
        }
    }
    dag
}

fn bench_dag(c: &mut Criterion) {
    let mut group = c.benchmark_group("choreo_dag");
    group.sample_size(50);

    for &(n, edges_per_node) in &[(256_u32, 1_u32), (256, 4), (4_096, 1), (4_096, 4)] {
        let dag = build_dag(n, edges_per_node, 0xC0DE_0000_0000_0001);

        group.bench_function(format!("topological_sort(n={n},e={edges_per_node})"), |b| {
            b.iter(|| black_box(dag.topological_sort().map(|order| order.len())));
        });

        group.bench_function(
            format!("topological_sort_deterministic(n={n},e={edges_per_node})"),
            |b| {
                b.iter(|| {
                    black_box(
                        dag.topological_sort_deterministic()
                            .map(|order| order.len()),
                    )
                });
            },
        );

        group.bench_function(
            format!("is_subgraph_detachable(n={n},e={edges_per_node})"),
            |b| {
                b.iter(|| black_box(dag.is_subgraph_detachable(&(n / 2))));
            },
        );

        group.bench_function(format!("extract_subgraph(n={n},e={edges_per_node})"), |b| {
            b.iter(|| black_box(dag.extract_subgraph([&0_u32]).len()));
        });

        group.bench_function(format!("build(n={n},e={edges_per_node})"), |b| {
            b.iter_batched(
                || n,
                |n| black_box(build_dag(n, edges_per_node, 0xC0DE_0000_0000_0002)),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dag);
criterion_main!(benches);
