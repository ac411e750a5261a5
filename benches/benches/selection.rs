// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use choreo_selection::{Selection, SelectionItem, SelectionUnion};
use criterion::{
    BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};

fn rows(range: core::ops::Range<usize>) -> Vec<SelectionItem> {
    range.map(SelectionItem::Row).collect()
}

fn bench_replace_with(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection/replace_with");

    for len in [128_usize, 512, 2_048] {
        let items = rows(0..len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &items, |b, items| {
            b.iter_batched(
                Selection::<SelectionItem>::new,
                |mut selection| {
                    selection.replace_with(items.iter().copied());
                    black_box(selection);
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection/union");

    // Each participant selects a window overlapping its neighbours by half.
    for participants in [4_u32, 16, 64] {
        let window = 256;
        let selections: Vec<(u32, Vec<SelectionItem>)> = (0..participants)
            .map(|p| {
                let start = p as usize * window / 2;
                (p, rows(start..start + window))
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("set_participant_selection", participants),
            &selections,
            |b, selections| {
                b.iter_batched(
                    SelectionUnion::<u32>::new,
                    |mut union| {
                        for (participant, items) in selections {
                            union.set_participant_selection(*participant, items.iter().copied());
                        }
                        black_box(union.len());
                    },
                    BatchSize::LargeInput,
                );
            },
        );

        group.bench_with_input(
            BenchmarkId::new("remove_participant", participants),
            &selections,
            |b, selections| {
                b.iter_batched(
                    || {
                        let mut union = SelectionUnion::<u32>::new();
                        for (participant, items) in selections {
                            union.set_participant_selection(*participant, items.iter().copied());
                        }
                        union
                    },
                    |mut union| {
                        for participant in 0..participants {
                            union.remove_participant(&participant);
                        }
                        black_box(union.is_empty());
                    },
                    BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_replace_with, bench_union);
criterion_main!(benches);
