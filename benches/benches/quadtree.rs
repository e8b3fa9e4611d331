// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{
    BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use kurbo::Rect;
use trellis_quadtree::QuadTree;

fn node_rect(i: usize) -> Rect {
    // Deterministic scatter over a ~4000×4000 area.
    let x = ((i * 727) % 4000) as f64;
    let y = ((i * 313) % 4000) as f64;
    Rect::new(x, y, x + 120.0, y + 60.0)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree/insert");
    for len in [256_usize, 1_024, 4_096] {
        group.throughput(Throughput::Elements(len as u64));
        for (label, min_cell) in [("coarse", 60.0), ("fine", 4.0)] {
            group.bench_with_input(
                BenchmarkId::new(label, len),
                &len,
                |b, &len| {
                    b.iter_batched(
                        || QuadTree::<u32>::with_min_cell(Rect::new(0.0, 0.0, 512.0, 512.0), min_cell),
                        |mut tree| {
                            for i in 0..len {
                                #[allow(
                                    clippy::cast_possible_truncation,
                                    reason = "bench ids fit in u32"
                                )]
                                tree.insert(node_rect(i), i as u32);
                            }
                            black_box(tree);
                        },
                        BatchSize::LargeInput,
                    );
                },
            );
        }
    }
    group.finish();
}

fn bench_window_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree/covered");

    // Hypothesis: query cost tracks the window footprint, not the item
    // count, once the tree actually subdivides.
    for len in [1_024_usize, 8_192] {
        for (label, min_cell) in [("coarse", 60.0), ("fine", 4.0)] {
            let mut tree = QuadTree::<u32>::with_min_cell(Rect::new(0.0, 0.0, 512.0, 512.0), min_cell);
            for i in 0..len {
                #[allow(clippy::cast_possible_truncation, reason = "bench ids fit in u32")]
                tree.insert(node_rect(i), i as u32);
            }
            group.throughput(Throughput::Elements(len as u64));
            group.bench_with_input(
                BenchmarkId::new(label, len),
                &tree,
                |b, tree| {
                    b.iter(|| {
                        // A viewport-sized window in the middle of the content.
                        let hits = tree.covered(Rect::new(1000.0, 1000.0, 1960.0, 1540.0));
                        black_box(hits);
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_move_rekey(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree/rekey");
    let len = 4_096_usize;
    group.throughput(Throughput::Elements(1));
    group.bench_function("remove_insert", |b| {
        b.iter_batched(
            || {
                let mut tree =
                    QuadTree::<u32>::with_min_cell(Rect::new(0.0, 0.0, 512.0, 512.0), 4.0);
                for i in 0..len {
                    #[allow(clippy::cast_possible_truncation, reason = "bench ids fit in u32")]
                    tree.insert(node_rect(i), i as u32);
                }
                tree
            },
            |mut tree| {
                // One committed drag: remove at the old origin, insert at the
                // new rect.
                tree.remove(node_rect(17).origin(), 17);
                tree.insert(node_rect(17) + kurbo::Vec2::new(250.0, 250.0), 17);
                black_box(tree);
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_window_query, bench_move_rekey);
criterion_main!(benches);
