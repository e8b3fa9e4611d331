// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{
    BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use kurbo::{Rect, Vec2};
use trellis_engine::{Engine, EngineConfig};
use trellis_graph::{Node, PortRef, PortSide, SequentialIds};

/// A grid diagram with a chain of edges, the per-frame workload shape.
fn diagram(nodes: usize) -> Engine {
    let mut engine = Engine::new(EngineConfig::default(), SequentialIds::new());
    engine.set_view_rect(Rect::new(0.0, 0.0, 1600.0, 900.0), 0);
    let cols = 40;
    let mut ids = Vec::with_capacity(nodes);
    for i in 0..nodes {
        let x = ((i % cols) as f64) * 200.0;
        let y = ((i / cols) as f64) * 150.0;
        let node = Node::new(Rect::new(x, y, x + 120.0, y + 60.0), "n")
            .with_input("in", "t")
            .with_output("out", "t");
        ids.push(engine.add_node(None, node).unwrap());
    }
    for pair in ids.windows(2) {
        let _ = engine.add_edge(
            PortRef::new(pair[0], PortSide::Output, 0),
            PortRef::new(pair[1], PortSide::Input, 0),
        );
    }
    engine.tick(300);
    engine
}

fn bench_pan_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("culling/pan_frame");
    for nodes in [500_usize, 2_000, 8_000] {
        let engine = diagram(nodes);
        group.throughput(Throughput::Elements(nodes as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(nodes),
            &engine,
            |b, engine| {
                b.iter_batched(
                    || engine.clone(),
                    |mut engine| {
                        // One panning frame: immediate pass + render snapshot.
                        engine.pan_by(Vec2::new(-40.0, -25.0), 1_000);
                        black_box(engine.frame());
                    },
                    BatchSize::LargeInput,
                );
            },
        );
    }
    group.finish();
}

fn bench_confirm_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("culling/confirm");
    for nodes in [500_usize, 2_000, 8_000] {
        let engine = diagram(nodes);
        group.throughput(Throughput::Elements(nodes as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(nodes),
            &engine,
            |b, engine| {
                b.iter_batched(
                    || engine.clone(),
                    |mut engine| {
                        engine.pan_by(Vec2::new(-900.0, -500.0), 1_000);
                        black_box(engine.tick(1_300));
                    },
                    BatchSize::LargeInput,
                );
            },
        );
    }
    group.finish();
}

fn bench_box_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("culling/box_select");
    for nodes in [500_usize, 2_000, 8_000] {
        let engine = diagram(nodes);
        group.throughput(Throughput::Elements(nodes as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(nodes),
            &engine,
            |b, engine| {
                b.iter_batched(
                    || engine.clone(),
                    |mut engine| {
                        // One drag-move frame of a lasso gesture.
                        engine.box_select(Rect::new(100.0, 100.0, 1100.0, 700.0));
                        black_box(engine.selection().nodes().len());
                    },
                    BatchSize::LargeInput,
                );
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_pan_frame, bench_confirm_pass, bench_box_select);
criterion_main!(benches);
