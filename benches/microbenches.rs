//! Criterion microbenches for redecor's hot paths.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - Layout JSON parsing (from_json_str, from_json_slice)
//! - Variant generation (generate_rearranged_layouts)
//! - Drawing a layout onto an image (draw_layout)

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use image::RgbImage;
use redecor::layout::io_json::{from_json_slice, from_json_str, to_json_string};
use redecor::layout::{BBoxXYXY, DetectedObject, Layout};
use redecor::rearrange::{generate_rearranged_layouts, RearrangeOptions};
use redecor::render::{draw_layout, RenderOptions};

fn synthetic_layout(objects: u32) -> Layout {
    Layout::new(
        (0..objects)
            .map(|i| {
                let x = f64::from(i % 20) * 30.0;
                let y = f64::from(i / 20) * 30.0;
                DetectedObject::new(BBoxXYXY::from_xyxy(x, y, x + 25.0, y + 25.0), i % 80, 0.5)
            })
            .collect(),
    )
}

/// Benchmark layout JSON parsing from string and bytes.
fn bench_layout_parse(c: &mut Criterion) {
    let json = to_json_string(&synthetic_layout(200)).expect("serialize layout");
    let bytes = json.as_bytes();

    let mut group = c.benchmark_group("layout_parse");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("from_json_str", |b| {
        b.iter(|| {
            let layout = from_json_str(black_box(&json)).unwrap();
            black_box(layout)
        })
    });
    group.bench_function("from_json_slice", |b| {
        b.iter(|| {
            let layout = from_json_slice(black_box(bytes)).unwrap();
            black_box(layout)
        })
    });

    group.finish();
}

/// Benchmark variant generation across layout sizes.
fn bench_rearrange(c: &mut Criterion) {
    let mut group = c.benchmark_group("rearrange");

    for objects in [4u32, 32, 256] {
        let layout = synthetic_layout(objects);
        let opts = RearrangeOptions {
            num_versions: 4,
            seed: Some(42),
        };
        group.throughput(Throughput::Elements(u64::from(objects) * 4));
        group.bench_with_input(BenchmarkId::from_parameter(objects), &layout, |b, layout| {
            b.iter(|| {
                let variants = generate_rearranged_layouts(black_box(layout), &opts).unwrap();
                black_box(variants)
            })
        });
    }

    group.finish();
}

/// Benchmark drawing one variant on a copy of a 640x480 image.
fn bench_draw(c: &mut Criterion) {
    let image = RgbImage::new(640, 480);
    let layout = synthetic_layout(64);
    let opts = RenderOptions::default();

    let mut group = c.benchmark_group("render");
    group.throughput(Throughput::Elements(layout.len() as u64));

    group.bench_function("draw_layout", |b| {
        b.iter(|| {
            let mut canvas = image.clone();
            draw_layout(&mut canvas, black_box(&layout.objects), &opts);
            black_box(canvas)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_layout_parse, bench_rearrange, bench_draw);
criterion_main!(benches);
