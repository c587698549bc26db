//! Criterion benchmarks for pixelgrid critical paths
//!
//! Benchmarks the operations that scale with canvas area:
//! - Selection: magic wand flood fill and lasso point-in-polygon
//! - Composition: preview (alpha-over) and export (topmost wins) merges
//! - History: commit cost with structural sharing across many layers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pixelgrid::color::Color;
use pixelgrid::composition::{export_compose, preview_compose};
use pixelgrid::history::History;
use pixelgrid::layers::LayerStack;
use pixelgrid::models::{CanvasSize, Layer, PixelKey, PixelMap};
use pixelgrid::selection::{magic_wand, LassoPath};

// =============================================================================
// Test Data Generators
// =============================================================================

fn square(side: u32) -> CanvasSize {
    CanvasSize { width: side, height: side }
}

/// Every cell filled with one color, so a wand from any cell floods the canvas.
fn make_solid(canvas: CanvasSize) -> PixelMap {
    let mut pixels = PixelMap::with_capacity(canvas.area());
    for y in 0..canvas.height as i32 {
        for x in 0..canvas.width as i32 {
            pixels.insert(PixelKey::new(x, y), Color::rgb(200, 40, 40));
        }
    }
    pixels
}

/// Diagonal stripes of a few colors, with every fifth cell left empty.
fn make_striped(canvas: CanvasSize, phase: i32) -> PixelMap {
    let colors = [Color::rgb(255, 0, 0), Color::rgb(0, 255, 0), Color::rgb(0, 0, 255), Color::WHITE];
    let mut pixels = PixelMap::new();
    for y in 0..canvas.height as i32 {
        for x in 0..canvas.width as i32 {
            let n = x + y + phase;
            if n % 5 != 0 {
                pixels.insert(PixelKey::new(x, y), colors[(n as usize / 7) % colors.len()]);
            }
        }
    }
    pixels
}

fn make_stack(canvas: CanvasSize, layers: usize) -> LayerStack {
    let layers: Vec<Layer> = (0..layers)
        .map(|i| {
            let mut layer =
                Layer::new(format!("layer-{}", i + 1), format!("Layer {}", i + 1)).with_pixels(make_striped(canvas, i as i32));
            layer.opacity = 0.5 + 0.1 * (i % 5) as f32;
            layer
        })
        .collect();
    LayerStack::from_layers(layers).expect("at least one layer")
}

/// A star-shaped lasso path through the canvas.
fn make_lasso(canvas: CanvasSize, points: usize) -> LassoPath {
    let center = canvas.width as f64 / 2.0;
    let start = PixelKey::new(canvas.width as i32 - 1, center as i32);
    let mut path = LassoPath::begin(start, canvas);
    for i in 1..points {
        let angle = i as f64 / points as f64 * std::f64::consts::TAU;
        let radius = if i % 2 == 0 { center } else { center * 0.4 };
        let key = PixelKey::new((center + radius * angle.cos()) as i32, (center + radius * angle.sin()) as i32);
        path.push(key, canvas);
    }
    path
}

// =============================================================================
// Selection Benchmarks
// =============================================================================

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    group.sample_size(20);

    for side in [64u32, 256, 512].iter() {
        let canvas = square(*side);
        let solid = make_solid(canvas);

        group.throughput(Throughput::Elements(canvas.area() as u64));
        group.bench_with_input(
            BenchmarkId::new("magic_wand_full", format!("{}x{}", side, side)),
            &solid,
            |b, pixels| b.iter(|| magic_wand(black_box(pixels), canvas, PixelKey::new(0, 0), 10.0)),
        );
    }

    let canvas = square(512);
    let striped = make_striped(canvas, 0);
    group.bench_function("magic_wand_striped_512", |b| {
        b.iter(|| magic_wand(black_box(&striped), canvas, PixelKey::new(3, 0), 30.0))
    });

    for points in [8usize, 64].iter() {
        let path = make_lasso(canvas, *points);
        group.throughput(Throughput::Elements(canvas.area() as u64));
        group.bench_with_input(BenchmarkId::new("lasso_512", points), &path, |b, path| {
            b.iter(|| path.commit(black_box(&striped), canvas, true))
        });
    }

    group.finish();
}

// =============================================================================
// Composition Benchmarks
// =============================================================================

fn bench_composition(c: &mut Criterion) {
    let mut group = c.benchmark_group("composition");
    group.sample_size(20);

    let canvas = square(512);
    for layers in [1usize, 4, 8].iter() {
        let stack = make_stack(canvas, *layers);
        group.throughput(Throughput::Elements(canvas.area() as u64));
        group.bench_with_input(BenchmarkId::new("preview_512", layers), &stack, |b, stack| {
            b.iter(|| preview_compose(black_box(stack), canvas))
        });
        group.bench_with_input(BenchmarkId::new("export_512", layers), &stack, |b, stack| {
            b.iter(|| export_compose(black_box(stack)))
        });
    }

    group.finish();
}

// =============================================================================
// History Benchmarks
// =============================================================================

fn bench_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("history");

    let canvas = square(256);
    let stack = make_stack(canvas, 8);
    group.bench_function("edit_and_commit_8_layers", |b| {
        b.iter_batched(
            || (History::new(stack.clone()), stack.clone()),
            |(mut history, mut stack)| {
                for i in 0..16 {
                    if let Ok(pixels) = stack.pixels_mut(i % 8) {
                        pixels.insert(PixelKey::new(i as i32, 0), Color::BLACK);
                    }
                    history.commit(stack.clone());
                }
                history
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_selection, bench_composition, bench_history);
criterion_main!(benches);
