//! Document-level properties, checked headlessly through the public API.
//!
//! Randomised cases use a fixed-seed generator so failures reproduce.

use std::collections::HashMap;

use pixelgrid::color::Color;
use pixelgrid::composition::export_compose;
use pixelgrid::document::Document;
use pixelgrid::layers::LayerStack;
use pixelgrid::models::{Bounds, CanvasSize, Layer, PixelKey, PixelMap};
use pixelgrid::selection::select_rect;

const RED: Color = Color::rgb(255, 0, 0);
const GREEN: Color = Color::rgb(0, 255, 0);

/// Small xorshift generator; deterministic across runs.
///
/// Colors fall into well-separated clusters, so every member of a wand
/// region is within tolerance of every other member.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }

    fn color(&mut self) -> Color {
        const SHADES: [Color; 4] =
            [Color::rgb(255, 0, 0), Color::rgb(250, 4, 0), Color::rgb(0, 0, 255), Color::rgb(20, 200, 20)];
        SHADES[self.below(4) as usize]
    }

    fn pixels(&mut self, canvas: CanvasSize, count: usize) -> PixelMap {
        (0..count)
            .map(|_| {
                let key = PixelKey::new(self.below(canvas.width as u64) as i32, self.below(canvas.height as u64) as i32);
                (key, self.color())
            })
            .collect()
    }
}

fn painted(canvas: CanvasSize, cells: &[((i32, i32), Color)]) -> Document {
    let mut doc = Document::new(canvas);
    for (key, color) in cells {
        doc.set_paint_color(*color);
        doc.draw_at((*key).into()).unwrap();
    }
    doc
}

#[test]
fn test_export_compose_topmost_visible_wins() {
    let canvas = CanvasSize { width: 16, height: 16 };
    let mut rng = Rng(0x9E37_79B9_7F4A_7C15);

    for round in 0..20 {
        let layers: Vec<Layer> = (0..4)
            .map(|i| {
                let mut layer = Layer::new(format!("l{}", i), format!("L{}", i)).with_pixels(rng.pixels(canvas, 40));
                layer.visible = rng.below(3) != 0;
                layer
            })
            .collect();
        let stack = LayerStack::from_layers(layers.clone()).unwrap();
        let merged = export_compose(&stack);

        for key in canvas_cells(canvas) {
            let expected = layers.iter().filter(|l| l.visible).find_map(|l| l.get(key));
            assert_eq!(merged.get(&key).copied(), expected, "round {} cell {}", round, key);
        }
    }
}

fn canvas_cells(canvas: CanvasSize) -> impl Iterator<Item = PixelKey> {
    Bounds::from_corners(PixelKey::new(0, 0), PixelKey::new(canvas.width as i32 - 1, canvas.height as i32 - 1)).cells()
}

#[test]
fn test_undo_after_commit_restores_state() {
    let mut doc = painted(CanvasSize::default(), &[((1, 1), RED), ((2, 1), GREEN)]);
    doc.add_layer();

    let before = doc.layers().clone();
    let edits: Vec<Box<dyn Fn(&mut Document)>> = vec![
        Box::new(|d: &mut Document| {
            d.draw_at(PixelKey::new(5, 5)).unwrap();
        }),
        Box::new(|d: &mut Document| {
            d.set_layer_opacity(1, 0.25).unwrap();
        }),
        Box::new(|d: &mut Document| {
            d.rename_layer(0, "renamed").unwrap();
        }),
        Box::new(|d: &mut Document| {
            d.add_layer();
        }),
        Box::new(|d: &mut Document| {
            d.set_layer_visible(1, false).unwrap();
        }),
        Box::new(|d: &mut Document| {
            d.set_active_layer(1).unwrap();
            d.select_rect(Bounds::from_corners((0, 0).into(), (3, 3).into()));
            d.delete_selection().unwrap();
        }),
    ];

    for edit in edits {
        let mut scratch = doc.clone();
        edit(&mut scratch);
        assert_ne!(scratch.layers(), &before);
        assert!(scratch.undo());
        assert_eq!(scratch.layers(), &before);
        assert!(scratch.redo());
        assert_ne!(scratch.layers(), &before);
    }
}

#[test]
fn test_wand_is_idempotent() {
    let canvas = CanvasSize { width: 24, height: 24 };
    let mut rng = Rng(42);

    for tolerance in [0.0, 10.0, 100.0] {
        let mut doc = Document::new(canvas);
        for (key, color) in rng.pixels(canvas, 300) {
            doc.set_paint_color(color);
            doc.draw_at(key).unwrap();
        }
        doc.set_tolerance(tolerance);

        let seeds: Vec<PixelKey> = doc.layers().active().pixels.keys().copied().take(15).collect();
        for seed in seeds {
            let first = doc.magic_wand(seed).cloned().unwrap();
            for member in first.pixels().keys().copied().collect::<Vec<_>>() {
                let again = doc.magic_wand(member).cloned().unwrap();
                assert_eq!(again, first, "tolerance {} seed {} member {}", tolerance, seed, member);
            }
        }
    }
}

#[test]
fn test_lasso_tracing_bbox_matches_rect() {
    let canvas = CanvasSize { width: 16, height: 16 };
    let mut rng = Rng(7);
    let pixels = rng.pixels(canvas, 60);

    for include_transparent in [true, false] {
        let mut doc = Document::new(canvas);
        for (key, color) in &pixels {
            doc.set_paint_color(*color);
            doc.draw_at(*key).unwrap();
        }
        doc.set_include_transparent(include_transparent);

        let corners = [(2, 3), (11, 3), (11, 9), (2, 9)].map(PixelKey::from);
        let lasso = doc.select_lasso(&corners).cloned().unwrap();
        let bounds = Bounds::from_corners(corners[0], corners[2]);
        let rect = select_rect(&doc.layers().active().pixels, bounds, canvas, include_transparent).unwrap();
        assert_eq!(lasso, rect);
    }
}

#[test]
fn test_move_and_move_back_restores_cells() {
    let canvas = CanvasSize { width: 32, height: 32 };
    let mut doc = painted(canvas, &[((10, 10), RED), ((11, 10), GREEN), ((12, 12), RED)]);
    let original = doc.layers().active().pixels.clone();

    doc.select_rect(Bounds::from_corners((10, 10).into(), (12, 12).into()));
    assert_eq!(doc.move_selection(5, -3).unwrap(), 0);
    assert_ne!(doc.layers().active().pixels, original);
    assert_eq!(doc.move_selection(-5, 3).unwrap(), 0);
    assert_eq!(doc.layers().active().pixels, original);
}

#[test]
fn test_copy_paste_at_origin_reproduces_cells() {
    let canvas = CanvasSize { width: 32, height: 32 };
    let cells = [((4, 4), RED), ((6, 5), GREEN), ((5, 7), RED)];
    let mut doc = painted(canvas, &cells);

    let bounds = Bounds::from_corners((4, 4).into(), (6, 7).into());
    doc.select_rect(bounds);
    doc.copy().unwrap();
    doc.delete_selection().unwrap();
    assert!(doc.layers().active().pixels.is_empty());

    doc.paste_at(bounds.top_left()).unwrap();
    let expected: PixelMap = cells.iter().map(|(k, c)| (PixelKey::from(*k), *c)).collect();
    assert_eq!(doc.layers().active().pixels, expected);
}

#[test]
fn test_resize_keeps_subset_and_resets_history() {
    let mut rng = Rng(99);
    let canvas = CanvasSize { width: 32, height: 32 };
    let mut doc = Document::new(canvas);
    for (key, color) in rng.pixels(canvas, 200) {
        doc.set_paint_color(color);
        doc.draw_at(key).unwrap();
    }
    doc.add_layer();
    doc.draw_at(PixelKey::new(20, 3)).unwrap();
    doc.draw_at(PixelKey::new(3, 3)).unwrap();

    let before: Vec<HashMap<PixelKey, Color>> = doc.layers().iter().map(|l| l.pixels.clone()).collect();
    doc.resize(16, 16);

    for (layer, old) in doc.layers().iter().zip(&before) {
        let expected: PixelMap = old.iter().filter(|(k, _)| k.x < 16 && k.y < 16).map(|(k, c)| (*k, *c)).collect();
        assert_eq!(layer.pixels, expected);
    }
    assert!(!doc.can_undo());
    assert!(!doc.undo());
    assert_eq!(doc.canvas(), CanvasSize { width: 16, height: 16 });
}

#[test]
fn test_scenario_wand_single_cell() {
    let mut doc = painted(CanvasSize::default(), &[((5, 5), RED)]);
    doc.set_tolerance(0.0);
    let selection = doc.magic_wand(PixelKey::new(5, 5)).unwrap();
    assert_eq!(selection.bounds(), Bounds::single(PixelKey::new(5, 5)));
    assert_eq!(selection.pixels().len(), 1);
    assert_eq!(selection.pixels().get(&PixelKey::new(5, 5)), Some(&Some(RED)));
}

#[test]
fn test_scenario_rect_without_transparent_then_copy() {
    let mut doc = painted(CanvasSize::default(), &[((1, 1), GREEN)]);
    doc.set_include_transparent(false);

    doc.begin_rect(PixelKey::new(0, 0));
    doc.update_rect(PixelKey::new(2, 2));
    let selection = doc.commit_rect().unwrap();
    assert_eq!(selection.pixels().len(), 1);
    assert_eq!(selection.pixels().get(&PixelKey::new(1, 1)), Some(&Some(GREEN)));

    doc.copy().unwrap();
    let clipboard = doc.clipboard();
    assert_eq!(clipboard.size(), (3, 3));
    assert_eq!(clipboard.len(), 1);
    assert_eq!(clipboard.pixels().get(&PixelKey::new(1, 1)), Some(&GREEN));
}

#[test]
fn test_project_round_trip_through_json() {
    let mut doc = painted(CanvasSize { width: 20, height: 12 }, &[((0, 0), RED), ((19, 11), GREEN)]);
    doc.add_layer();
    doc.set_layer_opacity(0, 0.4).unwrap();
    doc.set_layer_locked(1, true).unwrap();
    doc.add_custom_color(RED);

    let json = pixelgrid::project::export_json(&doc).unwrap();
    let mut restored = Document::default();
    restored.import_json(&json).unwrap();

    assert_eq!(restored.canvas(), doc.canvas());
    assert_eq!(restored.layers(), doc.layers());
    assert_eq!(restored.custom_palette(), doc.custom_palette());
    assert_eq!(restored.history().len(), 1);
}
