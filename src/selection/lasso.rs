//! Freeform lasso selection

use super::{take_cell, SelectedPixels, Selection};
use crate::models::{Bounds, CanvasSize, PixelKey, PixelMap};

/// Ordered polygon vertices gathered while the lasso gesture is active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LassoPath {
    points: Vec<PixelKey>,
}

impl LassoPath {
    pub fn begin(start: PixelKey, canvas: CanvasSize) -> Self {
        Self { points: vec![canvas.clamp_key(start)] }
    }

    /// Append a vertex, clamped onto the canvas. Repeats are kept and count
    /// toward the three-point minimum.
    pub fn push(&mut self, key: PixelKey, canvas: CanvasSize) {
        self.points.push(canvas.clamp_key(key));
    }

    pub fn points(&self) -> &[PixelKey] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Select every cell inside the closed polygon.
    ///
    /// Returns `None` for a path with fewer than three vertices. Only cells
    /// in the path's bounding box are tested.
    pub fn commit(&self, pixels: &PixelMap, canvas: CanvasSize, include_transparent: bool) -> Option<Selection> {
        if self.points.len() < 3 {
            return None;
        }
        let bounds = Bounds::enclosing(self.points.iter().copied())?.clip_to(canvas)?;

        let mut selected = SelectedPixels::new();
        for key in bounds.cells() {
            if point_in_polygon(key, &self.points) {
                take_cell(&mut selected, pixels, key, include_transparent);
            }
        }
        log::debug!("lasso of {} points: {} cells", self.points.len(), selected.len());
        Some(Selection::new(bounds, selected))
    }
}

/// Whether `key` lies inside or on the closed polygon `vertices`.
///
/// Interior cells are found by even-odd ray casting toward +x. Cells lying
/// exactly on an edge count as inside, so a polygon drawn along cell centers
/// selects its own outline.
pub fn point_in_polygon(key: PixelKey, vertices: &[PixelKey]) -> bool {
    let n = vertices.len();
    if n == 0 {
        return false;
    }

    let (x, y) = (f64::from(key.x), f64::from(key.y));
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (vertices[i], vertices[j]);
        if on_segment(key, a, b) {
            return true;
        }
        let (xi, yi) = (f64::from(a.x), f64::from(a.y));
        let (xj, yj) = (f64::from(b.x), f64::from(b.y));
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn on_segment(p: PixelKey, a: PixelKey, b: PixelKey) -> bool {
    let cross = i64::from(b.x - a.x) * i64::from(p.y - a.y) - i64::from(b.y - a.y) * i64::from(p.x - a.x);
    cross == 0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}
