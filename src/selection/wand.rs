//! Magic wand (flood) selection

use super::{SelectedPixels, Selection};
use crate::models::{Bounds, CanvasSize, PixelKey, PixelMap};
use std::collections::VecDeque;

/// Upper end of the tolerance scale.
pub const MAX_TOLERANCE: f64 = 100.0;

/// Flood-select from `seed` over 4-connected neighbors.
///
/// A cell joins (and is expanded further) only if it is occupied and its
/// color lies within `tolerance` of the seed color, measured as Euclidean RGB
/// distance. Unoccupied cells never join, whatever the transparency option
/// says. Returns `None` if the seed is off the canvas or unoccupied.
///
/// Each canvas cell is examined at most once, so the scan is bounded by the
/// canvas area.
pub fn magic_wand(
    pixels: &PixelMap,
    canvas: CanvasSize,
    seed: PixelKey,
    tolerance: f64,
) -> Option<Selection> {
    if !canvas.contains(seed) {
        return None;
    }
    let target = *pixels.get(&seed)?;
    let tolerance = tolerance.clamp(0.0, MAX_TOLERANCE);

    let mut visited = vec![false; canvas.area()];
    let mut queue = VecDeque::new();
    let mut selected = SelectedPixels::new();
    let mut bounds = Bounds::single(seed);

    visited[canvas.index_of(seed)] = true;
    queue.push_back(seed);

    while let Some(key) = queue.pop_front() {
        let Some(color) = pixels.get(&key) else {
            continue;
        };
        if color.distance(&target) > tolerance {
            continue;
        }

        selected.insert(key, Some(*color));
        bounds.include(key);

        let neighbors: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        for (dx, dy) in neighbors {
            let next = key.offset(dx, dy);
            if !canvas.contains(next) {
                continue;
            }
            let idx = canvas.index_of(next);
            if !visited[idx] {
                visited[idx] = true;
                queue.push_back(next);
            }
        }
    }

    log::debug!("magic wand from {} (tolerance {}): {} cells", seed, tolerance, selected.len());
    Some(Selection::new(bounds, selected))
}
