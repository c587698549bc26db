//! Rectangle selection

use super::{take_cell, SelectedPixels, Selection};
use crate::models::{Bounds, CanvasSize, PixelKey, PixelMap};

/// A rectangle drag in progress: a fixed start cell and a live end cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectDrag {
    start: PixelKey,
    end: PixelKey,
}

impl RectDrag {
    /// Start a drag. The start cell is clamped onto the canvas.
    pub fn begin(start: PixelKey, canvas: CanvasSize) -> Self {
        let start = canvas.clamp_key(start);
        Self { start, end: start }
    }

    /// Move the live corner, clamped onto the canvas.
    pub fn update(&mut self, end: PixelKey, canvas: CanvasSize) {
        self.end = canvas.clamp_key(end);
    }

    /// Normalized box between start and the live corner.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_corners(self.start, self.end)
    }

    pub fn commit(&self, pixels: &PixelMap, canvas: CanvasSize, include_transparent: bool) -> Option<Selection> {
        select_rect(pixels, self.bounds(), canvas, include_transparent)
    }
}

/// Select the cells of `bounds` (clipped to the canvas) from a layer.
///
/// Occupied cells carry their color. Unoccupied cells are added as
/// transparent entries only when `include_transparent` is set. The clipped
/// box is kept even when nothing inside it was taken; a box that misses the
/// canvas entirely selects nothing and returns `None`.
pub fn select_rect(
    pixels: &PixelMap,
    bounds: Bounds,
    canvas: CanvasSize,
    include_transparent: bool,
) -> Option<Selection> {
    let bounds = bounds.clip_to(canvas)?;

    let mut selected = SelectedPixels::new();
    for key in bounds.cells() {
        take_cell(&mut selected, pixels, key, include_transparent);
    }
    log::debug!("rectangle selection {:?}: {} cells", bounds, selected.len());
    Some(Selection::new(bounds, selected))
}
