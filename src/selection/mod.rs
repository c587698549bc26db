//! Selection engine
//!
//! Three builders produce the same [`Selection`] shape:
//!
//! - [`RectDrag`]: every cell in a dragged box
//! - [`magic_wand`]: 4-connected flood from a seed within a color tolerance
//! - [`LassoPath`]: cells inside a freeform polygon
//!
//! Editing operations (delete, fill, move, copy) only ever see a `Selection`,
//! never the builder that made it.

mod lasso;
mod rect;
mod wand;

pub use lasso::{point_in_polygon, LassoPath};
pub use rect::{select_rect, RectDrag};
pub use wand::{magic_wand, MAX_TOLERANCE};

use crate::color::Color;
use crate::models::{Bounds, CanvasSize, PixelKey, PixelMap};
use std::collections::HashMap;

/// Selected cells. `Some(color)` is an occupied cell; `None` marks a cell
/// that is selected but transparent, which only happens when transparent
/// cells are included.
pub type SelectedPixels = HashMap<PixelKey, Option<Color>>;

/// Options shared by the rectangle and lasso builders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionOptions {
    /// Magic wand color tolerance, 0-100.
    pub tolerance: f64,
    /// Whether rectangle and lasso selections take unoccupied cells too.
    pub include_transparent: bool,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self { tolerance: 10.0, include_transparent: true }
    }
}

/// A bounding box plus the cells it selects.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    bounds: Bounds,
    pixels: SelectedPixels,
}

impl Selection {
    pub fn new(bounds: Bounds, pixels: SelectedPixels) -> Self {
        Self { bounds, pixels }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn pixels(&self) -> &SelectedPixels {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn contains(&self, key: PixelKey) -> bool {
        self.pixels.contains_key(&key)
    }

    /// Occupied selected cells with their colors.
    pub fn occupied(&self) -> impl Iterator<Item = (PixelKey, Color)> + '_ {
        self.pixels.iter().filter_map(|(k, c)| c.map(|c| (*k, c)))
    }

    /// The selection shifted by `(dx, dy)`, keeping only cells that land on
    /// the canvas. Returns `None` if the shifted box misses the canvas.
    pub fn translated(&self, dx: i32, dy: i32, canvas: CanvasSize) -> Option<Selection> {
        let bounds = self.bounds.translate(dx, dy).clip_to(canvas)?;
        let pixels = self
            .pixels
            .iter()
            .map(|(k, c)| (k.offset(dx, dy), *c))
            .filter(|(k, _)| canvas.contains(*k))
            .collect();
        Some(Selection { bounds, pixels })
    }
}

/// Add `key` to `selected` following the occupied/transparent rule shared by
/// rectangle and lasso selection.
pub(crate) fn take_cell(
    selected: &mut SelectedPixels,
    pixels: &PixelMap,
    key: PixelKey,
    include_transparent: bool,
) {
    match pixels.get(&key) {
        Some(color) => {
            selected.insert(key, Some(*color));
        }
        None if include_transparent => {
            selected.insert(key, None);
        }
        None => {}
    }
}
