//! Editing operations over a [`Selection`]
//!
//! These work on a single layer of a [`LayerStack`] and never touch history;
//! the document decides when a change becomes a commit.

use crate::color::Color;
use crate::layers::{LayerError, LayerStack};
use crate::models::{CanvasSize, PixelKey, PixelMap};
use crate::selection::{SelectedPixels, Selection};
use thiserror::Error;

/// Errors from selection edits and paste.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Layer(#[from] LayerError),
    #[error("nothing is selected")]
    EmptySelection,
    #[error("clipboard is empty")]
    EmptyClipboard,
    #[error("no paste is being previewed")]
    NotPreviewing,
}

/// Remove every selected cell from layer `index`. Returns how many occupied
/// cells were cleared.
pub fn delete_selection(stack: &mut LayerStack, index: usize, selection: &Selection) -> Result<usize, LayerError> {
    let pixels = stack.pixels_mut(index)?;
    let cleared = selection.pixels().keys().filter(|k| pixels.remove(k).is_some()).count();
    Ok(cleared)
}

/// Paint every selected cell of layer `index`, transparent entries included.
pub fn fill_selection(
    stack: &mut LayerStack,
    index: usize,
    selection: &Selection,
    color: Color,
) -> Result<usize, LayerError> {
    let pixels = stack.pixels_mut(index)?;
    for key in selection.pixels().keys() {
        pixels.insert(*key, color);
    }
    Ok(selection.len())
}

/// Result of [`move_selection`].
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    /// The selection at its new position, or `None` if it left the canvas.
    pub selection: Option<Selection>,
    /// Occupied cells that landed off the canvas and were dropped.
    pub clipped: usize,
}

/// Shift the selected pixels of layer `index` by `(dx, dy)`.
///
/// All originals are lifted before any shifted cell is written, so a move
/// that overlaps itself is safe. Colors are read from the layer, not from the
/// selection. Cells that would land off the canvas are dropped.
pub fn move_selection(
    stack: &mut LayerStack,
    index: usize,
    selection: &Selection,
    dx: i32,
    dy: i32,
    canvas: CanvasSize,
) -> Result<MoveOutcome, LayerError> {
    let pixels = stack.pixels_mut(index)?;

    let lifted: Vec<(PixelKey, Color)> = selection
        .pixels()
        .keys()
        .filter_map(|k| pixels.remove(k).map(|c| (*k, c)))
        .collect();

    let mut clipped = 0;
    let mut followed = SelectedPixels::new();
    for (key, color) in &lifted {
        let target = key.offset(dx, dy);
        if canvas.contains(target) {
            pixels.insert(target, *color);
            followed.insert(target, Some(*color));
        } else {
            clipped += 1;
        }
    }
    if clipped > 0 {
        log::warn!("move by ({}, {}) dropped {} cells outside the canvas", dx, dy, clipped);
    }

    let selection = selection.translated(dx, dy, canvas).map(|moved| {
        let mut cells = moved.pixels().clone();
        for (key, value) in cells.iter_mut() {
            *value = followed.get(key).copied().flatten();
        }
        Selection::new(moved.bounds(), cells)
    });
    Ok(MoveOutcome { selection, clipped })
}

/// A selection drag in progress. Only tracks the offset; nothing is written
/// until the drag is committed with [`move_selection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveDrag {
    origin: PixelKey,
    offset: (i32, i32),
}

impl MoveDrag {
    /// Start a drag at `start` if it falls inside the selection's box.
    pub fn begin(start: PixelKey, selection: &Selection) -> Option<Self> {
        selection.bounds().contains(start).then_some(Self { origin: start, offset: (0, 0) })
    }

    pub fn update(&mut self, current: PixelKey) {
        self.offset = (current.x.saturating_sub(self.origin.x), current.y.saturating_sub(self.origin.y));
    }

    pub fn offset(&self) -> (i32, i32) {
        self.offset
    }

    /// Shifted occupied cells that would land on the canvas.
    pub fn preview_cells(&self, selection: &Selection, pixels: &PixelMap, canvas: CanvasSize) -> Vec<(PixelKey, Color)> {
        let (dx, dy) = self.offset;
        selection
            .pixels()
            .keys()
            .filter_map(|k| pixels.get(k).map(|c| (k.offset(dx, dy), *c)))
            .filter(|(k, _)| canvas.contains(*k))
            .collect()
    }
}
