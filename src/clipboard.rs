//! Copy and two-phase paste
//!
//! A [`ClipboardBuffer`] holds occupied cells keyed relative to the copied
//! selection's top-left corner. Pasting goes through [`PasteState`]:
//! `Idle -> Previewing -> Committing -> Idle`, with `cancel` back to `Idle`
//! from a preview.

use crate::color::Color;
use crate::edit::EditError;
use crate::layers::{LayerError, LayerStack};
use crate::models::{CanvasSize, PixelKey, PixelMap};
use crate::selection::Selection;

/// Relocatable copy of a selection's occupied cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipboardBuffer {
    pixels: PixelMap,
    width: u32,
    height: u32,
}

impl ClipboardBuffer {
    /// Copy the occupied cells of `selection`. Transparent entries are skipped.
    /// The buffer takes the size of the selection's box.
    pub fn copy(selection: &Selection) -> Self {
        let bounds = selection.bounds();
        let origin = bounds.top_left();
        let pixels = selection
            .occupied()
            .map(|(k, c)| (PixelKey::new(k.x.saturating_sub(origin.x), k.y.saturating_sub(origin.y)), c))
            .collect();
        Self { pixels, width: bounds.width(), height: bounds.height() }
    }

    /// `(width, height)` of the copied box.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Relative-keyed cells.
    pub fn pixels(&self) -> &PixelMap {
        &self.pixels
    }

    /// Cells placed with their origin at `anchor`. May include off-canvas keys.
    pub fn cells_at(&self, anchor: PixelKey) -> impl Iterator<Item = (PixelKey, Color)> + '_ {
        self.pixels.iter().map(move |(k, c)| (anchor.offset(k.x, k.y), *c))
    }
}

/// Paste interaction state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PasteState {
    #[default]
    Idle,
    /// Buffer shown at `anchor`; nothing written yet.
    Previewing { anchor: PixelKey },
    /// Being written at `anchor`.
    Committing { anchor: PixelKey },
}

impl PasteState {
    /// Enter preview at `anchor`, clamped onto the canvas.
    pub fn begin(buffer: &ClipboardBuffer, anchor: PixelKey, canvas: CanvasSize) -> Result<Self, EditError> {
        if buffer.is_empty() {
            return Err(EditError::EmptyClipboard);
        }
        Ok(PasteState::Previewing { anchor: canvas.clamp_key(anchor) })
    }

    /// Follow the pointer while previewing. Ignored in any other state.
    pub fn move_to(&mut self, anchor: PixelKey, canvas: CanvasSize) {
        if let PasteState::Previewing { anchor: current } = self {
            *current = canvas.clamp_key(anchor);
        }
    }

    pub fn cancel(&mut self) {
        *self = PasteState::Idle;
    }

    /// Leave the preview for the commit phase, returning the anchor to write at.
    pub fn start_commit(&mut self) -> Result<PixelKey, EditError> {
        match *self {
            PasteState::Previewing { anchor } => {
                *self = PasteState::Committing { anchor };
                Ok(anchor)
            }
            _ => Err(EditError::NotPreviewing),
        }
    }

    pub fn anchor(&self) -> Option<PixelKey> {
        match *self {
            PasteState::Idle => None,
            PasteState::Previewing { anchor } | PasteState::Committing { anchor } => Some(anchor),
        }
    }

    pub fn is_previewing(&self) -> bool {
        matches!(self, PasteState::Previewing { .. })
    }
}

/// Write `buffer` at `anchor` into layer `index`. Cells landing off the canvas
/// are dropped. Returns `(written, clipped)`.
pub fn paste_into(
    stack: &mut LayerStack,
    index: usize,
    buffer: &ClipboardBuffer,
    anchor: PixelKey,
    canvas: CanvasSize,
) -> Result<(usize, usize), LayerError> {
    let pixels = stack.pixels_mut(index)?;
    let (mut written, mut clipped) = (0, 0);
    for (key, color) in buffer.cells_at(anchor) {
        if canvas.contains(key) {
            pixels.insert(key, color);
            written += 1;
        } else {
            clipped += 1;
        }
    }
    if clipped > 0 {
        log::warn!("paste at {} dropped {} cells outside the canvas", anchor, clipped);
    }
    Ok((written, clipped))
}
