//! The editable document
//!
//! [`Document`] owns the canvas size, layer stack, history, selection,
//! clipboard and in-progress gesture. It is the only way to change any of
//! them: every user-visible action is one method call, and each action that
//! changes pixels or layers records exactly one history entry.
//!
//! Read-only queries ([`Document::preview_image`], [`Document::export_pixels`])
//! never mutate layer pixels.

use crate::canvas::crop_layers;
use crate::clipboard::{paste_into, ClipboardBuffer, PasteState};
use crate::color::{parse_color_lenient, Color};
use crate::composition::{export_compose, overlay_cells, preview_compose};
use crate::edit::{delete_selection, fill_selection, move_selection, EditError, MoveDrag};
use crate::history::History;
use crate::layers::{Direction, LayerError, LayerStack};
use crate::models::{Bounds, CanvasSize, Layer, PixelKey, PixelMap};
use crate::selection::{magic_wand, select_rect, LassoPath, RectDrag, Selection, SelectionOptions, MAX_TOLERANCE};
use image::RgbaImage;
use std::cell::Cell;

/// Alpha used to draw a pending paste over the preview.
pub const PASTE_PREVIEW_ALPHA: f32 = 0.5;
/// Alpha used to draw a selection being dragged.
pub const MOVE_PREVIEW_ALPHA: f32 = 0.6;

/// What a stroke does to each cell it passes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeTool {
    Draw,
    Erase,
}

/// Pointer gesture currently in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Stroke { tool: StrokeTool, written: usize },
    Rect(RectDrag),
    Lasso(LassoPath),
    Move(MoveDrag),
}

#[derive(Debug, Clone)]
pub struct Document {
    canvas: CanvasSize,
    layers: LayerStack,
    history: History<LayerStack>,
    selection: Option<Selection>,
    clipboard: ClipboardBuffer,
    paste: PasteState,
    gesture: Gesture,
    paint_color: Color,
    custom_palette: Vec<Color>,
    options: SelectionOptions,
    next_layer_id: u64,
    exporting: Cell<bool>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(CanvasSize::default())
    }
}

impl Document {
    /// A blank document: one empty `Layer 1`, black paint, one history entry.
    pub fn new(canvas: CanvasSize) -> Self {
        let canvas = CanvasSize::clamped(i64::from(canvas.width), i64::from(canvas.height));
        let layers = LayerStack::new(Layer::new("layer-1", "Layer 1"));
        Self {
            canvas,
            history: History::new(layers.clone()),
            layers,
            selection: None,
            clipboard: ClipboardBuffer::default(),
            paste: PasteState::Idle,
            gesture: Gesture::Idle,
            paint_color: Color::BLACK,
            custom_palette: Vec::new(),
            options: SelectionOptions::default(),
            next_layer_id: 2,
            exporting: Cell::new(false),
        }
    }

    /// Swap in a whole new canvas and layer stack (import or restore).
    /// Transient state is cleared and history restarts from the new stack.
    pub(crate) fn replace_contents(&mut self, canvas: CanvasSize, mut layers: LayerStack) {
        crop_layers(&mut layers, canvas);
        self.canvas = canvas;
        self.history.reset(layers.clone());
        self.layers = layers;
        self.selection = None;
        self.paste = PasteState::Idle;
        self.gesture = Gesture::Idle;
        self.next_layer_id = self.layers.len() as u64 + 1;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn history(&self) -> &History<LayerStack> {
        &self.history
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn clipboard(&self) -> &ClipboardBuffer {
        &self.clipboard
    }

    pub fn paste_state(&self) -> PasteState {
        self.paste
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn paint_color(&self) -> Color {
        self.paint_color
    }

    pub fn custom_palette(&self) -> &[Color] {
        &self.custom_palette
    }

    pub fn options(&self) -> SelectionOptions {
        self.options
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting.get()
    }

    /// Flattened pixels for export: topmost visible layer wins, opacity ignored.
    pub fn export_pixels(&self) -> PixelMap {
        export_compose(&self.layers)
    }

    /// On-screen rendering: alpha-blended layers plus any move or paste preview.
    pub fn preview_image(&self) -> RgbaImage {
        let mut image = preview_compose(&self.layers, self.canvas);
        if let (Gesture::Move(drag), Some(selection)) = (&self.gesture, &self.selection) {
            let cells = drag.preview_cells(selection, &self.layers.active().pixels, self.canvas);
            overlay_cells(&mut image, self.canvas, cells, MOVE_PREVIEW_ALPHA);
        }
        if let Some(anchor) = self.paste.anchor().filter(|_| self.paste.is_previewing()) {
            overlay_cells(&mut image, self.canvas, self.clipboard.cells_at(anchor), PASTE_PREVIEW_ALPHA);
        }
        image
    }

    /// Run an export step with the exporting flag raised. The flag is lowered
    /// again however `f` returns.
    pub fn export_with<R, E>(&self, f: impl FnOnce(&Document) -> Result<R, E>) -> Result<R, E> {
        struct Lower<'a>(&'a Cell<bool>);
        impl Drop for Lower<'_> {
            fn drop(&mut self) {
                self.0.set(false);
            }
        }

        self.exporting.set(true);
        let _lower = Lower(&self.exporting);
        f(self)
    }

    // ------------------------------------------------------------------
    // Paint color, palette, options
    // ------------------------------------------------------------------

    pub fn set_paint_color(&mut self, color: Color) {
        self.paint_color = color;
    }

    /// Set the paint color from typed text. Malformed text is ignored and
    /// `false` returned.
    pub fn set_paint_color_text(&mut self, text: &str) -> bool {
        match parse_color_lenient(text) {
            Some(color) => {
                self.paint_color = color;
                true
            }
            None => false,
        }
    }

    /// Append to the custom palette. Returns `false` for a duplicate.
    pub fn add_custom_color(&mut self, color: Color) -> bool {
        if self.custom_palette.contains(&color) {
            return false;
        }
        self.custom_palette.push(color);
        true
    }

    pub fn remove_custom_color(&mut self, color: Color) -> bool {
        let before = self.custom_palette.len();
        self.custom_palette.retain(|c| *c != color);
        self.custom_palette.len() != before
    }

    /// Replace the custom palette, keeping the first of any duplicates.
    pub fn set_custom_palette(&mut self, colors: impl IntoIterator<Item = Color>) {
        self.custom_palette.clear();
        for color in colors {
            self.add_custom_color(color);
        }
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.options.tolerance = if tolerance.is_nan() { 0.0 } else { tolerance.clamp(0.0, MAX_TOLERANCE) };
    }

    pub fn set_include_transparent(&mut self, include: bool) {
        self.options.include_transparent = include;
    }

    // ------------------------------------------------------------------
    // Draw / erase
    // ------------------------------------------------------------------

    /// Start a stroke on the active layer. Refused on a locked layer.
    pub fn begin_stroke(&mut self, tool: StrokeTool) -> Result<(), LayerError> {
        self.end_stroke();
        self.gesture = Gesture::Idle;
        if self.layers.active().locked {
            return Err(rejected(LayerError::Locked { name: self.layers.active().name.clone() }));
        }
        self.gesture = Gesture::Stroke { tool, written: 0 };
        Ok(())
    }

    /// Apply the current stroke at `key`. Off-canvas cells are ignored.
    /// Returns whether the cell was touched.
    pub fn stroke_to(&mut self, key: PixelKey) -> Result<bool, LayerError> {
        let Gesture::Stroke { tool, written } = &mut self.gesture else {
            return Ok(false);
        };
        if !self.canvas.contains(key) {
            return Ok(false);
        }
        let pixels = self.layers.active_pixels_mut().map_err(rejected)?;
        match tool {
            StrokeTool::Draw => {
                pixels.insert(key, self.paint_color);
            }
            StrokeTool::Erase => {
                pixels.remove(&key);
            }
        }
        *written += 1;
        Ok(true)
    }

    /// Finish the current stroke. Records one history entry if any cell was
    /// touched and returns whether it did.
    pub fn end_stroke(&mut self) -> bool {
        match std::mem::take(&mut self.gesture) {
            Gesture::Stroke { tool, written } if written > 0 => {
                self.commit(match tool {
                    StrokeTool::Draw => "draw",
                    StrokeTool::Erase => "erase",
                });
                true
            }
            Gesture::Stroke { .. } => false,
            other => {
                self.gesture = other;
                false
            }
        }
    }

    /// A single-cell draw stroke.
    pub fn draw_at(&mut self, key: PixelKey) -> Result<bool, LayerError> {
        self.click(StrokeTool::Draw, key)
    }

    /// A single-cell erase stroke.
    pub fn erase_at(&mut self, key: PixelKey) -> Result<bool, LayerError> {
        self.click(StrokeTool::Erase, key)
    }

    fn click(&mut self, tool: StrokeTool, key: PixelKey) -> Result<bool, LayerError> {
        self.begin_stroke(tool)?;
        self.stroke_to(key)?;
        Ok(self.end_stroke())
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn begin_rect(&mut self, start: PixelKey) {
        self.end_stroke();
        self.gesture = Gesture::Rect(RectDrag::begin(start, self.canvas));
    }

    pub fn update_rect(&mut self, end: PixelKey) {
        if let Gesture::Rect(drag) = &mut self.gesture {
            drag.update(end, self.canvas);
        }
    }

    /// Finish a rectangle drag and make it the selection.
    pub fn commit_rect(&mut self) -> Option<&Selection> {
        let Gesture::Rect(drag) = std::mem::take(&mut self.gesture) else {
            return self.selection.as_ref();
        };
        self.selection = drag.commit(&self.layers.active().pixels, self.canvas, self.options.include_transparent);
        self.selection.as_ref()
    }

    /// Select a box in one call. A box entirely off the canvas clears the
    /// selection.
    pub fn select_rect(&mut self, bounds: Bounds) -> Option<&Selection> {
        self.end_stroke();
        self.gesture = Gesture::Idle;
        self.selection = select_rect(&self.layers.active().pixels, bounds, self.canvas, self.options.include_transparent);
        self.selection.as_ref()
    }

    /// Flood-select from `seed` on the active layer with the current
    /// tolerance. An unoccupied seed clears the selection.
    pub fn magic_wand(&mut self, seed: PixelKey) -> Option<&Selection> {
        self.end_stroke();
        self.gesture = Gesture::Idle;
        self.selection = magic_wand(&self.layers.active().pixels, self.canvas, seed, self.options.tolerance);
        self.selection.as_ref()
    }

    pub fn begin_lasso(&mut self, start: PixelKey) {
        self.end_stroke();
        self.gesture = Gesture::Lasso(LassoPath::begin(start, self.canvas));
    }

    pub fn extend_lasso(&mut self, point: PixelKey) {
        if let Gesture::Lasso(path) = &mut self.gesture {
            path.push(point, self.canvas);
        }
    }

    /// Close the lasso. A path of fewer than three points leaves the
    /// previous selection in place.
    pub fn commit_lasso(&mut self) -> Option<&Selection> {
        let Gesture::Lasso(path) = std::mem::take(&mut self.gesture) else {
            return self.selection.as_ref();
        };
        match path.commit(&self.layers.active().pixels, self.canvas, self.options.include_transparent) {
            Some(selection) => self.selection = Some(selection),
            None => log::debug!("lasso of {} points ignored", path.len()),
        }
        self.selection.as_ref()
    }

    /// Lasso through `points` in one call.
    pub fn select_lasso(&mut self, points: &[PixelKey]) -> Option<&Selection> {
        let Some((first, rest)) = points.split_first() else {
            return self.selection.as_ref();
        };
        self.begin_lasso(*first);
        for point in rest {
            self.extend_lasso(*point);
        }
        self.commit_lasso()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        if matches!(self.gesture, Gesture::Move(_)) {
            self.gesture = Gesture::Idle;
        }
    }

    // ------------------------------------------------------------------
    // Selection edits
    // ------------------------------------------------------------------

    /// Clear the selected cells on the active layer, then drop the selection.
    pub fn delete_selection(&mut self) -> Result<usize, EditError> {
        self.end_stroke();
        let selection = self.selection.as_ref().ok_or(EditError::EmptySelection)?;
        let index = self.layers.active_index();
        let cleared = delete_selection(&mut self.layers, index, selection).map_err(rejected)?;
        self.selection = None;
        self.commit("delete");
        Ok(cleared)
    }

    /// Paint every selected cell with the paint color. The selection stays.
    pub fn fill_selection(&mut self) -> Result<usize, EditError> {
        self.end_stroke();
        let selection = self.selection.as_ref().ok_or(EditError::EmptySelection)?;
        let index = self.layers.active_index();
        let color = self.paint_color;
        let filled = fill_selection(&mut self.layers, index, selection, color).map_err(rejected)?;
        let painted = selection.pixels().keys().map(|k| (*k, Some(color))).collect();
        self.selection = Some(Selection::new(selection.bounds(), painted));
        self.commit("fill");
        Ok(filled)
    }

    /// Start dragging the selection if `start` is inside its box.
    pub fn begin_move(&mut self, start: PixelKey) -> bool {
        let Some(drag) = self.selection.as_ref().and_then(|s| MoveDrag::begin(start, s)) else {
            return false;
        };
        self.end_stroke();
        self.gesture = Gesture::Move(drag);
        true
    }

    pub fn update_move(&mut self, current: PixelKey) {
        if let Gesture::Move(drag) = &mut self.gesture {
            drag.update(current);
        }
    }

    /// Drop the dragged selection at its current offset. Every finished drag
    /// is one history entry, a zero offset included. Returns the number of
    /// clipped cells.
    pub fn commit_move(&mut self) -> Result<usize, EditError> {
        let Gesture::Move(drag) = std::mem::take(&mut self.gesture) else {
            return Ok(0);
        };
        let (dx, dy) = drag.offset();
        self.move_selection(dx, dy)
    }

    /// Shift the selected pixels of the active layer by `(dx, dy)`; the
    /// selection follows them. Returns the number of clipped cells.
    pub fn move_selection(&mut self, dx: i32, dy: i32) -> Result<usize, EditError> {
        self.end_stroke();
        let selection = self.selection.as_ref().ok_or(EditError::EmptySelection)?;
        let index = self.layers.active_index();
        let outcome = move_selection(&mut self.layers, index, selection, dx, dy, self.canvas).map_err(rejected)?;
        self.selection = outcome.selection;
        self.commit("move");
        Ok(outcome.clipped)
    }

    /// Copy the occupied selected cells into the clipboard. Returns how many.
    pub fn copy(&mut self) -> Result<usize, EditError> {
        let selection = self.selection.as_ref().ok_or(EditError::EmptySelection)?;
        self.clipboard = ClipboardBuffer::copy(selection);
        log::debug!("copied {} cells", self.clipboard.len());
        Ok(self.clipboard.len())
    }

    /// Enter paste preview at `anchor`.
    pub fn begin_paste(&mut self, anchor: PixelKey) -> Result<(), EditError> {
        self.paste = PasteState::begin(&self.clipboard, anchor, self.canvas)?;
        Ok(())
    }

    pub fn move_paste(&mut self, anchor: PixelKey) {
        self.paste.move_to(anchor, self.canvas);
    }

    pub fn cancel_paste(&mut self) {
        self.paste.cancel();
    }

    /// Write the previewed paste into the active layer and record it.
    /// On a locked layer the preview stays up and nothing changes.
    /// Returns the number of cells written.
    pub fn commit_paste(&mut self) -> Result<usize, EditError> {
        self.end_stroke();
        let anchor = self.paste.start_commit()?;
        let index = self.layers.active_index();
        match paste_into(&mut self.layers, index, &self.clipboard, anchor, self.canvas) {
            Ok((written, _clipped)) => {
                self.paste = PasteState::Idle;
                self.commit("paste");
                Ok(written)
            }
            Err(err) => {
                self.paste = PasteState::Previewing { anchor };
                Err(rejected(err).into())
            }
        }
    }

    /// Paste at `anchor` in one call.
    pub fn paste_at(&mut self, anchor: PixelKey) -> Result<usize, EditError> {
        self.begin_paste(anchor)?;
        let result = self.commit_paste();
        if result.is_err() {
            self.paste = PasteState::Idle;
        }
        result
    }

    // ------------------------------------------------------------------
    // Layers
    // ------------------------------------------------------------------

    /// Add an empty layer on top and make it active. Returns its index (0).
    pub fn add_layer(&mut self) -> usize {
        self.end_stroke();
        let mut n = self.next_layer_id;
        while self.layers.contains_id(&format!("layer-{}", n)) {
            n += 1;
        }
        self.next_layer_id = n + 1;
        let name = format!("Layer {}", self.layers.len() + 1);
        self.layers.push_top(Layer::new(format!("layer-{}", n), name));
        self.commit("add layer");
        0
    }

    pub fn remove_layer(&mut self, index: usize) -> Result<Layer, LayerError> {
        self.end_stroke();
        let removed = self.layers.remove(index)?;
        self.commit("remove layer");
        Ok(removed)
    }

    /// Move a layer one step. Returns `false` (and records nothing) at an edge.
    pub fn reorder_layer(&mut self, index: usize, direction: Direction) -> Result<bool, LayerError> {
        self.end_stroke();
        let moved = self.layers.reorder(index, direction)?;
        if moved {
            self.commit("reorder layer");
        }
        Ok(moved)
    }

    /// Choose the layer edits apply to. Not recorded in history on its own.
    pub fn set_active_layer(&mut self, index: usize) -> Result<(), LayerError> {
        self.end_stroke();
        self.layers.set_active(index)
    }

    pub fn set_layer_visible(&mut self, index: usize, visible: bool) -> Result<(), LayerError> {
        self.end_stroke();
        self.layers.set_visible(index, visible)?;
        self.commit("layer visibility");
        Ok(())
    }

    pub fn set_layer_locked(&mut self, index: usize, locked: bool) -> Result<(), LayerError> {
        self.end_stroke();
        self.layers.set_locked(index, locked)?;
        self.commit("layer lock");
        Ok(())
    }

    pub fn set_layer_opacity(&mut self, index: usize, opacity: f32) -> Result<(), LayerError> {
        self.end_stroke();
        self.layers.set_opacity(index, opacity)?;
        self.commit("layer opacity");
        Ok(())
    }

    /// Rename a layer. The name is trimmed; an empty result is ignored and
    /// `false` returned.
    pub fn rename_layer(&mut self, index: usize, name: &str) -> Result<bool, LayerError> {
        self.end_stroke();
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        self.layers.rename(index, name)?;
        self.commit("rename layer");
        Ok(true)
    }

    // ------------------------------------------------------------------
    // History and canvas
    // ------------------------------------------------------------------

    /// Restore the previous snapshot. The selection is left as is.
    pub fn undo(&mut self) -> bool {
        self.end_stroke();
        match self.history.undo() {
            Some(snapshot) => {
                self.layers = snapshot.clone();
                log::debug!("undo -> history entry {}", self.history.index());
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.end_stroke();
        match self.history.redo() {
            Some(snapshot) => {
                self.layers = snapshot.clone();
                log::debug!("redo -> history entry {}", self.history.index());
                true
            }
            None => false,
        }
    }

    /// Change the canvas size (clamped into range). Pixels outside the new
    /// bounds are discarded, the selection and any paste are dropped, and
    /// history restarts. Returns the number of discarded pixels.
    pub fn resize(&mut self, width: i64, height: i64) -> usize {
        self.end_stroke();
        let canvas = CanvasSize::clamped(width, height);
        let dropped = crop_layers(&mut self.layers, canvas);
        self.canvas = canvas;
        self.history.reset(self.layers.clone());
        self.selection = None;
        self.paste = PasteState::Idle;
        self.gesture = Gesture::Idle;
        log::info!("canvas resized to {}", canvas);
        dropped
    }

    fn commit(&mut self, action: &str) {
        self.history.commit(self.layers.clone());
        log::debug!("commit '{}' (history {}/{})", action, self.history.index() + 1, self.history.len());
    }
}

fn rejected(err: LayerError) -> LayerError {
    log::warn!("edit rejected: {}", err);
    err
}
