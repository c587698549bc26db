//! Ordered layer stack
//!
//! Index 0 is the topmost layer; list order is display order. The stack is
//! never empty and always has a valid active index.
//!
//! Layers are held behind [`Arc`] so that cloning a stack (which history
//! does on every commit) shares every layer that has not been touched since.
//! Mutation goes through [`Arc::make_mut`], copying only the layer being
//! edited.

use crate::models::{CanvasSize, Layer, PixelMap};
use std::sync::Arc;
use thiserror::Error;

/// Errors from layer stack operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    /// Pixel writes to a locked layer are refused.
    #[error("layer '{name}' is locked")]
    Locked { name: String },
    /// The last remaining layer cannot be removed.
    #[error("cannot remove the last layer")]
    LastLayer,
    #[error("layer index {index} out of range (stack has {len} layers)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Direction for [`LayerStack::reorder`], in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward index 0 (drawn later, appears on top)
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerStack {
    layers: Vec<Arc<Layer>>,
    active: usize,
}

impl LayerStack {
    /// A stack holding a single layer, which is active.
    pub fn new(first: Layer) -> Self {
        Self { layers: vec![Arc::new(first)], active: 0 }
    }

    /// Build a stack from layers in display order. Returns `None` if empty.
    pub fn from_layers(layers: Vec<Layer>) -> Option<Self> {
        if layers.is_empty() {
            return None;
        }
        Some(Self { layers: layers.into_iter().map(Arc::new).collect(), active: 0 })
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Never true for a constructed stack.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers in display order (topmost first).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Layer> + ExactSizeIterator {
        self.layers.iter().map(|l| l.as_ref())
    }

    /// Layers in paint order (bottom first).
    pub fn paint_order(&self) -> impl Iterator<Item = &Layer> {
        self.iter().rev()
    }

    pub fn get(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index).map(|l| l.as_ref())
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &Layer {
        &self.layers[self.active]
    }

    pub fn set_active(&mut self, index: usize) -> Result<(), LayerError> {
        self.check(index)?;
        self.active = index;
        Ok(())
    }

    /// Insert a layer on top of the stack and make it active.
    pub fn push_top(&mut self, layer: Layer) {
        self.layers.insert(0, Arc::new(layer));
        self.active = 0;
    }

    /// Remove the layer at `index`. The active index is clamped back into range.
    pub fn remove(&mut self, index: usize) -> Result<Layer, LayerError> {
        self.check(index)?;
        if self.layers.len() == 1 {
            return Err(LayerError::LastLayer);
        }
        let removed = self.layers.remove(index);
        self.active = self.active.min(self.layers.len() - 1);
        Ok(Arc::try_unwrap(removed).unwrap_or_else(|shared| (*shared).clone()))
    }

    /// Swap the layer at `index` with its neighbor. The active index follows
    /// the moved layer. Returns `false` when already at the top/bottom edge.
    pub fn reorder(&mut self, index: usize, direction: Direction) -> Result<bool, LayerError> {
        self.check(index)?;
        let target = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < self.layers.len() => index + 1,
            _ => return Ok(false),
        };
        self.layers.swap(index, target);
        self.active = target;
        Ok(true)
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) -> Result<(), LayerError> {
        self.layer_mut(index)?.visible = visible;
        Ok(())
    }

    pub fn set_locked(&mut self, index: usize, locked: bool) -> Result<(), LayerError> {
        self.layer_mut(index)?.locked = locked;
        Ok(())
    }

    /// Set opacity, clamped to [0, 1].
    pub fn set_opacity(&mut self, index: usize, opacity: f32) -> Result<(), LayerError> {
        let opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
        self.layer_mut(index)?.opacity = opacity;
        Ok(())
    }

    pub fn rename(&mut self, index: usize, name: impl Into<String>) -> Result<(), LayerError> {
        self.layer_mut(index)?.name = name.into();
        Ok(())
    }

    /// Writable pixel map of the layer at `index`; refused if the layer is locked.
    pub fn pixels_mut(&mut self, index: usize) -> Result<&mut PixelMap, LayerError> {
        self.check(index)?;
        if self.layers[index].locked {
            return Err(LayerError::Locked { name: self.layers[index].name.clone() });
        }
        Ok(&mut Arc::make_mut(&mut self.layers[index]).pixels)
    }

    /// Writable pixel map of the active layer; refused if it is locked.
    pub fn active_pixels_mut(&mut self) -> Result<&mut PixelMap, LayerError> {
        self.pixels_mut(self.active)
    }

    /// Drop every pixel outside `canvas` on every layer, locked or not.
    /// Returns the number of cells discarded. Layers with nothing to drop
    /// stay shared with earlier clones.
    pub fn retain_within(&mut self, canvas: CanvasSize) -> usize {
        let mut dropped = 0;
        for layer in &mut self.layers {
            let outside = layer.pixels.keys().filter(|k| !canvas.contains(**k)).count();
            if outside == 0 {
                continue;
            }
            Arc::make_mut(layer).pixels.retain(|k, _| canvas.contains(*k));
            dropped += outside;
        }
        dropped
    }

    /// Whether any layer's id equals `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id.as_str() == id)
    }

    /// Whether the layer at `index` is stored in the same allocation as in `other`.
    #[cfg(test)]
    fn shares_layer_with(&self, other: &LayerStack, index: usize) -> bool {
        match (self.layers.get(index), other.layers.get(index)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn layer_mut(&mut self, index: usize) -> Result<&mut Layer, LayerError> {
        self.check(index)?;
        Ok(Arc::make_mut(&mut self.layers[index]))
    }

    fn check(&self, index: usize) -> Result<(), LayerError> {
        if index < self.layers.len() {
            Ok(())
        } else {
            Err(LayerError::IndexOutOfRange { index, len: self.layers.len() })
        }
    }
}
