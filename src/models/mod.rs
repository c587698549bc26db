//! Data models for the editable document
//!
//! - [`PixelKey`], [`Bounds`] and [`CanvasSize`] address cells on the grid
//! - [`Layer`] is one sparse raster layer; absent keys are transparent

mod core;

pub use self::core::{Bounds, CanvasSize, PixelKey, PixelKeyError};

use crate::color::Color;
use std::collections::HashMap;
use std::fmt;

/// Sparse cell storage. A missing key is a transparent cell.
pub type PixelMap = HashMap<PixelKey, Color>;

/// Stable layer identifier, unique within a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One raster layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    /// Paint opacity in [0, 1]; only preview compositing honors it.
    pub opacity: f32,
    pub pixels: PixelMap,
}

impl Layer {
    /// A visible, unlocked, fully opaque layer with no pixels.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: LayerId(id.into()),
            name: name.into(),
            visible: true,
            locked: false,
            opacity: 1.0,
            pixels: PixelMap::new(),
        }
    }

    pub fn with_pixels(mut self, pixels: PixelMap) -> Self {
        self.pixels = pixels;
        self
    }

    pub fn get(&self, key: PixelKey) -> Option<Color> {
        self.pixels.get(&key).copied()
    }

    pub fn is_occupied(&self, key: PixelKey) -> bool {
        self.pixels.contains_key(&key)
    }
}
