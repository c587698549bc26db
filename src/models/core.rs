//! Core grid types: cell addresses, bounding boxes, canvas dimensions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error when a `"x,y"` cell key cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid pixel key '{0}', expected \"x,y\"")]
pub struct PixelKeyError(pub String);

/// Integer cell address. `(0, 0)` is the top-left cell.
///
/// Serialized as the literal string `"x,y"` with unpadded decimal integers,
/// which is also the key format used in project files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixelKey {
    pub x: i32,
    pub y: i32,
}

impl PixelKey {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// This key shifted by `(dx, dy)`. Saturates at the `i32` range, which
    /// is far off any canvas.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x.saturating_add(dx), y: self.y.saturating_add(dy) }
    }
}

impl From<(i32, i32)> for PixelKey {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for PixelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for PixelKey {
    type Err = PixelKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PixelKeyError(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(err)?;
        let x = x.parse::<i32>().map_err(|_| err())?;
        let y = y.parse::<i32>().map_err(|_| err())?;
        Ok(Self { x, y })
    }
}

impl Serialize for PixelKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PixelKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Inclusive bounding box over cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Bounds {
    /// Box spanning two corners given in any order.
    pub fn from_corners(a: PixelKey, b: PixelKey) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Box covering a single cell.
    pub fn single(key: PixelKey) -> Self {
        Self { min_x: key.x, min_y: key.y, max_x: key.x, max_y: key.y }
    }

    /// Smallest box covering every key, or `None` for an empty input.
    pub fn enclosing<I: IntoIterator<Item = PixelKey>>(keys: I) -> Option<Self> {
        let mut iter = keys.into_iter();
        let mut bounds = Self::single(iter.next()?);
        for key in iter {
            bounds.include(key);
        }
        Some(bounds)
    }

    /// Grow to cover `key`.
    pub fn include(&mut self, key: PixelKey) {
        self.min_x = self.min_x.min(key.x);
        self.min_y = self.min_y.min(key.y);
        self.max_x = self.max_x.max(key.x);
        self.max_y = self.max_y.max(key.y);
    }

    pub fn width(&self) -> u32 {
        self.max_x.abs_diff(self.min_x).saturating_add(1)
    }

    pub fn height(&self) -> u32 {
        self.max_y.abs_diff(self.min_y).saturating_add(1)
    }

    pub fn top_left(&self) -> PixelKey {
        PixelKey::new(self.min_x, self.min_y)
    }

    pub fn contains(&self, key: PixelKey) -> bool {
        key.x >= self.min_x && key.x <= self.max_x && key.y >= self.min_y && key.y <= self.max_y
    }

    /// Shift by `(dx, dy)`, saturating like [`PixelKey::offset`].
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            min_x: self.min_x.saturating_add(dx),
            min_y: self.min_y.saturating_add(dy),
            max_x: self.max_x.saturating_add(dx),
            max_y: self.max_y.saturating_add(dy),
        }
    }

    /// Intersection with the canvas, or `None` if the box lies entirely outside it.
    pub fn clip_to(&self, canvas: CanvasSize) -> Option<Self> {
        let clipped = Self {
            min_x: self.min_x.max(0),
            min_y: self.min_y.max(0),
            max_x: self.max_x.min(canvas.width as i32 - 1),
            max_y: self.max_y.min(canvas.height as i32 - 1),
        };
        if clipped.min_x > clipped.max_x || clipped.min_y > clipped.max_y {
            None
        } else {
            Some(clipped)
        }
    }

    /// Every cell in the box, row by row.
    pub fn cells(&self) -> impl Iterator<Item = PixelKey> {
        let (min_x, max_x) = (self.min_x, self.max_x);
        (self.min_y..=self.max_y)
            .flat_map(move |y| (min_x..=max_x).map(move |x| PixelKey::new(x, y)))
    }
}

/// Canvas dimensions in cells. Both sides stay within
/// [`CanvasSize::MIN`]..=[`CanvasSize::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const MIN: u32 = 8;
    pub const MAX: u32 = 512;

    /// Preset square sizes offered alongside custom input.
    pub const PRESETS: [CanvasSize; 5] = [
        CanvasSize { width: 16, height: 16 },
        CanvasSize { width: 32, height: 32 },
        CanvasSize { width: 64, height: 64 },
        CanvasSize { width: 128, height: 128 },
        CanvasSize { width: 256, height: 256 },
    ];

    /// Build a size, clamping each side into the allowed range.
    pub fn clamped(width: i64, height: i64) -> Self {
        Self { width: Self::clamp_side(width), height: Self::clamp_side(height) }
    }

    /// Clamp one side length into `[MIN, MAX]`.
    pub fn clamp_side(v: i64) -> u32 {
        v.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u32
    }

    /// Whether `key` addresses a cell on this canvas.
    pub fn contains(&self, key: PixelKey) -> bool {
        key.x >= 0 && key.y >= 0 && (key.x as u32) < self.width && (key.y as u32) < self.height
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Row-major index of an in-canvas key.
    pub(crate) fn index_of(&self, key: PixelKey) -> usize {
        key.y as usize * self.width as usize + key.x as usize
    }

    /// Clamp a key onto the nearest canvas cell.
    pub fn clamp_key(&self, key: PixelKey) -> PixelKey {
        PixelKey::new(
            key.x.clamp(0, self.width as i32 - 1),
            key.y.clamp(0, self.height as i32 - 1),
        )
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self { width: 32, height: 32 }
    }
}

impl fmt::Display for CanvasSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
