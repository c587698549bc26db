//! Canvas size changes
//!
//! Resizing is a top-left anchored crop or extend: pixels keep their
//! coordinates and anything outside the new bounds is discarded.

use crate::layers::LayerStack;
use crate::models::CanvasSize;

/// Fallback for custom size text that is not a number.
pub const DEFAULT_CUSTOM_SIDE: u32 = 64;

/// Integer prefix of typed text: optional sign then digits, with anything
/// after the digits ignored. Too many digits saturate.
fn leading_int(input: &str) -> Option<i64> {
    let text = input.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let digits = rest.find(|c: char| !c.is_ascii_digit()).map_or(rest, |end| &rest[..end]);
    if digits.is_empty() {
        return None;
    }
    let value = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

/// Interpret a typed custom side length. Input without a leading number,
/// or a leading zero value, falls back to [`DEFAULT_CUSTOM_SIDE`]; other
/// numbers are clamped, never rejected. `"12px"` reads as 12.
pub fn parse_custom_dimension(input: &str) -> u32 {
    match leading_int(input) {
        Some(value) if value != 0 => CanvasSize::clamp_side(value),
        _ => DEFAULT_CUSTOM_SIDE,
    }
}

/// Parse `"WxH"` (or a single number for a square) into a clamped size.
/// Each side reads like [`parse_custom_dimension`], but a side with no
/// leading number makes the whole input invalid.
pub fn parse_size(input: &str) -> Option<CanvasSize> {
    let side = |text: &str| leading_int(text).map(|_| parse_custom_dimension(text));
    let input = input.trim();
    let (width, height) = match input.split_once(['x', 'X']) {
        Some((w, h)) => (side(w)?, side(h)?),
        None => {
            let s = side(input)?;
            (s, s)
        }
    };
    Some(CanvasSize { width, height })
}

/// Crop every layer of `stack` to `size`. Returns the number of pixels dropped.
pub fn crop_layers(stack: &mut LayerStack, size: CanvasSize) -> usize {
    let dropped = stack.retain_within(size);
    if dropped > 0 {
        log::info!("resize to {} discarded {} pixels", size, dropped);
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::models::{Layer, PixelKey};

    #[test]
    fn test_parse_custom_dimension() {
        assert_eq!(parse_custom_dimension("48"), 48);
        assert_eq!(parse_custom_dimension(" 3 "), 8);
        assert_eq!(parse_custom_dimension("9999"), 512);
        assert_eq!(parse_custom_dimension("abc"), 64);
        assert_eq!(parse_custom_dimension(""), 64);
        assert_eq!(parse_custom_dimension("0"), 64);
        assert_eq!(parse_custom_dimension("12abc"), 12);
        assert_eq!(parse_custom_dimension("-40"), 8);
        assert_eq!(parse_custom_dimension("99999999999999999999999"), 512);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("16x24"), Some(CanvasSize { width: 16, height: 24 }));
        assert_eq!(parse_size("128"), Some(CanvasSize { width: 128, height: 128 }));
        assert_eq!(parse_size("1x1000"), Some(CanvasSize { width: 8, height: 512 }));
        assert_eq!(parse_size("wide"), None);
        assert_eq!(parse_size("0x20px"), Some(CanvasSize { width: 64, height: 20 }));
        assert_eq!(parse_size("16x"), None);
    }

    #[test]
    fn test_crop_keeps_top_left() {
        let pixels = [(0, 0), (15, 15), (16, 0), (31, 31)]
            .into_iter()
            .map(|k| (PixelKey::from(k), Color::BLACK))
            .collect();
        let mut stack = LayerStack::new(Layer::new("a", "A").with_pixels(pixels));
        let dropped = crop_layers(&mut stack, CanvasSize { width: 16, height: 16 });
        assert_eq!(dropped, 2);
        let mut kept: Vec<_> = stack.active().pixels.keys().copied().collect();
        kept.sort();
        assert_eq!(kept, vec![PixelKey::new(0, 0), PixelKey::new(15, 15)]);
    }
}
