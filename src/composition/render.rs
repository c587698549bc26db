//! Preview and export compositing over a [`LayerStack`]

use super::blend::blend_over;
use crate::color::Color;
use crate::layers::LayerStack;
use crate::models::{CanvasSize, PixelKey, PixelMap};
use image::{Rgba, RgbaImage};

/// Flatten visible layers into one pixel map.
///
/// Layers are applied bottom to top and each occupied cell simply overwrites
/// what is below it. Opacity is ignored; hidden layers contribute nothing.
pub fn export_compose(stack: &LayerStack) -> PixelMap {
    let mut merged = PixelMap::new();
    for layer in stack.paint_order().filter(|l| l.visible) {
        merged.extend(layer.pixels.iter().map(|(k, c)| (*k, *c)));
    }
    merged
}

/// Render visible layers into a one-pixel-per-cell RGBA image.
///
/// Layers are painted bottom to top, each cell alpha-blended over whatever is
/// already there with the layer's opacity as paint alpha. Empty cells stay
/// fully transparent.
pub fn preview_compose(stack: &LayerStack, canvas: CanvasSize) -> RgbaImage {
    let mut image = RgbaImage::new(canvas.width, canvas.height);
    for layer in stack.paint_order().filter(|l| l.visible) {
        if layer.opacity <= 0.0 {
            continue;
        }
        paint_cells(&mut image, canvas, layer.pixels.iter().map(|(k, c)| (*k, *c)), layer.opacity);
    }
    image
}

/// Paint transient cells (paste or move preview) over a rendered preview at
/// the given alpha. Cells outside the canvas are skipped.
pub fn overlay_cells<I>(image: &mut RgbaImage, canvas: CanvasSize, cells: I, alpha: f32)
where
    I: IntoIterator<Item = (PixelKey, Color)>,
{
    paint_cells(image, canvas, cells, alpha);
}

fn paint_cells<I>(image: &mut RgbaImage, canvas: CanvasSize, cells: I, alpha: f32)
where
    I: IntoIterator<Item = (PixelKey, Color)>,
{
    for (key, color) in cells {
        if !canvas.contains(key) {
            continue;
        }
        let (x, y) = (key.x as u32, key.y as u32);
        let dst: Rgba<u8> = *image.get_pixel(x, y);
        image.put_pixel(x, y, blend_over(color.to_rgba(), dst, alpha));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Layer;

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    fn layer(id: &str, cells: &[((i32, i32), Color)]) -> Layer {
        let pixels = cells.iter().map(|(k, c)| (PixelKey::from(*k), *c)).collect();
        Layer::new(id, id).with_pixels(pixels)
    }

    fn two_layer_stack() -> LayerStack {
        // top: red at (0,0); bottom: blue at (0,0) and (1,0)
        LayerStack::from_layers(vec![
            layer("top", &[((0, 0), RED)]),
            layer("bottom", &[((0, 0), BLUE), ((1, 0), BLUE)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_export_topmost_visible_wins() {
        let merged = export_compose(&two_layer_stack());
        assert_eq!(merged.get(&PixelKey::new(0, 0)), Some(&RED));
        assert_eq!(merged.get(&PixelKey::new(1, 0)), Some(&BLUE));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_export_ignores_opacity_and_hidden_layers() {
        let mut stack = two_layer_stack();
        stack.set_opacity(0, 0.1).unwrap();
        assert_eq!(export_compose(&stack).get(&PixelKey::new(0, 0)), Some(&RED));

        stack.set_visible(0, false).unwrap();
        assert_eq!(export_compose(&stack).get(&PixelKey::new(0, 0)), Some(&BLUE));
    }

    #[test]
    fn test_preview_blends_with_opacity() {
        let mut stack = two_layer_stack();
        stack.set_opacity(0, 0.5).unwrap();
        let image = preview_compose(&stack, CanvasSize { width: 8, height: 8 });
        assert_eq!(*image.get_pixel(0, 0), Rgba([128, 0, 128, 255]));
        assert_eq!(*image.get_pixel(1, 0), Rgba([0, 0, 255, 255]));
        assert_eq!(*image.get_pixel(2, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_preview_differs_from_export_when_translucent() {
        let mut stack = two_layer_stack();
        stack.set_opacity(0, 0.5).unwrap();
        let image = preview_compose(&stack, CanvasSize { width: 8, height: 8 });
        let exported = export_compose(&stack);
        assert_ne!(*image.get_pixel(0, 0), exported[&PixelKey::new(0, 0)].to_rgba());
    }

    #[test]
    fn test_preview_leaves_layers_untouched() {
        let stack = two_layer_stack();
        let before = stack.clone();
        let _ = preview_compose(&stack, CanvasSize { width: 8, height: 8 });
        assert_eq!(stack, before);
    }

    #[test]
    fn test_overlay_skips_out_of_canvas() {
        let canvas = CanvasSize { width: 8, height: 8 };
        let mut image = RgbaImage::new(8, 8);
        overlay_cells(&mut image, canvas, vec![(PixelKey::new(9, 0), RED), (PixelKey::new(1, 1), RED)], 0.5);
        assert_eq!(*image.get_pixel(1, 1), Rgba([255, 0, 0, 128]));
    }
}
