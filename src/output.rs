//! Raster, vector and project-file export
//!
//! Every exporter works from the export-compose merge: opacity is ignored
//! and the topmost visible occupied cell wins. Each occupied cell becomes a
//! `scale` x `scale` square at `(x * scale, y * scale)`.

use crate::color::Color;
use crate::document::Document;
use crate::models::{CanvasSize, PixelKey, PixelMap};
use crate::project;
use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{self, Cursor};
use std::path::Path;

/// Allowed export scale factors.
pub const EXPORT_SCALES: [u32; 5] = [1, 2, 4, 8, 16];

/// Default JPEG quality, 1-100.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Error type for output operations
#[derive(Debug)]
pub enum OutputError {
    /// IO error during file operations
    Io(io::Error),
    /// Image encoding error
    Image(image::ImageError),
    /// Project JSON serialization error
    Json(serde_json::Error),
    /// Scale factor outside [`EXPORT_SCALES`]
    UnsupportedScale(u32),
    /// Output path has no recognised extension
    UnsupportedFormat(String),
}

impl OutputError {
    /// Short machine-readable category, used in error logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OutputError::Io(_) => "io_error",
            OutputError::Image(_) => "encode_error",
            OutputError::Json(_) => "encode_error",
            OutputError::UnsupportedScale(_) | OutputError::UnsupportedFormat(_) => "argument_error",
        }
    }
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Io(e) => write!(f, "IO error: {}", e),
            OutputError::Image(e) => write!(f, "Image error: {}", e),
            OutputError::Json(e) => write!(f, "JSON error: {}", e),
            OutputError::UnsupportedScale(s) => {
                write!(f, "unsupported scale {} (expected one of 1, 2, 4, 8, 16)", s)
            }
            OutputError::UnsupportedFormat(p) => {
                write!(f, "cannot tell export format from '{}' (use .png, .jpg, .svg or .json)", p)
            }
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Io(e) => Some(e),
            OutputError::Image(e) => Some(e),
            OutputError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for OutputError {
    fn from(e: io::Error) -> Self {
        OutputError::Io(e)
    }
}

impl From<image::ImageError> for OutputError {
    fn from(e: image::ImageError) -> Self {
        OutputError::Image(e)
    }
}

impl From<serde_json::Error> for OutputError {
    fn from(e: serde_json::Error) -> Self {
        OutputError::Json(e)
    }
}

/// Export target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Transparent background
    Png,
    /// White background
    Jpeg,
    Svg,
    /// Project file
    Json,
}

impl ExportFormat {
    /// Guess the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(ExportFormat::Png),
            "jpg" | "jpeg" => Some(ExportFormat::Jpeg),
            "svg" => Some(ExportFormat::Svg),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub scale: u32,
    pub jpeg_quality: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { scale: 1, jpeg_quality: DEFAULT_JPEG_QUALITY }
    }
}

/// Check that `scale` is an allowed export factor.
pub fn check_scale(scale: u32) -> Result<u32, OutputError> {
    if EXPORT_SCALES.contains(&scale) {
        Ok(scale)
    } else {
        Err(OutputError::UnsupportedScale(scale))
    }
}

/// Rasterize merged pixels at `scale` over an optional solid background.
pub fn render_raster(
    pixels: &PixelMap,
    canvas: CanvasSize,
    scale: u32,
    background: Option<Color>,
) -> Result<RgbaImage, OutputError> {
    let scale = check_scale(scale)?;
    let fill = background.map(|c| c.to_rgba()).unwrap_or(Rgba([0, 0, 0, 0]));
    let mut image = RgbaImage::from_pixel(canvas.width, canvas.height, fill);
    for (key, color) in pixels {
        if canvas.contains(*key) {
            image.put_pixel(key.x as u32, key.y as u32, color.to_rgba());
        }
    }
    Ok(scale_image(image, scale))
}

/// Scale image by integer factor using nearest-neighbor interpolation.
///
/// This preserves crisp pixel edges.
pub fn scale_image(image: RgbaImage, factor: u32) -> RgbaImage {
    if factor <= 1 {
        return image;
    }
    let (w, h) = image.dimensions();
    image::imageops::resize(&image, w * factor, h * factor, FilterType::Nearest)
}

/// PNG bytes with a transparent background.
pub fn encode_png(pixels: &PixelMap, canvas: CanvasSize, scale: u32) -> Result<Vec<u8>, OutputError> {
    let image = render_raster(pixels, canvas, scale, None)?;
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image).write_to(&mut bytes, ImageOutputFormat::Png)?;
    Ok(bytes.into_inner())
}

/// JPEG bytes on a white background.
pub fn encode_jpeg(pixels: &PixelMap, canvas: CanvasSize, scale: u32, quality: u8) -> Result<Vec<u8>, OutputError> {
    let image = render_raster(pixels, canvas, scale, Some(Color::WHITE))?;
    let rgb = DynamicImage::ImageRgba8(image).into_rgb8();
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(rgb).write_to(&mut bytes, ImageOutputFormat::Jpeg(quality.clamp(1, 100)))?;
    Ok(bytes.into_inner())
}

/// SVG document with one `<rect>` per occupied cell, grouped by color.
pub fn render_svg(pixels: &PixelMap, canvas: CanvasSize, scale: u32) -> Result<String, OutputError> {
    let scale = check_scale(scale)?;
    let (width, height) = (canvas.width * scale, canvas.height * scale);

    let mut groups: BTreeMap<Color, Vec<PixelKey>> = BTreeMap::new();
    for (key, color) in pixels {
        if canvas.contains(*key) {
            groups.entry(*color).or_default().push(*key);
        }
    }

    let mut svg = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    );
    for (color, mut keys) in groups {
        keys.sort_by_key(|k| (k.y, k.x));
        let _ = write!(svg, "  <g fill=\"{}\">", color);
        for key in keys {
            let _ = write!(
                svg,
                r#"<rect x="{}" y="{}" width="{s}" height="{s}"/>"#,
                key.x as u32 * scale,
                key.y as u32 * scale,
                s = scale
            );
        }
        svg.push_str("</g>\n");
    }
    svg.push_str("</svg>\n");
    Ok(svg)
}

/// Encode `doc` in `format`.
pub fn export_bytes(doc: &Document, format: ExportFormat, options: ExportOptions) -> Result<Vec<u8>, OutputError> {
    doc.export_with(|doc| {
        let canvas = doc.canvas();
        match format {
            ExportFormat::Png => encode_png(&doc.export_pixels(), canvas, options.scale),
            ExportFormat::Jpeg => encode_jpeg(&doc.export_pixels(), canvas, options.scale, options.jpeg_quality),
            ExportFormat::Svg => render_svg(&doc.export_pixels(), canvas, options.scale).map(String::into_bytes),
            ExportFormat::Json => Ok(project::export_json(doc)?.into_bytes()),
        }
    })
}

/// Export `doc` to `path`, choosing the format from its extension.
/// Parent directories are created as needed.
pub fn export_to_path(doc: &Document, path: &Path, options: ExportOptions) -> Result<ExportFormat, OutputError> {
    let format = ExportFormat::from_path(path)
        .ok_or_else(|| OutputError::UnsupportedFormat(path.display().to_string()))?;
    let bytes = export_bytes(doc, format, options)?;
    write_file(path, &bytes)?;
    log::info!("exported {:?} ({} bytes) to {}", format, bytes.len(), path.display());
    Ok(format)
}

/// Write bytes, creating parent directories if they don't exist.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CANVAS: CanvasSize = CanvasSize { width: 8, height: 8 };
    const RED: Color = Color::rgb(255, 0, 0);

    fn one_red() -> PixelMap {
        let mut pixels = PixelMap::new();
        pixels.insert(PixelKey::new(1, 2), RED);
        pixels
    }

    #[test]
    fn test_scale_must_be_allowed() {
        for scale in EXPORT_SCALES {
            assert!(check_scale(scale).is_ok());
        }
        assert!(matches!(check_scale(3), Err(OutputError::UnsupportedScale(3))));
        assert!(matches!(render_svg(&one_red(), CANVAS, 0), Err(OutputError::UnsupportedScale(0))));
    }

    #[test]
    fn test_raster_scaled_squares() {
        let image = render_raster(&one_red(), CANVAS, 4, None).unwrap();
        assert_eq!(image.dimensions(), (32, 32));
        assert_eq!(*image.get_pixel(4, 8), Rgba([255, 0, 0, 255]));
        assert_eq!(*image.get_pixel(7, 11), Rgba([255, 0, 0, 255]));
        assert_eq!(*image.get_pixel(8, 8), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_raster_white_background() {
        let image = render_raster(&one_red(), CANVAS, 1, Some(Color::WHITE)).unwrap();
        assert_eq!(*image.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_png_round_trips_through_decoder() {
        let bytes = encode_png(&one_red(), CANVAS, 2).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (16, 16));
        assert_eq!(*decoded.get_pixel(2, 4), Rgba([255, 0, 0, 255]));
        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_jpeg_is_opaque() {
        let bytes = encode_jpeg(&one_red(), CANVAS, 1, 90).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (8, 8));
        assert!(decoded.pixels().all(|p| p[3] == 255));
        assert!(decoded.get_pixel(7, 7)[0] > 240);
    }

    #[test]
    fn test_svg_groups_by_color() {
        let mut pixels = one_red();
        pixels.insert(PixelKey::new(0, 0), RED);
        pixels.insert(PixelKey::new(3, 3), Color::BLACK);
        let svg = render_svg(&pixels, CANVAS, 2).unwrap();
        assert!(svg.contains(r#"width="16" height="16" viewBox="0 0 16 16""#));
        assert_eq!(svg.matches("<rect").count(), 3);
        assert_eq!(svg.matches("<g ").count(), 2);
        assert!(svg.contains(r##"<g fill="#FF0000"><rect x="0" y="0" width="2" height="2"/><rect x="2" y="4""##));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("a.PNG")), Some(ExportFormat::Png));
        assert_eq!(ExportFormat::from_path(Path::new("a.jpeg")), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_path(Path::new("a.svg")), Some(ExportFormat::Svg));
        assert_eq!(ExportFormat::from_path(Path::new("a.json")), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_path(Path::new("a.gif")), None);
        assert_eq!(ExportFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_export_to_path_creates_dirs_and_resets_flag() {
        let tmp = TempDir::new().unwrap();
        let mut doc = Document::new(CANVAS);
        doc.draw_at(PixelKey::new(0, 0)).unwrap();

        let path = tmp.path().join("out/nested/art.png");
        assert_eq!(export_to_path(&doc, &path, ExportOptions::default()).unwrap(), ExportFormat::Png);
        assert!(path.exists());
        assert!(!doc.is_exporting());

        let bad = ExportOptions { scale: 5, ..ExportOptions::default() };
        assert!(export_to_path(&doc, &tmp.path().join("x.png"), bad).is_err());
        assert!(!doc.is_exporting());
    }
}
