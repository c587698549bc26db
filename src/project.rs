//! Project file import and export
//!
//! The on-disk format is JSON:
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "canvasSize": { "width": 32, "height": 32 },
//!   "layers": [
//!     { "id": "layer-1", "name": "Layer 1", "pixels": { "5,7": "#FF0000" },
//!       "visible": true, "opacity": 1, "locked": false }
//!   ],
//!   "customPalette": ["#FF0000"],
//!   "selectedColor": "#000000",
//!   "timestamp": "2024-01-01T00:00:00.000Z"
//! }
//! ```
//!
//! Autosave records use the same schema with `"autoSave": true` and an
//! epoch-millisecond `timestamp`.
//!
//! Importing is all-or-nothing: a file is fully validated into a new layer
//! stack before the document is touched.

use crate::clock;
use crate::color::{parse_color_lenient, Color, ColorError};
use crate::document::Document;
use crate::layers::LayerStack;
use crate::models::{CanvasSize, Layer, LayerId, PixelKey, PixelKeyError, PixelMap};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Version written into exported files.
pub const PROJECT_VERSION: &str = "1.0.0";

/// Side used when `canvasSize` lacks a width or height.
const FALLBACK_SIDE: i64 = 16;

/// Errors from reading a project file.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("project file is missing '{0}'")]
    MissingField(&'static str),
    #[error("project file has no layers")]
    NoLayers,
    #[error("layer '{layer}': {source}")]
    InvalidPixelKey {
        layer: String,
        #[source]
        source: PixelKeyError,
    },
    #[error("layer '{layer}' cell {key}: {source}")]
    InvalidColor {
        layer: String,
        key: String,
        #[source]
        source: ColorError,
    },
    #[error("failed to read project: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Short machine-readable category, used in error logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ImportError::Json(_) => "json_error",
            ImportError::MissingField(_) | ImportError::NoLayers => "structure_error",
            ImportError::InvalidPixelKey { .. } | ImportError::InvalidColor { .. } => "data_error",
            ImportError::Io(_) => "io_error",
        }
    }
}

/// `timestamp` is an ISO string in exports and epoch milliseconds in autosaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(u64),
    Iso(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
}

/// One layer as stored in a file. Every field may be missing on import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

/// Whole project file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_size: Option<CanvasRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<LayerRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_palette: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_save: Option<bool>,
}

/// A validated project, ready to install into a [`Document`].
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub canvas: CanvasSize,
    pub layers: LayerStack,
    pub custom_palette: Option<Vec<Color>>,
    pub selected_color: Option<Color>,
}

impl ProjectFile {
    /// Snapshot a document. The timestamp is left for the caller to set.
    pub fn from_document(doc: &Document) -> Self {
        let canvas = doc.canvas();
        let layers = doc.layers().iter().map(layer_record).collect();
        Self {
            version: Some(PROJECT_VERSION.to_string()),
            canvas_size: Some(CanvasRecord {
                width: Some(i64::from(canvas.width)),
                height: Some(i64::from(canvas.height)),
            }),
            layers: Some(layers),
            custom_palette: Some(doc.custom_palette().iter().map(Color::to_hex).collect()),
            selected_color: Some(doc.paint_color().to_hex()),
            timestamp: None,
            auto_save: None,
        }
    }

    /// Whether this record was written by autosave.
    pub fn is_autosave(&self) -> bool {
        self.auto_save.unwrap_or(false)
    }

    /// Autosave time in epoch milliseconds, if recorded as such.
    pub fn saved_at_millis(&self) -> Option<u64> {
        match self.timestamp {
            Some(Timestamp::Millis(ms)) => Some(ms),
            _ => None,
        }
    }

    /// Validate and normalize into a [`Project`].
    ///
    /// Missing layer fields get defaults, opacity of zero reads as fully
    /// opaque, the canvas is clamped into range and cells outside it dropped.
    pub fn into_project(self) -> Result<Project, ImportError> {
        let canvas_record = self.canvas_size.ok_or(ImportError::MissingField("canvasSize"))?;
        let records = self.layers.ok_or(ImportError::MissingField("layers"))?;
        let canvas = CanvasSize::clamped(
            canvas_record.width.unwrap_or(FALLBACK_SIDE),
            canvas_record.height.unwrap_or(FALLBACK_SIDE),
        );

        let mut layers = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            layers.push(import_layer(record, i + 1, canvas)?);
        }
        dedupe_ids(&mut layers);
        let layers = LayerStack::from_layers(layers).ok_or(ImportError::NoLayers)?;

        let custom_palette = self
            .custom_palette
            .map(|colors| colors.iter().filter_map(|c| parse_color_lenient(c)).collect());
        let selected_color = self.selected_color.as_deref().and_then(parse_color_lenient);

        Ok(Project { canvas, layers, custom_palette, selected_color })
    }
}

/// Rename repeated layer ids to the first `layer-import-N` not used by any
/// layer. The first layer holding an id keeps it.
fn dedupe_ids(layers: &mut [Layer]) {
    let mut taken: HashSet<LayerId> = layers.iter().map(|l| l.id.clone()).collect();
    let mut kept = HashSet::new();
    let mut counter = 1;
    for layer in layers.iter_mut() {
        if kept.insert(layer.id.clone()) {
            continue;
        }
        let fresh = loop {
            let candidate = LayerId(format!("layer-import-{}", counter));
            counter += 1;
            if taken.insert(candidate.clone()) {
                break candidate;
            }
        };
        log::warn!("duplicate layer id '{}' renamed to '{}'", layer.id, fresh);
        kept.insert(fresh.clone());
        layer.id = fresh;
    }
}

fn layer_record(layer: &Layer) -> LayerRecord {
    let pixels = layer
        .pixels
        .iter()
        .map(|(k, c)| (*k, *c))
        .collect::<BTreeMap<PixelKey, Color>>()
        .into_iter()
        .map(|(k, c)| (k.to_string(), c.to_hex()))
        .collect();
    LayerRecord {
        id: Some(layer.id.to_string()),
        name: Some(layer.name.clone()),
        pixels: Some(pixels),
        visible: Some(layer.visible),
        opacity: Some(f64::from(layer.opacity)),
        locked: Some(layer.locked),
    }
}

fn import_layer(record: LayerRecord, ordinal: usize, canvas: CanvasSize) -> Result<Layer, ImportError> {
    let id = record
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("layer-import-{}", ordinal));
    let name = record.name.filter(|n| !n.is_empty()).unwrap_or_else(|| "Imported layer".to_string());

    let mut pixels = PixelMap::new();
    for (key_text, color_text) in record.pixels.unwrap_or_default() {
        let key: PixelKey = key_text
            .parse()
            .map_err(|source| ImportError::InvalidPixelKey { layer: id.clone(), source })?;
        let color = Color::parse(&color_text).map_err(|source| ImportError::InvalidColor {
            layer: id.clone(),
            key: key_text.clone(),
            source,
        })?;
        if canvas.contains(key) {
            pixels.insert(key, color);
        }
    }

    let opacity = match record.opacity {
        Some(o) if o.is_finite() && o != 0.0 => o.clamp(0.0, 1.0) as f32,
        _ => 1.0,
    };

    let mut layer = Layer::new(id, name).with_pixels(pixels);
    layer.visible = record.visible != Some(false);
    layer.locked = record.locked.unwrap_or(false);
    layer.opacity = opacity;
    Ok(layer)
}

/// Parse project JSON text.
pub fn parse_project(json: &str) -> Result<Project, ImportError> {
    let file: ProjectFile = serde_json::from_str(json)?;
    file.into_project()
}

/// Pretty-printed export JSON for `doc`, stamped with the current time.
pub fn export_json(doc: &Document) -> Result<String, serde_json::Error> {
    let mut file = ProjectFile::from_document(doc);
    file.timestamp = Some(Timestamp::Iso(clock::iso_now()));
    serde_json::to_string_pretty(&file)
}

/// Read a project from disk.
pub fn load_project(path: &Path) -> Result<Project, ImportError> {
    let text = fs::read_to_string(path)?;
    parse_project(&text)
}

impl Document {
    /// Build a document from a validated project.
    pub fn from_project(project: Project) -> Self {
        let mut doc = Document::new(project.canvas);
        doc.apply_project(project);
        doc
    }

    /// Replace this document's contents with `project`. History restarts
    /// and the top layer becomes active.
    pub fn apply_project(&mut self, project: Project) {
        self.replace_contents(project.canvas, project.layers);
        if let Some(palette) = project.custom_palette {
            self.set_custom_palette(palette);
        }
        if let Some(color) = project.selected_color {
            self.set_paint_color(color);
        }
        log::info!("loaded project: {} canvas, {} layers", self.canvas(), self.layers().len());
    }

    /// Validate `json` and, only if it is valid, replace this document with it.
    pub fn import_json(&mut self, json: &str) -> Result<(), ImportError> {
        let project = parse_project(json)?;
        self.apply_project(project);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);

    #[test]
    fn test_missing_required_fields() {
        assert!(matches!(parse_project(r#"{"layers": []}"#), Err(ImportError::MissingField("canvasSize"))));
        assert!(matches!(
            parse_project(r#"{"canvasSize": {"width": 16, "height": 16}}"#),
            Err(ImportError::MissingField("layers"))
        ));
        assert!(matches!(
            parse_project(r#"{"canvasSize": {"width": 16, "height": 16}, "layers": []}"#),
            Err(ImportError::NoLayers)
        ));
        assert!(matches!(parse_project("not json"), Err(ImportError::Json(_))));
    }

    #[test]
    fn test_layer_defaults() {
        let project = parse_project(
            r##"{"canvasSize": {"width": 16, "height": 16},
                "layers": [{"pixels": {"1,2": "#f00"}, "opacity": 0}, {"id": "bg", "visible": false}]}"##,
        )
        .unwrap();
        let top = project.layers.get(0).unwrap();
        assert_eq!(top.id.as_str(), "layer-import-1");
        assert_eq!(top.name, "Imported layer");
        assert!(top.visible);
        assert!(!top.locked);
        assert_eq!(top.opacity, 1.0);
        assert_eq!(top.get(PixelKey::new(1, 2)), Some(RED));

        let bottom = project.layers.get(1).unwrap();
        assert_eq!(bottom.id.as_str(), "bg");
        assert!(!bottom.visible);
        assert_eq!(project.layers.active_index(), 0);
    }

    #[test]
    fn test_canvas_clamped_and_cells_cropped() {
        let project = parse_project(
            r##"{"canvasSize": {"width": 4, "height": 9000},
                "layers": [{"pixels": {"7,0": "#000000", "8,0": "#000000"}}]}"##,
        )
        .unwrap();
        assert_eq!(project.canvas, CanvasSize { width: 8, height: 512 });
        assert_eq!(project.layers.get(0).unwrap().pixels.len(), 1);
    }

    #[test]
    fn test_duplicate_ids_renamed_to_free_ids() {
        let project = parse_project(
            r#"{"canvasSize": {"width": 8, "height": 8},
                "layers": [{"id": "layer-import-2"}, {}, {"id": "a"}, {"id": "a"}, {"id": "layer-import-1"}]}"#,
        )
        .unwrap();
        let ids: Vec<&str> = project.layers.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["layer-import-2", "layer-import-3", "a", "layer-import-4", "layer-import-1"]);
    }

    #[test]
    fn test_bad_cells_rejected() {
        let bad_key = r##"{"canvasSize": {"width": 8, "height": 8}, "layers": [{"pixels": {"1;2": "#000"}}]}"##;
        assert!(matches!(parse_project(bad_key), Err(ImportError::InvalidPixelKey { .. })));
        let bad_color = r#"{"canvasSize": {"width": 8, "height": 8}, "layers": [{"pixels": {"1,2": "red"}}]}"#;
        assert!(matches!(parse_project(bad_color), Err(ImportError::InvalidColor { .. })));
    }

    #[test]
    fn test_failed_import_leaves_document() {
        let mut doc = Document::default();
        doc.draw_at(PixelKey::new(0, 0)).unwrap();
        let before = doc.layers().clone();
        assert!(doc.import_json(r#"{"layers": []}"#).is_err());
        assert_eq!(doc.layers(), &before);
        assert_eq!(doc.history().len(), 2);
    }

    #[test]
    fn test_export_then_import() {
        let mut doc = Document::new(CanvasSize { width: 16, height: 8 });
        doc.set_paint_color(RED);
        doc.draw_at(PixelKey::new(10, 3)).unwrap();
        doc.add_layer();
        doc.set_layer_opacity(0, 0.25).unwrap();
        doc.add_custom_color(RED);

        let json = export_json(&doc).unwrap();
        assert!(json.contains("\"10,3\": \"#FF0000\""));
        assert!(json.contains("\"version\": \"1.0.0\""));

        let restored = Document::from_project(parse_project(&json).unwrap());
        assert_eq!(restored.canvas(), doc.canvas());
        assert_eq!(restored.layers().len(), 2);
        assert_eq!(restored.layers().get(0).unwrap().opacity, 0.25);
        assert_eq!(restored.layers().get(1).unwrap().get(PixelKey::new(10, 3)), Some(RED));
        assert_eq!(restored.custom_palette(), &[RED]);
        assert_eq!(restored.paint_color(), RED);
        assert_eq!(restored.history().len(), 1);
    }

    #[test]
    fn test_timestamp_forms() {
        let file: ProjectFile = serde_json::from_str(r#"{"timestamp": 1700000000000, "autoSave": true}"#).unwrap();
        assert!(file.is_autosave());
        assert_eq!(file.saved_at_millis(), Some(1_700_000_000_000));

        let file: ProjectFile = serde_json::from_str(r#"{"timestamp": "2024-01-01T00:00:00.000Z"}"#).unwrap();
        assert!(!file.is_autosave());
        assert_eq!(file.saved_at_millis(), None);
    }
}
