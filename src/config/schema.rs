//! Configuration schema types for `pxg.toml`
//!
//! Every section and field is optional; missing values take the defaults
//! of a fresh editor session.

use crate::models::CanvasSize;
use crate::output::{ExportOptions, DEFAULT_JPEG_QUALITY, EXPORT_SCALES};
use crate::selection::{SelectionOptions, MAX_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// New-document canvas size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        let size = CanvasSize::default();
        Self { width: size.width, height: size.height }
    }
}

/// Selection tool defaults
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Magic wand tolerance, 0-100
    pub tolerance: f64,
    /// Whether rectangle and lasso selections take empty cells
    pub include_transparent: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        let options = SelectionOptions::default();
        Self { tolerance: options.tolerance, include_transparent: options.include_transparent }
    }
}

/// Export defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Scale factor, one of 1, 2, 4, 8, 16
    pub scale: u32,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { scale: 1, jpeg_quality: DEFAULT_JPEG_QUALITY }
    }
}

/// Autosave and palette storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the autosave and palette records
    pub dir: PathBuf,
    /// Minimum autosave age, in seconds, before a restore is offered
    pub restore_after_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from(".pxg"), restore_after_secs: 300 }
    }
}

/// Error collection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Enable local error collection
    pub collect_errors: bool,
    /// JSONL file errors are appended to
    pub error_log: PathBuf,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { collect_errors: false, error_log: PathBuf::from(".pxg/errors.jsonl") }
    }
}

/// Root of `pxg.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PxgConfig {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "export.scale")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pxg.toml: '{}' {}", self.field, self.message)
    }
}

impl PxgConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut fail = |field: &str, message: String| {
            errors.push(ConfigValidationError { field: field.to_string(), message });
        };

        let side = CanvasSize::MIN..=CanvasSize::MAX;
        if !side.contains(&self.canvas.width) {
            fail("canvas.width", format!("must be between {} and {}", CanvasSize::MIN, CanvasSize::MAX));
        }
        if !side.contains(&self.canvas.height) {
            fail("canvas.height", format!("must be between {} and {}", CanvasSize::MIN, CanvasSize::MAX));
        }

        if !(0.0..=MAX_TOLERANCE).contains(&self.selection.tolerance) {
            fail("selection.tolerance", format!("must be between 0 and {}", MAX_TOLERANCE));
        }

        if !EXPORT_SCALES.contains(&self.export.scale) {
            fail("export.scale", "must be one of 1, 2, 4, 8, 16".to_string());
        }
        if !(1..=100).contains(&self.export.jpeg_quality) {
            fail("export.jpeg_quality", "must be between 1 and 100".to_string());
        }

        if self.storage.dir.as_os_str().is_empty() {
            fail("storage.dir", "must be a non-empty path".to_string());
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Canvas for new documents, clamped into range.
    pub fn canvas_size(&self) -> CanvasSize {
        CanvasSize::clamped(i64::from(self.canvas.width), i64::from(self.canvas.height))
    }

    pub fn selection_options(&self) -> SelectionOptions {
        SelectionOptions {
            tolerance: self.selection.tolerance.clamp(0.0, MAX_TOLERANCE),
            include_transparent: self.selection.include_transparent,
        }
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions { scale: self.export.scale, jpeg_quality: self.export.jpeg_quality }
    }

    pub fn restore_after(&self) -> Duration {
        Duration::from_secs(self.storage.restore_after_secs)
    }
}
