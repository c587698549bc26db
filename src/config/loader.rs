//! Configuration loading and discovery for `pxg.toml`
//!
//! Discovery walks up from the working directory, then falls back to the
//! XDG config home. A missing file is not an error: defaults apply.

use super::schema::PxgConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file.
pub const CONFIG_FILE: &str = "pxg.toml";

/// Why `pxg.toml` could not be used
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("cannot read pxg.toml: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("pxg.toml is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("invalid settings in pxg.toml:\n{}", .0.iter().map(|e| format!("  {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// Command-line flags that win over `pxg.toml`
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override magic wand tolerance
    pub tolerance: Option<f64>,
    /// Override transparent-cell selection
    pub include_transparent: Option<bool>,
    /// Override export scale factor
    pub scale: Option<u32>,
    /// Override JPEG quality
    pub jpeg_quality: Option<u8>,
    /// Override autosave directory
    pub storage_dir: Option<PathBuf>,
    /// Turn on the local error log
    pub collect_errors: Option<bool>,
}

/// Find pxg.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for pxg.toml
/// 2. Check XDG_CONFIG_HOME/pixelgrid/pxg.toml (or ~/.config/pixelgrid/pxg.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find pxg.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("pixelgrid").join(CONFIG_FILE);
    config_path.exists().then_some(config_path)
}

/// Find pxg.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration.
///
/// If a path is provided, loads from that file (which must exist).
/// Otherwise, uses [`find_config`]; when nothing is found the defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<PxgConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            log::debug!("loading config from {}", p.display());
            load_config_file(&p)
        }
        None => Ok(PxgConfig::default()),
    }
}

/// Load and validate configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<PxgConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: PxgConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Apply every flag that was given on top of `config`.
pub fn merge_cli_overrides(config: &mut PxgConfig, overrides: &CliOverrides) {
    if let Some(tolerance) = overrides.tolerance {
        config.selection.tolerance = tolerance;
    }
    if let Some(include) = overrides.include_transparent {
        config.selection.include_transparent = include;
    }
    if let Some(scale) = overrides.scale {
        config.export.scale = scale;
    }
    if let Some(quality) = overrides.jpeg_quality {
        config.export.jpeg_quality = quality;
    }
    if let Some(ref dir) = overrides.storage_dir {
        config.storage.dir = dir.clone();
    }
    if let Some(collect_errors) = overrides.collect_errors {
        config.telemetry.collect_errors = collect_errors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_finds_config_beside_cwd() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(CONFIG_FILE);
        fs::write(&config_path, "[canvas]\nwidth = 16\n").unwrap();

        assert_eq!(find_config_from(temp.path().to_path_buf()), Some(config_path));
    }

    #[test]
    fn test_finds_config_in_ancestor() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(CONFIG_FILE);
        fs::write(&config_path, "").unwrap();

        let subdir = temp.path().join("art").join("sprites");
        fs::create_dir_all(&subdir).unwrap();

        assert_eq!(find_config_from(subdir), Some(config_path));
    }

    #[test]
    fn test_no_config_anywhere() {
        let temp = TempDir::new().unwrap();
        assert_eq!(find_config_from(temp.path().to_path_buf()), None);
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(CONFIG_FILE);
        fs::write(&config_path, "[canvas]\nwidth = 128\nheight = 128\n\n[export]\nscale = 2\n")
            .unwrap();

        let config = load_config(Some(&config_path)).unwrap();
        assert_eq!(config.canvas.width, 128);
        assert_eq!(config.export.scale, 2);
    }

    #[test]
    fn test_missing_explicit_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let result = load_config(Some(&temp.path().join("nonexistent.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(CONFIG_FILE);
        fs::write(&config_path, "this is not valid toml {{{").unwrap();

        assert!(matches!(load_config(Some(&config_path)), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_out_of_range_value_is_validation_error() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(CONFIG_FILE);
        fs::write(&config_path, "[export]\nscale = 0\n").unwrap();

        match load_config(Some(&config_path)) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("export.scale"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_file_values() {
        let mut config = PxgConfig::default();
        let overrides = CliOverrides {
            tolerance: Some(40.0),
            scale: Some(16),
            storage_dir: Some(PathBuf::from("elsewhere")),
            ..Default::default()
        };

        merge_cli_overrides(&mut config, &overrides);
        assert_eq!(config.selection.tolerance, 40.0);
        assert!(config.selection.include_transparent);
        assert_eq!(config.export.scale, 16);
        assert_eq!(config.export.jpeg_quality, 90);
        assert_eq!(config.storage.dir, PathBuf::from("elsewhere"));
    }
}
