//! Command-line interface implementation
//!
//! This module provides the `pxg` entry point and dispatches to submodules
//! for specific command implementations. Every command loads a project file,
//! drives a [`Document`] through one or more actions, and writes the result
//! back.

mod draw;
mod export;
mod layer;
mod palette;
mod project;
mod restore;
mod select;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{self, CliOverrides, PxgConfig};
use crate::document::Document;
use crate::models::CanvasSize;
use crate::output;
use crate::project as project_file;
use crate::storage::{self, FileStore};
use crate::telemetry;

pub use layer::LayerAction;
pub use palette::PaletteAction;
pub use select::{EditAction, Selector};

/// Exit codes for `pxg`
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// pxg - Headless pixel-art editor for layered project files
#[derive(Parser)]
#[command(name = "pxg")]
#[command(about = "pxg - Edit, select, and export layered pixel-art projects")]
#[command(version)]
pub struct Cli {
    /// Config file to use instead of discovering pxg.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log library activity at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append import/export failures to the local error log
    #[arg(long, global = true)]
    pub collect_errors: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new, empty project file
    New {
        /// Project file to create
        file: PathBuf,

        /// Canvas size as WxH or a single side (clamped to 8-512)
        #[arg(long, value_parser = parse_canvas_size)]
        size: Option<CanvasSize>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show canvas size, layers and pixel counts
    Info {
        /// Project file to inspect
        file: PathBuf,

        /// Print the project as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Draw or erase cells on one layer as a single undoable stroke
    Draw {
        /// Project file to edit
        file: PathBuf,

        /// Layer index to paint on (0 is the topmost layer)
        #[arg(long)]
        layer: Option<usize>,

        /// Paint a cell, as x,y=COLOR (repeatable)
        #[arg(long = "set", value_name = "X,Y=COLOR")]
        set: Vec<draw::CellPaint>,

        /// Erase a cell, as x,y (repeatable)
        #[arg(long = "erase", value_name = "X,Y")]
        erase: Vec<crate::models::PixelKey>,

        /// Write the result here instead of editing in place
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Select cells and apply one edit to the selection
    Select {
        /// Project file to edit
        file: PathBuf,

        /// Layer index to select from (0 is the topmost layer)
        #[arg(long)]
        layer: Option<usize>,

        #[command(flatten)]
        selector: Selector,

        /// Magic wand color tolerance (0-100)
        #[arg(long)]
        tolerance: Option<f64>,

        /// Whether rectangle and lasso selections take empty cells
        #[arg(long)]
        include_transparent: Option<bool>,

        #[command(flatten)]
        action: EditAction,

        /// Write the result here instead of editing in place
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add, remove, reorder, or change properties of layers
    Layer {
        /// Project file to edit
        file: PathBuf,

        #[command(subcommand)]
        action: LayerAction,
    },

    /// Resize the canvas, discarding pixels outside the new bounds
    Resize {
        /// Project file to edit
        file: PathBuf,

        /// New size as WxH or a single side (clamped to 8-512)
        #[arg(value_parser = parse_canvas_size)]
        size: CanvasSize,
    },

    /// Export the flattened image or the project JSON
    Export {
        /// Project file to export
        file: PathBuf,

        /// Output file; the format follows the extension (png, jpg, svg, json)
        #[arg(short, long)]
        output: PathBuf,

        /// Scale factor for raster and vector output (1, 2, 4, 8, 16)
        #[arg(long)]
        scale: Option<u32>,

        /// JPEG quality (1-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: Option<u8>,
    },

    /// Report or restore an autosaved project
    Restore {
        /// Autosave directory (defaults to storage.dir from pxg.toml)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Write the restored project to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Offer the autosave regardless of its age
        #[arg(long)]
        any_age: bool,
    },

    /// Manage the persisted custom palette
    Palette {
        /// Palette directory (defaults to storage.dir from pxg.toml)
        #[arg(long)]
        dir: Option<PathBuf>,

        #[command(subcommand)]
        action: PaletteAction,
    },
}

/// Parse a canvas size argument.
fn parse_canvas_size(s: &str) -> Result<CanvasSize, String> {
    crate::canvas::parse_size(s).ok_or_else(|| format!("invalid size '{}', expected WxH", s))
}

/// Run the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut overrides = CliOverrides { collect_errors: cli.collect_errors.then_some(true), ..Default::default() };
    match &cli.command {
        Commands::Select { tolerance, include_transparent, .. } => {
            overrides.tolerance = *tolerance;
            overrides.include_transparent = *include_transparent;
        }
        Commands::Export { scale, quality, .. } => {
            overrides.scale = *scale;
            overrides.jpeg_quality = *quality;
        }
        Commands::Restore { dir, .. } | Commands::Palette { dir, .. } => {
            overrides.storage_dir = dir.clone();
        }
        _ => {}
    }

    let config = match load_config(cli.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };
    telemetry::init_collector(&config.telemetry.error_log, config.telemetry.collect_errors);

    match cli.command {
        Commands::New { file, size, force } => project::run_new(&file, size, force, &config),
        Commands::Info { file, json } => project::run_info(&file, json, &config),
        Commands::Draw { file, layer, set, erase, output } => {
            draw::run_draw(&file, layer, &set, &erase, output.as_deref(), &config)
        }
        Commands::Select { file, layer, selector, action, output, .. } => {
            select::run_select(&file, layer, &selector, &action, output.as_deref(), &config)
        }
        Commands::Layer { file, action } => layer::run_layer(&file, action, &config),
        Commands::Resize { file, size } => project::run_resize(&file, size, &config),
        Commands::Export { file, output, .. } => export::run_export(&file, &output, &config),
        Commands::Restore { output, any_age, .. } => restore::run_restore(output.as_deref(), any_age, &config),
        Commands::Palette { action, .. } => palette::run_palette(action, &config),
    }
}

/// Install the logger. `RUST_LOG` wins; otherwise warn, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

fn load_config(path: Option<&Path>, overrides: &CliOverrides) -> Result<PxgConfig, ExitCode> {
    let mut config = match config::load_config(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return Err(ExitCode::from(EXIT_ERROR));
        }
    };
    config::merge_cli_overrides(&mut config, overrides);

    let errors = config.validate();
    if !errors.is_empty() {
        for e in errors {
            eprintln!("Error: {}", e);
        }
        return Err(ExitCode::from(EXIT_INVALID_ARGS));
    }
    Ok(config)
}

/// Load a project into a document configured from `config`.
///
/// Import failures are reported on stderr and to the error log.
pub(crate) fn open_document(command: &str, path: &Path, config: &PxgConfig) -> Result<Document, ExitCode> {
    let project = match project_file::load_project(path) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Error: cannot open {}: {}", path.display(), e);
            telemetry::report(command, path, e.kind(), &e);
            return Err(ExitCode::from(EXIT_ERROR));
        }
    };

    let mut doc = Document::from_project(project);
    let options = config.selection_options();
    doc.set_tolerance(options.tolerance);
    doc.set_include_transparent(options.include_transparent);
    Ok(doc)
}

/// Record `doc` as the latest autosave in the configured storage directory.
/// A failed autosave is logged and reported but never fails the command.
pub(crate) fn autosave_document(command: &str, doc: &Document, config: &PxgConfig) {
    let mut store = FileStore::new(&config.storage.dir);
    if let Err(e) = storage::autosave(&mut store, doc) {
        log::warn!("autosave to {} failed: {}", store.dir().display(), e);
        telemetry::report(command, store.dir(), "storage_error", &e);
    }
}

/// Write `doc` as project JSON to `path`.
pub(crate) fn save_document(command: &str, doc: &Document, path: &Path) -> Result<(), ExitCode> {
    let written = project_file::export_json(doc)
        .map_err(output::OutputError::from)
        .and_then(|json| output::write_file(path, json.as_bytes()));
    match written {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: cannot write {}: {}", path.display(), e);
            telemetry::report(command, path, e.kind(), &e);
            Err(ExitCode::from(EXIT_ERROR))
        }
    }
}
