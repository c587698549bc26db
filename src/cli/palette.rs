//! Palette command implementation

use clap::Subcommand;
use std::process::ExitCode;

use crate::color::Color;
use crate::config::PxgConfig;
use crate::document::Document;
use crate::storage::{load_palette, save_palette, FileStore, StorageError};
use crate::telemetry::report;

use super::{EXIT_ERROR, EXIT_SUCCESS};

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum PaletteAction {
    /// List the saved custom colors
    List,
    /// Add a color (#RGB or #RRGGBB)
    Add { color: Color },
    /// Remove a color
    Remove { color: Color },
}

/// Execute the palette command
pub fn run_palette(action: PaletteAction, config: &PxgConfig) -> ExitCode {
    let mut store = FileStore::new(&config.storage.dir);
    match update(&mut store, &action) {
        Ok(colors) => {
            if colors.is_empty() {
                println!("Custom palette is empty");
            }
            for color in colors {
                println!("{}", color);
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            report("palette", store.dir(), "storage_error", &e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Apply `action` to the stored palette and return the resulting colors.
fn update(store: &mut FileStore, action: &PaletteAction) -> Result<Vec<Color>, StorageError> {
    let mut doc = Document::default();
    doc.set_custom_palette(load_palette(&*store)?);

    let changed = match action {
        PaletteAction::List => false,
        PaletteAction::Add { color } => {
            let added = doc.add_custom_color(*color);
            if !added {
                println!("{} is already in the palette", color);
            }
            added
        }
        PaletteAction::Remove { color } => {
            let removed = doc.remove_custom_color(*color);
            if !removed {
                println!("{} is not in the palette", color);
            }
            removed
        }
    };

    if changed {
        save_palette(store, doc.custom_palette())?;
    }
    Ok(doc.custom_palette().to_vec())
}
