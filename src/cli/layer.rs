//! Layer command implementation

use clap::Subcommand;
use std::path::Path;
use std::process::ExitCode;

use crate::config::PxgConfig;
use crate::document::Document;
use crate::layers::{Direction, LayerError};

use super::{autosave_document, open_document, save_document, EXIT_ERROR, EXIT_SUCCESS};

/// Layer indices count from 0, the topmost layer.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum LayerAction {
    /// Add an empty layer on top
    Add,
    /// Remove a layer (the last layer cannot be removed)
    Remove { index: usize },
    /// Move a layer one step toward the top
    Up { index: usize },
    /// Move a layer one step toward the bottom
    Down { index: usize },
    /// Hide a layer
    Hide { index: usize },
    /// Show a hidden layer
    Show { index: usize },
    /// Lock a layer against edits
    Lock { index: usize },
    /// Unlock a layer
    Unlock { index: usize },
    /// Set a layer's preview opacity (0.0-1.0)
    Opacity { index: usize, value: f32 },
    /// Rename a layer
    Rename { index: usize, name: String },
}

/// Execute the layer command
pub fn run_layer(file: &Path, action: LayerAction, config: &PxgConfig) -> ExitCode {
    let mut doc = match open_document("layer", file, config) {
        Ok(doc) => doc,
        Err(code) => return code,
    };

    let message = match apply(&mut doc, action) {
        Ok(message) => message,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if let Err(code) = save_document("layer", &doc, file) {
        return code;
    }
    autosave_document("layer", &doc, config);
    println!("{}", message);
    ExitCode::from(EXIT_SUCCESS)
}

fn layer_name(doc: &Document, index: usize) -> String {
    doc.layers().get(index).map(|l| l.name.clone()).unwrap_or_default()
}

fn apply(doc: &mut Document, action: LayerAction) -> Result<String, LayerError> {
    let message = match action {
        LayerAction::Add => {
            let index = doc.add_layer();
            format!("Added '{}'", layer_name(doc, index))
        }
        LayerAction::Remove { index } => {
            let removed = doc.remove_layer(index)?;
            format!("Removed '{}'", removed.name)
        }
        LayerAction::Up { index } | LayerAction::Down { index } => {
            let direction = if matches!(action, LayerAction::Up { .. }) { Direction::Up } else { Direction::Down };
            let name = layer_name(doc, index);
            if doc.reorder_layer(index, direction)? {
                format!("Moved '{}' {}", name, if direction == Direction::Up { "up" } else { "down" })
            } else {
                format!("'{}' is already at the edge", name)
            }
        }
        LayerAction::Hide { index } | LayerAction::Show { index } => {
            let visible = matches!(action, LayerAction::Show { .. });
            doc.set_layer_visible(index, visible)?;
            format!("'{}' is now {}", layer_name(doc, index), if visible { "visible" } else { "hidden" })
        }
        LayerAction::Lock { index } | LayerAction::Unlock { index } => {
            let locked = matches!(action, LayerAction::Lock { .. });
            doc.set_layer_locked(index, locked)?;
            format!("'{}' is now {}", layer_name(doc, index), if locked { "locked" } else { "unlocked" })
        }
        LayerAction::Opacity { index, value } => {
            doc.set_layer_opacity(index, value)?;
            let opacity = doc.layers().get(index).map(|l| l.opacity).unwrap_or(value);
            format!("'{}' opacity is now {:.2}", layer_name(doc, index), opacity)
        }
        LayerAction::Rename { index, ref name } => {
            if doc.rename_layer(index, name)? {
                format!("Renamed layer {} to '{}'", index, layer_name(doc, index))
            } else {
                format!("Layer {} left unchanged", index)
            }
        }
    };
    Ok(message)
}
