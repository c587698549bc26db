//! Restore command implementation

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use crate::config::PxgConfig;
use crate::document::Document;
use crate::storage::{pending_restore, restore, FileStore};
use crate::telemetry::report;

use super::{save_document, EXIT_ERROR, EXIT_SUCCESS};

/// Execute the restore command
///
/// Without `output` this only reports whether a restore is available.
pub fn run_restore(output: Option<&Path>, any_age: bool, config: &PxgConfig) -> ExitCode {
    let mut store = FileStore::new(&config.storage.dir);
    let threshold = if any_age { Duration::ZERO } else { config.restore_after() };

    let file = match pending_restore(&store, threshold) {
        Ok(Some(file)) => file,
        Ok(None) => {
            println!("No autosave to restore in {}", store.dir().display());
            return ExitCode::from(EXIT_SUCCESS);
        }
        Err(e) => {
            eprintln!("Error: cannot read autosave: {}", e);
            report("restore", store.dir(), "storage_error", &e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let layers = file.layers.as_ref().map_or(0, Vec::len);
    let Some(output) = output else {
        println!("Autosave available in {} ({} layers)", store.dir().display(), layers);
        println!("Run with --output <file> to restore it");
        return ExitCode::from(EXIT_SUCCESS);
    };

    let mut doc = Document::new(config.canvas_size());
    if let Err(e) = restore(&mut store, &mut doc, file) {
        eprintln!("Error: cannot restore autosave: {}", e);
        report("restore", store.dir(), "storage_error", &e);
        return ExitCode::from(EXIT_ERROR);
    }
    if let Err(code) = save_document("restore", &doc, output) {
        return code;
    }

    println!("Restored autosave to {}", output.display());
    ExitCode::from(EXIT_SUCCESS)
}
