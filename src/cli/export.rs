//! Export command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::PxgConfig;
use crate::output::{export_to_path, OutputError};
use crate::telemetry::report;

use super::{open_document, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the export command
pub fn run_export(file: &Path, output: &Path, config: &PxgConfig) -> ExitCode {
    let doc = match open_document("export", file, config) {
        Ok(doc) => doc,
        Err(code) => return code,
    };

    let options = config.export_options();
    match export_to_path(&doc, output, options) {
        Ok(format) => {
            println!("Exported {} as {:?} (scale {}) to {}", file.display(), format, options.scale, output.display());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            report("export", output, e.kind(), &e);
            match e {
                OutputError::UnsupportedFormat(_) | OutputError::UnsupportedScale(_) => {
                    ExitCode::from(EXIT_INVALID_ARGS)
                }
                _ => ExitCode::from(EXIT_ERROR),
            }
        }
    }
}
