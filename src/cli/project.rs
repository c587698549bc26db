//! Project file commands (new, info, resize)

use std::path::Path;
use std::process::ExitCode;

use crate::config::PxgConfig;
use crate::document::Document;
use crate::models::CanvasSize;
use crate::project::export_json;

use super::{autosave_document, open_document, save_document, EXIT_ERROR, EXIT_SUCCESS};

/// Execute the new command
pub fn run_new(file: &Path, size: Option<CanvasSize>, force: bool, config: &PxgConfig) -> ExitCode {
    if file.exists() && !force {
        eprintln!("Error: {} already exists (use --force to overwrite)", file.display());
        return ExitCode::from(EXIT_ERROR);
    }

    let size = size.unwrap_or_else(|| config.canvas_size());
    let doc = Document::new(size);
    if let Err(code) = save_document("new", &doc, file) {
        return code;
    }

    println!("Created {} ({} canvas)", file.display(), doc.canvas());
    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the info command
pub fn run_info(file: &Path, json: bool, config: &PxgConfig) -> ExitCode {
    let doc = match open_document("info", file, config) {
        Ok(doc) => doc,
        Err(code) => return code,
    };

    if json {
        match export_json(&doc) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
        return ExitCode::from(EXIT_SUCCESS);
    }

    println!("{}", file.display());
    println!("  canvas: {}", doc.canvas());
    println!("  color:  {}", doc.paint_color());
    if !doc.custom_palette().is_empty() {
        let palette: Vec<String> = doc.custom_palette().iter().map(|c| c.to_hex()).collect();
        println!("  palette: {}", palette.join(" "));
    }
    println!("  layers ({}, top first):", doc.layers().len());
    for (i, layer) in doc.layers().iter().enumerate() {
        let mut flags = Vec::new();
        if !layer.visible {
            flags.push("hidden");
        }
        if layer.locked {
            flags.push("locked");
        }
        let flags = if flags.is_empty() { String::new() } else { format!(" [{}]", flags.join(", ")) };
        println!(
            "    {:>2}  {:<16} {:<12} opacity {:.2}  {} pixels{}",
            i,
            layer.name,
            layer.id.0,
            layer.opacity,
            layer.pixels.len(),
            flags
        );
    }
    println!("  visible pixels: {}", doc.export_pixels().len());

    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the resize command
pub fn run_resize(file: &Path, size: CanvasSize, config: &PxgConfig) -> ExitCode {
    let mut doc = match open_document("resize", file, config) {
        Ok(doc) => doc,
        Err(code) => return code,
    };

    let before = doc.canvas();
    let dropped = doc.resize(i64::from(size.width), i64::from(size.height));
    if let Err(code) = save_document("resize", &doc, file) {
        return code;
    }
    autosave_document("resize", &doc, config);

    println!("Resized {} from {} to {} ({} pixels discarded)", file.display(), before, doc.canvas(), dropped);
    ExitCode::from(EXIT_SUCCESS)
}
