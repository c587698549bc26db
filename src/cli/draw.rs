//! Draw command implementation

use std::path::Path;
use std::process::ExitCode;
use std::str::FromStr;

use crate::color::Color;
use crate::config::PxgConfig;
use crate::document::{Document, StrokeTool};
use crate::layers::LayerError;
use crate::models::PixelKey;

use super::{autosave_document, open_document, save_document, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// One `--set x,y=COLOR` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPaint {
    pub key: PixelKey,
    pub color: Color,
}

impl FromStr for CellPaint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, color) = s.split_once('=').ok_or_else(|| format!("expected X,Y=COLOR, got '{}'", s))?;
        let key = key.trim().parse::<PixelKey>().map_err(|e| e.to_string())?;
        let color = color.parse::<Color>().map_err(|e| e.to_string())?;
        Ok(Self { key, color })
    }
}

/// Execute the draw command
pub fn run_draw(
    file: &Path,
    layer: Option<usize>,
    set: &[CellPaint],
    erase: &[PixelKey],
    output: Option<&Path>,
    config: &PxgConfig,
) -> ExitCode {
    if set.is_empty() && erase.is_empty() {
        eprintln!("Error: nothing to draw (use --set or --erase)");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let mut doc = match open_document("draw", file, config) {
        Ok(doc) => doc,
        Err(code) => return code,
    };
    if let Some(index) = layer {
        if let Err(e) = doc.set_active_layer(index) {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    }

    let painted = match apply_strokes(&mut doc, set, erase) {
        Ok(count) => count,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let target = output.unwrap_or(file);
    if let Err(code) = save_document("draw", &doc, target) {
        return code;
    }
    autosave_document("draw", &doc, config);

    let skipped = set.len() + erase.len() - painted;
    if skipped > 0 {
        println!("Updated {} cells in {} ({} off canvas)", painted, target.display(), skipped);
    } else {
        println!("Updated {} cells in {}", painted, target.display());
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Paint all `set` cells as one stroke, then erase all `erase` cells as a
/// second. Returns how many cells were on the canvas.
fn apply_strokes(doc: &mut Document, set: &[CellPaint], erase: &[PixelKey]) -> Result<usize, LayerError> {
    let mut touched = 0;

    if !set.is_empty() {
        doc.begin_stroke(StrokeTool::Draw)?;
        for paint in set {
            doc.set_paint_color(paint.color);
            if doc.stroke_to(paint.key)? {
                touched += 1;
            }
        }
        doc.end_stroke();
    }

    if !erase.is_empty() {
        doc.begin_stroke(StrokeTool::Erase)?;
        for key in erase {
            if doc.stroke_to(*key)? {
                touched += 1;
            }
        }
        doc.end_stroke();
    }

    Ok(touched)
}
