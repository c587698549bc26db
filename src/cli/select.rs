//! Select command implementation (headless selection + edit)

use clap::Args;
use std::path::Path;
use std::process::ExitCode;
use std::str::FromStr;

use crate::color::Color;
use crate::config::PxgConfig;
use crate::document::Document;
use crate::edit::EditError;
use crate::models::{Bounds, PixelKey};

use super::{autosave_document, open_document, save_document, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// How to build the selection. Exactly one is required.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct Selector {
    /// Rectangle between two corners, as x0,y0,x1,y1 (inclusive)
    #[arg(long, value_name = "X0,Y0,X1,Y1", value_parser = parse_rect)]
    pub rect: Option<Bounds>,

    /// Magic wand seed cell, as x,y
    #[arg(long, value_name = "X,Y")]
    pub wand: Option<PixelKey>,

    /// Lasso path, as x,y;x,y;... (at least three points)
    #[arg(long, value_name = "X,Y;X,Y;...")]
    pub lasso: Option<LassoPoints>,
}

/// What to do with the selection. Exactly one is required.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct EditAction {
    /// Paint every selected cell with this color
    #[arg(long, value_name = "COLOR")]
    pub fill: Option<Color>,

    /// Clear the selected cells
    #[arg(long)]
    pub delete: bool,

    /// Shift the selected pixels, as dx,dy
    #[arg(long = "move", value_name = "DX,DY", allow_hyphen_values = true)]
    pub shift: Option<Offset>,

    /// Copy the selection and paste it with its top-left at x,y
    #[arg(long, value_name = "X,Y")]
    pub copy_to: Option<PixelKey>,
}

/// Lasso vertices in drawing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LassoPoints(pub Vec<PixelKey>);

impl FromStr for LassoPoints {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let points = s
            .split(';')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<PixelKey>().map_err(|e| e.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        if points.len() < 3 {
            return Err(format!("a lasso needs at least three points, got {}", points.len()));
        }
        Ok(Self(points))
    }
}

/// A `dx,dy` move offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl FromStr for Offset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.parse::<PixelKey>().map_err(|_| format!("invalid offset '{}', expected DX,DY", s))?;
        Ok(Self { dx: key.x, dy: key.y })
    }
}

fn parse_rect(s: &str) -> Result<Bounds, String> {
    let parts: Vec<i32> = s
        .split(',')
        .map(|p| p.trim().parse::<i32>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("invalid rectangle '{}', expected X0,Y0,X1,Y1", s))?;
    match parts.as_slice() {
        [x0, y0, x1, y1] => Ok(Bounds::from_corners(PixelKey::new(*x0, *y0), PixelKey::new(*x1, *y1))),
        _ => Err(format!("invalid rectangle '{}', expected X0,Y0,X1,Y1", s)),
    }
}

/// Execute the select command
pub fn run_select(
    file: &Path,
    layer: Option<usize>,
    selector: &Selector,
    action: &EditAction,
    output: Option<&Path>,
    config: &PxgConfig,
) -> ExitCode {
    let mut doc = match open_document("select", file, config) {
        Ok(doc) => doc,
        Err(code) => return code,
    };
    if let Some(index) = layer {
        if let Err(e) = doc.set_active_layer(index) {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    }

    let selected = select(&mut doc, selector);
    println!("Selected {} cells", selected);

    let summary = match apply(&mut doc, action) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let target = output.unwrap_or(file);
    if let Err(code) = save_document("select", &doc, target) {
        return code;
    }
    autosave_document("select", &doc, config);
    println!("{} in {}", summary, target.display());
    ExitCode::from(EXIT_SUCCESS)
}

/// Build the selection. Returns how many cells it holds.
fn select(doc: &mut Document, selector: &Selector) -> usize {
    let selection = if let Some(bounds) = selector.rect {
        doc.select_rect(bounds)
    } else if let Some(seed) = selector.wand {
        doc.magic_wand(seed)
    } else if let Some(LassoPoints(points)) = &selector.lasso {
        doc.select_lasso(points)
    } else {
        None
    };
    selection.map_or(0, |s| s.len())
}

/// Apply the edit and describe what happened.
fn apply(doc: &mut Document, action: &EditAction) -> Result<String, EditError> {
    if let Some(color) = action.fill {
        doc.set_paint_color(color);
        let filled = doc.fill_selection()?;
        Ok(format!("Filled {} cells with {}", filled, color))
    } else if action.delete {
        let cleared = doc.delete_selection()?;
        Ok(format!("Deleted {} pixels", cleared))
    } else if let Some(Offset { dx, dy }) = action.shift {
        let clipped = doc.move_selection(dx, dy)?;
        match clipped {
            0 => Ok(format!("Moved selection by {},{}", dx, dy)),
            n => Ok(format!("Moved selection by {},{} ({} pixels clipped)", dx, dy, n)),
        }
    } else if let Some(anchor) = action.copy_to {
        let copied = doc.copy()?;
        let written = doc.paste_at(anchor)?;
        Ok(format!("Copied {} pixels, pasted {} at {}", copied, written, anchor))
    } else {
        Err(EditError::EmptySelection)
    }
}
