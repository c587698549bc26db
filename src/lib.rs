//! Pixelgrid - Layered pixel-grid editing engine
//!
//! This library provides:
//! - A layer stack of sparse cell maps with visibility, lock and opacity
//! - Rectangle, magic wand and lasso selections with delete, fill and move
//! - Copy and a previewed paste, plus linear undo/redo over layer snapshots
//! - Preview and export compositing, PNG/JPEG/SVG output and a JSON project
//!   format with autosave
//!
//! All edits go through [`document::Document`].

pub mod canvas;
pub mod cli;
pub mod clipboard;
pub mod clock;
pub mod color;
pub mod composition;
pub mod config;
pub mod document;
pub mod edit;
pub mod history;
pub mod layers;
pub mod models;
pub mod output;
pub mod project;
pub mod selection;
pub mod storage;
pub mod telemetry;
