//! Layer flattening
//!
//! Two separate modes, never interchangeable:
//!
//! - [`preview_compose`] paints visible layers bottom to top with each layer's
//!   opacity as paint alpha, producing an RGBA image for on-screen feedback.
//! - [`export_compose`] merges raw colors of visible layers bottom to top,
//!   ignoring opacity, producing the pixel map used by every exporter.
//!
//! Both only read layer pixel maps.

mod blend;
mod render;

pub use render::{export_compose, overlay_cells, preview_compose};
