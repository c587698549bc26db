//! Configuration for the `pxg` front end
//!
//! Provides types, discovery and parsing for `pxg.toml`.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
