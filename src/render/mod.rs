//! Raster rendering: drawing resolved field text onto badge surfaces.

pub mod field;

pub use field::render_field;
