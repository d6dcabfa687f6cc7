//! # Lanyard - Bulk ID Badge Generator
//!
//! Lanyard turns a template image, a list of positioned text fields, a
//! field-to-column mapping, and a set of data rows into one PNG badge per
//! row. It provides:
//!
//! - **Text layout**: greedy word wrapping against a measurement closure
//! - **Auto-fit sizing**: binary search for the largest font size whose
//!   wrapped text fits a field's box
//! - **Field rendering**: aligned, optionally rotated, anti-aliased text
//!   drawn onto RGBA surfaces with ab_glyph
//! - **Badge rasterization**: per-row surfaces, PNG encoding, ordered
//!   output, progress callbacks
//! - **Font registration**: one-time discovery of the bundled font family
//!
//! ## Quick Start
//!
//! ```no_run
//! use lanyard::fonts::FontRegistry;
//! use lanyard::generate::{generate_badges, load_template};
//! use lanyard::template::{DataRow, FieldMapping, TemplateField};
//!
//! let registry = FontRegistry::global()?;
//! let template = load_template(std::path::Path::new("badge.png"))?;
//!
//! let fields: Vec<TemplateField> =
//!     serde_json::from_str(&std::fs::read_to_string("fields.json")?)?;
//! let mapping = FieldMapping::from([("f1".to_string(), "name".to_string())]);
//! let rows = vec![DataRow::from([
//!     ("name".to_string(), serde_json::json!("Alice")),
//! ])];
//!
//! let badges = generate_badges(
//!     &template, 400, 200, &fields, &mapping, &rows, registry,
//!     |current, total| println!("badge {current}/{total}"),
//! )?;
//! std::fs::write("badge-0.png", &badges[0])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`layout`] | Greedy word wrapping |
//! | [`fit`] | Auto-fit font sizing |
//! | [`fonts`] | Font discovery and measurement |
//! | [`render`] | Field drawing onto RGBA surfaces |
//! | [`generate`] | Per-row badge rasterization |
//! | [`template`] | Field, mapping, and row descriptors |
//! | [`dataset`] | CSV row ingestion |
//! | [`server`] | HTTP job service |
//! | [`error`] | Error types |

pub mod dataset;
pub mod error;
pub mod fit;
pub mod fonts;
pub mod generate;
pub mod layout;
pub mod render;
pub mod server;
pub mod template;

// Re-exports for convenience
pub use error::LanyardError;
pub use fonts::FontRegistry;
pub use template::{DataRow, FieldMapping, TemplateField};
