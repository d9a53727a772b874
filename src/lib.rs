//! # labelgen - SVG Label Generator
//!
//! labelgen fills SVG label templates with product data from CSV rows and
//! renders them to PDF. It provides:
//!
//! - **Placeholders**: elements whose (possibly `_xHHHH_`-escaped) id starts
//!   with `var_` are filled with row values
//! - **Barcodes**: EAN-13 and Code 128 images embedded as PNG data URIs
//! - **Rendering**: vector PDF via `svg2pdf`, with a rasterizing fallback
//! - **Output**: single previews, N-up grid sheets and ZIP batches
//!
//! ## Quick Start
//!
//! ```no_run
//! use labelgen::{
//!     barcode::{self, BarcodeOptions, Symbology},
//!     render::{RenderOptions, Renderer},
//!     template::{fill, ValueMap},
//! };
//!
//! let template = std::fs::read_to_string("templates/label.svg")?;
//!
//! let mut values = ValueMap::new();
//! values.insert("var_Name".to_string(), "Widget".to_string());
//! values.insert("var_Price".to_string(), "9.99".to_string());
//!
//! let code = barcode::encode("012345678905", Symbology::Ean13, &BarcodeOptions::default())?;
//! let svg = fill(&template, &values, Some(&code))?;
//!
//! let pdf = Renderer::new(RenderOptions::default()).render(&svg)?;
//! std::fs::write("label.pdf", pdf)?;
//!
//! # Ok::<(), labelgen::LabelError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`svg`] | XML tree, id decoding, placeholder index, sizes |
//! | [`template`] | Template filling |
//! | [`barcode`] | Barcode encoding to PNG |
//! | [`render`] | PDF rendering and grid sheets |
//! | [`batch`] | ZIP packaging and file names |
//! | [`table`] | CSV loading and column mapping |
//! | [`label`] | Preview, grid and batch jobs over CSV rows |
//! | [`config`] | TOML configuration |
//! | [`workspace`] | Template discovery and output directories |
//! | [`error`] | Error types |

pub mod barcode;
pub mod batch;
pub mod config;
pub mod error;
pub mod label;
pub mod render;
pub mod svg;
pub mod table;
pub mod template;
pub mod workspace;

// Re-exports for convenience
pub use config::LabelConfig;
pub use error::{LabelError, Result};
pub use label::{BatchReport, LabelJob};
pub use render::Renderer;
pub use template::{TemplateFiller, ValueMap};
