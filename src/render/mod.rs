//! # SVG to PDF Rendering
//!
//! Converts filled SVG documents into single-page PDFs.
//!
//! ## Backends
//!
//! | Backend | Crates | Fidelity |
//! |---------|--------|----------|
//! | Vector | `svg2pdf` | Paths, text and images stay vector |
//! | Raster | `resvg` + `lopdf` | Rasterized at `raster_dpi`, embedded as one image |
//!
//! The [`RenderStrategy`] picks which backends run. `Auto` tries the vector
//! backend and falls back to the raster backend when it fails; the fallback
//! is logged, never hidden.
//!
//! ## Page Size
//!
//! The page matches the document's intrinsic size (see [`crate::svg::size`]).
//! A document declaring no size at all is rendered on an A4 page (595×842 pt).
//!
//! ## Example
//!
//! ```no_run
//! use labelgen::render::{RenderOptions, Renderer};
//!
//! let renderer = Renderer::new(RenderOptions::default());
//! let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100"/>"#;
//! let pdf = renderer.render(svg)?;
//! # Ok::<(), labelgen::LabelError>(())
//! ```

pub mod grid;
pub mod page;
pub mod pdf;

pub use grid::{GridLayout, GridOptions, compose_grid};
pub use page::PageSize;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{LabelError, Result};
use crate::svg::size::pt_to_px;
use crate::svg::{Document, Size, intrinsic_size};

/// Page used for documents that declare no size.
pub const DEFAULT_PAGE: Size = Size::new(595.0, 842.0);

/// Which rendering backends to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStrategy {
    /// Vector first, raster when vector fails
    #[default]
    Auto,
    /// Vector only
    Vector,
    /// Raster only
    Raster,
}

/// The backend that produced a PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Vector,
    Raster,
}

/// Rendering options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// User pixels per inch of the SVG documents
    pub dpi: f32,
    /// Resolution of the raster backend
    pub raster_dpi: f32,
    pub strategy: RenderStrategy,
    /// Load system fonts for `<text>` rendering
    pub system_fonts: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: 96.0,
            raster_dpi: 300.0,
            strategy: RenderStrategy::Auto,
            system_fonts: true,
        }
    }
}

/// A PDF plus the backend that produced it.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub pdf: Vec<u8>,
    pub backend: Backend,
}

/// SVG to PDF renderer. Font databases are loaded once per renderer.
pub struct Renderer {
    options: RenderOptions,
    vector_fonts: Arc<svg2pdf::usvg::fontdb::Database>,
    raster_fonts: Arc<resvg::usvg::fontdb::Database>,
    #[cfg(test)]
    fail_vector: bool,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        let mut vector_fonts = svg2pdf::usvg::fontdb::Database::new();
        let mut raster_fonts = resvg::usvg::fontdb::Database::new();
        if options.system_fonts {
            vector_fonts.load_system_fonts();
            raster_fonts.load_system_fonts();
            log::debug!("loaded {} font faces", vector_fonts.len());
        }
        Self {
            options,
            vector_fonts: Arc::new(vector_fonts),
            raster_fonts: Arc::new(raster_fonts),
            #[cfg(test)]
            fail_vector: false,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render with the configured strategy.
    pub fn render(&self, svg: &str) -> Result<Vec<u8>> {
        self.render_with_backend(svg).map(|r| r.pdf)
    }

    /// Render with the configured strategy, reporting the backend used.
    pub fn render_with_backend(&self, svg: &str) -> Result<Rendered> {
        let (svg, size) = self.prepare(svg)?;
        match self.options.strategy {
            RenderStrategy::Vector => Ok(Rendered {
                pdf: self.vector(&svg)?,
                backend: Backend::Vector,
            }),
            RenderStrategy::Raster => Ok(Rendered {
                pdf: self.raster(&svg, size)?,
                backend: Backend::Raster,
            }),
            RenderStrategy::Auto => match self.vector(&svg) {
                Ok(pdf) => Ok(Rendered {
                    pdf,
                    backend: Backend::Vector,
                }),
                Err(vector_err) => {
                    log::warn!("vector rendering failed, using raster fallback: {}", vector_err);
                    let pdf = self.raster(&svg, size).map_err(|raster_err| {
                        LabelError::Render(format!(
                            "vector: {}; raster: {}",
                            vector_err, raster_err
                        ))
                    })?;
                    Ok(Rendered {
                        pdf,
                        backend: Backend::Raster,
                    })
                }
            },
        }
    }

    /// Render with the vector backend only.
    pub fn render_vector(&self, svg: &str) -> Result<Vec<u8>> {
        let (svg, _) = self.prepare(svg)?;
        self.vector(&svg)
    }

    /// Render with the raster backend only.
    pub fn render_raster(&self, svg: &str) -> Result<Vec<u8>> {
        let (svg, size) = self.prepare(svg)?;
        self.raster(&svg, size)
    }

    /// Give size-less documents the default page size and report the page size.
    fn prepare(&self, svg: &str) -> Result<(String, Size)> {
        let mut doc = Document::parse(svg)?;
        if let Some(size) = intrinsic_size(&doc.root, self.options.dpi) {
            return Ok((svg.to_string(), size));
        }
        let dpi = self.options.dpi;
        doc.root
            .set_attr("width", pt_to_px(DEFAULT_PAGE.width, dpi).to_string());
        doc.root
            .set_attr("height", pt_to_px(DEFAULT_PAGE.height, dpi).to_string());
        Ok((doc.to_xml()?, DEFAULT_PAGE))
    }

    fn vector(&self, svg: &str) -> Result<Vec<u8>> {
        #[cfg(test)]
        if self.fail_vector {
            return Err(LabelError::Render("svg2pdf conversion failed: disabled".to_string()));
        }

        let mut opt = svg2pdf::usvg::Options::default();
        opt.dpi = self.options.dpi;
        opt.fontdb = Arc::clone(&self.vector_fonts);
        let tree = svg2pdf::usvg::Tree::from_str(svg, &opt)
            .map_err(|e| LabelError::Render(format!("SVG parse failed: {}", e)))?;

        let page = svg2pdf::PageOptions {
            dpi: self.options.dpi,
            ..Default::default()
        };
        svg2pdf::to_pdf(&tree, svg2pdf::ConversionOptions::default(), page)
            .map_err(|e| LabelError::Render(format!("svg2pdf conversion failed: {}", e)))
    }

    fn raster(&self, svg: &str, page: Size) -> Result<Vec<u8>> {
        use resvg::tiny_skia::{Color, Pixmap, Transform};

        let mut opt = resvg::usvg::Options::default();
        opt.dpi = self.options.dpi;
        opt.fontdb = Arc::clone(&self.raster_fonts);
        let tree = resvg::usvg::Tree::from_str(svg, &opt)
            .map_err(|e| LabelError::Render(format!("SVG parse failed: {}", e)))?;

        let width = pt_to_px(page.width, self.options.raster_dpi).ceil().max(1.0) as u32;
        let height = pt_to_px(page.height, self.options.raster_dpi).ceil().max(1.0) as u32;
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            LabelError::Render(format!("cannot allocate {}x{} pixmap", width, height))
        })?;
        pixmap.fill(Color::WHITE);

        let tree_size = tree.size();
        let transform = Transform::from_scale(
            width as f32 / tree_size.width(),
            height as f32 / tree_size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        // The white backdrop leaves every pixel opaque, so dropping alpha is exact.
        let rgb: Vec<u8> = pixmap
            .data()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();

        log::debug!(
            "rasterized {}x{} px for a {:.1}x{:.1} pt page",
            width,
            height,
            page.width,
            page.height
        );
        pdf::image_page(page, width, height, rgb)
    }
}

/// Page size of a rendered PDF, in points.
pub fn pdf_page_size(pdf: &[u8]) -> Result<Size> {
    pdf::first_page_size(pdf)
}

/// Intrinsic size of an SVG text in points, if declared.
pub fn svg_size(svg: &str, dpi: f32) -> Result<Option<Size>> {
    let doc = Document::parse(svg)?;
    Ok(intrinsic_size(&doc.root, dpi))
}
