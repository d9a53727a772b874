//! # Label Jobs
//!
//! Ties the pipeline together for one template and one column mapping:
//!
//! ```text
//! Row → ColumnMapping::value_map ─┐
//! Row → barcode::encode ──────────┼→ TemplateFiller::fill → Renderer → PDF
//!                                 │
//!                                 └→ (grid) compose_grid → one PDF page
//! ```
//!
//! Per-row failures never abort a batch. A barcode that cannot be encoded
//! leaves the label without its image; a label that cannot be filled or
//! rendered is skipped and recorded in the [`BatchReport`].

use std::path::{Path, PathBuf};

use crate::barcode::{self, BarcodeImage, BarcodeOptions, Symbology};
use crate::batch::{ZipPackager, batch_entry_name, chunk_archive_name, preview_name};
use crate::config::LabelConfig;
use crate::error::{LabelError, Result};
use crate::render::{GridOptions, Renderer, compose_grid};
use crate::svg::extract_placeholders;
use crate::table::{ColumnMapping, Row, Table};
use crate::template::TemplateFiller;

/// Columns tried, in order, for batch entry names.
pub const NAME_COLUMNS: [&str; 3] = ["PRODUCT_NAME", "STYLE", "BATCH"];

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Labels written
    pub rendered: usize,
    /// Rows whose barcode could not be encoded (label written without it)
    pub barcode_failures: Vec<usize>,
    /// Rows skipped, with the reason
    pub skipped: Vec<(usize, String)>,
    /// Archives written to disk
    pub archives: Vec<PathBuf>,
}

impl BatchReport {
    fn merge(&mut self, other: BatchReport) {
        self.rendered += other.rendered;
        self.barcode_failures.extend(other.barcode_failures);
        self.skipped.extend(other.skipped);
        self.archives.extend(other.archives);
    }
}

/// A template bound to a mapping, ready to produce labels for rows.
pub struct LabelJob {
    template: String,
    placeholders: Vec<String>,
    mapping: ColumnMapping,
    symbology: Symbology,
    barcode_options: BarcodeOptions,
    filler: TemplateFiller,
    renderer: Renderer,
    grid: GridOptions,
    chunk_size: usize,
}

impl LabelJob {
    /// Validate the template and mapping up front.
    ///
    /// Fails if the template does not parse or no text placeholder is mapped.
    /// A barcode column is dropped when the template has no barcode slot.
    pub fn new(template: impl Into<String>, mut mapping: ColumnMapping, config: &LabelConfig) -> Result<Self> {
        let template = template.into();
        let placeholders = extract_placeholders(&template, &config.placeholders)?;
        if mapping.is_empty() {
            return Err(LabelError::Mapping(
                "no placeholders are mapped to CSV columns".to_string(),
            ));
        }
        let has_slot = placeholders.iter().any(|p| config.placeholders.is_barcode_slot(p));
        if !has_slot {
            if let Some(column) = mapping.barcode_column() {
                log::warn!("template has no barcode slot; ignoring barcode column {}", column);
                mapping.set_barcode_column(None);
            }
        }
        log::debug!(
            "template has {} placeholders: {}",
            placeholders.len(),
            placeholders.join(", ")
        );

        Ok(Self {
            template,
            placeholders,
            mapping,
            symbology: config.barcode.symbology,
            barcode_options: config.barcode.options(),
            filler: TemplateFiller::with_policy(config.placeholders.clone()),
            renderer: Renderer::new(config.render_options()),
            grid: config.grid_options(),
            chunk_size: config.chunk_size(),
        })
    }

    pub fn with_symbology(mut self, symbology: Symbology) -> Self {
        self.symbology = symbology;
        self
    }

    pub fn with_grid(mut self, grid: GridOptions) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Encode the row's barcode, if its column is mapped and non-blank.
    pub fn barcode(&self, row: &Row<'_>) -> Option<Result<BarcodeImage>> {
        let payload = self.mapping.barcode_payload(row)?;
        Some(barcode::encode(payload, self.symbology, &self.barcode_options))
    }

    /// Fill the template for one row. The flag is false when the row's
    /// barcode failed to encode and was left out.
    pub fn fill_row(&self, row: &Row<'_>) -> Result<(String, bool)> {
        let values = self.mapping.value_map(row);
        let (image, barcode_ok) = match self.barcode(row) {
            Some(Ok(image)) => (Some(image), true),
            Some(Err(e)) => {
                log::warn!("row {}: {}; label produced without barcode", row.index, e);
                (None, false)
            }
            None => (None, true),
        };
        let svg = self.filler.fill(&self.template, &values, image.as_ref())?;
        Ok((svg, barcode_ok))
    }

    /// Render a single preview: `(file name, pdf)`.
    pub fn preview(&self, row: &Row<'_>) -> Result<(String, Vec<u8>)> {
        let (svg, _) = self.fill_row(row)?;
        let pdf = self.renderer.render(&svg)?;
        let label = row.non_empty("PRODUCT_NAME").unwrap_or("label");
        Ok((preview_name(row.index, label), pdf))
    }

    /// Lazily render `rows` into `(file name, pdf)` entries.
    pub fn entries<'a, I>(&'a self, rows: I) -> BatchEntries<'a, I::IntoIter>
    where
        I: IntoIterator<Item = Row<'a>>,
    {
        BatchEntries {
            job: self,
            rows: rows.into_iter(),
            report: BatchReport::default(),
        }
    }

    /// Render `rows` into one in-memory ZIP.
    pub fn package<'a, I>(&'a self, rows: I) -> Result<(Vec<u8>, BatchReport)>
    where
        I: IntoIterator<Item = Row<'a>>,
    {
        let mut entries = self.entries(rows);
        let mut packager = ZipPackager::in_memory();
        for (name, pdf) in entries.by_ref() {
            packager.add(&name, &pdf)?;
        }
        let zip = packager.finish()?.into_inner();
        Ok((zip, entries.into_report()))
    }

    /// Write every row of `table` to ZIP archives in `out_dir`, one archive
    /// per chunk of rows.
    pub fn write_batches(&self, table: &Table, out_dir: impl AsRef<Path>) -> Result<BatchReport> {
        let out_dir = out_dir.as_ref();
        let total = table.len().div_ceil(self.chunk_size).max(1);
        let mut report = BatchReport::default();

        for chunk in 0..total {
            let start = chunk * self.chunk_size;
            let rows = table.rows().skip(start).take(self.chunk_size);
            let (zip, chunk_report) = self.package(rows)?;

            let path = out_dir.join(chunk_archive_name(chunk, total));
            std::fs::write(&path, zip)?;
            log::info!(
                "wrote {} ({} labels)",
                path.display(),
                chunk_report.rendered
            );
            report.merge(chunk_report);
            report.archives.push(path);
        }

        log::info!(
            "batch done: {} rendered, {} skipped, {} without barcode",
            report.rendered,
            report.skipped.len(),
            report.barcode_failures.len()
        );
        Ok(report)
    }

    /// Compose `rows` onto one grid sheet. Rows that fail to fill are left out.
    pub fn grid<'a, I>(&'a self, rows: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = Row<'a>>,
    {
        let mut documents = Vec::new();
        for row in rows {
            match self.fill_row(&row) {
                Ok((svg, _)) => documents.push(svg),
                Err(e) => log::error!("row {} skipped: {}", row.index, e),
            }
        }
        log::info!("composing {} labels on one {} sheet", documents.len(), self.grid.page_size);
        compose_grid(&documents[..], &self.grid, &self.renderer)
    }
}

/// Base name for a row's batch entry.
pub fn entry_base(row: &Row<'_>) -> String {
    NAME_COLUMNS
        .iter()
        .find_map(|column| row.non_empty(column))
        .map(str::to_string)
        .unwrap_or_else(|| format!("row{}", row.index))
}

/// Iterator over rendered batch entries. Failed rows are skipped and recorded.
pub struct BatchEntries<'a, I> {
    job: &'a LabelJob,
    rows: I,
    report: BatchReport,
}

impl<I> BatchEntries<'_, I> {
    pub fn report(&self) -> &BatchReport {
        &self.report
    }

    pub fn into_report(self) -> BatchReport {
        self.report
    }
}

impl<'a, I> Iterator for BatchEntries<'a, I>
where
    I: Iterator<Item = Row<'a>>,
{
    type Item = (String, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        for row in self.rows.by_ref() {
            let rendered = self
                .job
                .fill_row(&row)
                .and_then(|(svg, barcode_ok)| Ok((self.job.renderer.render(&svg)?, barcode_ok)));
            match rendered {
                Ok((pdf, barcode_ok)) => {
                    if !barcode_ok {
                        self.report.barcode_failures.push(row.index);
                    }
                    self.report.rendered += 1;
                    log::debug!("row {} rendered ({} bytes)", row.index, pdf.len());
                    return Some((batch_entry_name(&entry_base(&row), row.index), pdf));
                }
                Err(e) => {
                    log::error!("row {} skipped: {}", row.index, e);
                    self.report.skipped.push((row.index, e.to_string()));
                }
            }
        }
        None
    }
}
