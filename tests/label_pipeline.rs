//! # Label Pipeline Tests
//!
//! End-to-end runs from template text and CSV rows to PDFs and archives.
//!
//! Rendering uses the raster backend at low resolution and no system fonts,
//! so the tests do not depend on the fonts installed on the machine.

use labelgen::barcode::{self, BarcodeOptions, Symbology};
use labelgen::batch::package_zip;
use labelgen::render::{self, GridOptions, PageSize, RenderOptions, RenderStrategy, Renderer};
use labelgen::svg::{Document, PlaceholderPolicy, extract_placeholders};
use labelgen::table::{ColumnMapping, Table};
use labelgen::template::{ValueMap, fill};
use labelgen::{LabelConfig, LabelJob};
use pretty_assertions::assert_eq;
use std::io::{Cursor, Read};

// ============================================================================
// FIXTURES
// ============================================================================

const TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="384" height="192" viewBox="0 0 384 192">
  <rect width="384" height="192" fill="white" stroke="black"/>
  <g id="var_Name"><text x="12" y="40" font-size="24">Product <tspan font-weight="bold">name</tspan></text></g>
  <text id="var_Price" x="12" y="80" data-maxlen="8">0.00</text>
  <text id="var_x5F_Colour" x="12" y="120">colour</text>
  <g id="var_BarcodeImg"><image x="200" y="20" width="170" height="90" href="placeholder.png"/></g>
</svg>"#;

const CSV: &str = "\
PRODUCT_NAME,Price,Colour,STYLE,BATCH,Barcode
Widget,9.99,Red,ST-1,B1,012345678905
Gadget,12.50,Blue,ST-2,B1,4006381333931
Doohickey,1.25,Green,ST-3,B2,not-a-code
,0.10,Black,ST-4,B2,
";

fn config() -> LabelConfig {
    LabelConfig {
        system_fonts: false,
        raster_dpi: 36.0,
        render_strategy: RenderStrategy::Raster,
        ..Default::default()
    }
}

fn load_table() -> Table {
    let (table, warnings) = Table::from_reader(CSV.as_bytes()).unwrap();
    assert_eq!(
        warnings,
        vec!["Suggested columns missing: COLOUR (you can still map manually)".to_string()]
    );
    table
}

fn job(table: &Table) -> LabelJob {
    let config = config();
    let placeholders = extract_placeholders(TEMPLATE, &config.placeholders).unwrap();
    let mut mapping = ColumnMapping::auto(&placeholders, table.columns(), None, &config.placeholders);
    mapping.apply_override("var_Name=PRODUCT_NAME", table.columns()).unwrap();
    LabelJob::new(TEMPLATE, mapping, &config).unwrap()
}

fn zip_names(zip: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(zip)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

// ============================================================================
// FILLING
// ============================================================================

#[test]
fn test_end_to_end_fill() {
    let mut values = ValueMap::new();
    values.insert("var_Name".to_string(), "Widget".to_string());
    values.insert("var_Price".to_string(), "9.99".to_string());
    let code = barcode::encode("012345678905", Symbology::Ean13, &BarcodeOptions::default()).unwrap();

    let filled = fill(TEMPLATE, &values, Some(&code)).unwrap();
    let doc = Document::parse(&filled).unwrap();

    let name = doc.root.child_elements().find(|e| e.id() == Some("var_Name")).unwrap();
    assert_eq!(name.child_elements().next().unwrap().text(), "Widget");
    assert!(filled.contains(">9.99</text>"));
    assert!(!filled.contains("tspan"));

    let slot = doc
        .root
        .child_elements()
        .find(|e| e.id() == Some("var_BarcodeImg"))
        .unwrap();
    let image = slot.child_elements().next().unwrap();
    assert!(image.attr("href").unwrap().starts_with("data:image/png;base64,"));
    assert_eq!(image.attr("href"), image.attr("xlink:href"));
    assert_eq!(doc.root.attr("xmlns:xlink"), Some("http://www.w3.org/1999/xlink"));
}

#[test]
fn test_placeholders_in_document_order() {
    let placeholders = extract_placeholders(TEMPLATE, &PlaceholderPolicy::default()).unwrap();
    assert_eq!(
        placeholders,
        vec!["var_Name", "var_Price", "var_Colour", "var_BarcodeImg"]
    );
}

#[test]
fn test_auto_mapping_decodes_escaped_ids() {
    let table = load_table();
    let job = job(&table);
    assert_eq!(job.mapping().column_for("var_Colour"), Some("Colour"));
    assert_eq!(job.mapping().column_for("var_Price"), Some("Price"));
    assert_eq!(job.mapping().barcode_column(), Some("Barcode"));

    let (svg, _) = job.fill_row(&table.row(1).unwrap()).unwrap();
    assert!(svg.contains(">Blue</text>"));
    assert!(svg.contains(">12.50</text>"));
}

#[test]
fn test_fill_is_deterministic() {
    let table = load_table();
    let job = job(&table);
    let row = table.row(0).unwrap();
    assert_eq!(job.fill_row(&row).unwrap(), job.fill_row(&row).unwrap());
}

// ============================================================================
// RENDERING
// ============================================================================

#[test]
fn test_preview_pdf() {
    let table = load_table();
    let job = job(&table);
    let (name, pdf) = job.preview(&table.row(0).unwrap()).unwrap();

    assert_eq!(name, "preview_0_Widget.pdf");
    let size = render::pdf_page_size(&pdf).unwrap();
    assert!((size.width - 288.0).abs() < 0.5);
    assert!((size.height - 144.0).abs() < 0.5);
}

#[test]
fn test_vector_and_raster_agree_on_page_size() {
    let mut values = ValueMap::new();
    values.insert("var_Name".to_string(), "Widget".to_string());
    let svg = fill(TEMPLATE, &values, None).unwrap();

    let sizes: Vec<_> = [RenderStrategy::Vector, RenderStrategy::Raster]
        .into_iter()
        .map(|strategy| {
            let renderer = Renderer::new(RenderOptions {
                strategy,
                raster_dpi: 36.0,
                system_fonts: false,
                ..Default::default()
            });
            let size = render::pdf_page_size(&renderer.render(&svg).unwrap()).unwrap();
            (size.width.round(), size.height.round())
        })
        .collect();
    assert_eq!(sizes, vec![(288.0, 144.0), (288.0, 144.0)]);
}

#[test]
fn test_grid_sheet() {
    let table = load_table();
    let job = job(&table).with_grid(GridOptions {
        page_size: PageSize::A5,
        columns: 2,
        margin: 10.0,
        gutter: 5.0,
    });
    let pdf = job.grid(table.rows()).unwrap();

    let size = render::pdf_page_size(&pdf).unwrap();
    assert!((size.width - 420.0).abs() < 0.5);
    assert!((size.height - 595.0).abs() < 0.5);
}

// ============================================================================
// BATCHES
// ============================================================================

#[test]
fn test_batch_names_and_barcode_failures() {
    let table = load_table();
    let job = job(&table);
    let (zip, report) = job.package(table.rows()).unwrap();

    assert_eq!(
        zip_names(&zip),
        vec!["Widget_0.pdf", "Gadget_1.pdf", "Doohickey_2.pdf", "ST-4_3.pdf"]
    );
    assert_eq!(report.rendered, 4);
    assert_eq!(report.barcode_failures, vec![2]);
    assert!(report.skipped.is_empty());
}

#[test]
fn test_chunked_archives_on_disk() {
    let table = load_table();
    let job = job(&table).with_chunk_size(3);
    let dir = tempfile::tempdir().unwrap();

    let report = job.write_batches(&table, dir.path()).unwrap();
    let names: Vec<String> = report
        .archives
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["labels_batch_001.zip", "labels_batch_002.zip"]);

    let second = std::fs::read(&report.archives[1]).unwrap();
    assert_eq!(zip_names(&second), vec!["ST-4_3.pdf"]);
}

#[test]
fn test_single_chunk_archive_name() {
    let table = load_table();
    let dir = tempfile::tempdir().unwrap();
    let report = job(&table).write_batches(&table, dir.path()).unwrap();
    assert_eq!(report.archives, vec![dir.path().join("labels_batch.zip")]);
}

#[test]
fn test_package_zip_roundtrip() {
    let entries: Vec<(String, Vec<u8>)> = vec![
        ("a.pdf".to_string(), b"%PDF-a".to_vec()),
        ("b.pdf".to_string(), b"%PDF-bb".to_vec()),
        ("c.pdf".to_string(), Vec::new()),
    ];
    let zip = package_zip(entries.clone().into_iter().map(Ok)).unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(&zip[..])).unwrap();
    assert_eq!(archive.len(), entries.len());
    for (name, content) in &entries {
        let mut out = Vec::new();
        archive.by_name(name).unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(&out, content);
    }
}

#[test]
fn test_config_drives_job() {
    let table = load_table();
    let config = LabelConfig::from_toml(
        r#"
render_strategy = "raster"
raster_dpi = 24
system_fonts = false
zip_chunk_size = 2

[barcode]
symbology = "CODE128"
"#,
    )
    .unwrap();

    let mapping = ColumnMapping::auto(
        &extract_placeholders(TEMPLATE, &config.placeholders).unwrap(),
        table.columns(),
        None,
        &config.placeholders,
    );
    let job = LabelJob::new(TEMPLATE, mapping, &config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let report = job.write_batches(&table, dir.path()).unwrap();

    assert_eq!(report.archives.len(), 2);
    // Code 128 accepts every payload in the fixture
    assert!(report.barcode_failures.is_empty());
    assert_eq!(report.rendered, 4);
}
