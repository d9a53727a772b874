//! # labelgen CLI
//!
//! Command-line interface for generating labels from CSV data.
//!
//! ## Usage
//!
//! ```bash
//! # List templates and their placeholders
//! labelgen templates
//! labelgen placeholders templates/label.svg
//!
//! # Preview row 3 as a PDF
//! labelgen preview --template templates/label.svg --csv samples/Data.csv --row 3
//!
//! # Put rows 0..12 on one A4 sheet, four per row
//! labelgen grid --template templates/label.svg --csv samples/Data.csv --columns 4 --rows-to 12
//!
//! # Render every row into ZIP archives
//! labelgen batch --template templates/label.svg --csv samples/Data.csv
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use labelgen::{
    LabelConfig, LabelError, LabelJob,
    barcode::Symbology,
    config::DEFAULT_CONFIG_PATH,
    render::PageSize,
    svg::extract_placeholders,
    table::{ColumnMapping, MappingPresets, Table},
    workspace::{self, OutputDirs},
};

/// labelgen - Fill SVG label templates from CSV and render PDFs
#[derive(Parser, Debug)]
#[command(name = "labelgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the placeholders of a template
    Placeholders {
        template: PathBuf,
    },

    /// List available templates
    Templates {
        /// Template directory (defaults to the configured one)
        dir: Option<PathBuf>,
    },

    /// Render one row to a preview PDF
    Preview {
        #[command(flatten)]
        input: InputArgs,

        /// Row index (0-based)
        #[arg(long, default_value = "0")]
        row: usize,

        /// Output file (defaults to outputs/previews/<generated name>)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Compose rows onto one N-up sheet
    Grid {
        #[command(flatten)]
        input: InputArgs,

        /// Columns per row
        #[arg(long)]
        columns: Option<i32>,

        /// Page size (A4, A5, A3, Letter, Legal)
        #[arg(long)]
        page_size: Option<String>,

        /// Page margin in points
        #[arg(long)]
        margin: Option<f32>,

        /// Space between cells in points
        #[arg(long)]
        gutter: Option<f32>,

        /// First row (inclusive, 0-based)
        #[arg(long, default_value = "0")]
        rows_from: usize,

        /// Last row (exclusive)
        #[arg(long)]
        rows_to: Option<usize>,

        #[arg(short, long, value_name = "FILE", default_value = "labels_grid.pdf")]
        output: PathBuf,
    },

    /// Render every row into ZIP archives of PDFs
    Batch {
        #[command(flatten)]
        input: InputArgs,

        /// Output directory (defaults to outputs/batches)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Rows per archive
        #[arg(long)]
        chunk_size: Option<usize>,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// SVG template
    #[arg(long)]
    template: PathBuf,

    /// CSV data
    #[arg(long)]
    csv: PathBuf,

    /// Map a placeholder to a column: var_Name=PRODUCT_NAME
    #[arg(long = "map", value_name = "PLACEHOLDER=COLUMN")]
    maps: Vec<String>,

    /// Column holding barcode payloads (empty to disable)
    #[arg(long)]
    barcode_column: Option<String>,

    /// Barcode symbology (EAN13, CODE128)
    #[arg(long)]
    symbology: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), LabelError> {
    let mut config = LabelConfig::load(&cli.config)?;

    match cli.command {
        Commands::Placeholders { template } => {
            let text = std::fs::read_to_string(&template)?;
            for name in extract_placeholders(&text, &config.placeholders)? {
                println!("{}", name);
            }
        }

        Commands::Templates { dir } => {
            let dir = dir.unwrap_or_else(|| config.templates_dir.clone());
            let names = workspace::list_templates(&dir)?;
            if names.is_empty() {
                return Err(LabelError::Template(format!(
                    "No SVG templates found in {}",
                    dir.display()
                )));
            }
            for name in names {
                println!("{}", name);
            }
        }

        Commands::Preview { input, row, output } => {
            let (job, table) = load_job(&input, &config)?;
            let row = table.row(row).ok_or_else(|| {
                LabelError::Csv(format!("row {} out of range (0..{})", row, table.len()))
            })?;
            let (name, pdf) = job.preview(&row)?;
            let path = match output {
                Some(path) => path,
                None => OutputDirs::prepare(&config.output_dir)?.previews.join(name),
            };
            std::fs::write(&path, pdf)?;
            println!("Saved to {}", path.display());
        }

        Commands::Grid {
            input,
            columns,
            page_size,
            margin,
            gutter,
            rows_from,
            rows_to,
            output,
        } => {
            if let Some(tag) = page_size {
                config.page_size = tag;
            }
            if let Some(columns) = columns {
                config.grid.columns = columns;
            }
            if let Some(margin) = margin {
                config.grid.margin = margin;
            }
            if let Some(gutter) = gutter {
                config.grid.gutter = gutter;
            }
            let (job, table) = load_job(&input, &config)?;
            let end = rows_to.unwrap_or(table.len()).min(table.len());
            let rows = table
                .rows()
                .skip(rows_from)
                .take(end.saturating_sub(rows_from));
            let pdf = job.grid(rows)?;
            std::fs::write(&output, pdf)?;
            println!(
                "Saved {} sheet to {}",
                PageSize::from_tag(&config.page_size),
                output.display()
            );
        }

        Commands::Batch {
            input,
            out_dir,
            chunk_size,
        } => {
            if let Some(chunk_size) = chunk_size {
                config.zip_chunk_size = chunk_size;
            }
            let (job, table) = load_job(&input, &config)?;
            let out_dir = match out_dir {
                Some(dir) => {
                    workspace::ensure_dir(&dir)?;
                    dir
                }
                None => OutputDirs::prepare(&config.output_dir)?.batches,
            };
            let report = job.write_batches(&table, &out_dir)?;
            for path in &report.archives {
                println!("Saved {}", path.display());
            }
            println!(
                "{} labels, {} skipped, {} without barcode",
                report.rendered,
                report.skipped.len(),
                report.barcode_failures.len()
            );
        }
    }

    Ok(())
}

/// Load the template and CSV, and build the column mapping.
fn load_job(input: &InputArgs, config: &LabelConfig) -> Result<(LabelJob, Table), LabelError> {
    let template = std::fs::read_to_string(&input.template)?;
    let (table, warnings) = Table::from_path(&input.csv)?;
    for warning in &warnings {
        log::warn!("{}", warning);
    }

    let placeholders = extract_placeholders(&template, &config.placeholders)?;
    let presets = MappingPresets::load(&config.presets)?;
    let mut mapping = ColumnMapping::auto(
        &placeholders,
        table.columns(),
        presets.preset(MappingPresets::DEFAULT),
        &config.placeholders,
    );
    for entry in &input.maps {
        mapping.apply_override(entry, table.columns())?;
    }
    if let Some(column) = &input.barcode_column {
        let column = column.trim();
        if column.is_empty() {
            mapping.set_barcode_column(None);
        } else if table.has_column(column) {
            mapping.set_barcode_column(Some(column.to_string()));
        } else {
            return Err(LabelError::Mapping(format!(
                "barcode column '{}' not found in CSV",
                column
            )));
        }
    }
    for (placeholder, column) in mapping.fields() {
        log::info!("{} <- {}", placeholder, column);
    }

    let mut job = LabelJob::new(template, mapping, config)?;
    if let Some(symbology) = &input.symbology {
        job = job.with_symbology(symbology.parse::<Symbology>()?);
    }
    Ok((job, table))
}
