//! # Configuration
//!
//! `LabelConfig` is read from a TOML file (`config/app.toml` by default).
//! Every field has a default, so a missing file or a partial file is fine.
//!
//! ```toml
//! page_size = "A4"
//! dpi = 96
//! zip_chunk_size = 200
//! render_strategy = "auto"
//!
//! [grid]
//! columns = 3
//! margin = 18
//! gutter = 9
//!
//! [barcode]
//! symbology = "EAN13"
//! module_width = 2
//!
//! [placeholders]
//! prefix = "var_"
//! duplicates = "last-wins"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::barcode::{BarcodeOptions, Symbology};
use crate::error::{LabelError, Result};
use crate::render::{GridOptions, PageSize, RenderOptions, RenderStrategy};
use crate::svg::PlaceholderPolicy;

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Paper size tag for grid sheets
    pub page_size: String,
    /// User pixels per inch of templates
    pub dpi: f32,
    /// Resolution of the raster fallback
    pub raster_dpi: f32,
    /// Rows per batch archive
    pub zip_chunk_size: usize,
    pub render_strategy: RenderStrategy,
    pub system_fonts: bool,
    pub templates_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Mapping presets JSON
    pub presets: PathBuf,
    pub grid: GridConfig,
    pub barcode: BarcodeConfig,
    pub placeholders: PlaceholderPolicy,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            page_size: "A4".to_string(),
            dpi: 96.0,
            raster_dpi: 300.0,
            zip_chunk_size: 200,
            render_strategy: RenderStrategy::Auto,
            system_fonts: true,
            templates_dir: PathBuf::from("templates"),
            output_dir: PathBuf::from("outputs"),
            presets: PathBuf::from("config/mapping_presets.json"),
            grid: GridConfig::default(),
            barcode: BarcodeConfig::default(),
            placeholders: PlaceholderPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub columns: i32,
    pub margin: f32,
    pub gutter: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        let options = GridOptions::default();
        Self {
            columns: options.columns,
            margin: options.margin,
            gutter: options.gutter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeConfig {
    pub symbology: Symbology,
    pub module_width: u32,
    pub height: u32,
    pub quiet_zone: u32,
}

impl Default for BarcodeConfig {
    fn default() -> Self {
        let options = BarcodeOptions::default();
        Self {
            symbology: Symbology::default(),
            module_width: options.module_width,
            height: options.height,
            quiet_zone: options.quiet_zone,
        }
    }
}

impl BarcodeConfig {
    pub fn options(&self) -> BarcodeOptions {
        BarcodeOptions {
            module_width: self.module_width.max(1),
            height: self.height.max(1),
            quiet_zone: self.quiet_zone,
        }
    }
}

impl LabelConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)
            .map_err(|e| LabelError::Config(format!("{}: {}", path.display(), e)))?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| LabelError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| LabelError::Config(e.to_string()))
    }

    pub fn page_size(&self) -> PageSize {
        PageSize::from_tag(&self.page_size)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            dpi: self.dpi,
            raster_dpi: self.raster_dpi,
            strategy: self.render_strategy,
            system_fonts: self.system_fonts,
        }
    }

    pub fn grid_options(&self) -> GridOptions {
        GridOptions {
            page_size: self.page_size(),
            columns: self.grid.columns,
            margin: self.grid.margin,
            gutter: self.grid.gutter,
        }
    }

    /// Rows per archive, at least 1.
    pub fn chunk_size(&self) -> usize {
        self.zip_chunk_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::DuplicatePolicy;

    #[test]
    fn test_defaults() {
        let config = LabelConfig::default();
        assert_eq!(config.page_size(), PageSize::A4);
        assert_eq!(config.dpi, 96.0);
        assert_eq!(config.zip_chunk_size, 200);
        assert_eq!(config.render_strategy, RenderStrategy::Auto);
        assert_eq!(config.placeholders.prefix, "var_");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = LabelConfig::from_toml(
            r#"
page_size = "letter"
zip_chunk_size = 50
render_strategy = "raster"

[grid]
columns = 4

[barcode]
symbology = "CODE128"

[placeholders]
duplicates = "first-wins"
"#,
        )
        .unwrap();

        assert_eq!(config.page_size(), PageSize::Letter);
        assert_eq!(config.chunk_size(), 50);
        assert_eq!(config.render_strategy, RenderStrategy::Raster);
        assert_eq!(config.grid.columns, 4);
        assert_eq!(config.grid.margin, GridConfig::default().margin);
        assert_eq!(config.barcode.symbology, Symbology::Code128);
        assert_eq!(config.barcode.options(), BarcodeOptions::default());
        assert_eq!(config.placeholders.duplicates, DuplicatePolicy::FirstWins);
        assert_eq!(config.placeholders.barcode_slot(), "var_BarcodeImg");
        assert_eq!(config.dpi, 96.0);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            LabelConfig::from_toml("dpi = \"lots\""),
            Err(LabelError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LabelConfig::load(dir.path().join("app.toml")).unwrap();
        assert_eq!(config, LabelConfig::default());
    }

    #[test]
    fn test_load_roundtrips_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.toml");
        let mut config = LabelConfig::default();
        config.grid.columns = 6;
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();
        assert_eq!(LabelConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        let config = LabelConfig {
            zip_chunk_size: 0,
            ..Default::default()
        };
        assert_eq!(config.chunk_size(), 1);
    }

    #[test]
    fn test_options_follow_config() {
        let config = LabelConfig::from_toml("dpi = 72\n[grid]\ngutter = 0").unwrap();
        assert_eq!(config.render_options().dpi, 72.0);
        assert_eq!(config.grid_options().gutter, 0.0);
        assert_eq!(config.grid_options().page_size, PageSize::A4);
    }
}
