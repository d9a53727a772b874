//! # Barcode Images
//!
//! Encodes a payload with the `barcoders` crate and rasterizes the bars into a
//! grayscale PNG that can be embedded in a template as a data URI.
//!
//! ## Supported Symbologies
//!
//! | Symbology | Payload | Notes |
//! |-----------|---------|-------|
//! | EAN-13 | 12 or 13 digits | non-digits are dropped; a 13th (check) digit is recomputed |
//! | Code 128 | any printable ASCII | character set B |
//!
//! ## Example
//!
//! ```
//! use labelgen::barcode::{encode, BarcodeOptions, Symbology};
//!
//! let image = encode("012345678905", Symbology::Ean13, &BarcodeOptions::default()).unwrap();
//! assert!(image.data_uri().starts_with("data:image/png;base64,"));
//! ```

use barcoders::sym::code128::Code128;
use barcoders::sym::ean13::EAN13;
use base64::Engine;
use image::{GrayImage, ImageEncoder, Luma};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{LabelError, Result};

/// Barcode symbology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Symbology {
    /// EAN-13 retail barcode
    #[default]
    #[serde(rename = "EAN13", alias = "ean13")]
    Ean13,
    /// Code 128 (set B)
    #[serde(rename = "CODE128", alias = "code128", alias = "Code128")]
    Code128,
}

impl FromStr for Symbology {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EAN13" | "EAN-13" => Ok(Symbology::Ean13),
            "CODE128" | "CODE-128" => Ok(Symbology::Code128),
            _ => Err(LabelError::Barcode(format!(
                "Unsupported barcode kind: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbology::Ean13 => write!(f, "EAN13"),
            Symbology::Code128 => write!(f, "CODE128"),
        }
    }
}

/// Raster geometry of generated barcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeOptions {
    /// Width of one module (narrowest bar) in pixels
    pub module_width: u32,
    /// Bar height in pixels
    pub height: u32,
    /// Blank modules on each side of the symbol
    pub quiet_zone: u32,
}

impl Default for BarcodeOptions {
    fn default() -> Self {
        Self {
            module_width: 2,
            height: 120,
            quiet_zone: 10,
        }
    }
}

/// An encoded raster image ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl BarcodeImage {
    pub const MIME: &'static str = "image/png";

    /// Wrap arbitrary PNG bytes (e.g. an image produced elsewhere).
    pub fn from_png(png: Vec<u8>, width: u32, height: u32) -> Self {
        Self { png, width, height }
    }

    /// `data:image/png;base64,...`
    pub fn data_uri(&self) -> String {
        png_data_uri(&self.png)
    }
}

/// Wrap PNG bytes as a base64 data URI.
pub fn png_data_uri(png: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        BarcodeImage::MIME,
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

/// Encode `payload` and render it as a PNG image.
pub fn encode(payload: &str, symbology: Symbology, options: &BarcodeOptions) -> Result<BarcodeImage> {
    let modules = encode_modules(payload, symbology)?;
    render_png(&modules, options)
}

/// Encode `payload` into modules (1 = bar, 0 = space).
pub fn encode_modules(payload: &str, symbology: Symbology) -> Result<Vec<u8>> {
    let data = payload.trim();
    if data.is_empty() {
        return Err(LabelError::Barcode("Empty barcode data".to_string()));
    }

    match symbology {
        Symbology::Ean13 => {
            let digits = ean13_digits(data)?;
            let barcode = EAN13::new(&digits)
                .map_err(|e| LabelError::Barcode(format!("invalid EAN-13 data: {:?}", e)))?;
            Ok(barcode.encode())
        }
        Symbology::Code128 => {
            // Character set B covers upper/lower case letters, digits and punctuation.
            let prefixed = format!("\u{0181}{}", data);
            let barcode = Code128::new(&prefixed)
                .map_err(|e| LabelError::Barcode(format!("invalid Code 128 data: {:?}", e)))?;
            Ok(barcode.encode())
        }
    }
}

/// Reduce an EAN-13 payload to the 12 digits that get encoded.
fn ean13_digits(data: &str) -> Result<String> {
    let digits: String = data.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        12 => Ok(digits),
        13 => Ok(digits[..12].to_string()),
        _ => Err(LabelError::Barcode(
            "EAN-13 requires 12 or 13 digits".to_string(),
        )),
    }
}

fn render_png(modules: &[u8], options: &BarcodeOptions) -> Result<BarcodeImage> {
    let module_width = options.module_width.max(1);
    let height = options.height.max(1);
    let total_modules = modules.len() as u32 + 2 * options.quiet_zone;
    let width = total_modules * module_width;

    let mut img = GrayImage::from_pixel(width, height, Luma([255u8]));
    for (i, &module) in modules.iter().enumerate() {
        if module != 1 {
            continue;
        }
        let x0 = (options.quiet_zone + i as u32) * module_width;
        for x in x0..x0 + module_width {
            for y in 0..height {
                img.put_pixel(x, y, Luma([0u8]));
            }
        }
    }

    let mut png = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::L8)
        .map_err(|e: image::ImageError| LabelError::Barcode(format!("PNG encoding failed: {}", e)))?;

    Ok(BarcodeImage { png, width, height })
}
