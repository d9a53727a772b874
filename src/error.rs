//! # Error Types
//!
//! This module defines error types used throughout the labelgen library.

use thiserror::Error;

/// Main error type for labelgen operations
#[derive(Debug, Error)]
pub enum LabelError {
    /// Template could not be parsed or serialized
    #[error("Template error: {0}")]
    Template(String),

    /// Barcode payload or symbology rejected
    #[error("Barcode error: {0}")]
    Barcode(String),

    /// Both rendering paths failed for a document
    #[error("Render error: {0}")]
    Render(String),

    /// CSV input could not be read
    #[error("CSV error: {0}")]
    Csv(String),

    /// Configuration file or value is invalid
    #[error("Config error: {0}")]
    Config(String),

    /// Placeholder to column mapping is unusable
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// ZIP archive could not be written
    #[error("Archive error: {0}")]
    Archive(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, LabelError>;

impl From<quick_xml::Error> for LabelError {
    fn from(err: quick_xml::Error) -> Self {
        LabelError::Template(err.to_string())
    }
}

impl From<csv::Error> for LabelError {
    fn from(err: csv::Error) -> Self {
        LabelError::Csv(err.to_string())
    }
}

impl From<zip::result::ZipError> for LabelError {
    fn from(err: zip::result::ZipError) -> Self {
        LabelError::Archive(err.to_string())
    }
}

impl From<lopdf::Error> for LabelError {
    fn from(err: lopdf::Error) -> Self {
        LabelError::Render(format!("PDF assembly failed: {}", err))
    }
}
