//! Error types for the tax form filler library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the tax form filler library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Document has no interactive form
    #[error("PDF has no AcroForm fields")]
    NoAcroForm,

    /// Field name not present in the template
    #[error("No such form field: {0}")]
    UnknownField(String),

    /// Field is flagged read-only
    #[error("Form field is read-only: {0}")]
    ReadOnlyField(String),

    /// Date parsing error
    #[error("Invalid date expression: {0}")]
    InvalidDateExpression(String),

    /// Tax period parsing error
    #[error("Invalid tax period: {0}")]
    InvalidPeriod(String),

    /// Unrecognized form kind
    #[error("Unknown form kind: {0} (expected 1040 or 941-schedule-d)")]
    UnknownForm(String),

    /// Template bytes are not a PDF
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Template download failed
    #[error("Template download failed: {0}")]
    Download(#[from] reqwest::Error),

    /// General error
    #[error("{0}")]
    General(String),
}
