//! Error types for gatewatch

use chrono::NaiveDate;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Faults raised inside plate localization and reading.
///
/// These never stop the decision loop: the engine logs them and treats the
/// frame as if nothing was read. They stay distinct from "no detection"
/// (`Ok(None)`) so the two can be told apart in logs.
#[derive(Debug, Error)]
pub enum VisionFault {
    #[error("Frame has no pixels")]
    EmptyFrame,

    #[error("Plate region is degenerate")]
    DegenerateRegion,

    #[error("Plate crop is empty")]
    EmptyCrop,

    #[error("Invalid vision parameter: {0}")]
    InvalidParameter(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Vision error: {0}")]
    Vision(#[from] VisionFault),

    #[error("Registry unavailable: {0}")]
    Registry(String),

    #[error("Unknown vehicle status: {0:?}")]
    UnknownStatus(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Ledger invariant violated: {open} open sessions for {plate} on {date}")]
    InvariantViolation {
        plate: String,
        date: NaiveDate,
        open: usize,
    },

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
