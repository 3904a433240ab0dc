//! Error handling for sheet merging operations.
//!
//! Per-file errors (decoding, parsing, reserved columns) are caught by the
//! processing loop and recorded in the processing log. Configuration and
//! report-output errors end the run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV parsing failed for file: {file} - {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("Spreadsheet parsing failed for file: {file} - {source}")]
    Spreadsheet {
        file: String,
        #[source]
        source: calamine::Error,
    },

    #[error("Workbook contains no worksheets: {file}")]
    EmptyWorkbook { file: String },

    #[error("Unsupported file type: {file} (expected .csv, .xlsx or .xls)")]
    UnsupportedFormat { file: String },

    #[error("Could not decode {file} with any candidate encoding (tried: {tried}); last failure: {last}")]
    EncodingExhausted {
        file: String,
        tried: String,
        last: String,
    },

    #[error("Column '{column}' in {file} collides with a metadata column name")]
    ReservedColumn { file: String, column: String },

    #[error("Report rendering failed: {0}")]
    Report(#[from] rust_xlsxwriter::XlsxError),

    #[error(
        "Failed to write report to {path}: {reason}. If the file is open in another program, close it and run again"
    )]
    OutputWriteFailed { path: PathBuf, reason: String },

    #[error("Input directory not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Processing interrupted: {reason}")]
    Interrupted { reason: String },
}

impl MergeError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a CSV parsing error for a file
    pub fn csv(file: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            file: file.into(),
            source,
        }
    }

    /// Create a spreadsheet parsing error for a file
    pub fn spreadsheet(file: impl Into<String>, source: calamine::Error) -> Self {
        Self::Spreadsheet {
            file: file.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;
