//! Work-order sheet merger
//!
//! Merges heterogeneous CSV and Excel work-order exports into one table.
//! Each file goes through:
//! - header row detection by keyword scoring
//! - work date and unit tag extraction from the file name
//! - column label normalization through synonym rules
//! - key column filtering and metadata tagging
//!
//! The merged table is rendered as a styled single-sheet xlsx report
//! together with a per-file processing log.

pub mod columns;
pub mod config;
pub mod constants;
pub mod error;
pub mod header;
pub mod metadata;
pub mod models;
pub mod processor;
pub mod reader;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

pub use config::MergeConfig;
pub use error::{MergeError, Result};
pub use models::{FileStatus, LogEntry, ProcessingLog, ProcessingStats, SourceFile};
pub use processor::{RunSummary, SheetMerger};
