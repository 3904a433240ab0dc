//! Core data structures shared across the merge pipeline.
//!
//! Defines source files, raw and parsed tables, filename metadata, and the
//! per-file processing log that is reported back to the caller.

use crate::columns::clean_label;
use crate::constants::UNNAMED_COLUMN_PREFIX;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A single cell value; empty cells are `None`
pub type Cell = Option<String>;

/// Input formats understood by the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Csv,
    Xlsx,
    Xls,
}

impl FileKind {
    /// Infer the format from a file name's extension (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();

        match extension.as_str() {
            "csv" => Some(FileKind::Csv),
            "xlsx" => Some(FileKind::Xlsx),
            "xls" => Some(FileKind::Xls),
            _ => None,
        }
    }

    /// Text formats need character-encoding detection
    pub fn is_text(&self) -> bool {
        matches!(self, FileKind::Csv)
    }
}

/// A raw input file supplied by the caller
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub kind: Option<FileKind>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let kind = FileKind::from_name(&name);
        Self { name, bytes, kind }
    }
}

/// Header-less rows exactly as they were read from a file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Split the table at `header_idx`: that row becomes the labels, every
    /// later row becomes data. Rows above the header are dropped.
    ///
    /// Header cells that are empty or hold only spaces, periods or line
    /// breaks are labelled `Unnamed:<index>`, and data rows wider than the
    /// header extend it with more unnamed labels, so no cell is lost.
    /// Short rows are padded with empty cells.
    pub fn into_record(self, header_idx: usize) -> ParsedRecord {
        let mut rows = self.rows.into_iter().skip(header_idx);
        let Some(header) = rows.next() else {
            return ParsedRecord::default();
        };
        let data: Vec<Vec<Cell>> = rows.collect();

        let width = data
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);

        let mut labels: Vec<String> = header
            .into_iter()
            .enumerate()
            .map(|(idx, cell)| match cell {
                Some(label) if !clean_label(&label).is_empty() => label,
                _ => unnamed_label(idx),
            })
            .collect();
        for idx in labels.len()..width {
            labels.push(unnamed_label(idx));
        }

        let rows = data
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();

        ParsedRecord { labels, rows }
    }
}

fn unnamed_label(idx: usize) -> String {
    format!("{}{}", UNNAMED_COLUMN_PREFIX, idx)
}

/// A table with column labels (not necessarily unique) and aligned data rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRecord {
    pub labels: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ParsedRecord {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, top to bottom
    pub fn column(&self, idx: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(idx).and_then(|cell| cell.as_deref()))
    }
}

/// Metadata embedded in a source filename
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub work_date: String,
    pub unit_tag: String,
}

/// Why a file was skipped without contributing rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Unit tag matched a configured exclusion keyword; the file was not parsed
    Excluded { keyword: String },
    /// No column matched the key identifier policy
    NoKeyColumn,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Excluded { keyword } => write!(f, "excluded by unit rule '{}'", keyword),
            SkipReason::NoKeyColumn => write!(f, "no key column"),
        }
    }
}

/// Outcome of processing one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// Parsed and contributed `rows` rows to the master table
    Accepted { rows: usize },
    /// Parsed fine, key column present, but no row carried a key value
    AcceptedEmpty,
    Skipped { reason: SkipReason },
    Failed { error: String },
}

impl FileStatus {
    pub fn rows(&self) -> usize {
        match self {
            FileStatus::Accepted { rows } => *rows,
            _ => 0,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FileStatus::Failed { .. })
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Accepted { rows } => write!(f, "accepted ({} rows)", rows),
            FileStatus::AcceptedEmpty => write!(f, "accepted (no matching rows)"),
            FileStatus::Skipped { reason } => write!(f, "skipped: {}", reason),
            FileStatus::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

/// One line of the processing log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub file: String,
    #[serde(flatten)]
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.status)
    }
}

/// Ordered per-file outcomes of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProcessingLog {
    entries: Vec<LogEntry>,
}

impl ProcessingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(|e| e.status.is_failure())
    }

    /// Summarize the log into counters
    pub fn stats(&self) -> ProcessingStats {
        let mut stats = ProcessingStats {
            files_total: self.entries.len(),
            ..Default::default()
        };

        for entry in &self.entries {
            match &entry.status {
                FileStatus::Accepted { rows } => {
                    stats.files_accepted += 1;
                    stats.total_rows += rows;
                }
                FileStatus::AcceptedEmpty => stats.files_empty += 1,
                FileStatus::Skipped {
                    reason: SkipReason::Excluded { .. },
                } => stats.files_excluded += 1,
                FileStatus::Skipped {
                    reason: SkipReason::NoKeyColumn,
                } => stats.files_without_key += 1,
                FileStatus::Failed { .. } => stats.files_failed += 1,
            }
        }

        stats
    }
}

/// Processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub files_total: usize,
    pub files_accepted: usize,
    pub files_empty: usize,
    pub files_excluded: usize,
    pub files_without_key: usize,
    pub files_failed: usize,
    pub total_rows: usize,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
}
