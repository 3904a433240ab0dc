//! Merge pipeline with per-run context.
//!
//! Orchestrates the per-file workflow (exclusion check, decoding, header
//! probe, full read, label normalization, key filtering, metadata tagging)
//! and accumulates accepted rows in a [`MasterTable`]. Files are handled one
//! at a time in input order; a failing file is logged and never aborts the
//! batch.

pub mod discovery;
pub mod filter;
pub mod master;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::filter::{find_key_column, retain_keyed_rows, tag_rows};
use self::master::MasterTable;

use crate::columns::{normalize_columns, resolve_duplicates};
use crate::config::MergeConfig;
use crate::error::{MergeError, Result};
use crate::header::probe_header;
use crate::metadata::extract_metadata;
use crate::models::{
    FileStatus, LogEntry, ParsedRecord, ProcessingLog, ProcessingStats, SkipReason, SourceFile,
};
use crate::reader::{LoadedSource, describe};

use polars::prelude::DataFrame;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Receives a notification after every file of a run
pub trait ProgressObserver {
    fn on_batch_start(&mut self, _total: usize) {}

    /// `done` files out of `total` have been handled; `entry` is the latest
    fn on_file_processed(&mut self, done: usize, total: usize, entry: &LogEntry);

    fn on_batch_finish(&mut self, _log: &ProcessingLog) {}
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_file_processed(&mut self, _done: usize, _total: usize, _entry: &LogEntry) {}
}

impl<F> ProgressObserver for F
where
    F: FnMut(usize, usize, &LogEntry),
{
    fn on_file_processed(&mut self, done: usize, total: usize, entry: &LogEntry) {
        self(done, total, entry)
    }
}

/// Result of processing a single file
#[derive(Debug)]
pub struct FileResult {
    pub status: FileStatus,
    /// Tagged rows (metadata columns first); present only when rows were accepted
    pub record: Option<ParsedRecord>,
    /// Name of the encoding a text file was decoded with
    pub encoding: Option<String>,
}

impl FileResult {
    fn status(status: FileStatus) -> Self {
        Self {
            status,
            record: None,
            encoding: None,
        }
    }
}

/// Outcome of a complete run
#[derive(Debug)]
pub struct RunSummary {
    pub master: DataFrame,
    pub log: ProcessingLog,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn stats(&self) -> ProcessingStats {
        ProcessingStats {
            processing_time_ms: self.elapsed.as_millis(),
            ..self.log.stats()
        }
    }
}

/// State owned by one run: the master table, the log and progress counters
#[derive(Debug)]
pub struct RunContext {
    master: MasterTable,
    log: ProcessingLog,
    total: usize,
    started: Instant,
}

impl RunContext {
    pub fn log(&self) -> &ProcessingLog {
        &self.log
    }

    /// Record a file that could not even be loaded (e.g. unreadable on disk)
    pub fn record_failure(
        &mut self,
        file: &str,
        err: &MergeError,
        progress: &mut (impl ProgressObserver + ?Sized),
    ) {
        error!("Failed to process {}: {}", file, err);
        self.push_entry(
            LogEntry {
                file: file.to_string(),
                status: FileStatus::Failed {
                    error: err.to_string(),
                },
                encoding: None,
            },
            progress,
        );
    }

    fn push_entry(&mut self, entry: LogEntry, progress: &mut (impl ProgressObserver + ?Sized)) {
        self.log.push(entry);
        if let Some(entry) = self.log.entries().last() {
            progress.on_file_processed(self.log.len(), self.total, entry);
        }
    }

    /// Concatenate the accepted rows and close the run
    pub fn finish(self, progress: &mut (impl ProgressObserver + ?Sized)) -> Result<RunSummary> {
        progress.on_batch_finish(&self.log);
        debug!(
            "Concatenating {} rows from {} files",
            self.master.row_count(),
            self.master.frame_count()
        );
        let master = self.master.finish()?;

        Ok(RunSummary {
            master,
            log: self.log,
            elapsed: self.started.elapsed(),
        })
    }
}

/// Main entry point of the merge pipeline
#[derive(Debug, Clone)]
pub struct SheetMerger {
    config: MergeConfig,
}

impl SheetMerger {
    /// Create a merger after validating `config`
    pub fn new(config: MergeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Open a run over `total` files
    pub fn begin(
        &self,
        total: usize,
        progress: &mut (impl ProgressObserver + ?Sized),
    ) -> Result<RunContext> {
        progress.on_batch_start(total);
        Ok(RunContext {
            master: MasterTable::new(&self.config.metadata_columns)?,
            log: ProcessingLog::new(),
            total,
            started: Instant::now(),
        })
    }

    /// Process one file and fold its rows and log entry into `ctx`
    pub fn ingest(
        &self,
        ctx: &mut RunContext,
        source: &SourceFile,
        progress: &mut (impl ProgressObserver + ?Sized),
    ) {
        let FileResult {
            mut status,
            record,
            encoding,
        } = self.process_file(source);

        if let Some(record) = record {
            if let Err(e) = ctx.master.append(record) {
                error!("Failed to add {} to the master table: {}", source.name, e);
                status = FileStatus::Failed {
                    error: e.to_string(),
                };
            }
        }

        ctx.push_entry(
            LogEntry {
                file: source.name.clone(),
                status,
                encoding,
            },
            progress,
        );
    }

    /// Process every source in order and return the merged table and log
    pub fn run(
        &self,
        sources: &[SourceFile],
        progress: &mut (impl ProgressObserver + ?Sized),
    ) -> Result<RunSummary> {
        let mut ctx = self.begin(sources.len(), progress)?;
        for source in sources {
            self.ingest(&mut ctx, source, progress);
        }
        ctx.finish(progress)
    }

    /// Process a single file without touching any run state.
    ///
    /// Never returns an error: failures are reported as [`FileStatus::Failed`].
    pub fn process_file(&self, source: &SourceFile) -> FileResult {
        let metadata = extract_metadata(&source.name);

        // Excluded units are skipped before any parsing
        if let Some(keyword) = self.config.excluded_keyword_for(&metadata.unit_tag) {
            info!(
                "Skipping {}: unit tag '{}' matches exclusion '{}'",
                source.name, metadata.unit_tag, keyword
            );
            return FileResult::status(FileStatus::Skipped {
                reason: SkipReason::Excluded {
                    keyword: keyword.to_string(),
                },
            });
        }

        // Decode text or open the workbook
        let loaded = match LoadedSource::load(source, &self.config.encodings) {
            Ok(loaded) => loaded,
            Err(e) => {
                error!("Failed to process {}: {}", source.name, e);
                return FileResult::status(FileStatus::Failed {
                    error: e.to_string(),
                });
            }
        };
        let encoding = loaded.encoding().map(|e| e.name().to_string());

        let mut result = match self.extract_rows(source, &loaded, &metadata) {
            Ok(Some(record)) if record.is_empty() => {
                info!("{}: key column found but no rows carry a key", source.name);
                FileResult::status(FileStatus::AcceptedEmpty)
            }
            Ok(Some(record)) => {
                info!("{}: accepted {} rows", source.name, record.row_count());
                FileResult {
                    status: FileStatus::Accepted {
                        rows: record.row_count(),
                    },
                    record: Some(record),
                    encoding: None,
                }
            }
            Ok(None) => {
                warn!("Skipping {}: no key column", source.name);
                FileResult::status(FileStatus::Skipped {
                    reason: SkipReason::NoKeyColumn,
                })
            }
            Err(e) => {
                error!("Failed to process {}: {}", source.name, e);
                FileResult::status(FileStatus::Failed {
                    error: e.to_string(),
                })
            }
        };

        result.encoding = encoding;
        result
    }

    /// Read, normalize, filter and tag one file. `Ok(None)` means no key column.
    fn extract_rows(
        &self,
        source: &SourceFile,
        loaded: &LoadedSource<'_>,
        metadata: &crate::models::Metadata,
    ) -> Result<Option<ParsedRecord>> {
        if let Some(kind) = source.kind {
            debug!("{}: reading as {}", source.name, describe(kind));
        }

        // Locate the header, then read everything below it
        let header_idx = probe_header(&source.name, &self.config.header, |limit| {
            loaded.read_rows(Some(limit))
        });

        let mut record = loaded.read_rows(None)?.into_record(header_idx);
        // Normalize labels
        record.labels = normalize_columns(&record.labels, &self.config.synonyms);
        let record = resolve_duplicates(record, self.config.duplicate_labels, &source.name);

        let Some(key_idx) = find_key_column(&record.labels, &self.config.key_column) else {
            debug!("{}: columns {:?}", source.name, record.labels);
            return Ok(None);
        };
        debug!(
            "{}: key column '{}' at index {}",
            source.name, record.labels[key_idx], key_idx
        );

        // Keep keyed rows and tag them with the filename metadata
        let total = record.row_count();
        let record = retain_keyed_rows(record, key_idx);
        debug!(
            "{}: kept {} of {} rows",
            source.name,
            record.row_count(),
            total
        );

        tag_rows(
            record,
            metadata,
            &self.config.metadata_columns,
            &source.name,
        )
        .map(Some)
    }
}
