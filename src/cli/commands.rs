//! Command implementation for the sheet merger CLI
//!
//! Contains the main run loop, progress reporting, the final summary and
//! the optional JSON processing log.

use crate::cli::args::Args;
use crate::constants::SUPPORTED_EXTENSIONS;
use crate::error::MergeError;
use crate::models::{LogEntry, ProcessingLog, ProcessingStats, SourceFile};
use crate::processor::discovery::discover_input_files;
use crate::processor::writer::ReportWriter;
use crate::processor::{ProgressObserver, RunSummary, SheetMerger};

use anyhow::{Context, Result};
use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Main command runner
///
/// 1. Set up logging and build the configuration
/// 2. Discover input files
/// 3. Merge them file by file with progress reporting
/// 4. Write the report and print the summary
pub async fn run(args: Args) -> Result<ProcessingStats> {
    setup_logging(&args);

    info!("Starting sheet merger");
    debug!("Command line arguments: {:?}", args);

    // Build configuration
    let config = args.to_config().context("Invalid configuration")?;
    let output_path = args.output_path(&config);
    let merger = SheetMerger::new(config)?;

    // Discover input files
    let files = discover_input_files(&args.input_dir, merger.config())
        .await
        .with_context(|| format!("Failed to scan {}", args.input_dir.display()))?;

    if files.is_empty() {
        warn!("No input files found in {}", args.input_dir.display());
        println!(
            "{} {}",
            format!("No {} files found in", SUPPORTED_EXTENSIONS.join("/")).yellow(),
            args.input_dir.display()
        );
        return Ok(ProcessingStats::default());
    }
    info!("Found {} input files", files.len());

    // Set up progress reporting
    let mut progress = ProgressReporter::new(args.show_progress());
    let mut ctx = merger.begin(files.len(), &mut progress)?;

    // Merge file by file; an unreadable file is logged and skipped
    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match tokio::fs::read(path).await {
            Ok(bytes) => merger.ingest(&mut ctx, &SourceFile::new(name, bytes), &mut progress),
            Err(e) => ctx.record_failure(&name, &MergeError::Io(e), &mut progress),
        }
    }

    let summary = ctx.finish(&mut progress)?;

    if summary.master.height() == 0 {
        warn!("No rows were merged; writing a header-only report");
    }

    // Write the report
    let style = merger.config().report.clone();
    let writer = ReportWriter::new(output_path.clone(), style);
    writer
        .write(&summary.master)
        .with_context(|| format!("Failed to write report {}", output_path.display()))?;
    info!("Report written to {}", output_path.display());

    if let Some(log_path) = &args.log_json {
        write_log_json(log_path, &summary, &output_path)
            .with_context(|| format!("Failed to write processing log {}", log_path.display()))?;
        info!("Processing log written to {}", log_path.display());
    }

    let stats = ProcessingStats {
        output_path,
        ..summary.stats()
    };
    print_summary(&stats, &summary.log);

    Ok(stats)
}

/// Set up structured logging based on CLI arguments.
///
/// A subscriber installed earlier in the process is kept.
fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sheet_merger={}", log_level)));

    let installed = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if installed.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

/// Progress bar driven by the merge loop
pub struct ProgressReporter {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }
}

impl ProgressObserver for ProgressReporter {
    fn on_batch_start(&mut self, total: usize) {
        if !self.enabled {
            return;
        }

        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Merging files...");
        self.bar = Some(pb);
    }

    fn on_file_processed(&mut self, done: usize, _total: usize, entry: &LogEntry) {
        if let Some(pb) = &self.bar {
            pb.set_position(done as u64);
            pb.set_message(entry.file.clone());
        }
    }

    fn on_batch_finish(&mut self, _log: &ProcessingLog) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message("Merge complete");
        }
    }
}

/// Serialize the processing log with its counters and a generation timestamp
fn write_log_json(path: &Path, summary: &RunSummary, output_path: &Path) -> Result<()> {
    let stats = summary.stats();
    let document = serde_json::json!({
        "generated_at": chrono::Local::now().to_rfc3339(),
        "output": output_path.display().to_string(),
        "processing_time_ms": stats.processing_time_ms as u64,
        "summary": {
            "files_total": stats.files_total,
            "files_accepted": stats.files_accepted,
            "files_empty": stats.files_empty,
            "files_excluded": stats.files_excluded,
            "files_without_key": stats.files_without_key,
            "files_failed": stats.files_failed,
            "total_rows": stats.total_rows,
        },
        "files": summary.log,
    });

    let contents = serde_json::to_string_pretty(&document)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Print the human-readable summary
fn print_summary(stats: &ProcessingStats, log: &ProcessingLog) {
    let duration = HumanDuration(Duration::from_millis(stats.processing_time_ms as u64));
    let merged = stats.files_accepted + stats.files_empty;

    println!();
    println!("{}", "Merge Complete".bright_green().bold());
    println!(
        "   Files merged:      {}/{}",
        merged.to_string().bright_cyan(),
        stats.files_total
    );
    println!(
        "   Rows merged:       {}",
        stats.total_rows.to_string().bright_cyan()
    );
    if stats.files_excluded > 0 {
        println!("   Excluded by unit:  {}", stats.files_excluded);
    }
    if stats.files_without_key > 0 {
        println!(
            "   {} {}",
            "Without key column:".yellow(),
            stats.files_without_key
        );
    }
    if stats.files_failed > 0 {
        println!("   {} {}", "Failed:".bright_red().bold(), stats.files_failed);
        for entry in log.failures() {
            println!("     - {}", entry.to_string().bright_black());
        }
    }
    println!("   Processing time:   {}", duration);
    println!(
        "   Output:            {}",
        stats.output_path.display().to_string().bright_white()
    );
    println!();
}
