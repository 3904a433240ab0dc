//! Command-line argument definitions for the sheet merger
//!
//! Flags override values loaded from an optional TOML profile, which in turn
//! override the built-in defaults.

use crate::config::{DuplicateLabelPolicy, HeaderSearch, MergeConfig};
use crate::error::{MergeError, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// CLI arguments for the work-order sheet merger
///
/// Merges every CSV/xlsx/xls export in a directory into one xlsx report,
/// tagging each row with the work date and unit taken from its file name.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sheet-merger",
    version,
    about = "Merge work-order CSV/Excel exports into a single xlsx report"
)]
pub struct Args {
    /// Directory containing the exports to merge
    #[arg(value_name = "DIR", default_value = ".")]
    pub input_dir: PathBuf,

    /// Report path (defaults to DIR/combined_raw_data_result.xlsx)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// TOML profile with merge settings
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Header keywords, comma separated
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub keywords: Option<Vec<String>>,

    /// Minimum number of keywords a header row must contain
    #[arg(long, value_name = "N")]
    pub threshold: Option<usize>,

    /// Take the first row over the threshold instead of the best scoring one
    #[arg(long)]
    pub first_match: bool,

    /// Key column triggers, comma separated
    #[arg(long = "key", value_name = "LIST", value_delimiter = ',')]
    pub key_triggers: Option<Vec<String>>,

    /// Skip files whose unit tag contains this keyword (repeatable)
    #[arg(long = "exclude-unit", value_name = "KEYWORD")]
    pub exclude_units: Vec<String>,

    /// Keep duplicate columns as label_2, label_3... instead of merging them
    #[arg(long)]
    pub suffix_duplicates: bool,

    /// Write the report without header styling or column sizing
    #[arg(long)]
    pub no_style: bool,

    /// Write the per-file processing log as JSON
    #[arg(long, value_name = "FILE")]
    pub log_json: Option<PathBuf>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors and hide the progress bar
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Build the merge configuration: defaults, then profile, then flags
    pub fn to_config(&self) -> Result<MergeConfig> {
        let mut config = match &self.profile {
            Some(path) => MergeConfig::from_file(path)?,
            None => MergeConfig::default(),
        };

        if let Some(keywords) = &self.keywords {
            config = config.with_header_keywords(keywords.iter().map(|k| k.trim()));
        }
        if let Some(threshold) = self.threshold {
            config = config.with_header_threshold(threshold);
        }
        if self.first_match {
            config = config.with_header_search(HeaderSearch::FirstMatch);
        }
        if let Some(triggers) = &self.key_triggers {
            config = config.with_key_triggers(triggers.iter().map(|t| t.trim()));
        }
        for keyword in &self.exclude_units {
            config = config.with_excluded_unit(keyword.trim());
        }
        if self.suffix_duplicates {
            config = config.with_duplicate_labels(DuplicateLabelPolicy::Suffix);
        }
        if self.no_style {
            config = config.without_styling();
        }

        if let Some(output) = &self.output {
            let name = output
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    MergeError::configuration(format!(
                        "Output path has no file name: {}",
                        output.display()
                    ))
                })?;
            config.output_file_name = name.to_string();
        }

        config.validate()?;
        Ok(config)
    }

    /// Report location: the explicit output path, or the configured file
    /// name inside the input directory
    pub fn output_path(&self, config: &MergeConfig) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => self.input_dir.join(&config.output_file_name),
        }
    }

    /// Get the log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}
