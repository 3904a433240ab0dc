//! Input file discovery
//!
//! Lists the spreadsheet and CSV exports in a single input directory.
//! Office lock files and previously generated reports are left out.

use crate::config::MergeConfig;
use crate::constants::EXCEL_LOCK_FILE_PREFIX;
use crate::error::{MergeError, Result};
use crate::models::FileKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// File discovery component for an input directory
#[derive(Debug)]
pub struct FileDiscovery {
    input_dir: PathBuf,
    output_stem: String,
    ignored_count: usize,
}

impl FileDiscovery {
    /// `output_stem` is the report name without extension; any file whose
    /// name contains it is treated as an earlier result
    pub fn new(input_dir: PathBuf, output_stem: impl Into<String>) -> Self {
        Self {
            input_dir,
            output_stem: output_stem.into(),
            ignored_count: 0,
        }
    }

    /// Number of entries passed over in the last scan
    pub fn ignored_count(&self) -> usize {
        self.ignored_count
    }

    /// Discover input files, sorted by file name.
    ///
    /// Only the top level of the directory is scanned.
    pub async fn discover_input_files(&mut self) -> Result<Vec<PathBuf>> {
        if !self.input_dir.is_dir() {
            return Err(MergeError::InputNotFound {
                path: self.input_dir.clone(),
            });
        }

        debug!("Searching for input files in: {}", self.input_dir.display());

        let mut files = Vec::new();
        let mut ignored = 0;
        let mut dir = fs::read_dir(&self.input_dir).await?;

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();

            // Follows symlinks; dangling links are passed over
            let is_file = fs::metadata(&path)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }

            if self.is_input_file(&path) {
                files.push(path);
            } else {
                debug!("Ignoring {}", path.display());
                ignored += 1;
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        self.ignored_count = ignored;
        debug!("Found {} input files ({} ignored)", files.len(), ignored);

        Ok(files)
    }

    fn is_input_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        FileKind::from_name(name).is_some()
            && !name.starts_with(EXCEL_LOCK_FILE_PREFIX)
            && (self.output_stem.is_empty() || !name.contains(&self.output_stem))
    }
}

/// List the input files of `dir`, leaving out the report `config` produces
pub async fn discover_input_files(dir: &Path, config: &MergeConfig) -> Result<Vec<PathBuf>> {
    let mut discovery = FileDiscovery::new(dir.to_path_buf(), config.output_stem());
    let files = discovery.discover_input_files().await?;

    if discovery.ignored_count() > 0 {
        info!(
            "Ignored {} entries in {}",
            discovery.ignored_count(),
            dir.display()
        );
    }
    Ok(files)
}
