//! Configuration management and validation.
//!
//! Every heuristic of the pipeline (header keywords and threshold, key column
//! triggers, synonym rules, candidate encodings, exclusion rules, report
//! styling) is carried by [`MergeConfig`]. Defaults reproduce the behaviour
//! expected for work-order exports; a TOML profile can override any field.

use crate::columns::SynonymMap;
use crate::constants::*;
use crate::error::{MergeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// How the header locator picks a row among those reaching the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderSearch {
    /// Scan the whole probe window and keep the highest score (ties: lowest index)
    BestScore,
    /// Return the first row whose score reaches the threshold
    FirstMatch,
}

/// Header row detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderPolicy {
    /// Substrings that mark a header row; each counts once per row
    pub keywords: Vec<String>,

    /// Minimum number of distinct keywords a row must contain
    pub threshold: usize,

    /// Number of leading rows inspected
    pub probe_rows: usize,

    pub search: HeaderSearch,
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self {
            keywords: to_strings(DEFAULT_HEADER_KEYWORDS),
            threshold: DEFAULT_HEADER_THRESHOLD,
            probe_rows: DEFAULT_PROBE_ROWS,
            search: HeaderSearch::BestScore,
        }
    }
}

/// How normalized labels are compared against key triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMatch {
    /// Label must equal a trigger
    Exact,
    /// Label must contain a trigger
    Substring,
}

/// Key identifier column detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyColumnPolicy {
    pub triggers: Vec<String>,
    pub matching: KeyMatch,
}

impl Default for KeyColumnPolicy {
    fn default() -> Self {
        Self {
            triggers: to_strings(DEFAULT_KEY_TRIGGERS),
            matching: KeyMatch::Substring,
        }
    }
}

impl KeyColumnPolicy {
    /// Whether a normalized label identifies the key column
    pub fn matches(&self, label: &str) -> bool {
        self.triggers.iter().any(|trigger| match self.matching {
            KeyMatch::Exact => label == trigger,
            KeyMatch::Substring => label.contains(trigger.as_str()),
        })
    }
}

/// What to do when several columns of one file normalize to the same label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateLabelPolicy {
    /// Keep one column; each row takes the value of the last colliding column
    LastWins,
    /// Keep every column; later occurrences become `label_2`, `label_3`, ...
    Suffix,
}

/// Names of the two metadata columns prepended to every row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataColumns {
    pub date: String,
    pub unit: String,
}

impl Default for MetadataColumns {
    fn default() -> Self {
        Self {
            date: DEFAULT_DATE_COLUMN.to_string(),
            unit: DEFAULT_UNIT_COLUMN.to_string(),
        }
    }
}

/// Cosmetic settings for the xlsx report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportStyle {
    /// Apply header formatting, borders and column sizing
    pub enabled: bool,

    pub sheet_name: String,

    /// Header background as 0xRRGGBB
    pub header_fill: u32,

    /// Data rows per column that get borders and feed width sizing
    pub sample_rows: usize,

    pub column_padding: usize,
    pub max_column_width: usize,

    /// Freeze the header row when scrolling
    pub freeze_header: bool,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            header_fill: DEFAULT_HEADER_FILL,
            sample_rows: DEFAULT_STYLE_SAMPLE_ROWS,
            column_padding: DEFAULT_COLUMN_PADDING,
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            freeze_header: true,
        }
    }
}

/// Global configuration for a merge run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub header: HeaderPolicy,

    pub key_column: KeyColumnPolicy,

    /// Ordered label rewrite rules
    pub synonyms: SynonymMap,

    /// Encoding labels tried in order for text files
    pub encodings: Vec<String>,

    /// A file whose unit tag contains any of these is skipped unparsed
    pub excluded_unit_keywords: Vec<String>,

    pub duplicate_labels: DuplicateLabelPolicy,

    pub metadata_columns: MetadataColumns,

    /// File name of the merged report; inputs containing its stem are ignored
    pub output_file_name: String,

    pub report: ReportStyle,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            header: HeaderPolicy::default(),
            key_column: KeyColumnPolicy::default(),
            synonyms: SynonymMap::default(),
            encodings: to_strings(DEFAULT_ENCODINGS),
            excluded_unit_keywords: Vec::new(),
            duplicate_labels: DuplicateLabelPolicy::LastWins,
            metadata_columns: MetadataColumns::default(),
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
            report: ReportStyle::default(),
        }
    }
}

impl MergeConfig {
    /// Parse a TOML profile; absent fields keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| MergeError::configuration(format!("Invalid profile: {}", e)))
    }

    /// Load a TOML profile from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MergeError::configuration(format!("Cannot read profile {}: {}", path.display(), e))
        })?;
        debug!("Loaded profile from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Replace the header keywords
    pub fn with_header_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Set the header score threshold
    pub fn with_header_threshold(mut self, threshold: usize) -> Self {
        self.header.threshold = threshold;
        self
    }

    /// Set the header search mode
    pub fn with_header_search(mut self, search: HeaderSearch) -> Self {
        self.header.search = search;
        self
    }

    /// Replace the key column triggers
    pub fn with_key_triggers<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_column.triggers = triggers.into_iter().map(Into::into).collect();
        self
    }

    /// Add a unit-tag exclusion keyword
    pub fn with_excluded_unit(mut self, keyword: impl Into<String>) -> Self {
        self.excluded_unit_keywords.push(keyword.into());
        self
    }

    /// Set the duplicate label policy
    pub fn with_duplicate_labels(mut self, policy: DuplicateLabelPolicy) -> Self {
        self.duplicate_labels = policy;
        self
    }

    /// Disable report styling
    pub fn without_styling(mut self) -> Self {
        self.report.enabled = false;
        self
    }

    /// First exclusion keyword contained in `unit_tag`, if any
    pub fn excluded_keyword_for(&self, unit_tag: &str) -> Option<&str> {
        self.excluded_unit_keywords
            .iter()
            .map(String::as_str)
            .find(|keyword| !keyword.is_empty() && unit_tag.contains(keyword))
    }

    /// Stem of the output file name, used to keep results out of the inputs
    pub fn output_stem(&self) -> &str {
        Path::new(&self.output_file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.output_file_name)
    }

    /// Check the configuration for values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.header.keywords.iter().all(|k| k.is_empty()) {
            return Err(MergeError::configuration(
                "header.keywords must contain at least one non-empty keyword",
            ));
        }
        if self.header.threshold == 0 {
            return Err(MergeError::configuration(
                "header.threshold must be at least 1",
            ));
        }
        if self.header.probe_rows == 0 {
            return Err(MergeError::configuration(
                "header.probe_rows must be at least 1",
            ));
        }
        if self.key_column.triggers.iter().all(|t| t.is_empty()) {
            return Err(MergeError::configuration(
                "key_column.triggers must contain at least one non-empty trigger",
            ));
        }

        if self.encodings.is_empty() {
            return Err(MergeError::configuration(
                "encodings must list at least one encoding",
            ));
        }
        for label in &self.encodings {
            if encoding_rs::Encoding::for_label(label.as_bytes()).is_none() {
                return Err(MergeError::configuration(format!(
                    "Unknown encoding label: {}",
                    label
                )));
            }
        }

        self.synonyms.validate()?;

        let columns = &self.metadata_columns;
        if columns.date.is_empty() || columns.unit.is_empty() || columns.date == columns.unit {
            return Err(MergeError::configuration(
                "metadata_columns must be two distinct, non-empty names",
            ));
        }

        if !self
            .output_file_name
            .to_ascii_lowercase()
            .ends_with(".xlsx")
        {
            return Err(MergeError::configuration(format!(
                "output_file_name must end with .xlsx: {}",
                self.output_file_name
            )));
        }

        validate_sheet_name(&self.report.sheet_name)?;
        if self.report.header_fill > 0xFF_FFFF {
            return Err(MergeError::configuration(format!(
                "report.header_fill is not an RGB value: {:#x}",
                self.report.header_fill
            )));
        }

        Ok(())
    }
}

fn validate_sheet_name(name: &str) -> Result<()> {
    const FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

    if name.is_empty() || name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(MergeError::configuration(format!(
            "report.sheet_name must be 1-{} characters: '{}'",
            MAX_SHEET_NAME_LEN, name
        )));
    }
    if name.contains(FORBIDDEN) {
        return Err(MergeError::configuration(format!(
            "report.sheet_name contains a forbidden character: '{}'",
            name
        )));
    }
    Ok(())
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        MergeConfig::default().validate().unwrap();
    }

    #[test]
    fn test_builder_methods() {
        let config = MergeConfig::default()
            .with_header_keywords(["수주", "NO"])
            .with_header_threshold(2)
            .with_header_search(HeaderSearch::FirstMatch)
            .with_key_triggers(["수주NO"])
            .with_excluded_unit("단조")
            .with_duplicate_labels(DuplicateLabelPolicy::Suffix)
            .without_styling();

        assert_eq!(config.header.keywords, vec!["수주", "NO"]);
        assert_eq!(config.header.threshold, 2);
        assert_eq!(config.header.search, HeaderSearch::FirstMatch);
        assert_eq!(config.key_column.triggers, vec!["수주NO"]);
        assert_eq!(config.excluded_unit_keywords, vec!["단조"]);
        assert_eq!(config.duplicate_labels, DuplicateLabelPolicy::Suffix);
        assert!(!config.report.enabled);
    }

    #[test]
    fn test_profile_overrides_only_given_fields() {
        let profile = r#"
            excluded_unit_keywords = ["단조"]

            [header]
            keywords = ["수주", "NO"]
            threshold = 2
            search = "first_match"

            [key_column]
            triggers = ["수주NO"]
            matching = "exact"

            [[synonyms]]
            trigger = "수주"
            canonical = "수주NO"
        "#;

        let config = MergeConfig::from_toml_str(profile).unwrap();

        assert_eq!(config.header.threshold, 2);
        assert_eq!(config.header.probe_rows, DEFAULT_PROBE_ROWS);
        assert_eq!(config.header.search, HeaderSearch::FirstMatch);
        assert_eq!(config.key_column.matching, KeyMatch::Exact);
        assert_eq!(config.synonyms.len(), 1);
        assert_eq!(config.output_file_name, DEFAULT_OUTPUT_FILE_NAME);
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_profile_is_configuration_error() {
        let result = MergeConfig::from_toml_str("header = 5");
        assert!(matches!(result, Err(MergeError::Configuration { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_threshold = MergeConfig::default().with_header_threshold(0);
        assert!(zero_threshold.validate().is_err());

        let mut bad_encoding = MergeConfig::default();
        bad_encoding.encodings = vec!["klingon".to_string()];
        assert!(bad_encoding.validate().is_err());

        let mut bad_output = MergeConfig::default();
        bad_output.output_file_name = "result.csv".to_string();
        assert!(bad_output.validate().is_err());

        let mut bad_sheet = MergeConfig::default();
        bad_sheet.report.sheet_name = "a/b".to_string();
        assert!(bad_sheet.validate().is_err());

        let mut same_columns = MergeConfig::default();
        same_columns.metadata_columns.unit = same_columns.metadata_columns.date.clone();
        assert!(same_columns.validate().is_err());
    }

    #[test]
    fn test_key_column_matching() {
        let substring = KeyColumnPolicy::default();
        assert!(substring.matches("수주NO"));
        assert!(!substring.matches("품명"));

        let exact = KeyColumnPolicy {
            triggers: vec!["수주NO".to_string()],
            matching: KeyMatch::Exact,
        };
        assert!(exact.matches("수주NO"));
        assert!(!exact.matches("수주NO_2"));
    }

    #[test]
    fn test_excluded_keyword_for() {
        let config = MergeConfig::default().with_excluded_unit("단조");
        assert_eq!(config.excluded_keyword_for("단조2"), Some("단조"));
        assert_eq!(config.excluded_keyword_for("1"), None);
    }

    #[test]
    fn test_output_stem() {
        let config = MergeConfig::default();
        assert_eq!(config.output_stem(), "combined_raw_data_result");
    }
}
