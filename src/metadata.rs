//! Filename metadata extraction.
//!
//! Work-order exports carry their work date (`11-03`) and unit tag (`(1)`,
//! `(단조)`) in the file name, e.g. `11월 작업지시서 - 11-03(1).csv`.

use crate::constants::{UNKNOWN_DATE, UNKNOWN_UNIT};
use crate::models::Metadata;
use regex::Regex;
use std::sync::LazyLock;

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}-\d{1,2})").expect("date pattern is valid"));

static UNIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((.+?)\)").expect("unit pattern is valid"));

/// Extract the work date and unit tag from a file name.
///
/// Both captures are purely textual: `13-45` is returned as a date as-is.
/// Missing patterns fall back to the "date unknown" / "unit unknown" sentinels.
pub fn extract_metadata(filename: &str) -> Metadata {
    let work_date = DATE_PATTERN
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string());

    let unit_tag = UNIT_PATTERN
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_UNIT.to_string());

    Metadata {
        work_date,
        unit_tag,
    }
}
