//! Header row detection.
//!
//! Work-order exports often start with a title block, so the header row is
//! located by scoring the first few rows against a keyword set instead of
//! assuming row 0.

use crate::config::{HeaderPolicy, HeaderSearch};
use crate::error::Result;
use crate::models::{Cell, RawTable};
use tracing::debug;

/// Number of distinct keywords that occur in at least one cell of `row`.
///
/// A keyword found in several cells still counts once.
pub fn score_row(row: &[Cell], keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|keyword| !keyword.is_empty())
        .filter(|keyword| {
            row.iter()
                .any(|cell| cell.as_deref().unwrap_or("").contains(keyword.as_str()))
        })
        .count()
}

/// Index of the header row among `rows`, or 0 when no row reaches the
/// threshold. Only the first `policy.probe_rows` rows are considered.
pub fn locate_header(rows: &[Vec<Cell>], policy: &HeaderPolicy) -> usize {
    let mut best: Option<(usize, usize)> = None;

    for (idx, row) in rows.iter().take(policy.probe_rows).enumerate() {
        let score = score_row(row, &policy.keywords);
        if score < policy.threshold {
            continue;
        }

        match policy.search {
            HeaderSearch::FirstMatch => return idx,
            HeaderSearch::BestScore => {
                if best.is_none_or(|(_, best_score)| score > best_score) {
                    best = Some((idx, score));
                }
            }
        }
    }

    best.map(|(idx, _)| idx).unwrap_or(0)
}

/// Run a probe read and locate the header in its rows.
///
/// A failing probe is not fatal: the error is logged at debug level and row 0
/// is assumed. If that guess is wrong the key column will not be found and the
/// file is reported as skipped.
pub fn probe_header<F>(file: &str, policy: &HeaderPolicy, probe: F) -> usize
where
    F: FnOnce(usize) -> Result<RawTable>,
{
    match probe(policy.probe_rows) {
        Ok(table) => {
            let idx = locate_header(&table.rows, policy);
            debug!("{}: header row {} (probed {} rows)", file, idx, table.len());
            idx
        }
        Err(e) => {
            debug!("{}: header probe failed, assuming row 0: {}", file, e);
            0
        }
    }
}
