//! Row filtering and metadata tagging
//!
//! Keeps only rows that carry a key identifier value and prepends the
//! filename metadata to each of them.

use crate::config::{KeyColumnPolicy, MetadataColumns};
use crate::error::{MergeError, Result};
use crate::models::{Metadata, ParsedRecord};

/// Index of the first column whose normalized label matches the key policy
pub fn find_key_column(labels: &[String], policy: &KeyColumnPolicy) -> Option<usize> {
    labels.iter().position(|label| policy.matches(label))
}

/// Drop rows whose key cell is empty or whitespace only
pub fn retain_keyed_rows(record: ParsedRecord, key_idx: usize) -> ParsedRecord {
    let rows = record
        .rows
        .into_iter()
        .filter(|row| {
            row.get(key_idx)
                .and_then(|cell| cell.as_deref())
                .is_some_and(|value| !value.trim().is_empty())
        })
        .collect();

    ParsedRecord {
        labels: record.labels,
        rows,
    }
}

/// Prepend the date and unit tag columns, in that order, to every row
pub fn tag_rows(
    record: ParsedRecord,
    metadata: &Metadata,
    columns: &MetadataColumns,
    file: &str,
) -> Result<ParsedRecord> {
    if let Some(clash) = record
        .labels
        .iter()
        .find(|label| **label == columns.date || **label == columns.unit)
    {
        return Err(MergeError::ReservedColumn {
            file: file.to_string(),
            column: clash.clone(),
        });
    }

    let mut labels = Vec::with_capacity(record.labels.len() + 2);
    labels.push(columns.date.clone());
    labels.push(columns.unit.clone());
    labels.extend(record.labels);

    let rows = record
        .rows
        .into_iter()
        .map(|row| {
            let mut tagged = Vec::with_capacity(row.len() + 2);
            tagged.push(Some(metadata.work_date.clone()));
            tagged.push(Some(metadata.unit_tag.clone()));
            tagged.extend(row);
            tagged
        })
        .collect();

    Ok(ParsedRecord { labels, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyMatch;
    use crate::models::Cell;

    fn cell(value: &str) -> Cell {
        Some(value.to_string())
    }

    fn record() -> ParsedRecord {
        ParsedRecord {
            labels: vec!["품명".to_string(), "수주NO".to_string()],
            rows: vec![
                vec![cell("볼트"), cell("A-1")],
                vec![cell("너트"), None],
                vec![cell("와셔"), cell("   ")],
                vec![None, cell("A-2")],
            ],
        }
    }

    #[test]
    fn test_find_key_column_substring_and_exact() {
        let labels = vec!["수주일자".to_string(), "수주NO".to_string()];

        let substring = KeyColumnPolicy::default();
        assert_eq!(find_key_column(&labels, &substring), Some(0));

        let exact = KeyColumnPolicy {
            triggers: vec!["수주NO".to_string()],
            matching: KeyMatch::Exact,
        };
        assert_eq!(find_key_column(&labels, &exact), Some(1));

        let labels = vec!["품명".to_string()];
        assert_eq!(find_key_column(&labels, &substring), None);
    }

    #[test]
    fn test_retain_keyed_rows() {
        let filtered = retain_keyed_rows(record(), 1);
        assert_eq!(filtered.row_count(), 2);
        assert_eq!(filtered.rows[0][1], cell("A-1"));
        assert_eq!(filtered.rows[1][1], cell("A-2"));
    }

    #[test]
    fn test_tag_rows_prepends_date_then_unit() {
        let metadata = Metadata {
            work_date: "11-03".to_string(),
            unit_tag: "1".to_string(),
        };
        let tagged = tag_rows(record(), &metadata, &MetadataColumns::default(), "a.csv").unwrap();

        assert_eq!(tagged.labels[..3], ["work_date", "unit_tag", "품명"]);
        assert!(tagged.rows.iter().all(|row| row[0] == cell("11-03")));
        assert!(tagged.rows.iter().all(|row| row[1] == cell("1")));
        assert_eq!(tagged.rows[0].len(), 4);
    }

    #[test]
    fn test_tag_rows_rejects_reserved_label() {
        let mut clashing = record();
        clashing.labels[0] = "work_date".to_string();
        let metadata = Metadata {
            work_date: "1-1".to_string(),
            unit_tag: "x".to_string(),
        };

        let result = tag_rows(clashing, &metadata, &MetadataColumns::default(), "a.csv");
        assert!(matches!(result, Err(MergeError::ReservedColumn { .. })));
    }
}
