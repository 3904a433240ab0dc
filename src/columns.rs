//! Column label normalization.
//!
//! Labels are cleaned (spaces, periods and line breaks removed) and then
//! rewritten through an ordered synonym map so that the same field spelled
//! differently across files lands in one canonical column.

use crate::config::DuplicateLabelPolicy;
use crate::constants::{DEFAULT_SYNONYMS, LABEL_STRIP_CHARS};
use crate::error::{MergeError, Result};
use crate::models::{Cell, ParsedRecord};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// One rewrite rule: a label containing `trigger` becomes `canonical`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymRule {
    pub trigger: String,
    pub canonical: String,
}

impl SynonymRule {
    pub fn new(trigger: impl Into<String>, canonical: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            canonical: canonical.into(),
        }
    }
}

/// Ordered synonym rules; the first rule whose trigger occurs in a label wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynonymMap {
    rules: Vec<SynonymRule>,
}

impl Default for SynonymMap {
    fn default() -> Self {
        Self::new(
            DEFAULT_SYNONYMS
                .iter()
                .map(|(trigger, canonical)| SynonymRule::new(*trigger, *canonical))
                .collect(),
        )
    }
}

impl SynonymMap {
    pub fn new(rules: Vec<SynonymRule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Canonical name for a cleaned label, if any trigger matches
    pub fn lookup(&self, cleaned: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| cleaned.contains(rule.trigger.as_str()))
            .map(|rule| rule.canonical.as_str())
    }

    /// Reject rule sets that would make normalization non-idempotent:
    /// every canonical name must normalize to itself.
    pub fn validate(&self) -> Result<()> {
        for rule in &self.rules {
            if rule.trigger.is_empty() {
                return Err(MergeError::configuration(format!(
                    "Synonym rule for '{}' has an empty trigger",
                    rule.canonical
                )));
            }

            let renormalized = normalize_label(&rule.canonical, self);
            if renormalized != rule.canonical {
                return Err(MergeError::configuration(format!(
                    "Canonical name '{}' (trigger '{}') normalizes to '{}'; reorder the rules or rename it",
                    rule.canonical, rule.trigger, renormalized
                )));
            }
        }
        Ok(())
    }
}

/// Remove spaces, periods and line breaks
pub fn clean_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !LABEL_STRIP_CHARS.contains(c))
        .collect()
}

/// Clean a label and apply the first matching synonym rule
pub fn normalize_label(label: &str, synonyms: &SynonymMap) -> String {
    let cleaned = clean_label(label);
    match synonyms.lookup(&cleaned) {
        Some(canonical) => canonical.to_string(),
        None => cleaned,
    }
}

/// Normalize every label independently; length and order are preserved
pub fn normalize_columns(labels: &[String], synonyms: &SynonymMap) -> Vec<String> {
    labels
        .iter()
        .map(|label| normalize_label(label, synonyms))
        .collect()
}

/// Make labels unique according to `policy`.
///
/// With [`DuplicateLabelPolicy::LastWins`] colliding columns collapse into the
/// position of their first occurrence and each row keeps the value of the
/// last colliding column, which can silently discard data from the earlier
/// ones. [`DuplicateLabelPolicy::Suffix`] keeps every column instead.
pub fn resolve_duplicates(
    record: ParsedRecord,
    policy: DuplicateLabelPolicy,
    file: &str,
) -> ParsedRecord {
    let has_duplicates = {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut found = false;
        for label in &record.labels {
            if !seen.insert(label.as_str()) {
                found = true;
                warn!(
                    "{}: several columns normalize to '{}' ({:?} policy)",
                    file, label, policy
                );
            }
        }
        found
    };
    if !has_duplicates {
        return record;
    }

    match policy {
        DuplicateLabelPolicy::LastWins => merge_last_wins(record),
        DuplicateLabelPolicy::Suffix => suffix_duplicates(record),
    }
}

fn merge_last_wins(record: ParsedRecord) -> ParsedRecord {
    let mut labels: Vec<String> = Vec::new();
    let mut target: Vec<usize> = Vec::with_capacity(record.labels.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for label in &record.labels {
        let position = *positions.entry(label.clone()).or_insert_with(|| {
            labels.push(label.clone());
            labels.len() - 1
        });
        target.push(position);
    }

    let rows = record
        .rows
        .into_iter()
        .map(|row| {
            let mut merged: Vec<Cell> = vec![None; labels.len()];
            for (source_idx, cell) in row.into_iter().enumerate() {
                if let Some(&dest) = target.get(source_idx) {
                    merged[dest] = cell;
                }
            }
            merged
        })
        .collect();

    ParsedRecord { labels, rows }
}

fn suffix_duplicates(record: ParsedRecord) -> ParsedRecord {
    let mut taken: HashMap<String, usize> = record
        .labels
        .iter()
        .map(|label| (label.clone(), 0))
        .collect();
    let mut labels = Vec::with_capacity(record.labels.len());

    for label in &record.labels {
        let seen = taken.get_mut(label).map(|count| {
            *count += 1;
            *count
        });

        if seen == Some(1) {
            labels.push(label.clone());
            continue;
        }

        let mut n = seen.unwrap_or(1);
        let mut candidate = format!("{}_{}", label, n);
        while taken.contains_key(&candidate) {
            n += 1;
            candidate = format!("{}_{}", label, n);
        }
        taken.insert(candidate.clone(), 1);
        labels.push(candidate);
    }

    ParsedRecord {
        labels,
        rows: record.rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn cell(value: &str) -> Cell {
        Some(value.to_string())
    }

    #[test]
    fn test_clean_label_strips_spaces_periods_newlines() {
        assert_eq!(clean_label(" 수주 NO.\n"), "수주NO");
        assert_eq!(clean_label("a.b c\r\nd"), "abcd");
        assert_eq!(clean_label("plain"), "plain");
    }

    #[test]
    fn test_synonyms_rewrite_whole_label() {
        let synonyms = SynonymMap::default();
        assert_eq!(normalize_label("수주NO.", &synonyms), "수주NO");
        assert_eq!(normalize_label("품 명", &synonyms), "품명");
        assert_eq!(normalize_label("품목", &synonyms), "품명");
        assert_eq!(normalize_label("납기 요청", &synonyms), "납기일");
        assert_eq!(normalize_label("비 고", &synonyms), "비고");
    }

    #[test]
    fn test_default_synonyms_keep_other_order_fields_apart() {
        let synonyms = SynonymMap::default();
        let labels = strings(&["수주 NO.", "수주일자", "수주처", "수주번호", "수주No"]);

        let normalized = normalize_columns(&labels, &synonyms);

        assert_eq!(
            normalized,
            strings(&["수주NO", "수주일자", "수주처", "수주NO", "수주NO"])
        );
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let synonyms = SynonymMap::new(vec![
            SynonymRule::new("A", "first"),
            SynonymRule::new("B", "second"),
        ]);
        assert_eq!(normalize_label("xBxAx", &synonyms), "first");
        assert_eq!(normalize_label("xBx", &synonyms), "second");
    }

    #[test]
    fn test_normalize_columns_preserves_length_and_order() {
        let synonyms = SynonymMap::default();
        let labels = strings(&["비고", "수주 NO.", "품목", "품 명"]);
        let normalized = normalize_columns(&labels, &synonyms);
        assert_eq!(normalized, strings(&["비고", "수주NO", "품명", "품명"]));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let synonyms = SynonymMap::default();
        let labels = strings(&[
            "수주 NO.",
            "품\n명",
            "품목코드",
            "규 격",
            "단위.중량",
            "Unnamed: 7",
            "고객사",
            "",
        ]);
        let once = normalize_columns(&labels, &synonyms);
        let twice = normalize_columns(&once, &synonyms);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_default_synonyms_validate() {
        SynonymMap::default().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_non_idempotent_rules() {
        let synonyms = SynonymMap::new(vec![
            SynonymRule::new("번호", "수주"),
            SynonymRule::new("수주", "수주번호"),
        ]);
        assert!(synonyms.validate().is_err());
    }

    #[test]
    fn test_resolve_duplicates_last_wins() {
        let record = ParsedRecord {
            labels: strings(&["품명", "수주NO", "품명"]),
            rows: vec![
                vec![cell("a"), cell("1"), cell("b")],
                vec![cell("c"), cell("2"), None],
            ],
        };

        let resolved = resolve_duplicates(record, DuplicateLabelPolicy::LastWins, "t.csv");

        assert_eq!(resolved.labels, strings(&["품명", "수주NO"]));
        assert_eq!(resolved.rows[0], vec![cell("b"), cell("1")]);
        assert_eq!(resolved.rows[1], vec![None, cell("2")]);
    }

    #[test]
    fn test_resolve_duplicates_suffix() {
        let record = ParsedRecord {
            labels: strings(&["품명", "품명_2", "품명", "품명"]),
            rows: vec![vec![cell("a"), cell("b"), cell("c"), cell("d")]],
        };

        let resolved = resolve_duplicates(record, DuplicateLabelPolicy::Suffix, "t.csv");

        assert_eq!(
            resolved.labels,
            strings(&["품명", "품명_2", "품명_3", "품명_4"])
        );
        assert_eq!(resolved.rows[0].len(), 4);
    }

    #[test]
    fn test_resolve_without_duplicates_is_unchanged() {
        let record = ParsedRecord {
            labels: strings(&["a", "b"]),
            rows: vec![vec![cell("1"), cell("2")]],
        };
        let resolved = resolve_duplicates(record.clone(), DuplicateLabelPolicy::Suffix, "t.csv");
        assert_eq!(resolved, record);
    }
}
