//! Master table accumulation
//!
//! Each accepted file becomes a string-typed polars `DataFrame`; the frames
//! are concatenated diagonally so the result carries the union of all
//! columns in order of first appearance, with nulls where a file lacked a
//! column. The two metadata columns always lead.

use crate::config::MetadataColumns;
use crate::error::Result;
use crate::models::ParsedRecord;
use polars::functions::concat_df_diagonal;
use polars::prelude::*;
use tracing::debug;

/// Accumulator for all accepted rows of a run
#[derive(Debug)]
pub struct MasterTable {
    frames: Vec<DataFrame>,
    rows: usize,
}

impl MasterTable {
    /// Start with an empty frame holding only the metadata columns, so they
    /// come first whatever the accepted files contain
    pub fn new(columns: &MetadataColumns) -> Result<Self> {
        let seed = DataFrame::new(vec![
            empty_string_column(&columns.date),
            empty_string_column(&columns.unit),
        ])?;

        Ok(Self {
            frames: vec![seed],
            rows: 0,
        })
    }

    /// Number of accumulated rows
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Number of files that contributed a frame
    pub fn frame_count(&self) -> usize {
        self.frames.len() - 1
    }

    /// Append a tagged record; its labels must be unique
    pub fn append(&mut self, record: ParsedRecord) -> Result<()> {
        let frame = record_to_frame(record)?;
        self.rows += frame.height();
        self.frames.push(frame);
        Ok(())
    }

    /// Concatenate everything into one frame
    pub fn finish(self) -> Result<DataFrame> {
        debug!(
            "Concatenating {} frames ({} rows)",
            self.frames.len() - 1,
            self.rows
        );

        if self.frames.len() == 1 {
            return Ok(self.frames.into_iter().next().unwrap_or_default());
        }
        Ok(concat_df_diagonal(&self.frames)?)
    }
}

fn empty_string_column(name: &str) -> Column {
    Column::new(name.into(), Vec::<Option<String>>::new())
}

/// Convert a record into a frame of nullable string columns
pub fn record_to_frame(record: ParsedRecord) -> Result<DataFrame> {
    let ParsedRecord { labels, rows } = record;
    let mut values: Vec<Vec<Option<String>>> = labels
        .iter()
        .map(|_| Vec::with_capacity(rows.len()))
        .collect();

    for row in rows {
        let mut cells = row.into_iter();
        for column in values.iter_mut() {
            column.push(cells.next().flatten());
        }
    }

    let columns: Vec<Column> = labels
        .iter()
        .zip(values)
        .map(|(label, data)| Column::new(label.as_str().into(), data))
        .collect();

    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn cell(value: &str) -> Cell {
        Some(value.to_string())
    }

    fn tagged(labels: &[&str], rows: Vec<Vec<Cell>>) -> ParsedRecord {
        ParsedRecord {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            rows,
        }
    }

    fn column_names(frame: &DataFrame) -> Vec<String> {
        frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    #[test]
    fn test_empty_master_has_metadata_columns() {
        let master = MasterTable::new(&MetadataColumns::default()).unwrap();
        assert_eq!(master.row_count(), 0);

        let frame = master.finish().unwrap();
        assert_eq!(frame.height(), 0);
        assert_eq!(column_names(&frame), vec!["work_date", "unit_tag"]);
    }

    #[test]
    fn test_union_of_columns_in_first_appearance_order() {
        let mut master = MasterTable::new(&MetadataColumns::default()).unwrap();
        master
            .append(tagged(
                &["work_date", "unit_tag", "수주NO", "품명"],
                vec![vec![cell("11-03"), cell("1"), cell("A-1"), cell("볼트")]],
            ))
            .unwrap();
        master
            .append(tagged(
                &["work_date", "unit_tag", "수주NO", "수량"],
                vec![
                    vec![cell("11-04"), cell("2"), cell("B-1"), cell("5")],
                    vec![cell("11-04"), cell("2"), cell("B-2"), None],
                ],
            ))
            .unwrap();

        assert_eq!(master.row_count(), 3);
        assert_eq!(master.frame_count(), 2);

        let frame = master.finish().unwrap();
        assert_eq!(frame.height(), 3);
        assert_eq!(
            column_names(&frame),
            vec!["work_date", "unit_tag", "수주NO", "품명", "수량"]
        );

        let names = frame
            .column("품명")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap();
        assert_eq!(names.get(0), Some("볼트"));
        assert_eq!(names.get(1), None);
    }

    #[test]
    fn test_record_to_frame_pads_short_rows() {
        let frame = record_to_frame(tagged(&["a", "b"], vec![vec![cell("1")]])).unwrap();
        assert_eq!(frame.height(), 1);
        assert_eq!(frame.column("b").unwrap().null_count(), 1);
    }

    #[test]
    fn test_duplicate_labels_are_rejected_by_frame() {
        let result = record_to_frame(tagged(&["a", "a"], vec![vec![cell("1"), cell("2")]]));
        assert!(result.is_err());
    }
}
