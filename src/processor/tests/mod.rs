//! Pipeline tests for the processor module
//!
//! Exercise the complete per-file workflow on in-memory sources.

pub mod error_handling;

use crate::config::MergeConfig;
use crate::models::SourceFile;
use crate::processor::SheetMerger;
use polars::prelude::DataFrame;

/// CSV source from UTF-8 text
pub fn csv_source(name: &str, text: &str) -> SourceFile {
    SourceFile::new(name, text.as_bytes().to_vec())
}

/// Xlsx source whose first sheet holds `rows` as strings
pub fn xlsx_source(name: &str, rows: &[&[&str]]) -> SourceFile {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
    }
    SourceFile::new(name, workbook.save_to_buffer().unwrap())
}

pub fn default_merger() -> SheetMerger {
    SheetMerger::new(MergeConfig::default()).unwrap()
}

pub fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Values of a string column, `None` for nulls
pub fn column_values(frame: &DataFrame, name: &str) -> Vec<Option<String>> {
    frame
        .column(name)
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect()
}

/// The title block and header layout of a typical daily export
pub const DAILY_EXPORT: &str = "작업 지시 현황,,,
수주NO.,품 명,규격,수량
A-1,볼트,M8,10
,너트,M8,5
A-2,와셔,M8,3
  ,핀,,1
A-3,스프링,,2
";
