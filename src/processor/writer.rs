//! Report writing
//!
//! Renders the master table to a single-sheet xlsx workbook and replaces the
//! output file atomically, so an interrupted or failed write never leaves a
//! truncated report behind.

use crate::config::ReportStyle;
use crate::error::{MergeError, Result};

use polars::prelude::{DataFrame, DataType};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, FormatPattern, Workbook};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Xlsx report writer
#[derive(Debug)]
pub struct ReportWriter {
    output_path: PathBuf,
    style: ReportStyle,
}

impl ReportWriter {
    pub fn new(output_path: PathBuf, style: ReportStyle) -> Self {
        Self { output_path, style }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Render `frame` and write it to the output path; returns the data row count
    pub fn write(&self, frame: &DataFrame) -> Result<usize> {
        let bytes = render_report(frame, &self.style)?;
        debug!(
            "Rendered report: {} rows, {} columns, {} bytes",
            frame.height(),
            frame.width(),
            bytes.len()
        );

        write_report(&self.output_path, &bytes)?;
        Ok(frame.height())
    }
}

/// Render a frame into xlsx bytes.
///
/// Every value is written as text. With styling enabled the header row is
/// bold on a solid fill, the first `sample_rows` data rows get thin borders,
/// and column widths follow the longest sampled value.
pub fn render_report(frame: &DataFrame, style: &ReportStyle) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&style.sheet_name)?;

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(style.header_fill))
        .set_pattern(FormatPattern::Solid)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);
    let cell_format = Format::new().set_border(FormatBorder::Thin);

    for (col_idx, column) in frame.get_columns().iter().enumerate() {
        let col = column_index(col_idx)?;
        let name = column.name().as_str();

        if style.enabled {
            worksheet.write_string_with_format(0, col, name, &header_format)?;
        } else {
            worksheet.write_string(0, col, name)?;
        }

        let values = column.as_materialized_series().cast(&DataType::String)?;
        let values = values.str()?;
        let mut widest = name.chars().count();

        for (row_idx, value) in values.into_iter().enumerate() {
            let row = row_index(row_idx)?;
            let styled = style.enabled && row_idx < style.sample_rows;

            match (value, styled) {
                (Some(text), true) => {
                    worksheet.write_string_with_format(row, col, text, &cell_format)?;
                }
                (Some(text), false) => {
                    worksheet.write_string(row, col, text)?;
                }
                (None, true) => {
                    worksheet.write_blank(row, col, &cell_format)?;
                }
                (None, false) => {}
            }

            if row_idx < style.sample_rows {
                widest = widest.max(value.map_or(0, |text| text.chars().count()));
            }
        }

        if style.enabled {
            worksheet.set_column_width(col, column_width(widest, style) as f64)?;
        }
    }

    if style.enabled && style.freeze_header {
        worksheet.set_freeze_panes(1, 0)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Width for a column whose widest sampled value has `widest` characters
pub fn column_width(widest: usize, style: &ReportStyle) -> usize {
    (widest + style.column_padding).min(style.max_column_width)
}

/// Replace `path` with `bytes` via a temporary file in the same directory
pub fn write_report(path: &Path, bytes: &[u8]) -> Result<()> {
    let failed = |reason: String| MergeError::OutputWriteFailed {
        path: path.to_path_buf(),
        reason,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| failed(e.to_string()))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| failed(e.to_string()))?;
    temp.write_all(bytes).map_err(|e| failed(e.to_string()))?;
    temp.flush().map_err(|e| failed(e.to_string()))?;
    temp.persist(path).map_err(|e| failed(e.error.to_string()))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn column_index(idx: usize) -> Result<u16> {
    u16::try_from(idx)
        .map_err(|_| MergeError::configuration(format!("Too many columns for xlsx: {}", idx + 1)))
}

/// Data rows start below the header
fn row_index(idx: usize) -> Result<u32> {
    u32::try_from(idx + 1)
        .map_err(|_| MergeError::configuration(format!("Too many rows for xlsx: {}", idx + 1)))
}
