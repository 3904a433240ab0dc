//! Reading source files into raw, header-less tables.
//!
//! Text files are decoded with the first candidate encoding that succeeds
//! without replacement characters; spreadsheets are read from their first
//! worksheet. Both produce a [`RawTable`] whose cells are strings or `None`.

use crate::error::{MergeError, Result};
use crate::models::{Cell, FileKind, RawTable, SourceFile};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::Timelike;
use encoding_rs::Encoding;
use std::borrow::Cow;
use std::io::Cursor;
use tracing::debug;

/// A source file prepared for (possibly repeated) table reads
#[derive(Debug)]
pub enum LoadedSource<'a> {
    Text {
        name: &'a str,
        text: String,
        encoding: &'static Encoding,
    },
    Workbook {
        name: &'a str,
        bytes: &'a [u8],
    },
}

impl<'a> LoadedSource<'a> {
    /// Pick a parser by extension and decode text formats
    pub fn load(source: &'a SourceFile, encodings: &[String]) -> Result<Self> {
        let kind = source.kind.ok_or_else(|| MergeError::UnsupportedFormat {
            file: source.name.clone(),
        })?;

        if kind.is_text() {
            let (text, encoding) = decode_text(&source.name, &source.bytes, encodings)?;
            Ok(LoadedSource::Text {
                name: &source.name,
                text,
                encoding,
            })
        } else {
            Ok(LoadedSource::Workbook {
                name: &source.name,
                bytes: &source.bytes,
            })
        }
    }

    /// Encoding the text was decoded with; `None` for workbooks
    pub fn encoding(&self) -> Option<&'static Encoding> {
        match self {
            LoadedSource::Text { encoding, .. } => Some(*encoding),
            LoadedSource::Workbook { .. } => None,
        }
    }

    /// Read at most `limit` rows (all rows when `None`)
    pub fn read_rows(&self, limit: Option<usize>) -> Result<RawTable> {
        match self {
            LoadedSource::Text { name, text, .. } => read_csv_rows(name, text, limit),
            LoadedSource::Workbook { name, bytes } => read_sheet_rows(name, bytes, limit),
        }
    }
}

/// Decode `bytes` with the first candidate encoding that yields no malformed
/// sequences. A byte-order mark overrides the candidate list.
pub fn decode_text(
    file: &str,
    bytes: &[u8],
    labels: &[String],
) -> Result<(String, &'static Encoding)> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        debug!("{}: byte-order mark selects {}", file, encoding.name());
        return decode_strict(&bytes[bom_len..], encoding)
            .map(|text| (text, encoding))
            .ok_or_else(|| MergeError::EncodingExhausted {
                file: file.to_string(),
                tried: encoding.name().to_string(),
                last: format!("malformed {} after byte-order mark", encoding.name()),
            });
    }

    let mut tried: Vec<&'static Encoding> = Vec::new();
    let mut last = String::from("no candidate encodings configured");

    for label in labels {
        let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
            last = format!("unknown encoding label '{}'", label);
            continue;
        };
        if tried.contains(&encoding) {
            continue;
        }
        tried.push(encoding);

        match decode_strict(bytes, encoding) {
            Some(text) => {
                debug!("{}: decoded as {}", file, encoding.name());
                return Ok((text, encoding));
            }
            None => {
                debug!("{}: not valid {}", file, encoding.name());
                last = format!("malformed {} byte sequence", encoding.name());
            }
        }
    }

    Err(MergeError::EncodingExhausted {
        file: file.to_string(),
        tried: tried
            .iter()
            .map(|e| e.name())
            .collect::<Vec<_>>()
            .join(", "),
        last,
    })
}

fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
}

/// Parse comma-separated text into raw rows; ragged rows are allowed
pub fn read_csv_rows(file: &str, text: &str, limit: Option<usize>) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        if limit.is_some_and(|limit| rows.len() >= limit) {
            break;
        }
        let record = record.map_err(|e| MergeError::csv(file, e))?;
        rows.push(record.iter().map(text_cell).collect());
    }

    Ok(RawTable::new(rows))
}

/// Read the first worksheet of an xlsx/xls workbook into raw rows.
///
/// Row indices are relative to the sheet's used range, so leading rows that
/// are completely empty do not count.
pub fn read_sheet_rows(file: &str, bytes: &[u8], limit: Option<usize>) -> Result<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| MergeError::spreadsheet(file, e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| MergeError::EmptyWorkbook {
            file: file.to_string(),
        })?
        .map_err(|e| MergeError::spreadsheet(file, e))?;

    let take = limit.unwrap_or(usize::MAX);
    let rows = range
        .rows()
        .take(take)
        .map(|row| row.iter().map(data_cell).collect())
        .collect();

    Ok(RawTable::new(rows))
}

fn text_cell(value: &str) -> Cell {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// String form of a spreadsheet cell; empty cells become `None`
fn data_cell(value: &Data) -> Cell {
    let text = match value {
        Data::Empty => return None,
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => {
            if *b {
                "TRUE".to_string()
            } else {
                "FALSE".to_string()
            }
        }
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) if naive.time().num_seconds_from_midnight() == 0 => {
                naive.format("%Y-%m-%d").to_string()
            }
            Some(naive) => naive.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERROR:{:?}", e),
    };

    if text.is_empty() { None } else { Some(text) }
}

/// Format a file kind for log messages
pub fn describe(kind: FileKind) -> &'static str {
    match kind {
        FileKind::Csv => "comma-separated text",
        FileKind::Xlsx => "xlsx workbook",
        FileKind::Xls => "xls workbook",
    }
}
