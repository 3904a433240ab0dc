//! Application constants for the sheet merger
//!
//! Default keyword sets, synonym rules, sentinels and report styling values
//! used when no profile overrides them.

// =============================================================================
// Input Files
// =============================================================================

/// File extensions accepted as input (compared case-insensitively)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

/// Prefix Excel uses for owner/lock files next to an open workbook
pub const EXCEL_LOCK_FILE_PREFIX: &str = "~$";

/// Default name of the merged report written into the input directory
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "combined_raw_data_result.xlsx";

/// Candidate text encodings, tried in order until one decodes strictly
pub const DEFAULT_ENCODINGS: &[&str] = &["utf-8", "euc-kr", "windows-949"];

// =============================================================================
// Header Detection
// =============================================================================

/// Number of leading rows scanned when looking for the header row
pub const DEFAULT_PROBE_ROWS: usize = 15;

/// Minimum number of distinct keywords a row needs to count as a header
pub const DEFAULT_HEADER_THRESHOLD: usize = 1;

/// Keywords that mark a header row of a work-order export
pub const DEFAULT_HEADER_KEYWORDS: &[&str] = &["수주", "품명", "품목", "규격", "수량"];

// =============================================================================
// Column Normalization
// =============================================================================

/// Ordered `(trigger, canonical)` rewrite rules; the first trigger found wins.
///
/// Every canonical name must normalize to itself, otherwise normalization
/// would not be idempotent. Order-number triggers name the number column
/// itself so that other order fields (`수주일자`, `수주처`) keep their labels.
pub const DEFAULT_SYNONYMS: &[(&str, &str)] = &[
    ("수주NO", "수주NO"),
    ("수주No", "수주NO"),
    ("수주번호", "수주NO"),
    ("품명", "품명"),
    ("품목", "품명"),
    ("규격", "규격"),
    ("수량", "수량"),
    ("중량", "중량"),
    ("재질", "재질"),
    ("강종", "재질"),
    ("납기", "납기일"),
    ("거래처", "거래처"),
    ("고객", "거래처"),
];

/// Characters removed from every column label before synonym matching
pub const LABEL_STRIP_CHARS: &[char] = &[' ', '.', '\n', '\r'];

/// Label given to header cells that are empty
pub const UNNAMED_COLUMN_PREFIX: &str = "Unnamed:";

/// Substrings that identify the key identifier column
pub const DEFAULT_KEY_TRIGGERS: &[&str] = &["수주"];

// =============================================================================
// Metadata
// =============================================================================

/// Date written when a filename has no `d-d` pattern
pub const UNKNOWN_DATE: &str = "date unknown";

/// Unit tag written when a filename has no parenthesized segment
pub const UNKNOWN_UNIT: &str = "unit unknown";

/// Name of the first metadata column in the merged table
pub const DEFAULT_DATE_COLUMN: &str = "work_date";

/// Name of the second metadata column in the merged table
pub const DEFAULT_UNIT_COLUMN: &str = "unit_tag";

// =============================================================================
// Report Styling
// =============================================================================

/// Worksheet name of the merged report
pub const DEFAULT_SHEET_NAME: &str = "merged";

/// Header fill color (RGB)
pub const DEFAULT_HEADER_FILL: u32 = 0x4472C4;

/// Rows per column inspected for borders and width sizing
pub const DEFAULT_STYLE_SAMPLE_ROWS: usize = 100;

/// Extra characters added to the widest sampled value
pub const DEFAULT_COLUMN_PADDING: usize = 2;

/// Upper bound on auto-sized column widths
pub const DEFAULT_MAX_COLUMN_WIDTH: usize = 50;

/// Excel's limit on worksheet name length
pub const MAX_SHEET_NAME_LEN: usize = 31;
