//! Tabular source reader for `.xlsx` and `.csv` victim spreadsheets.
//!
//! A logical filename names one format; when that file is absent the other
//! extension is tried before absence is reported. Every row is returned as
//! a [`serde_json::Map`] keyed by the header text exactly as it appears in
//! the file, encoding artifacts included.

use std::path::{Path, PathBuf};

use calamine::{Data, Reader as _};
use serde_json::Value;

use crate::DatasetError;

/// One untyped source row: header text -> cell value.
pub type RawRecord = serde_json::Map<String, Value>;

/// A parsed spreadsheet.
#[derive(Debug, Clone)]
pub struct RawTable {
    /// File the table was read from.
    pub path: PathBuf,
    /// Header row, verbatim and in file order.
    pub headers: Vec<String>,
    /// Data rows. Empty cells are [`Value::Null`].
    pub rows: Vec<RawRecord>,
}

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Office Open XML workbook (first sheet is read).
    Xlsx,
    /// Comma- or semicolon-separated text.
    Csv,
}

impl SourceFormat {
    /// Detects the format from a file extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xls" | "ods" => Some(Self::Xlsx),
            "csv" | "txt" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Extension tried when a file in this format is missing.
    #[must_use]
    pub const fn alternate_extension(self) -> &'static str {
        match self {
            Self::Xlsx => "csv",
            Self::Csv => "xlsx",
        }
    }
}

/// Resolves the file to read for `filename` under `dir`: the file itself if
/// it exists, otherwise the same stem with the alternate extension.
#[must_use]
pub fn resolve_source_path(dir: &Path, filename: &str) -> Option<PathBuf> {
    let preferred = dir.join(filename);
    if preferred.is_file() {
        return Some(preferred);
    }

    let format = SourceFormat::from_path(&preferred)?;
    let fallback = preferred.with_extension(format.alternate_extension());
    if fallback.is_file() {
        log::info!(
            "{} not found, using {}",
            preferred.display(),
            fallback.display()
        );
        return Some(fallback);
    }

    None
}

/// Reads `filename` from `dir`, falling back to the alternate extension.
///
/// Returns `Ok(None)` when neither file exists; the caller decides whether
/// that is fatal.
///
/// # Errors
///
/// Returns [`DatasetError`] if a file exists but cannot be read or parsed.
pub fn read_table(dir: &Path, filename: &str) -> Result<Option<RawTable>, DatasetError> {
    let Some(path) = resolve_source_path(dir, filename) else {
        log::warn!("Source file not found: {}", dir.join(filename).display());
        return Ok(None);
    };

    read_path(&path).map(Some)
}

/// Reads a table from an explicit path, choosing the parser by extension.
///
/// # Errors
///
/// Returns [`DatasetError`] on I/O, encoding, or parse failure, or if the
/// extension is not a supported tabular format.
pub fn read_path(path: &Path) -> Result<RawTable, DatasetError> {
    log::info!("Loading {}", path.display());

    match SourceFormat::from_path(path) {
        Some(SourceFormat::Csv) => read_csv(path),
        Some(SourceFormat::Xlsx) => read_xlsx(path),
        None => Err(DatasetError::UnsupportedFormat {
            path: path.display().to_string(),
        }),
    }
}

// ============================================================
// CSV
// ============================================================

fn read_csv(path: &Path) -> Result<RawTable, DatasetError> {
    let bytes = std::fs::read(path)?;
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
    let text = std::str::from_utf8(bytes).map_err(|e| DatasetError::Encoding {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let delimiter = sniff_delimiter(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut row = RawRecord::new();
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).map(str::trim).unwrap_or_default();
            let value = if value.is_empty() {
                Value::Null
            } else {
                Value::String(value.to_owned())
            };
            row.entry(header.clone()).or_insert(value);
        }
        rows.push(row);
    }

    log::debug!(
        "Parsed {} CSV rows from {} (delimiter {:?})",
        rows.len(),
        path.display(),
        char::from(delimiter)
    );

    Ok(RawTable {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

/// Picks `;` when the header line has more semicolons than commas.
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    if semicolons > commas { b';' } else { b',' }
}

// ============================================================
// XLSX
// ============================================================

fn read_xlsx(path: &Path) -> Result<RawTable, DatasetError> {
    let mut workbook = calamine::open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DatasetError::EmptyWorkbook {
            path: path.display().to_string(),
        })??;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .map(|cells| cells.iter().map(ToString::to_string).collect())
        .unwrap_or_default();

    let rows: Vec<RawRecord> = sheet_rows
        .map(|cells| {
            let mut row = RawRecord::new();
            for (header, cell) in headers.iter().zip(cells) {
                row.entry(header.clone()).or_insert_with(|| cell_to_value(cell));
            }
            row
        })
        .collect();

    log::debug!("Parsed {} XLSX rows from {}", rows.len(), path.display());

    Ok(RawTable {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

/// Date-formatted cells become ISO strings so the date parser sees one
/// representation regardless of source format.
fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::String(trimmed.to_owned())
            }
        }
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => dt.as_datetime().map_or(Value::Null, |d| {
            Value::String(d.format("%Y-%m-%dT%H:%M:%S").to_string())
        }),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
    }
}
