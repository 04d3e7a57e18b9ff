//! Turns raw spreadsheet rows into [`EnrichedRecord`] values.
//!
//! Row-level problems never abort a load: an unparseable date becomes
//! year/month `0`, an unparseable victim count becomes `1`, a missing
//! municipality column tags every row as [`UNKNOWN_MUNICIPALITY`].

use chrono::{Datelike as _, Days, NaiveDate};
use serde_json::Value;
use violence_map_dataset_models::{EnrichedRecord, UNKNOWN_MUNICIPALITY};

use crate::columns::{Field, MonthColumn, month_columns, resolve_column};
use crate::normalize::normalize_value;
use crate::reader::{RawRecord, RawTable};

/// Date formats tried in order. Day-first forms come before ISO so that
/// `05/03/2024` is 5 March.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%y",
];

/// Largest spreadsheet serial accepted as a date (31 Dec 9999).
const MAX_SERIAL_DATE: f64 = 2_958_465.0;

/// Columns resolved for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    /// Municipality column.
    pub municipality: Option<String>,
    /// Date-of-fact column.
    pub fact_date: Option<String>,
    /// Victim count column.
    pub victim_count: Option<String>,
    /// Offense nature column.
    pub category: Option<String>,
    /// Explicit year column.
    pub year: Option<String>,
    /// Per-month count columns.
    pub month_columns: Vec<MonthColumn>,
}

impl ResolvedColumns {
    /// Resolves every field against the table headers.
    #[must_use]
    pub fn resolve(headers: &[String]) -> Self {
        let owned = |field| resolve_column(headers, field).map(str::to_owned);
        Self {
            municipality: owned(Field::Municipality),
            fact_date: owned(Field::FactDate),
            victim_count: owned(Field::VictimCount),
            category: owned(Field::Category),
            year: owned(Field::Year),
            month_columns: month_columns(headers),
        }
    }

    /// Whether rows should be unpivoted into one record per month column.
    #[must_use]
    pub fn is_wide(&self) -> bool {
        self.fact_date.is_none() && !self.month_columns.is_empty()
    }

    /// Human-readable notes for every field that fell back to a default.
    #[must_use]
    pub fn fallbacks(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if self.municipality.is_none() {
            notes.push(format!(
                "municipality column not found; rows tagged {UNKNOWN_MUNICIPALITY}"
            ));
        }
        if self.fact_date.is_none() && self.month_columns.is_empty() {
            notes.push("date column not found; year and month set to 0".to_string());
        }
        if !self.is_wide() && self.victim_count.is_none() {
            notes.push("victim count column not found; one victim per row".to_string());
        }
        if self.category.is_none() {
            notes.push("category column not found".to_string());
        }
        notes
    }
}

/// Output of [`enrich`].
#[derive(Debug, Clone)]
pub struct EnrichedTable {
    /// Columns the records were derived from.
    pub columns: ResolvedColumns,
    /// One record per row (long layout) or per non-empty month cell (wide).
    pub records: Vec<EnrichedRecord>,
}

/// Derives enriched records from a raw table.
#[must_use]
pub fn enrich(table: &RawTable) -> EnrichedTable {
    let columns = ResolvedColumns::resolve(&table.headers);

    for note in columns.fallbacks() {
        log::warn!("{}: {note}", table.path.display());
    }

    let records = if columns.is_wide() {
        log::info!(
            "{}: per-month layout with {} month columns",
            table.path.display(),
            columns.month_columns.len()
        );
        table
            .rows
            .iter()
            .flat_map(|row| enrich_wide_row(row, &columns))
            .collect()
    } else {
        table
            .rows
            .iter()
            .map(|row| enrich_long_row(row, &columns))
            .collect()
    };

    EnrichedTable { columns, records }
}

fn municipality_key(row: &RawRecord, columns: &ResolvedColumns) -> String {
    columns.municipality.as_ref().map_or_else(
        || UNKNOWN_MUNICIPALITY.to_string(),
        |col| row.get(col).map(normalize_value).unwrap_or_default(),
    )
}

fn cell<'a>(row: &'a RawRecord, column: Option<&String>) -> Option<&'a Value> {
    row.get(column?)
}

fn enrich_long_row(row: &RawRecord, columns: &ResolvedColumns) -> EnrichedRecord {
    let (year, month) = cell(row, columns.fact_date.as_ref())
        .and_then(parse_fact_date)
        .map_or((0, 0), |date| (date.year(), date.month()));

    let victim_count = cell(row, columns.victim_count.as_ref())
        .and_then(parse_count)
        .unwrap_or(1);

    EnrichedRecord {
        municipality_key: municipality_key(row, columns),
        year,
        month,
        victim_count,
        category: cell(row, columns.category.as_ref()).and_then(category_label),
    }
}

fn enrich_wide_row(row: &RawRecord, columns: &ResolvedColumns) -> Vec<EnrichedRecord> {
    let key = municipality_key(row, columns);
    let row_year = cell(row, columns.year.as_ref()).and_then(parse_year);
    let category = cell(row, columns.category.as_ref()).and_then(category_label);

    columns
        .month_columns
        .iter()
        .filter_map(|month_column| {
            let count = row.get(&month_column.header).and_then(parse_count)?;
            if count == 0 {
                return None;
            }
            Some(EnrichedRecord {
                municipality_key: key.clone(),
                year: month_column.year.or(row_year).unwrap_or(0),
                month: month_column.month,
                victim_count: count,
                category: category.clone(),
            })
        })
        .collect()
}

/// Parses a date-of-fact cell, day-first.
///
/// Accepts day-first and ISO text (an optional trailing time is ignored)
/// and spreadsheet serial numbers. Returns `None` for anything else,
/// including dates outside four-digit years.
#[must_use]
pub fn parse_fact_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => n.as_f64().and_then(serial_to_date),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let date_part = s.trim().split([' ', 'T']).next()?;
    if date_part.is_empty() {
        return None;
    }

    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(date_part, format)
            .ok()
            .filter(has_four_digit_year)
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=MAX_SERIAL_DATE).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?
        .checked_add_days(Days::new(serial.trunc() as u64))
        .filter(has_four_digit_year)
}

fn has_four_digit_year(date: &NaiveDate) -> bool {
    (1000..=9999).contains(&date.year())
}

/// Coerces a victim-count cell to a non-negative integer.
///
/// Fractional values are truncated (`"2.0"` and `"2,0"` are 2). Negative,
/// non-finite and non-numeric values are `None`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_count(value: &Value) -> Option<u64> {
    let float = match value {
        Value::Number(n) => {
            if let Some(count) = n.as_u64() {
                return Some(count);
            }
            n.as_f64()?
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(count) = trimmed.parse::<u64>() {
                return Some(count);
            }
            trimmed.replace(',', ".").parse::<f64>().ok()?
        }
        _ => return None,
    };

    (float.is_finite() && float >= 0.0).then(|| float.trunc() as u64)
}

#[allow(clippy::cast_possible_truncation)]
fn parse_year(value: &Value) -> Option<i32> {
    let year = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (1000..=9999).contains(&year).then_some(year as i32)
}

fn category_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
