#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Victim spreadsheet ingestion and aggregation.
//!
//! The pipeline reads a spreadsheet ([`reader`]), locates its columns by
//! alias ([`columns`]), derives normalized records ([`enrich`]), and keeps
//! them in a process-wide [`cache::DatasetCache`]. Queries filter and group
//! the cached records with [`aggregate`] without copying or mutating them.

pub mod aggregate;
pub mod cache;
pub mod columns;
pub mod enrich;
pub mod normalize;
pub mod reader;

use std::path::{Path, PathBuf};

use violence_map_dataset_models::{
    CategoryBreakdownEntry, DatasetKind, EnrichedRecord, Fallback,
};

use crate::aggregate::RecordFilter;
use crate::enrich::{ResolvedColumns, enrich};
use crate::reader::read_table;

/// Errors that can occur while loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// I/O error reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook parsing failed.
    #[error("XLSX error: {0}")]
    Xlsx(#[from] calamine::Error),

    /// The file is not valid UTF-8.
    #[error("Unsupported encoding in {path}: {message}")]
    Encoding {
        /// File that failed to decode.
        path: String,
        /// Decoder message.
        message: String,
    },

    /// The workbook has no sheets.
    #[error("Workbook has no sheets: {path}")]
    EmptyWorkbook {
        /// Workbook path.
        path: String,
    },

    /// The file extension is not a tabular format.
    #[error("Unsupported file format: {path}")]
    UnsupportedFormat {
        /// Offending path.
        path: String,
    },
}

/// An enriched victim dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Which source this is.
    pub kind: DatasetKind,
    /// File the records were read from.
    pub path: PathBuf,
    /// Columns resolved from the file's headers.
    pub columns: ResolvedColumns,
    /// Enriched records.
    pub records: Vec<EnrichedRecord>,
}

impl Dataset {
    /// Category breakdown for the records passing `filter`.
    ///
    /// Falls back to an empty list when the source has no category column.
    #[must_use]
    pub fn breakdown(&self, filter: &RecordFilter<'_>) -> Fallback<Vec<CategoryBreakdownEntry>> {
        if self.columns.category.is_none() {
            return Fallback::defaulted(
                Vec::new(),
                format!("{} category column not found", self.kind),
            );
        }
        Fallback::Found(aggregate::breakdown(&self.records, filter))
    }

    /// Victim total for the records passing `filter`.
    #[must_use]
    pub fn total(&self, filter: &RecordFilter<'_>) -> u64 {
        aggregate::total(&self.records, filter)
    }
}

/// Reads and enriches `filename` from `dir`.
///
/// Returns `Ok(None)` when the file (and its alternate extension) is absent.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file exists but cannot be parsed.
pub fn load_dataset(
    dir: &Path,
    filename: &str,
    kind: DatasetKind,
) -> Result<Option<Dataset>, DatasetError> {
    let Some(table) = read_table(dir, filename)? else {
        return Ok(None);
    };

    let enriched = enrich(&table);
    log::info!(
        "Loaded {kind} dataset from {}: {} rows -> {} records (municipality={:?}, date={:?}, victims={:?}, category={:?})",
        table.path.display(),
        table.rows.len(),
        enriched.records.len(),
        enriched.columns.municipality,
        enriched.columns.fact_date,
        enriched.columns.victim_count,
        enriched.columns.category,
    );

    Ok(Some(Dataset {
        kind,
        path: table.path,
        columns: enriched.columns,
        records: enriched.records,
    }))
}
