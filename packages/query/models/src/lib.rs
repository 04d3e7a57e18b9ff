#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query inputs and outputs for the violence map.
//!
//! [`Period`] is the validated `(year, month)` pair every query takes;
//! [`MunicipalitySummary`] and [`Comparison`] are the JSON shapes returned
//! by the municipality endpoints.

use serde::{Deserialize, Serialize};
use violence_map_dataset_models::CategoryBreakdownEntry;

/// A validated query period. `month == 0` selects the whole year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Smallest accepted year.
    pub const MIN_YEAR: i32 = 1000;
    /// Largest accepted year.
    pub const MAX_YEAR: i32 = 9999;

    /// Creates a period.
    ///
    /// # Errors
    ///
    /// Returns an error if `year` is not a four-digit year or `month` is
    /// outside `0..=12`.
    pub const fn new(year: i32, month: u32) -> Result<Self, InvalidPeriodError> {
        if year < Self::MIN_YEAR || year > Self::MAX_YEAR {
            return Err(InvalidPeriodError::Year(year));
        }
        if month > 12 {
            return Err(InvalidPeriodError::Month(month));
        }
        Ok(Self { year, month })
    }

    /// Parses a period from path segments such as `"2024"` and `"3"`.
    ///
    /// # Errors
    ///
    /// Returns an error if either segment is not an integer or the values
    /// are out of range.
    pub fn parse(year: &str, month: &str) -> Result<Self, InvalidPeriodError> {
        let year: i32 = year
            .trim()
            .parse()
            .map_err(|_| InvalidPeriodError::NotANumber(year.to_string()))?;
        let month: i64 = month
            .trim()
            .parse()
            .map_err(|_| InvalidPeriodError::NotANumber(month.to_string()))?;
        let month = u32::try_from(month).map_err(|_| InvalidPeriodError::NegativeMonth(month))?;
        Self::new(year, month)
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Month in `1..=12`, or `0` for the whole year.
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Whether the period covers the whole year.
    #[must_use]
    pub const fn is_whole_year(&self) -> bool {
        self.month == 0
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_whole_year() {
            write!(f, "{}", self.year)
        } else {
            write!(f, "{}-{:02}", self.year, self.month)
        }
    }
}

/// Error returned when a year/month pair is not a valid [`Period`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidPeriodError {
    /// A segment could not be parsed as an integer.
    NotANumber(String),
    /// The year is not a four-digit calendar year.
    Year(i32),
    /// The month is above 12.
    Month(u32),
    /// The month is negative.
    NegativeMonth(i64),
}

impl std::fmt::Display for InvalidPeriodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotANumber(value) => write!(f, "'{value}' is not an integer"),
            Self::Year(year) => write!(f, "invalid year {year}: expected a four-digit year"),
            Self::Month(month) => write!(f, "invalid month {month}: expected 0-12"),
            Self::NegativeMonth(month) => write!(f, "invalid month {month}: expected 0-12"),
        }
    }
}

impl std::error::Error for InvalidPeriodError {}

/// One side of a comparison: a municipality over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Municipality name as typed by the user.
    pub municipality: String,
    /// Calendar year.
    pub year: i32,
    /// Month, or `0` for the whole year.
    pub month: u32,
}

/// Totals, per-capita rates and category breakdowns for one municipality
/// over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalitySummary {
    /// Municipality name as requested.
    pub municipality: String,
    /// Calendar year.
    pub year: i32,
    /// Month, or `0` for the whole year.
    pub month: u32,
    /// Population used for the rates (1 when unknown).
    pub population: u64,
    /// Domestic violence victims.
    pub violence_total: u64,
    /// Sexual violence victims.
    pub assault_total: u64,
    /// Domestic violence victims per 100,000 inhabitants.
    pub violence_rate: f64,
    /// Sexual violence victims per 100,000 inhabitants.
    pub assault_rate: f64,
    /// Domestic violence victims by offense category.
    pub violence_categories: Vec<CategoryBreakdownEntry>,
    /// Sexual violence victims by offense category.
    pub assault_categories: Vec<CategoryBreakdownEntry>,
    /// Defaults applied while building the summary.
    pub fallbacks: Vec<String>,
}

/// Two summaries side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    /// Summary for the first scenario.
    pub scenario_a: MunicipalitySummary,
    /// Summary for the second scenario.
    pub scenario_b: MunicipalitySummary,
}
