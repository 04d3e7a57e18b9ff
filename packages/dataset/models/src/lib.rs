#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Victim-record types shared by the ingestion and aggregation pipeline.
//!
//! Raw spreadsheet rows are short-lived; everything downstream of the
//! enricher works with [`EnrichedRecord`] values and the aggregate shapes
//! derived from them.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Municipality key assigned to rows whose source has no municipality column.
pub const UNKNOWN_MUNICIPALITY: &str = "UNKNOWN";

/// Category label for records without a category value.
pub const UNSPECIFIED_CATEGORY: &str = "NÃO INFORMADO";

/// The two victim-record sources served by the map.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DatasetKind {
    /// Domestic violence victim records.
    Violence,
    /// Sexual violence (rape) victim records.
    Assault,
}

/// A source row reduced to the fields the aggregation pipeline needs.
///
/// `year` is `0` or a four-digit year, `month` is `0` or in `1..=12`. A
/// zero means the row's date could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRecord {
    /// Normalized municipality name used as the join key.
    pub municipality_key: String,
    /// Calendar year of the fact, `0` if unknown.
    pub year: i32,
    /// Month of the fact, `0` if unknown.
    pub month: u32,
    /// Number of victims represented by this row.
    pub victim_count: u64,
    /// Free-text offense nature, when the source has one.
    pub category: Option<String>,
}

/// Summed victim count for one municipality under a year/month filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRow {
    /// Normalized municipality name.
    pub municipality_key: String,
    /// Sum of `victim_count` over the matching records.
    pub total_victims: u64,
}

/// One category's share of a filtered record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdownEntry {
    /// Category label as found in the source (trimmed).
    pub category: String,
    /// Victim total for this category.
    pub count: u64,
    /// Share of the filtered total, rounded to one decimal.
    pub percentage: f64,
}

/// Result of a step that falls back to a documented default on failure.
///
/// Callers that only need the value use [`Fallback::value`]; callers that
/// report degraded results inspect [`Fallback::reason`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback<T> {
    /// The value was resolved from source data.
    Found(T),
    /// The default was applied.
    Defaulted {
        /// The default value.
        value: T,
        /// Why the default was needed.
        reason: String,
    },
}

impl<T> Fallback<T> {
    /// Wraps a default value together with the reason it was applied.
    pub fn defaulted(value: T, reason: impl Into<String>) -> Self {
        Self::Defaulted {
            value,
            reason: reason.into(),
        }
    }

    /// Returns a reference to the wrapped value.
    #[must_use]
    pub const fn value(&self) -> &T {
        match self {
            Self::Found(value) | Self::Defaulted { value, .. } => value,
        }
    }

    /// Consumes the fallback and returns the wrapped value.
    pub fn into_value(self) -> T {
        match self {
            Self::Found(value) | Self::Defaulted { value, .. } => value,
        }
    }

    /// Returns the reason the default was applied, if it was.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Found(_) => None,
            Self::Defaulted { reason, .. } => Some(reason),
        }
    }

    /// Whether the default was applied.
    #[must_use]
    pub const fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator as _;

    #[test]
    fn dataset_kind_round_trips_through_strings() {
        for kind in DatasetKind::iter() {
            let parsed: DatasetKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert_eq!(DatasetKind::Assault.as_ref(), "assault");
    }

    #[test]
    fn fallback_exposes_value_and_reason() {
        let found = Fallback::Found(3);
        assert_eq!(*found.value(), 3);
        assert!(found.reason().is_none());

        let defaulted = Fallback::defaulted(1, "population missing");
        assert!(defaulted.is_defaulted());
        assert_eq!(defaulted.reason(), Some("population missing"));
        assert_eq!(defaulted.into_value(), 1);
    }
}
