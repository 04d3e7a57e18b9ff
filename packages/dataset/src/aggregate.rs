//! Year/month filtering and grouping of enriched records.
//!
//! All functions borrow the record slice; cached datasets are never
//! mutated or reordered by a query.

use std::collections::BTreeMap;

use violence_map_dataset_models::{
    AggregateRow, CategoryBreakdownEntry, EnrichedRecord, UNSPECIFIED_CATEGORY,
};

/// Selects records by period and, optionally, municipality.
///
/// `month == 0` selects the whole year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFilter<'a> {
    /// Calendar year to keep.
    pub year: i32,
    /// Month to keep, or `0` for the whole year.
    pub month: u32,
    /// Normalized municipality key to keep, if any.
    pub municipality_key: Option<&'a str>,
}

impl<'a> RecordFilter<'a> {
    /// Filter for every municipality in a period.
    #[must_use]
    pub const fn period(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            municipality_key: None,
        }
    }

    /// Restricts the filter to one normalized municipality key.
    #[must_use]
    pub const fn with_municipality(mut self, key: &'a str) -> Self {
        self.municipality_key = Some(key);
        self
    }

    /// Whether `record` passes the filter.
    #[must_use]
    pub fn matches(&self, record: &EnrichedRecord) -> bool {
        record.year == self.year
            && (self.month == 0 || record.month == self.month)
            && self
                .municipality_key
                .is_none_or(|key| record.municipality_key == key)
    }

    fn select<'r>(self, records: &'r [EnrichedRecord]) -> impl Iterator<Item = &'r EnrichedRecord>
    where
        'a: 'r,
    {
        records.iter().filter(move |record| self.matches(record))
    }
}

/// Sums victims per municipality for `year`/`month`.
///
/// Rows come back sorted by municipality key. An empty result is not an
/// error. Sums saturate at `u64::MAX`.
#[must_use]
pub fn aggregate(records: &[EnrichedRecord], year: i32, month: u32) -> Vec<AggregateRow> {
    let filter = RecordFilter::period(year, month);
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for record in filter.select(records) {
        let total = totals.entry(record.municipality_key.as_str()).or_default();
        *total = total.saturating_add(record.victim_count);
    }

    totals
        .into_iter()
        .map(|(key, total_victims)| AggregateRow {
            municipality_key: key.to_string(),
            total_victims,
        })
        .collect()
}

/// Sums victims over every record passing `filter`.
#[must_use]
pub fn total(records: &[EnrichedRecord], filter: &RecordFilter<'_>) -> u64 {
    filter
        .select(records)
        .fold(0u64, |sum, r| sum.saturating_add(r.victim_count))
}

/// Groups the filtered records by category, largest first.
///
/// Records without a category are counted under
/// [`UNSPECIFIED_CATEGORY`]. Percentages are apportioned in tenths with the
/// largest-remainder method, so each is within 0.1 of its exact share and
/// together they add up to exactly 100.0. Returns an empty list when the
/// filtered total is zero.
#[must_use]
pub fn breakdown(
    records: &[EnrichedRecord],
    filter: &RecordFilter<'_>,
) -> Vec<CategoryBreakdownEntry> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for record in filter.select(records) {
        let label = record.category.as_deref().unwrap_or(UNSPECIFIED_CATEGORY);
        let count = counts.entry(label).or_default();
        *count = count.saturating_add(record.victim_count);
    }

    let grand_total = counts.values().fold(0u64, |sum, c| sum.saturating_add(*c));
    if grand_total == 0 {
        return Vec::new();
    }

    let mut entries: Vec<(&str, u64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let tenths = apportion_tenths(&entries);

    entries
        .into_iter()
        .zip(tenths)
        .map(|((category, count), tenths)| CategoryBreakdownEntry {
            category: category.to_string(),
            count,
            percentage: tenths_to_percentage(tenths),
        })
        .collect()
}

/// Splits 1000 tenths of a percent across `entries` proportionally to their
/// counts.
fn apportion_tenths(entries: &[(&str, u64)]) -> Vec<u64> {
    let grand_total: u128 = entries.iter().map(|(_, count)| u128::from(*count)).sum();
    let mut tenths = Vec::with_capacity(entries.len());
    let mut remainders = Vec::with_capacity(entries.len());

    for (i, (_, count)) in entries.iter().enumerate() {
        let scaled = u128::from(*count) * 1000;
        #[allow(clippy::cast_possible_truncation)]
        let share = (scaled / grand_total) as u64;
        tenths.push(share);
        remainders.push((scaled % grand_total, i));
    }

    let assigned: u64 = tenths.iter().sum();
    let leftover = usize::try_from(1000 - assigned).unwrap_or(0);

    remainders.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    for (_, i) in remainders.into_iter().take(leftover) {
        tenths[i] += 1;
    }

    tenths
}

#[allow(clippy::cast_precision_loss)]
fn tenths_to_percentage(tenths: u64) -> f64 {
    tenths as f64 / 10.0
}
