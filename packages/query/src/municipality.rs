//! Single-municipality summaries and side-by-side comparisons.
//!
//! These never touch the boundary file. A municipality with no matching
//! records is not an error: its totals are 0 and its rates 0.0.

use violence_map_dataset::aggregate::RecordFilter;
use violence_map_dataset::cache::CachedDataset;
use violence_map_dataset::normalize::normalize_name;
use violence_map_dataset_models::{CategoryBreakdownEntry, DatasetKind};
use violence_map_geography::population::load_population;
use violence_map_query_models::{Comparison, MunicipalitySummary, Period, Scenario};

use crate::{QueryError, ViolenceMapService};

/// Rates are expressed per this many inhabitants.
pub const RATE_BASE: f64 = 100_000.0;

/// Victims per [`RATE_BASE`] inhabitants, rounded to two decimals.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn per_capita_rate(total: u64, population: u64) -> f64 {
    let rate = total as f64 / population.max(1) as f64 * RATE_BASE;
    (rate * 100.0).round() / 100.0
}

struct DatasetSummary {
    total: u64,
    categories: Vec<CategoryBreakdownEntry>,
}

fn summarize(
    kind: DatasetKind,
    cached: &CachedDataset,
    filter: &RecordFilter<'_>,
    fallbacks: &mut Vec<String>,
) -> DatasetSummary {
    let Some(dataset) = cached.dataset() else {
        let reason = cached.unavailable_reason().unwrap_or_default();
        fallbacks.push(format!("{kind} dataset unavailable ({reason}); totals default to 0"));
        return DatasetSummary {
            total: 0,
            categories: Vec::new(),
        };
    };

    let breakdown = dataset.breakdown(filter);
    if let Some(reason) = breakdown.reason() {
        fallbacks.push(reason.to_string());
    }

    DatasetSummary {
        total: dataset.total(filter),
        categories: breakdown.into_value(),
    }
}

impl ViolenceMapService {
    /// Totals, per-capita rates and category breakdowns for one
    /// municipality over `period`.
    ///
    /// `name` is matched after normalization, so `"caruaru"` and
    /// `"CARUARU "` find the same records. The returned summary echoes
    /// `name` as given.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if `name` normalizes to an
    /// empty string.
    pub fn get_municipality(
        &self,
        name: &str,
        period: Period,
    ) -> Result<MunicipalitySummary, QueryError> {
        let key = normalize_name(name);
        if key.is_empty() {
            return Err(QueryError::invalid_argument("municipality name is empty"));
        }

        let filter = RecordFilter::period(period.year(), period.month()).with_municipality(&key);
        let mut fallbacks = Vec::new();

        let violence = summarize(
            DatasetKind::Violence,
            self.cache.violence(),
            &filter,
            &mut fallbacks,
        );
        let assault = summarize(
            DatasetKind::Assault,
            self.cache.assault(),
            &filter,
            &mut fallbacks,
        );

        let table = load_population(&self.layout.population_path());
        let population = table.value().lookup(&key);
        match (table.reason(), population.reason()) {
            (Some(reason), _) | (None, Some(reason)) => fallbacks.push(reason.to_string()),
            (None, None) => {}
        }
        let population = population.into_value();

        for reason in &fallbacks {
            log::warn!("Summary for {key} {period}: {reason}");
        }

        Ok(MunicipalitySummary {
            municipality: name.to_string(),
            year: period.year(),
            month: period.month(),
            population,
            violence_total: violence.total,
            assault_total: assault.total,
            violence_rate: per_capita_rate(violence.total, population),
            assault_rate: per_capita_rate(assault.total, population),
            violence_categories: violence.categories,
            assault_categories: assault.categories,
            fallbacks,
        })
    }

    /// Summaries for two scenarios.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if either scenario has an
    /// invalid period or an empty municipality name.
    pub fn compare(
        &self,
        scenario_a: &Scenario,
        scenario_b: &Scenario,
    ) -> Result<Comparison, QueryError> {
        Ok(Comparison {
            scenario_a: self.scenario(scenario_a)?,
            scenario_b: self.scenario(scenario_b)?,
        })
    }

    fn scenario(&self, scenario: &Scenario) -> Result<MunicipalitySummary, QueryError> {
        let period = Period::new(scenario.year, scenario.month)?;
        self.get_municipality(&scenario.municipality, period)
    }
}
