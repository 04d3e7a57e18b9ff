//! Population-by-municipality lookup.
//!
//! The table is re-read on every query that needs it. The first column is
//! the municipality name and the second its population, whatever the
//! headers say. Every failure degrades to a population of 1 so per-capita
//! rates never divide by zero; the degradation is reported through
//! [`Fallback`].

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use violence_map_dataset::normalize::normalize_value;
use violence_map_dataset::reader::read_path;
use violence_map_dataset_models::Fallback;
use violence_map_geography_models::PopulationEntry;

/// Population used when a municipality has no usable entry.
pub const DEFAULT_POPULATION: u64 = 1;

/// Brazilian dotted thousands, e.g. `1.234.567`.
static DOTTED_THOUSANDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{1,3}(\.[0-9]{3})+$").expect("valid regex"));

/// Population keyed by normalized municipality name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationTable {
    entries: BTreeMap<String, u64>,
}

impl PopulationTable {
    /// Builds a table from entries. The first entry for a key wins.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = PopulationEntry>) -> Self {
        let mut map = BTreeMap::new();
        for entry in entries {
            map.entry(entry.municipality_key)
                .or_insert_with(|| entry.population.max(DEFAULT_POPULATION));
        }
        Self { entries: map }
    }

    /// Looks up the population for a normalized key, defaulting to
    /// [`DEFAULT_POPULATION`].
    #[must_use]
    pub fn lookup(&self, key: &str) -> Fallback<u64> {
        self.entries.get(key).map_or_else(
            || {
                Fallback::defaulted(
                    DEFAULT_POPULATION,
                    format!("population for {key} not found; using {DEFAULT_POPULATION}"),
                )
            },
            |population| Fallback::Found(*population),
        )
    }

    /// Number of municipalities in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads the population table from `path`.
///
/// A missing or unreadable file yields an empty table wrapped in
/// [`Fallback::Defaulted`], so every lookup then defaults. Rows whose
/// population does not parse are skipped and their lookups default too.
#[must_use]
pub fn load_population(path: &Path) -> Fallback<PopulationTable> {
    if !path.is_file() {
        log::warn!("Population table {} not found", path.display());
        return Fallback::defaulted(
            PopulationTable::default(),
            "population table not found; populations default to 1",
        );
    }

    let table = match read_path(path) {
        Ok(table) => table,
        Err(e) => {
            log::error!("Failed to read population table {}: {e}", path.display());
            return Fallback::defaulted(
                PopulationTable::default(),
                "population table unreadable; populations default to 1",
            );
        }
    };

    let [name_column, population_column, ..] = table.headers.as_slice() else {
        log::warn!(
            "Population table {} has fewer than two columns",
            path.display()
        );
        return Fallback::defaulted(
            PopulationTable::default(),
            "population table has fewer than two columns; populations default to 1",
        );
    };

    let entries = table.rows.iter().filter_map(|row| {
        let municipality_key = row.get(name_column).map(normalize_value)?;
        if municipality_key.is_empty() {
            return None;
        }
        let Some(population) = row.get(population_column).and_then(parse_population) else {
            log::debug!("Skipping unusable population for {municipality_key}");
            return None;
        };
        Some(PopulationEntry {
            municipality_key,
            population,
        })
    });

    let population = PopulationTable::from_entries(entries);
    log::debug!(
        "Loaded population for {} municipalities from {}",
        population.len(),
        path.display()
    );
    Fallback::Found(population)
}

/// Parses a population cell. Values below 1 are treated as missing.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_population(value: &Value) -> Option<u64> {
    let parsed = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => {
            let trimmed = s.trim();
            if DOTTED_THOUSANDS_RE.is_match(trimmed) {
                trimmed.replace('.', "").parse().ok()
            } else {
                trimmed.parse::<u64>().ok().or_else(|| {
                    trimmed
                        .replace(',', ".")
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && *f >= 0.0)
                        .map(|f| f as u64)
                })
            }
        }
        _ => None,
    };
    parsed.filter(|p| *p >= 1)
}
