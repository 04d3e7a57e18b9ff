//! Joins victim aggregates and population onto municipal boundaries.
//!
//! Every boundary feature is emitted, whether or not it matched anything:
//! missing counts become `0` and missing populations `1`. The boundaries
//! and aggregates are only borrowed.

use std::collections::BTreeMap;

use geojson::{Feature, FeatureCollection, JsonObject};
use serde_json::Value;
use violence_map_dataset_models::AggregateRow;
use violence_map_geography_models::{
    PROP_ASSAULT_TOTAL, PROP_DISPLAY_NAME, PROP_DISPLAY_VALUE, PROP_MUNICIPALITY_KEY,
    PROP_POPULATION, PROP_VIOLENCE_TOTAL,
};

use crate::GeoError;
use crate::boundaries::{Boundaries, MunicipalityBoundary};
use crate::population::PopulationTable;
use crate::reproject::geojson_to_wgs84;

/// Victim aggregates to join onto the map.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapAggregates<'a> {
    /// Domestic violence totals per municipality.
    pub violence: &'a [AggregateRow],
    /// Sexual violence totals per municipality.
    pub assault: &'a [AggregateRow],
}

/// Builds the output `FeatureCollection` in WGS 84.
///
/// # Errors
///
/// Returns [`GeoError`] if a geometry cannot be converted to WGS 84.
pub fn assemble(
    boundaries: &Boundaries,
    aggregates: MapAggregates<'_>,
    population: &PopulationTable,
) -> Result<FeatureCollection, GeoError> {
    let violence = index(aggregates.violence);
    let assault = index(aggregates.assault);

    let mut defaulted_population = 0usize;
    let mut features = Vec::with_capacity(boundaries.municipalities.len());

    for municipality in &boundaries.municipalities {
        let population = population.lookup(&municipality.key);
        if population.is_defaulted() {
            defaulted_population += 1;
        }

        let totals = FeatureTotals {
            violence: violence.get(municipality.key.as_str()).copied().unwrap_or(0),
            assault: assault.get(municipality.key.as_str()).copied().unwrap_or(0),
            population: *population.value(),
        };

        features.push(build_feature(municipality, &totals, boundaries)?);
    }

    if defaulted_population > 0 {
        log::info!(
            "{defaulted_population} of {} municipalities had no population entry; using 1",
            features.len()
        );
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// [`assemble`] followed by JSON serialization.
///
/// # Errors
///
/// Returns [`GeoError`] if assembly or serialization fails.
pub fn assemble_json(
    boundaries: &Boundaries,
    aggregates: MapAggregates<'_>,
    population: &PopulationTable,
) -> Result<String, GeoError> {
    let collection = assemble(boundaries, aggregates, population)?;
    Ok(serde_json::to_string(&collection)?)
}

struct FeatureTotals {
    violence: u64,
    assault: u64,
    population: u64,
}

fn index(rows: &[AggregateRow]) -> BTreeMap<&str, u64> {
    rows.iter()
        .map(|row| (row.municipality_key.as_str(), row.total_victims))
        .collect()
}

fn build_feature(
    municipality: &MunicipalityBoundary,
    totals: &FeatureTotals,
    boundaries: &Boundaries,
) -> Result<Feature, GeoError> {
    let source = &municipality.feature;

    let geometry = source
        .geometry
        .as_ref()
        .map(|g| geojson_to_wgs84(g, &boundaries.crs))
        .transpose()?;

    let mut properties: JsonObject = source.properties.clone().unwrap_or_default();
    properties.insert(
        PROP_MUNICIPALITY_KEY.to_string(),
        Value::String(municipality.key.clone()),
    );
    properties.insert(PROP_VIOLENCE_TOTAL.to_string(), Value::from(totals.violence));
    properties.insert(PROP_ASSAULT_TOTAL.to_string(), Value::from(totals.assault));
    properties.insert(PROP_POPULATION.to_string(), Value::from(totals.population));
    properties.insert(PROP_DISPLAY_VALUE.to_string(), Value::from(totals.violence));
    properties.insert(PROP_DISPLAY_NAME.to_string(), municipality.name.clone());

    Ok(Feature {
        bbox: None,
        geometry,
        id: source.id.clone(),
        properties: Some(properties),
        foreign_members: None,
    })
}
