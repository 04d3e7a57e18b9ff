#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Municipal boundary, population and coordinate reference types.

use serde::{Deserialize, Serialize};

/// Property holding the normalized municipality key on output features.
pub const PROP_MUNICIPALITY_KEY: &str = "municipality_key";
/// Property holding the domestic violence victim total.
pub const PROP_VIOLENCE_TOTAL: &str = "violence_total";
/// Property holding the sexual violence victim total.
pub const PROP_ASSAULT_TOTAL: &str = "assault_total";
/// Property holding the municipality population.
pub const PROP_POPULATION: &str = "population";
/// Property the map renderer colors by.
pub const PROP_DISPLAY_VALUE: &str = "display_value";
/// Property holding the municipality name as written in the boundary file.
pub const PROP_DISPLAY_NAME: &str = "display_name";

/// Numeric properties every output feature carries.
pub const NUMERIC_PROPERTIES: [&str; 4] = [
    PROP_VIOLENCE_TOTAL,
    PROP_ASSAULT_TOTAL,
    PROP_POPULATION,
    PROP_DISPLAY_VALUE,
];

/// Population of one municipality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationEntry {
    /// Normalized municipality name.
    pub municipality_key: String,
    /// Inhabitants, at least 1.
    pub population: u64,
}

/// Coordinate reference system declared by a boundary file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crs {
    /// WGS 84 geographic coordinates (EPSG:4326, OGC CRS84). Output CRS.
    Wgs84,
    /// SIRGAS 2000 geographic coordinates (EPSG:4674), the IBGE default.
    Sirgas2000,
    /// Spherical Web Mercator (EPSG:3857).
    WebMercator,
    /// Anything else, kept verbatim.
    Other(String),
}

impl Crs {
    /// Parses a GeoJSON `crs.properties.name` value such as
    /// `urn:ogc:def:crs:EPSG::4674` or `EPSG:3857`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        if upper.ends_with("CRS84") {
            return Self::Wgs84;
        }

        let code = upper.rsplit(':').next().unwrap_or_default();
        match code {
            "4326" => Self::Wgs84,
            "4674" => Self::Sirgas2000,
            "3857" | "900913" | "102100" => Self::WebMercator,
            _ => Self::Other(name.to_string()),
        }
    }

    /// Whether coordinates in this CRS can be emitted as WGS 84 unchanged.
    ///
    /// SIRGAS 2000 and WGS 84 differ by centimeters, well below map scale.
    #[must_use]
    pub const fn is_geographic_wgs84(&self) -> bool {
        matches!(self, Self::Wgs84 | Self::Sirgas2000)
    }
}
