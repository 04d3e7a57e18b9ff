#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Municipal boundaries, population lookup and map assembly.
//!
//! Loads the state's municipality polygons from a `GeoJSON` file, joins
//! victim aggregates and population onto them by normalized name, and
//! emits a WGS 84 `FeatureCollection` ready for choropleth rendering.

pub mod assemble;
pub mod boundaries;
pub mod population;
pub mod reproject;

use thiserror::Error;

/// Errors that can occur during geography operations.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Neither the primary nor the fallback boundary file exists.
    #[error("Map data unavailable: no boundary file at {primary} or {fallback}")]
    MapDataUnavailable {
        /// Primary path that was tried.
        primary: String,
        /// Fallback path that was tried.
        fallback: String,
    },

    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The boundary file has no recognizable name property.
    #[error("No municipality name property (tried {tried}) in {path}")]
    MissingNameProperty {
        /// Boundary file path.
        path: String,
        /// Comma-separated aliases that were tried.
        tried: String,
    },

    /// The boundary file declares a CRS that cannot be converted.
    #[error("Unsupported coordinate reference system: {0}")]
    UnsupportedCrs(String),

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
