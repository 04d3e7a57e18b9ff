//! Municipal boundary loading.
//!
//! The boundary file is the one input with no safe default: without it
//! there is no map, so absence is reported as
//! [`GeoError::MapDataUnavailable`].

use std::path::{Path, PathBuf};

use geojson::{Feature, GeoJson, JsonObject};
use violence_map_dataset::normalize::normalize_value;
use violence_map_geography_models::Crs;

use crate::GeoError;

/// Name properties used by IBGE municipal meshes over the years, in
/// priority order. `NM_MUN` comes first, so a mesh that carries it next to
/// a legacy column such as `NOME` is labelled from `NM_MUN`.
pub const DEFAULT_NAME_PROPERTIES: &[&str] = &["NM_MUN", "NM_MUNICIP", "NM_MUN_2022", "NOME"];

/// Where to look for the boundary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryPaths {
    /// Path tried first.
    pub primary: PathBuf,
    /// Path tried when the primary is absent.
    pub fallback: PathBuf,
}

impl BoundaryPaths {
    /// Returns the first existing path.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::MapDataUnavailable`] if neither file exists.
    pub fn resolve(&self) -> Result<&Path, GeoError> {
        if self.primary.is_file() {
            return Ok(&self.primary);
        }
        if self.fallback.is_file() {
            log::info!(
                "Boundary file {} not found, using {}",
                self.primary.display(),
                self.fallback.display()
            );
            return Ok(&self.fallback);
        }
        Err(GeoError::MapDataUnavailable {
            primary: self.primary.display().to_string(),
            fallback: self.fallback.display().to_string(),
        })
    }
}

/// One municipality polygon with its join key.
#[derive(Debug, Clone)]
pub struct MunicipalityBoundary {
    /// Normalized name used to join aggregates and population.
    pub key: String,
    /// Name value as written in the boundary file.
    pub name: serde_json::Value,
    /// Source feature, geometry and properties untouched.
    pub feature: Feature,
}

/// A loaded boundary file.
#[derive(Debug, Clone)]
pub struct Boundaries {
    /// File the boundaries were read from.
    pub path: PathBuf,
    /// Property the municipality names were taken from.
    pub name_property: String,
    /// CRS declared by the file (WGS 84 when undeclared).
    pub crs: Crs,
    /// One entry per source feature, in file order.
    pub municipalities: Vec<MunicipalityBoundary>,
}

/// Loads the boundary file from `paths`, resolving the name property from
/// `name_properties`.
///
/// # Errors
///
/// Returns [`GeoError`] if no file exists, the file is not a `GeoJSON`
/// `FeatureCollection`, or none of the name properties is present.
pub fn load_boundaries(
    paths: &BoundaryPaths,
    name_properties: &[String],
) -> Result<Boundaries, GeoError> {
    let path = paths.resolve()?;
    let text = std::fs::read_to_string(path)?;
    let geojson: GeoJson = text.parse()?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(GeoError::Conversion {
            message: format!("{} is not a FeatureCollection", path.display()),
        });
    };

    let crs = declared_crs(collection.foreign_members.as_ref());
    let name_property = resolve_name_property(&collection.features, name_properties)
        .ok_or_else(|| GeoError::MissingNameProperty {
            path: path.display().to_string(),
            tried: name_properties.join(", "),
        })?;

    let municipalities: Vec<MunicipalityBoundary> = collection
        .features
        .into_iter()
        .map(|feature| {
            let name = feature
                .property(&name_property)
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            MunicipalityBoundary {
                key: normalize_value(&name),
                name,
                feature,
            }
        })
        .collect();

    log::info!(
        "Loaded {} municipality boundaries from {} (name property {name_property}, crs {crs:?})",
        municipalities.len(),
        path.display()
    );

    Ok(Boundaries {
        path: path.to_path_buf(),
        name_property,
        crs,
        municipalities,
    })
}

/// Picks the first alias, in list order, present on any feature. Later
/// aliases never override an earlier one that is present. An empty
/// collection resolves to the first alias.
fn resolve_name_property(features: &[Feature], aliases: &[String]) -> Option<String> {
    if features.is_empty() {
        return aliases.first().cloned();
    }
    aliases
        .iter()
        .find(|alias| features.iter().any(|f| f.contains_property(alias)))
        .cloned()
}

/// Reads the legacy `crs` member (`{"type": "name", "properties": {"name": ...}}`).
fn declared_crs(foreign_members: Option<&JsonObject>) -> Crs {
    foreign_members
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.pointer("/properties/name"))
        .and_then(serde_json::Value::as_str)
        .map_or(Crs::Wgs84, Crs::from_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Vec<String> {
        DEFAULT_NAME_PROPERTIES.iter().map(|s| (*s).to_string()).collect()
    }

    fn paths(dir: &Path) -> BoundaryPaths {
        BoundaryPaths {
            primary: dir.join("municipios_2024").join("PE.geojson"),
            fallback: dir.join("PE.geojson"),
        }
    }

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::4674"}},
        "features": [
            {"type": "Feature", "properties": {"CD_MUN": "2611606", "NM_MUNICIP": "Recife"},
             "geometry": {"type": "Polygon", "coordinates": [[[-35.0, -8.0], [-34.9, -8.0], [-34.9, -8.1], [-35.0, -8.0]]]}},
            {"type": "Feature", "properties": {"CD_MUN": "2604106", "NM_MUNICIP": "Caruaru"},
             "geometry": {"type": "Polygon", "coordinates": [[[-36.0, -8.2], [-35.9, -8.2], [-35.9, -8.3], [-36.0, -8.2]]]}}
        ]
    }"#;

    #[test]
    fn falls_back_to_secondary_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("PE.geojson"), SAMPLE).unwrap();

        let boundaries = load_boundaries(&paths(dir.path()), &defaults()).unwrap();
        assert_eq!(boundaries.path, dir.path().join("PE.geojson"));
        assert_eq!(boundaries.name_property, "NM_MUNICIP");
        assert_eq!(boundaries.crs, Crs::Sirgas2000);
        assert_eq!(boundaries.municipalities.len(), 2);
        assert_eq!(boundaries.municipalities[0].key, "RECIFE");
        assert_eq!(boundaries.municipalities[1].name, "Caruaru");
    }

    #[test]
    fn earlier_alias_wins_when_several_are_present() {
        let features: Vec<Feature> = [
            serde_json::json!({"NM_MUN": "Recife", "NOME": "RECIFE (PE)"}),
            serde_json::json!({"NOME": "Olinda"}),
        ]
        .into_iter()
        .map(|properties| Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: properties.as_object().cloned(),
            foreign_members: None,
        })
        .collect();

        assert_eq!(
            resolve_name_property(&features, &defaults()).as_deref(),
            Some("NM_MUN")
        );
        assert_eq!(
            resolve_name_property(&features, &["NOME".to_string(), "NM_MUN".to_string()])
                .as_deref(),
            Some("NOME")
        );
        assert_eq!(
            resolve_name_property(&[], &defaults()).as_deref(),
            Some("NM_MUN")
        );
    }

    #[test]
    fn missing_file_is_map_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_boundaries(&paths(dir.path()), &defaults()).unwrap_err();
        assert!(matches!(err, GeoError::MapDataUnavailable { .. }));
    }

    #[test]
    fn unknown_name_property_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("PE.geojson"), SAMPLE).unwrap();

        let err = load_boundaries(&paths(dir.path()), &["NAME".to_string()]).unwrap_err();
        assert!(matches!(err, GeoError::MissingNameProperty { .. }));
    }

    #[test]
    fn undeclared_crs_is_wgs84() {
        assert_eq!(declared_crs(None), Crs::Wgs84);
    }
}
