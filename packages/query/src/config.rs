//! Input file layout.
//!
//! The defaults are embedded from `config/layout.toml`. At startup the
//! data directory comes from `DATA_DIR` and an optional TOML overrides
//! file from `VIOLENCE_MAP_CONFIG`; any key left out of the overrides
//! keeps its default.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use violence_map_dataset::cache::DatasetSource;
use violence_map_geography::boundaries::BoundaryPaths;

/// Embedded default layout.
const DEFAULT_LAYOUT_TOML: &str = include_str!("../config/layout.toml");

/// Environment variable holding the data directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable holding the path of a TOML overrides file.
pub const CONFIG_PATH_ENV: &str = "VIOLENCE_MAP_CONFIG";

/// Data directory used when `DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Errors that can occur while loading the layout.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The overrides file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// Overrides file path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The overrides file is not valid TOML for a layout.
    #[error("Invalid config file {path}: {source}")]
    Parse {
        /// Overrides file path.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}

/// Boundary file locations, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoundaryFiles {
    /// Path tried first.
    pub primary: PathBuf,
    /// Path tried when the primary is absent.
    pub fallback: PathBuf,
}

/// Where every input lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataLayout {
    /// Root directory all other paths are relative to.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Logical filename of the domestic violence spreadsheet.
    pub violence_spreadsheet: String,
    /// Logical filename of the sexual violence spreadsheet.
    pub assault_spreadsheet: String,
    /// Population table.
    pub population: PathBuf,
    /// Name properties tried on the boundary features, in order.
    pub boundary_name_properties: Vec<String>,
    /// Municipal boundary file.
    pub boundaries: BoundaryFiles,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

impl Default for DataLayout {
    /// # Panics
    ///
    /// Panics if the embedded layout fails to parse, which a unit test
    /// rules out.
    fn default() -> Self {
        toml::de::from_str(DEFAULT_LAYOUT_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded layout: {e}"))
    }
}

impl DataLayout {
    /// Default layout rooted at `data_dir`.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Builds the layout from `VIOLENCE_MAP_CONFIG` and `DATA_DIR`.
    ///
    /// `DATA_DIR` takes precedence over a `data_dir` set in the overrides
    /// file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the overrides file is set but cannot be
    /// read or parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut layout = Self::default();

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            log::info!("Loading layout overrides from {path}");
            layout.apply(LayoutOverrides::load(Path::new(&path))?);
        }

        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            layout.data_dir = PathBuf::from(dir);
        }

        Ok(layout)
    }

    /// Replaces every field the overrides set.
    pub fn apply(&mut self, overrides: LayoutOverrides) {
        if let Some(data_dir) = overrides.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(name) = overrides.violence_spreadsheet {
            self.violence_spreadsheet = name;
        }
        if let Some(name) = overrides.assault_spreadsheet {
            self.assault_spreadsheet = name;
        }
        if let Some(population) = overrides.population {
            self.population = population;
        }
        if let Some(properties) = overrides.boundary_name_properties {
            self.boundary_name_properties = properties;
        }
        if let Some(boundaries) = overrides.boundaries {
            if let Some(primary) = boundaries.primary {
                self.boundaries.primary = primary;
            }
            if let Some(fallback) = boundaries.fallback {
                self.boundaries.fallback = fallback;
            }
        }
    }

    /// Source of the domestic violence dataset.
    #[must_use]
    pub fn violence_source(&self) -> DatasetSource {
        DatasetSource {
            dir: self.data_dir.clone(),
            filename: self.violence_spreadsheet.clone(),
        }
    }

    /// Source of the sexual violence dataset.
    #[must_use]
    pub fn assault_source(&self) -> DatasetSource {
        DatasetSource {
            dir: self.data_dir.clone(),
            filename: self.assault_spreadsheet.clone(),
        }
    }

    /// Absolute boundary paths.
    #[must_use]
    pub fn boundary_paths(&self) -> BoundaryPaths {
        BoundaryPaths {
            primary: self.data_dir.join(&self.boundaries.primary),
            fallback: self.data_dir.join(&self.boundaries.fallback),
        }
    }

    /// Absolute population table path.
    #[must_use]
    pub fn population_path(&self) -> PathBuf {
        self.data_dir.join(&self.population)
    }
}

/// Partial boundary locations for an overrides file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundaryOverrides {
    /// Replacement primary path.
    pub primary: Option<PathBuf>,
    /// Replacement fallback path.
    pub fallback: Option<PathBuf>,
}

/// Contents of an overrides file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutOverrides {
    /// Replacement data directory.
    pub data_dir: Option<PathBuf>,
    /// Replacement domestic violence spreadsheet name.
    pub violence_spreadsheet: Option<String>,
    /// Replacement sexual violence spreadsheet name.
    pub assault_spreadsheet: Option<String>,
    /// Replacement population table.
    pub population: Option<PathBuf>,
    /// Replacement boundary name properties.
    pub boundary_name_properties: Option<Vec<String>>,
    /// Replacement boundary paths.
    pub boundaries: Option<BoundaryOverrides>,
}

impl LayoutOverrides {
    /// Reads an overrides file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::de::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use violence_map_geography::boundaries::DEFAULT_NAME_PROPERTIES;

    use super::*;

    #[test]
    fn embedded_layout_parses() {
        let layout = DataLayout::default();
        assert_eq!(layout.data_dir, PathBuf::from("data"));
        assert_eq!(
            layout.violence_spreadsheet,
            "MICRODADOS_DE_VIOLÊNCIA_DOMÉSTICA_JAN_2015_A_NOV_2025.xlsx"
        );
        assert_eq!(
            layout.boundary_name_properties,
            DEFAULT_NAME_PROPERTIES
                .iter()
                .map(|s| (*s).to_string())
                .collect::<Vec<_>>()
        );
        assert_eq!(
            layout.population_path(),
            Path::new("data").join("csv/populacao_pe.csv")
        );
    }

    #[test]
    fn overrides_replace_only_given_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.toml");
        std::fs::write(
            &path,
            "assault_spreadsheet = \"estupro.csv\"\n[boundaries]\nprimary = \"pe.geojson\"\n",
        )
        .unwrap();

        let mut layout = DataLayout::with_data_dir("/srv/pe");
        layout.apply(LayoutOverrides::load(&path).unwrap());

        assert_eq!(layout.assault_spreadsheet, "estupro.csv");
        assert_eq!(
            layout.violence_source().filename,
            DataLayout::default().violence_spreadsheet
        );
        let paths = layout.boundary_paths();
        assert_eq!(paths.primary, PathBuf::from("/srv/pe/pe.geojson"));
        assert_eq!(
            paths.fallback,
            PathBuf::from("/srv/pe/shapefile/PE_Municipios_2024.geojson")
        );
    }

    #[test]
    fn unknown_override_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.toml");
        std::fs::write(&path, "shapefile = \"x.shp\"\n").unwrap();

        assert!(matches!(
            LayoutOverrides::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
