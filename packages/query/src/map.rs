//! Choropleth map query.

use violence_map_dataset_models::DatasetKind;
use violence_map_geography::assemble::{MapAggregates, assemble_json};
use violence_map_geography::boundaries::load_boundaries;
use violence_map_geography::population::load_population;
use violence_map_query_models::Period;

use crate::{QueryError, ViolenceMapService};

impl ViolenceMapService {
    /// Returns the municipal `GeoJSON` `FeatureCollection` for `period`,
    /// annotated with victim totals and population.
    ///
    /// The boundary file is resolved before any dataset is touched, so a
    /// missing map fails fast with no partial output.
    ///
    /// # Errors
    ///
    /// * [`QueryError::NotFound`] if no boundary file exists
    /// * [`QueryError::Internal`] if the boundary file cannot be parsed or
    ///   reprojected
    pub fn get_map(&self, period: Period) -> Result<String, QueryError> {
        let boundaries = load_boundaries(
            &self.layout.boundary_paths(),
            &self.layout.boundary_name_properties,
        )?;

        let violence = self.aggregate(DatasetKind::Violence, period);
        let assault = self.aggregate(DatasetKind::Assault, period);

        let population = load_population(&self.layout.population_path());
        if let Some(reason) = population.reason() {
            log::warn!("Map for {period}: {reason}");
        }

        let json = assemble_json(
            &boundaries,
            MapAggregates {
                violence: &violence,
                assault: &assault,
            },
            population.value(),
        )?;

        log::info!(
            "Built map for {period}: {} municipalities, {} with domestic violence, {} with sexual violence",
            boundaries.municipalities.len(),
            violence.len(),
            assault.len()
        );

        Ok(json)
    }
}
