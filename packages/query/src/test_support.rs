//! On-disk data directories for query tests.

use std::path::Path;

use tempfile::TempDir;

use crate::{DataLayout, ViolenceMapService};

const VIOLENCE_CSV: &str = "\
MUNICÍPIO DO FATO,DATA DO FATO,TOTAL DE VÍTIMAS,NATUREZA
Recife,15/03/2024,2,AMEAÇA
RECIFE,20/03/2024,1,LESÃO CORPORAL
Caruaru,02/03/2024,10,AMEAÇA
Caruaru,10/06/2024,10,AMEAÇA
Caruaru,28/11/2024,10,LESÃO CORPORAL
Caruaru,05/01/2023,7,AMEAÇA
";

const ASSAULT_CSV: &str = "\
MUNICIPIO;DATA
Recife;01/03/2024
Caruaru;15/08/2024
";

const POPULATION_CSV: &str = "\
Município,População
Caruaru,300000
";

const BOUNDARIES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type": "Feature", "properties": {"CD_MUN": "2611606", "NM_MUN": "Recife"},
         "geometry": {"type": "Polygon", "coordinates": [[[-35.0, -8.0], [-34.9, -8.0], [-34.9, -8.1], [-35.0, -8.0]]]}},
        {"type": "Feature", "properties": {"CD_MUN": "2604106", "NM_MUN": "Caruaru"},
         "geometry": {"type": "Polygon", "coordinates": [[[-36.0, -8.2], [-35.9, -8.2], [-35.9, -8.3], [-36.0, -8.2]]]}},
        {"type": "Feature", "properties": {"CD_MUN": "2607604", "NM_MUN": "Itamaracá"},
         "geometry": {"type": "Polygon", "coordinates": [[[-34.9, -7.7], [-34.8, -7.7], [-34.8, -7.8], [-34.9, -7.7]]]}}
    ]
}"#;

/// A temporary data directory laid out like production.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// Both spreadsheets, exported as CSV next to their `.xlsx` names.
    pub fn new() -> Self {
        let fixture = Self::empty();
        let layout = fixture.layout();
        fixture.write(&csv_name(&layout.violence_spreadsheet), VIOLENCE_CSV);
        fixture.write(&csv_name(&layout.assault_spreadsheet), ASSAULT_CSV);
        fixture
    }

    /// No input files at all.
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn with_boundaries(self) -> Self {
        let primary = self.layout().boundaries.primary;
        self.write(&primary, BOUNDARIES);
        self
    }

    pub fn with_population(self) -> Self {
        self.with_population_table(POPULATION_CSV)
    }

    pub fn with_population_table(self, csv: &str) -> Self {
        let population = self.layout().population;
        self.write(&population, csv);
        self
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::with_data_dir(self.dir.path())
    }

    pub fn service(&self) -> ViolenceMapService {
        ViolenceMapService::new(self.layout())
    }

    fn write(&self, relative: impl AsRef<Path>, contents: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
}

fn csv_name(xlsx: &str) -> String {
    Path::new(xlsx)
        .with_extension("csv")
        .to_string_lossy()
        .into_owned()
}
