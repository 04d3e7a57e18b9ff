//! Process-lifetime cache of the enriched victim datasets.
//!
//! Each slot is filled at most once, by the first caller that asks for it.
//! Concurrent first callers block on the same [`OnceLock`] until the single
//! load finishes, so a slot never holds a partially built dataset. Load
//! failures are memoized too: a process restart is the only refresh.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use violence_map_dataset_models::DatasetKind;

use crate::{Dataset, load_dataset};

/// Memoized outcome of loading one dataset.
#[derive(Debug, Clone)]
pub enum CachedDataset {
    /// The dataset loaded successfully.
    Ready(Arc<Dataset>),
    /// Neither the preferred file nor its alternate extension exists.
    Missing {
        /// Logical filename that was looked up.
        filename: String,
    },
    /// The file exists but could not be parsed.
    Failed {
        /// Underlying error message.
        reason: String,
    },
}

impl CachedDataset {
    /// Returns the dataset when it loaded.
    #[must_use]
    pub const fn dataset(&self) -> Option<&Arc<Dataset>> {
        match self {
            Self::Ready(dataset) => Some(dataset),
            Self::Missing { .. } | Self::Failed { .. } => None,
        }
    }

    /// Describes why the dataset is unavailable, if it is.
    #[must_use]
    pub fn unavailable_reason(&self) -> Option<String> {
        match self {
            Self::Ready(_) => None,
            Self::Missing { filename } => Some(format!("{filename} not found")),
            Self::Failed { reason } => Some(format!("load failed: {reason}")),
        }
    }
}

/// Where a dataset is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSource {
    /// Directory containing the spreadsheet.
    pub dir: PathBuf,
    /// Logical filename (`.xlsx` or `.csv`).
    pub filename: String,
}

/// Lazily-populated holder of the violence and assault datasets.
///
/// Construct once at startup and share (e.g. behind an [`Arc`]) with every
/// request handler.
#[derive(Debug)]
pub struct DatasetCache {
    violence_source: DatasetSource,
    assault_source: DatasetSource,
    violence: OnceLock<CachedDataset>,
    assault: OnceLock<CachedDataset>,
    loads: AtomicUsize,
}

impl DatasetCache {
    /// Creates an empty cache. Nothing is read until first access.
    #[must_use]
    pub const fn new(violence_source: DatasetSource, assault_source: DatasetSource) -> Self {
        Self {
            violence_source,
            assault_source,
            violence: OnceLock::new(),
            assault: OnceLock::new(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Returns the domestic violence dataset, loading it on first call.
    pub fn violence(&self) -> &CachedDataset {
        self.get(DatasetKind::Violence)
    }

    /// Returns the sexual violence dataset, loading it on first call.
    pub fn assault(&self) -> &CachedDataset {
        self.get(DatasetKind::Assault)
    }

    /// Returns the dataset for `kind`, loading it on first call.
    pub fn get(&self, kind: DatasetKind) -> &CachedDataset {
        let (slot, source) = match kind {
            DatasetKind::Violence => (&self.violence, &self.violence_source),
            DatasetKind::Assault => (&self.assault, &self.assault_source),
        };
        slot.get_or_init(|| self.load(kind, source))
    }

    /// Number of loads performed so far (at most one per dataset).
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn load(&self, kind: DatasetKind, source: &DatasetSource) -> CachedDataset {
        self.loads.fetch_add(1, Ordering::SeqCst);

        match load_dataset(&source.dir, &source.filename, kind) {
            Ok(Some(dataset)) => CachedDataset::Ready(Arc::new(dataset)),
            Ok(None) => {
                log::error!("{kind} dataset unavailable: {} not found", source.filename);
                CachedDataset::Missing {
                    filename: source.filename.clone(),
                }
            }
            Err(e) => {
                log::error!("{kind} dataset failed to load from {}: {e}", source.filename);
                CachedDataset::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn source(dir: &Path, filename: &str) -> DatasetSource {
        DatasetSource {
            dir: dir.to_path_buf(),
            filename: filename.to_string(),
        }
    }

    #[test]
    fn loads_each_dataset_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("violencia.csv"),
            "MUNICÍPIO DO FATO,DATA DO FATO,TOTAL DE VÍTIMAS\nRecife,15/03/2024,2\n",
        )
        .unwrap();

        let cache = DatasetCache::new(
            source(dir.path(), "violencia.xlsx"),
            source(dir.path(), "estupro.xlsx"),
        );
        assert_eq!(cache.load_count(), 0);

        let first = cache.violence().dataset().unwrap().clone();
        let second = cache.violence().dataset().unwrap().clone();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.records.len(), 1);
        assert_eq!(cache.load_count(), 1);

        // The missing file is memoized as well.
        assert!(matches!(cache.assault(), CachedDataset::Missing { .. }));
        assert!(matches!(cache.assault(), CachedDataset::Missing { .. }));
        assert_eq!(cache.load_count(), 2);
    }

    #[test]
    fn concurrent_first_access_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut csv = String::from("MUNICIPIO,DATA DO FATO\n");
        for day in 1..=28 {
            csv.push_str(&format!("Olinda,{day:02}/02/2024\n"));
        }
        std::fs::write(dir.path().join("v.csv"), csv).unwrap();

        let cache = Arc::new(DatasetCache::new(
            source(dir.path(), "v.csv"),
            source(dir.path(), "a.csv"),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.violence().dataset().map(|d| d.records.len()))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(28));
        }
        assert_eq!(cache.load_count(), 1);
    }

    #[test]
    fn parse_failures_are_memoized_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.xlsx"), b"not a workbook").unwrap();

        let cache = DatasetCache::new(
            source(dir.path(), "broken.xlsx"),
            source(dir.path(), "a.csv"),
        );

        let slot = cache.violence();
        assert!(matches!(slot, CachedDataset::Failed { .. }));
        assert!(slot.unavailable_reason().unwrap().starts_with("load failed"));
        cache.violence();
        assert_eq!(cache.load_count(), 1);
    }
}
