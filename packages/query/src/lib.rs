#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map and municipality queries.
//!
//! [`ViolenceMapService`] owns the data layout and the process-wide
//! [`DatasetCache`]. Construct it once at startup and share it with every
//! request handler; all operations are synchronous and take `&self`.

pub mod config;
pub mod error;
pub mod map;
pub mod municipality;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use violence_map_dataset::aggregate::aggregate;
use violence_map_dataset::cache::DatasetCache;
use violence_map_dataset_models::{AggregateRow, DatasetKind};
use violence_map_query_models::Period;

pub use config::DataLayout;
pub use error::QueryError;

/// Entry point for every query.
#[derive(Debug, Clone)]
pub struct ViolenceMapService {
    layout: DataLayout,
    cache: Arc<DatasetCache>,
}

impl ViolenceMapService {
    /// Creates a service with an empty cache. Spreadsheets are read on the
    /// first query that needs them.
    #[must_use]
    pub fn new(layout: DataLayout) -> Self {
        let cache = DatasetCache::new(layout.violence_source(), layout.assault_source());
        Self {
            layout,
            cache: Arc::new(cache),
        }
    }

    /// The layout this service reads from.
    #[must_use]
    pub const fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// The dataset cache shared by every clone of this service.
    #[must_use]
    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// Per-municipality victim totals for one dataset.
    ///
    /// An unavailable dataset yields no rows, so every municipality counts 0.
    fn aggregate(&self, kind: DatasetKind, period: Period) -> Vec<AggregateRow> {
        let cached = self.cache.get(kind);
        match cached.dataset() {
            Some(dataset) => aggregate(&dataset.records, period.year(), period.month()),
            None => {
                log::warn!(
                    "{kind} dataset unavailable ({}); counting 0 victims for {period}",
                    cached.unavailable_reason().unwrap_or_default()
                );
                Vec::new()
            }
        }
    }
}
