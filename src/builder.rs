//! Builder for assembling a cache from configuration and collaborators.

use crate::cache::GeoCategoryCache;
use crate::config::CacheConfig;
use crate::error::Result;
use crate::lookup::RemoteCategoryLookup;
use crate::spatial_index::{RTreeIndex, SpatialIndex};
use std::sync::Arc;

/// Builder for [`GeoCategoryCache`] with a custom index and settings.
///
/// ```rust
/// use async_trait::async_trait;
/// use geocache::{GeoCacheBuilder, LookupError, RemoteCategoryLookup};
///
/// struct NoCategories;
///
/// #[async_trait]
/// impl RemoteCategoryLookup for NoCategories {
///     async fn fetch(&self, _query_key: &str) -> Result<Vec<String>, LookupError> {
///         Ok(Vec::new())
///     }
/// }
///
/// let cache = GeoCacheBuilder::new()
///     .tolerance_meters(250.0)
///     .max_entries(10_000)
///     .build(NoCategories)?;
/// assert!(cache.is_empty());
/// # Ok::<(), geocache::GeoCacheError>(())
/// ```
#[derive(Default)]
pub struct GeoCacheBuilder {
    config: CacheConfig,
    index: Option<Arc<dyn SpatialIndex>>,
}

impl GeoCacheBuilder {
    /// Start from the default configuration and a fresh [`RTreeIndex`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tolerance_meters(mut self, meters: f64) -> Self {
        self.config = self.config.with_tolerance_meters(meters);
        self
    }

    /// Bound the default index to `max_entries`, evicting the oldest first.
    ///
    /// Zero is rejected by [`build`](Self::build).
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.config.max_entries = Some(max_entries);
        self
    }

    pub fn single_flight(mut self, enabled: bool) -> Self {
        self.config = self.config.with_single_flight(enabled);
        self
    }

    /// Use an existing index instead of creating one.
    ///
    /// A supplied index manages its own capacity; `max_entries` only applies
    /// to the index the builder creates itself.
    pub fn index(mut self, index: Arc<dyn SpatialIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Validate the configuration and create the cache.
    pub fn build<L>(self, lookup: L) -> Result<GeoCategoryCache>
    where
        L: RemoteCategoryLookup + 'static,
    {
        self.config.validate()?;

        let index = match self.index {
            Some(index) => {
                if self.config.max_entries.is_some() {
                    log::warn!("max_entries is ignored for a caller-supplied index");
                }
                index
            }
            None => Arc::new(RTreeIndex::with_capacity(self.config.max_entries)),
        };

        log::info!(
            "Geo category cache ready: tolerance {} m, max entries {:?}, single-flight {}",
            self.config.tolerance_meters,
            self.config.max_entries,
            self.config.single_flight
        );

        Ok(GeoCategoryCache::from_parts(
            Arc::new(lookup),
            index,
            self.config,
        ))
    }
}
