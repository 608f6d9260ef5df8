//! Cache-with-fallback controller for location based category lookups.
//!
//! A lookup first searches the spatial index around the requested coordinate.
//! Anything found there is returned as-is; only when nothing is nearby does
//! the cache ask the remote collaborator, and a successful answer is stored so
//! the next lookup in the same area is served locally.

use crate::builder::GeoCacheBuilder;
use crate::config::CacheConfig;
use crate::error::LookupError;
use crate::gps::GpsCoordinates;
use crate::lookup::RemoteCategoryLookup;
use crate::spatial_index::{RTreeIndex, SpatialIndex};
use crate::stats::{CacheStats, StatsCounters};
use crate::types::Coordinate;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared, WeakShared};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Weak};

type FetchResult = Result<Arc<[String]>, LookupError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;
type InFlight = Mutex<Registry>;

/// Pending fetches by query key.
///
/// Entries hold only a weak handle: the fetch lives as long as some caller is
/// waiting on it.
#[derive(Default)]
struct Registry {
    next_id: u64,
    pending: FxHashMap<String, (u64, WeakShared<BoxFuture<'static, FetchResult>>)>,
}

/// Removes its registry entry when the fetch it belongs to completes or is
/// dropped unfinished.
struct Registration {
    registry: Weak<InFlight>,
    key: String,
    id: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock();
        // The key may already belong to a newer fetch.
        if registry
            .pending
            .get(&self.key)
            .is_some_and(|(id, _)| *id == self.id)
        {
            registry.pending.remove(&self.key);
            log::trace!("Released in-flight category fetch for {}", self.key);
        }
    }
}

enum Resolution {
    Hit(Vec<String>),
    Fetch(SharedFetch),
}

/// Answers "which categories apply near this coordinate?" with as few remote
/// calls as possible.
///
/// All methods take `&self`; share one instance between callers with an
/// `Arc`. Lookups are plain futures and do not depend on a particular async
/// runtime. Dropping a pending lookup abandons it without waiting for the
/// remote side.
pub struct GeoCategoryCache {
    index: Arc<dyn SpatialIndex>,
    lookup: Arc<dyn RemoteCategoryLookup>,
    config: CacheConfig,
    in_flight: Arc<InFlight>,
    stats: Arc<StatsCounters>,
}

impl GeoCategoryCache {
    /// Create a cache over `index` with the default configuration.
    pub fn new(lookup: Arc<dyn RemoteCategoryLookup>, index: Arc<dyn SpatialIndex>) -> Self {
        Self::from_parts(lookup, index, CacheConfig::default())
    }

    /// Create a cache backed by a fresh, unbounded [`RTreeIndex`].
    pub fn with_lookup(lookup: Arc<dyn RemoteCategoryLookup>) -> Self {
        Self::new(lookup, Arc::new(RTreeIndex::new()))
    }

    pub fn builder() -> GeoCacheBuilder {
        GeoCacheBuilder::new()
    }

    pub(crate) fn from_parts(
        lookup: Arc<dyn RemoteCategoryLookup>,
        index: Arc<dyn SpatialIndex>,
        config: CacheConfig,
    ) -> Self {
        Self {
            index,
            lookup,
            config,
            in_flight: Arc::new(Mutex::new(Registry::default())),
            stats: Arc::new(StatsCounters::default()),
        }
    }

    /// Find the categories recorded near `coordinate`.
    ///
    /// On a hit the labels of every nearby entry are concatenated in index
    /// order, duplicates included, and the remote collaborator is not called.
    /// On a miss the collaborator is called once; a successful answer is
    /// inserted at `coordinate` before being returned. A failed call inserts
    /// nothing and its error is returned unchanged.
    pub async fn find_categories(
        &self,
        coordinate: Coordinate,
    ) -> Result<Vec<String>, LookupError> {
        if let Some(labels) = self.cached_labels(&coordinate) {
            return Ok(labels);
        }

        let key = coordinate.query_key();

        if !self.config.single_flight {
            self.stats.record_miss();
            log::debug!("Cache miss at {}, fetching categories", key);
            let labels = fetch_and_insert(
                Arc::clone(&self.lookup),
                Arc::clone(&self.index),
                Arc::clone(&self.stats),
                coordinate,
                key,
            )
            .await?;
            return Ok(labels.to_vec());
        }

        match self.resolve_miss(coordinate, key) {
            Resolution::Hit(labels) => Ok(labels),
            Resolution::Fetch(pending) => pending.await.map(|labels| labels.to_vec()),
        }
    }

    /// Like [`find_categories`](Self::find_categories) for a GPS record that
    /// may be absent. Without coordinates the answer is empty and neither the
    /// index nor the collaborator is consulted.
    pub async fn find_categories_for_gps(
        &self,
        gps: Option<&GpsCoordinates>,
    ) -> Result<Vec<String>, LookupError> {
        match gps {
            Some(gps) => self.find_categories(gps.coordinate()).await,
            None => Ok(Vec::new()),
        }
    }

    fn cached_labels(&self, coordinate: &Coordinate) -> Option<Vec<String>> {
        let bbox = coordinate.bounding_box(self.config.tolerance_meters);
        log::trace!(
            "Search within: lat [{}, {}], lon [{}, {}]",
            bbox.min_lat(),
            bbox.max_lat(),
            bbox.min_lon(),
            bbox.max_lon()
        );
        let found = self.index.query_within(&bbox);
        if found.is_empty() {
            return None;
        }

        self.stats.record_hit();
        let labels: Vec<String> = found
            .iter()
            .flat_map(|point| point.labels().iter().cloned())
            .collect();
        log::debug!(
            "Cache hit at {}: {} entries, {} labels",
            coordinate.query_key(),
            found.len(),
            labels.len()
        );
        Some(labels)
    }

    // The index is checked again under the registry lock: a fetch that just
    // completed has already inserted its entry before leaving the registry.
    fn resolve_miss(&self, coordinate: Coordinate, key: String) -> Resolution {
        let mut in_flight = self.in_flight.lock();

        if let Some(pending) = in_flight
            .pending
            .get(&key)
            .and_then(|(_, weak)| weak.upgrade())
        {
            self.stats.record_miss();
            self.stats.record_coalesced();
            log::debug!("Joining in-flight category fetch for {}", key);
            return Resolution::Fetch(pending);
        }

        if let Some(labels) = self.cached_labels(&coordinate) {
            return Resolution::Hit(labels);
        }

        self.stats.record_miss();
        log::debug!("Cache miss at {}, fetching categories", key);

        let id = in_flight.next_id;
        in_flight.next_id += 1;
        let registration = Registration {
            registry: Arc::downgrade(&self.in_flight),
            key: key.clone(),
            id,
        };
        let fetch = fetch_and_insert(
            Arc::clone(&self.lookup),
            Arc::clone(&self.index),
            Arc::clone(&self.stats),
            coordinate,
            key.clone(),
        );
        let pending = async move {
            let _registration = registration;
            fetch.await
        }
        .boxed()
        .shared();

        if let Some(weak) = pending.downgrade() {
            in_flight.pending.insert(key, (id, weak));
        }
        Resolution::Fetch(pending)
    }

    /// Number of entries currently held by the index.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of distinct query keys with a remote fetch still pending.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().pending.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.index.len())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<dyn SpatialIndex> {
        &self.index
    }
}

async fn fetch_and_insert(
    lookup: Arc<dyn RemoteCategoryLookup>,
    index: Arc<dyn SpatialIndex>,
    stats: Arc<StatsCounters>,
    coordinate: Coordinate,
    key: String,
) -> FetchResult {
    stats.record_remote_call();
    match lookup.fetch(&key).await {
        Ok(labels) => {
            let labels: Arc<[String]> = labels.into();
            index.insert(coordinate, Arc::clone(&labels));
            log::debug!("Cached {} categories at {}", labels.len(), key);
            Ok(labels)
        }
        Err(e) => {
            stats.record_remote_failure();
            log::warn!("Category lookup for {} failed: {}", key, e);
            Err(e)
        }
    }
}
