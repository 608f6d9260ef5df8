//! Spatial result cache for location based category lookups.
//!
//! A [`GeoCategoryCache`] answers "which categories apply near this
//! coordinate?". It searches an R*-tree of previously fetched answers around
//! the coordinate and only calls the [`RemoteCategoryLookup`] collaborator
//! when nothing is stored nearby, inserting the answer for next time.
//!
//! ```rust
//! use async_trait::async_trait;
//! use geocache::{Coordinate, GeoCategoryCache, LookupError, RemoteCategoryLookup};
//! use std::sync::Arc;
//!
//! struct Commons;
//!
//! #[async_trait]
//! impl RemoteCategoryLookup for Commons {
//!     async fn fetch(&self, _query_key: &str) -> Result<Vec<String>, LookupError> {
//!         Ok(vec!["Eiffel Tower".to_string()])
//!     }
//! }
//!
//! let cache = GeoCategoryCache::with_lookup(Arc::new(Commons));
//! let here = Coordinate::new(48.8584, 2.2945)?;
//!
//! let first = futures::executor::block_on(cache.find_categories(here))?;
//! let again = futures::executor::block_on(cache.find_categories(here))?;
//! assert_eq!(first, again);
//! assert_eq!(cache.stats().remote_calls, 1);
//! # Ok::<(), geocache::GeoCacheError>(())
//! ```

pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod gps;
pub mod lookup;
pub mod spatial_index;
pub mod stats;
pub mod types;

pub use builder::GeoCacheBuilder;
pub use cache::GeoCategoryCache;
pub use config::CacheConfig;
pub use error::{GeoCacheError, LookupError, Result};
pub use gps::{GpsCoordinates, Hemisphere};
pub use lookup::RemoteCategoryLookup;
pub use spatial_index::{IndexedPoint, RTreeIndex, SpatialIndex};
pub use stats::CacheStats;
pub use types::{BoundingBox, Coordinate};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{
        CacheConfig, Coordinate, GeoCacheBuilder, GeoCacheError, GeoCategoryCache,
        GpsCoordinates, LookupError, RemoteCategoryLookup, Result,
    };

    pub use crate::{BoundingBox, IndexedPoint, RTreeIndex, SpatialIndex};
}
