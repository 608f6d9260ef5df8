//! 2D spatial index holding previously fetched category labels.
//!
//! The cache talks to the index through the [`SpatialIndex`] trait so that
//! tests and embedders can substitute their own structure. [`RTreeIndex`] is
//! the default implementation, an R*-tree keyed on longitude/latitude.

use crate::types::{BoundingBox, Coordinate};
use parking_lot::RwLock;
use rstar::{AABB, RTree, RTreeObject};
use std::collections::VecDeque;
use std::sync::Arc;

/// A coordinate and the category labels fetched for it.
///
/// Labels keep the order they were received in, duplicates included.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPoint {
    coordinate: Coordinate,
    labels: Arc<[String]>,
}

impl IndexedPoint {
    pub fn new(coordinate: Coordinate, labels: impl Into<Arc<[String]>>) -> Self {
        Self {
            coordinate,
            labels: labels.into(),
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Insert and range-query capability required by the cache.
///
/// Implementations must be safe to share between threads: inserts from one
/// caller have to be visible to queries issued afterwards by any other.
pub trait SpatialIndex: Send + Sync {
    /// Store a new entry. Inserting twice at the same coordinate keeps both.
    fn insert(&self, coordinate: Coordinate, labels: Arc<[String]>);

    /// All entries inside `bbox`, bounds inclusive. Never mutates the index.
    fn query_within(&self, bbox: &BoundingBox) -> Vec<IndexedPoint>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    seq: u64,
    point: IndexedPoint,
}

impl RTreeObject for Entry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let coord = self.point.coordinate();
        AABB::from_point([coord.longitude(), coord.latitude()])
    }
}

struct Inner {
    tree: RTree<Entry>,
    next_seq: u64,
    // Insertion order, only tracked when a capacity is set.
    order: VecDeque<Entry>,
    evicted: u64,
}

/// R*-tree backed [`SpatialIndex`].
///
/// Results are returned in insertion order. With a capacity, the oldest entry
/// is evicted once the index grows past it.
pub struct RTreeIndex {
    inner: RwLock<Inner>,
    capacity: Option<usize>,
}

impl RTreeIndex {
    /// Create an unbounded index.
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    /// Create an index that keeps at most `capacity` entries when set.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is `Some(0)`.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        assert!(
            capacity != Some(0),
            "Index capacity must be greater than zero"
        );
        Self {
            inner: RwLock::new(Inner {
                tree: RTree::new(),
                next_seq: 0,
                order: VecDeque::new(),
                evicted: 0,
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Total number of entries dropped to honor the capacity.
    pub fn evicted_count(&self) -> u64 {
        self.inner.read().evicted
    }
}

impl Default for RTreeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex for RTreeIndex {
    fn insert(&self, coordinate: Coordinate, labels: Arc<[String]>) {
        let mut inner = self.inner.write();
        let seq = inner.next_seq;
        inner.next_seq += 1;

        let entry = Entry {
            seq,
            point: IndexedPoint::new(coordinate, labels),
        };

        if let Some(capacity) = self.capacity {
            inner.order.push_back(entry.clone());
            inner.tree.insert(entry);

            while inner.tree.size() > capacity {
                let Some(oldest) = inner.order.pop_front() else {
                    break;
                };
                if inner.tree.remove(&oldest).is_some() {
                    inner.evicted += 1;
                    log::debug!(
                        "Evicted cached categories at {}",
                        oldest.point.coordinate().query_key()
                    );
                }
            }
        } else {
            inner.tree.insert(entry);
        }
    }

    fn query_within(&self, bbox: &BoundingBox) -> Vec<IndexedPoint> {
        if !bbox.is_finite() {
            log::warn!("Rejecting bounding box query with non-finite coordinates");
            return Vec::new();
        }

        let envelope = AABB::from_corners(
            [bbox.min_lon(), bbox.min_lat()],
            [bbox.max_lon(), bbox.max_lat()],
        );

        let inner = self.inner.read();
        let mut found: Vec<&Entry> = inner.tree.locate_in_envelope(&envelope).collect();
        found.sort_unstable_by_key(|entry| entry.seq);
        found.into_iter().map(|entry| entry.point.clone()).collect()
    }

    fn len(&self) -> usize {
        self.inner.read().tree.size()
    }
}
