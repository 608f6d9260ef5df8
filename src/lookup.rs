//! Remote category lookup collaborator.
//!
//! The cache only needs one capability from the remote side: given a query
//! key derived from a coordinate, produce the category labels for that place.
//! How the request travels (HTTP, RPC, a local database) is up to the
//! implementor.

use crate::error::LookupError;
use async_trait::async_trait;
use std::sync::Arc;

/// Asynchronous source of category labels for a location.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use geocache::{LookupError, RemoteCategoryLookup};
///
/// struct FixedCategories(Vec<String>);
///
/// #[async_trait]
/// impl RemoteCategoryLookup for FixedCategories {
///     async fn fetch(&self, _query_key: &str) -> Result<Vec<String>, LookupError> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait RemoteCategoryLookup: Send + Sync {
    /// Fetch the labels for `query_key` (see [`Coordinate::query_key`]).
    ///
    /// An empty vector is a valid answer. Failures of any kind are reported
    /// as a [`LookupError`].
    ///
    /// [`Coordinate::query_key`]: crate::Coordinate::query_key
    async fn fetch(&self, query_key: &str) -> Result<Vec<String>, LookupError>;
}

#[async_trait]
impl<T: RemoteCategoryLookup + ?Sized> RemoteCategoryLookup for Arc<T> {
    async fn fetch(&self, query_key: &str) -> Result<Vec<String>, LookupError> {
        (**self).fetch(query_key).await
    }
}

#[async_trait]
impl<T: RemoteCategoryLookup + ?Sized> RemoteCategoryLookup for Box<T> {
    async fn fetch(&self, query_key: &str) -> Result<Vec<String>, LookupError> {
        (**self).fetch(query_key).await
    }
}
