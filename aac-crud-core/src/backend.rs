//! Collection backend abstraction for the repository.
//!
//! This module defines the seam between the validating [`Repository`](crate::repository::Repository)
//! and whatever actually stores the documents (a MongoDB collection, an in-process collection, ...).
//!
//! # Overview
//!
//! The [`CollectionBackend`] trait is a thin async mirror of the store's native single-collection
//! API: insert one, find, find one, field-merge update, delete, count, and a liveness ping.
//! Backends receive arguments that have already been validated and pass them through verbatim;
//! they do no validation of their own beyond what the store itself enforces.
//!
//! # Traits
//!
//! - [`CollectionBackend`]: The core trait for collection backends
//! - [`CollectionBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use aac_crud_core::backend::CollectionBackend;
//! use bson::doc;
//!
//! let backend = MyBackendImpl::new();
//!
//! let id = backend.insert_one(doc! { "name": "Rex", "species": "dog" }).await?;
//! let count = backend.count(doc! { "species": "dog" }).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::{Bson, Document};
use std::fmt::Debug;

use crate::error::BackendResult;

/// Counts reported by a field-merge update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Number of documents matched by the filter.
    pub matched: u64,
    /// Number of documents whose contents actually changed.
    pub modified: u64,
}

/// Abstract interface for a single document collection.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and support concurrent access from multiple
/// async tasks. Ordering and atomicity across concurrent callers are whatever the
/// underlying store provides.
///
/// # Error Handling
///
/// Every method returns [`BackendResult<T>`](crate::error::BackendResult). The error
/// carries the store's failure message verbatim.
#[async_trait]
pub trait CollectionBackend: Send + Sync + Debug {
    /// Issues a lightweight round trip to confirm the store is reachable.
    async fn ping(&self) -> BackendResult<()>;

    /// Inserts one document and returns the value of its identity field.
    ///
    /// If the document has no `_id`, the backend assigns one.
    async fn insert_one(&self, document: Document) -> BackendResult<Bson>;

    /// Returns every document matching `filter`, shaped by `projection`, in store order.
    ///
    /// # Arguments
    ///
    /// * `filter` - Match criteria, passed to the store verbatim
    /// * `projection` - Field inclusion flags
    /// * `limit` - Maximum number of documents to return, if any
    async fn find(
        &self,
        filter: Document,
        projection: Document,
        limit: Option<i64>,
    ) -> BackendResult<Vec<Document>>;

    /// Returns the first document matching `filter`, or `None`.
    async fn find_one(
        &self,
        filter: Document,
        projection: Document,
    ) -> BackendResult<Option<Document>>;

    /// Overwrites the fields named in `set` on every match (`many`) or on the first match.
    ///
    /// Fields not named in `set` are left untouched.
    async fn update(
        &self,
        filter: Document,
        set: Document,
        many: bool,
    ) -> BackendResult<UpdateOutcome>;

    /// Deletes every match (`many`) or the first match, returning the number deleted.
    async fn delete(&self, filter: Document, many: bool) -> BackendResult<u64>;

    /// Counts the documents matching `filter`.
    async fn count(&self, filter: Document) -> BackendResult<u64>;

    /// Releases any resources held by the backend.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> BackendResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory trait for creating collection backends.
///
/// Building may involve I/O (parsing a connection string, resolving hosts), so it is async.
#[async_trait]
pub trait CollectionBackendBuilder {
    type Backend: CollectionBackend;

    async fn build(self) -> BackendResult<Self::Backend>;
}
