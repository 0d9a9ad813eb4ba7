//! The validating CRUD repository over one collection.
//!
//! [`Repository`] owns a [`CollectionBackend`] and exposes create, read, update, delete and
//! count. Each call checks the shape of its arguments first and only then delegates to the
//! backend, so a rejected call never reaches the store. Backend failures are reported as
//! [`ShelterError::Operation`] tagged with the [`Operation`] that was running.
//!
//! Update and delete refuse an empty query: `{}` would match every document in the collection.
//!
//! # Concurrency
//!
//! `Repository<B>` is `Send + Sync` whenever `B` is, and holds no locks of its own. Concurrent
//! callers get whatever ordering and atomicity the underlying store provides.
//!
//! # Example
//!
//! ```ignore
//! use aac_crud_core::{query::by_id, repository::Repository};
//! use bson::doc;
//!
//! let shelter = Repository::connect(backend).await?;
//!
//! let id = shelter.create(doc! { "name": "Rex", "species": "dog" }).await?;
//! let rex = shelter.read_one(by_id(&id), None).await?;
//! assert_eq!(shelter.delete(by_id(&id), false).await?, 1);
//! ```

use bson::{Bson, Document};
use tracing::{debug, error, instrument, warn};

use crate::{
    backend::{CollectionBackend, CollectionBackendBuilder},
    error::{BackendError, Operation, ShelterError, ShelterResult},
    query::{Projection, id_to_string, require_document, require_non_empty_document},
};

/// Validated CRUD access to a single document collection.
#[derive(Debug, Clone)]
pub struct Repository<B: CollectionBackend> {
    backend: B,
}

impl<B: CollectionBackend> Repository<B> {
    /// Wraps `backend` and immediately checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns an operation failure of kind [`Operation::Connect`] if the liveness check fails.
    #[instrument(skip(backend))]
    pub async fn connect(backend: B) -> ShelterResult<Self> {
        backend.ping().await.map_err(|e| fail(Operation::Connect, e))?;
        debug!("liveness check succeeded");

        Ok(Self { backend })
    }

    /// Builds a backend with `builder`, then connects to it as [`Repository::connect`] does.
    pub async fn open<Bd>(builder: Bd) -> ShelterResult<Self>
    where
        Bd: CollectionBackendBuilder<Backend = B>,
    {
        let backend = builder.build().await.map_err(|e| fail(Operation::Connect, e))?;
        Self::connect(backend).await
    }

    /// Inserts one document and returns its generated identifier.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `document` is not a non-empty document.
    #[instrument(skip_all)]
    pub async fn create(&self, document: impl Into<Bson>) -> ShelterResult<String> {
        let document = require_non_empty_document(
            document.into(),
            "Create failed: data must be a non-empty document.",
        )
        .inspect_err(reject)?;

        let id = self.backend
            .insert_one(document)
            .await
            .map_err(|e| fail(Operation::Create, e))?;
        let id = id_to_string(&id);

        debug!(%id, "document created");
        Ok(id)
    }

    /// Returns the documents matching `query`, in store order.
    ///
    /// `query` defaults to matching everything and `projection` to hiding the identity field.
    /// When `limit` is given, at most that many documents are returned.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `query` is not a document or `limit` is not positive.
    #[instrument(skip(self, query, projection))]
    pub async fn read(
        &self,
        query: Option<Bson>,
        projection: Option<Projection>,
        limit: Option<i64>,
    ) -> ShelterResult<Vec<Document>> {
        let filter = match query {
            Some(query) => require_document(query, "Read failed: query must be a document.").inspect_err(reject)?,
            None => Document::new(),
        };
        if let Some(limit) = limit {
            if limit < 1 {
                let err = ShelterError::validation("Limit must be a positive integer.");
                reject(&err);
                return Err(err);
            }
        }

        let documents = self.backend
            .find(filter, projection.unwrap_or_default().into_document(), limit)
            .await
            .map_err(|e| fail(Operation::Read, e))?;

        debug!(returned = documents.len(), "read complete");
        Ok(documents)
    }

    /// Returns the first document matching `query`, or `None` if nothing matches.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `query` is not a non-empty document.
    #[instrument(skip_all)]
    pub async fn read_one(
        &self,
        query: impl Into<Bson>,
        projection: Option<Projection>,
    ) -> ShelterResult<Option<Document>> {
        let filter = require_non_empty_document(
            query.into(),
            "read_one requires a non-empty query document.",
        )
        .inspect_err(reject)?;

        let document = self.backend
            .find_one(filter, projection.unwrap_or_default().into_document())
            .await
            .map_err(|e| fail(Operation::ReadOne, e))?;

        debug!(found = document.is_some(), "read_one complete");
        Ok(document)
    }

    /// Returns every document in the collection, without identity fields.
    pub async fn read_all(&self, limit: Option<i64>) -> ShelterResult<Vec<Document>> {
        self.read(Some(Bson::Document(Document::new())), Some(Projection::exclude_id()), limit).await
    }

    /// Overwrites the fields in `new_values` on every match (`many`) or on the first match.
    ///
    /// Fields not named in `new_values` are left untouched. Returns the number of documents
    /// actually modified, which may be fewer than matched when values were already equal.
    ///
    /// # Errors
    ///
    /// Returns a validation error if either argument is not a non-empty document.
    #[instrument(skip(self, query, new_values))]
    pub async fn update(
        &self,
        query: impl Into<Bson>,
        new_values: impl Into<Bson>,
        many: bool,
    ) -> ShelterResult<u64> {
        let filter = require_non_empty_document(
            query.into(),
            "Update failed: query must be a non-empty document.",
        )
        .inspect_err(reject)?;
        let set = require_non_empty_document(
            new_values.into(),
            "Update failed: new_values must be a non-empty document.",
        )
        .inspect_err(reject)?;

        let outcome = self.backend
            .update(filter, set, many)
            .await
            .map_err(|e| fail(Operation::Update, e))?;

        debug!(matched = outcome.matched, modified = outcome.modified, "update complete");
        Ok(outcome.modified)
    }

    /// Deletes every match (`many`) or the first match, returning the number deleted.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `query` is not a non-empty document.
    #[instrument(skip(self, query))]
    pub async fn delete(&self, query: impl Into<Bson>, many: bool) -> ShelterResult<u64> {
        let filter = require_non_empty_document(
            query.into(),
            "Delete failed: query must be a non-empty document.",
        )
        .inspect_err(reject)?;

        let deleted = self.backend
            .delete(filter, many)
            .await
            .map_err(|e| fail(Operation::Delete, e))?;

        debug!(deleted, "delete complete");
        Ok(deleted)
    }

    /// Counts the documents matching `query`, or the whole collection when `query` is `None`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `query` is not a document.
    #[instrument(skip_all)]
    pub async fn count(&self, query: Option<Bson>) -> ShelterResult<u64> {
        let filter = match query {
            Some(query) => require_document(query, "Count failed: query must be a document.").inspect_err(reject)?,
            None => Document::new(),
        };

        let count = self.backend
            .count(filter)
            .await
            .map_err(|e| fail(Operation::Count, e))?;

        debug!(count, "count complete");
        Ok(count)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Shuts the backend down, releasing its connections.
    ///
    /// # Errors
    ///
    /// Returns an operation failure of kind [`Operation::Shutdown`] if the backend reports one.
    pub async fn shutdown(self) -> ShelterResult<()> {
        self.backend
            .shutdown()
            .await
            .map_err(|e| fail(Operation::Shutdown, e))
    }
}

fn reject(err: &ShelterError) {
    warn!(error = %err, "rejected invalid arguments");
}

fn fail(operation: Operation, err: BackendError) -> ShelterError {
    error!(%operation, error = %err, "backend operation failed");
    ShelterError::operation(operation, err)
}
