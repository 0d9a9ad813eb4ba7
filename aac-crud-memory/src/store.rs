//! In-memory collection backend.
//!
//! This module provides a backend that keeps one collection's documents in
//! insertion order behind an async-safe read-write lock.

use std::sync::Arc;
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Bson, Document, doc, oid::ObjectId};

use aac_crud_core::{
    backend::{CollectionBackend, CollectionBackendBuilder, UpdateOutcome},
    error::{BackendError, BackendResult},
    query::ID_FIELD,
};

use crate::evaluator::{DocumentEvaluator, apply_set, project};


/// Thread-safe in-memory collection.
///
/// Implements [`CollectionBackend`] with the same observable behaviour as a MongoDB
/// collection for the filters the evaluator understands: documents are returned in
/// insertion order, missing `_id`s are filled with fresh ObjectIds, and duplicate
/// `_id`s are rejected.
///
/// # Thread Safety
///
/// `InMemoryCollection` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Clones share the same documents.
///
/// # Example
///
/// ```ignore
/// use aac_crud_memory::InMemoryCollection;
/// use aac_crud_core::backend::CollectionBackend;
/// use bson::doc;
///
/// let animals = InMemoryCollection::new();
/// animals.insert_one(doc! { "name": "Rex", "species": "dog" }).await?;
/// assert_eq!(animals.count(doc! { "species": "dog" }).await?, 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryCollection {
    documents: Arc<RwLock<Vec<Document>>>,
    /// When set, every call fails with this message.
    unavailable: Option<String>,
}

impl InMemoryCollection {
    /// Creates a new empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection whose every call fails with `message`, as an unreachable server would.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            documents: Arc::default(),
            unavailable: Some(message.into()),
        }
    }

    /// Creates a builder for constructing a pre-populated collection.
    pub fn builder() -> InMemoryCollectionBuilder {
        InMemoryCollectionBuilder::default()
    }

    /// Returns a copy of every stored document, in insertion order.
    pub async fn snapshot(&self) -> Vec<Document> {
        self.documents.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    fn check_available(&self) -> BackendResult<()> {
        match &self.unavailable {
            Some(message) => Err(BackendError::new(message.clone())),
            None => Ok(()),
        }
    }

    /// Indices of documents matching `filter`, in insertion order.
    fn matching(documents: &[Document], filter: &Document) -> BackendResult<Vec<usize>> {
        let mut indices = Vec::new();

        for (index, document) in documents.iter().enumerate() {
            if DocumentEvaluator::new(document).matches(filter)? {
                indices.push(index);
            }
        }

        Ok(indices)
    }
}


#[async_trait]
impl CollectionBackend for InMemoryCollection {
    async fn ping(&self) -> BackendResult<()> {
        self.check_available()
    }

    async fn insert_one(&self, document: Document) -> BackendResult<Bson> {
        self.check_available()?;
        let mut documents = self.documents.write().await;

        let (id, document) = match document.get(ID_FIELD) {
            Some(id) => (id.clone(), document),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                let mut stored = doc! { ID_FIELD: id.clone() };
                stored.extend(document);
                (id, stored)
            }
        };

        if documents.iter().any(|existing| existing.get(ID_FIELD) == Some(&id)) {
            return Err(BackendError::new(format!(
                "E11000 duplicate key error index: _id_ dup key: {{ _id: {id} }}"
            )));
        }

        documents.push(document);
        Ok(id)
    }

    async fn find(&self, filter: Document, projection: Document, limit: Option<i64>) -> BackendResult<Vec<Document>> {
        self.check_available()?;
        let documents = self.documents.read().await;

        // A limit of 0 means no limit; negative limits are treated by magnitude.
        let limit = match limit.map(i64::unsigned_abs) {
            Some(0) | None => usize::MAX,
            Some(limit) => usize::try_from(limit).unwrap_or(usize::MAX),
        };

        Self::matching(&documents, &filter)?
            .into_iter()
            .take(limit)
            .map(|index| project(&documents[index], &projection))
            .collect()
    }

    async fn find_one(&self, filter: Document, projection: Document) -> BackendResult<Option<Document>> {
        self.check_available()?;
        let documents = self.documents.read().await;

        for document in documents.iter() {
            if DocumentEvaluator::new(document).matches(&filter)? {
                return project(document, &projection).map(Some);
            }
        }

        Ok(None)
    }

    async fn update(&self, filter: Document, set: Document, many: bool) -> BackendResult<UpdateOutcome> {
        self.check_available()?;
        let mut documents = self.documents.write().await;

        let mut targets = Self::matching(&documents, &filter)?;
        if !many {
            targets.truncate(1);
        }

        let mut outcome = UpdateOutcome::default();
        for index in targets {
            // Apply to a copy so a failing path leaves the stored document untouched.
            let mut updated = documents[index].clone();
            let changed = apply_set(&mut updated, &set)?;

            outcome.matched += 1;
            if changed {
                documents[index] = updated;
                outcome.modified += 1;
            }
        }

        Ok(outcome)
    }

    async fn delete(&self, filter: Document, many: bool) -> BackendResult<u64> {
        self.check_available()?;
        let mut documents = self.documents.write().await;

        let mut targets = Self::matching(&documents, &filter)?;
        if !many {
            targets.truncate(1);
        }

        for index in targets.iter().rev() {
            documents.remove(*index);
        }

        Ok(targets.len() as u64)
    }

    async fn count(&self, filter: Document) -> BackendResult<u64> {
        self.check_available()?;
        let documents = self.documents.read().await;

        Ok(Self::matching(&documents, &filter)?.len() as u64)
    }
}


/// Builder for constructing [`InMemoryCollection`] instances, optionally pre-populated.
///
/// # Example
///
/// ```ignore
/// use aac_crud_memory::InMemoryCollection;
/// use aac_crud_core::backend::CollectionBackendBuilder;
/// use bson::doc;
///
/// let animals = InMemoryCollection::builder()
///     .document(doc! { "name": "Rex", "species": "dog" })
///     .build()
///     .await?;
/// ```
#[derive(Default)]
pub struct InMemoryCollectionBuilder {
    documents: Vec<Document>,
}

impl InMemoryCollectionBuilder {
    pub fn document(mut self, document: Document) -> Self {
        self.documents.push(document);
        self
    }

    pub fn documents(mut self, documents: impl IntoIterator<Item = Document>) -> Self {
        self.documents.extend(documents);
        self
    }
}

#[async_trait]
impl CollectionBackendBuilder for InMemoryCollectionBuilder {
    type Backend = InMemoryCollection;

    /// Builds the collection, inserting the seed documents in order.
    ///
    /// Fails if two seed documents share an `_id`.
    async fn build(self) -> BackendResult<Self::Backend> {
        let collection = InMemoryCollection::new();

        for document in self.documents {
            collection.insert_one(document).await?;
        }

        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> InMemoryCollection {
        InMemoryCollection::builder()
            .documents([
                doc! { "name": "Rex", "species": "dog", "age": 4 },
                doc! { "name": "Milo", "species": "cat", "age": 2 },
                doc! { "name": "Bella", "species": "dog", "age": 7 },
            ])
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_object_id_first() {
        let animals = InMemoryCollection::new();
        let id = animals.insert_one(doc! { "name": "Rex" }).await.unwrap();

        let stored = animals.snapshot().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].keys().next().map(String::as_str), Some("_id"));
        assert_eq!(stored[0].get("_id"), Some(&id));
        assert!(matches!(id, Bson::ObjectId(_)));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_ids() {
        let animals = InMemoryCollection::new();
        animals.insert_one(doc! { "_id": "A1", "name": "Rex" }).await.unwrap();
        let err = animals.insert_one(doc! { "_id": "A1", "name": "Max" }).await.unwrap_err();
        assert!(err.message().contains("duplicate key"));
        assert_eq!(animals.len().await, 1);
    }

    #[tokio::test]
    async fn test_find_preserves_order_and_limit() {
        let animals = seeded().await;
        let dogs = animals.find(doc! { "species": "dog" }, doc! { "_id": 0 }, None).await.unwrap();
        assert_eq!(dogs, vec![
            doc! { "name": "Rex", "species": "dog", "age": 4 },
            doc! { "name": "Bella", "species": "dog", "age": 7 },
        ]);

        let limited = animals.find(doc! {}, doc! { "_id": 0, "name": 1 }, Some(2)).await.unwrap();
        assert_eq!(limited, vec![doc! { "name": "Rex" }, doc! { "name": "Milo" }]);
    }

    #[tokio::test]
    async fn test_update_counts_only_changed_documents() {
        let animals = seeded().await;
        animals.update(doc! { "name": "Rex" }, doc! { "status": "adopted" }, false).await.unwrap();

        let outcome = animals.update(doc! { "species": "dog" }, doc! { "status": "adopted" }, true).await.unwrap();
        assert_eq!(outcome, UpdateOutcome { matched: 2, modified: 1 });

        let outcome = animals.update(doc! { "species": "dog" }, doc! { "age": 1 }, false).await.unwrap();
        assert_eq!(outcome, UpdateOutcome { matched: 1, modified: 1 });
        assert_eq!(animals.count(doc! { "age": 1 }).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_one_and_many() {
        let animals = seeded().await;
        assert_eq!(animals.delete(doc! { "species": "dog" }, false).await.unwrap(), 1);
        assert_eq!(animals.count(doc! { "species": "dog" }).await.unwrap(), 1);
        assert_eq!(animals.delete(doc! { "age": { "$gte": 0 } }, true).await.unwrap(), 2);
        assert!(animals.is_empty().await);
    }

    #[tokio::test]
    async fn test_unavailable_collection_fails_every_call() {
        let animals = InMemoryCollection::unavailable("connection refused");
        assert_eq!(animals.ping().await.unwrap_err().message(), "connection refused");
        assert!(animals.count(doc! {}).await.is_err());
        assert!(animals.insert_one(doc! { "name": "Rex" }).await.is_err());
    }
}
