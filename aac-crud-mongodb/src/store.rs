use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Bson, Document, doc};
use mongodb::{
    Client, Collection as MongoCollectionHandle,
    options::{ClientOptions, Credential},
};
use tracing::debug;
use aac_crud_core::{
    backend::{CollectionBackend, CollectionBackendBuilder, UpdateOutcome},
    config::ConnectionConfig,
    error::{BackendError, BackendResult, ShelterResult},
    repository::Repository,
};


/// A single MongoDB collection.
///
/// Cloning is cheap: the driver's `Client` is reference-counted and pools its own connections.
#[derive(Debug, Clone)]
pub struct MongoCollection {
    client: Client,
    collection: MongoCollectionHandle<Document>,
}

impl MongoCollection {
    pub fn new(client: Client, database: &str, collection: &str) -> Self {
        let collection = client.database(database).collection(collection);
        Self { client, collection }
    }

    pub fn builder(config: ConnectionConfig) -> MongoCollectionBuilder {
        MongoCollectionBuilder::new(config)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn namespace(&self) -> String {
        self.collection.namespace().to_string()
    }

    /// Drops the whole collection, documents and indexes included.
    pub async fn drop_collection(&self) -> BackendResult<()> {
        self.collection.drop().await.map_err(backend_error)
    }

    async fn shutdown(self) -> BackendResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

fn backend_error(err: mongodb::error::Error) -> BackendError {
    BackendError::new(err.to_string())
}

#[async_trait]
impl CollectionBackend for MongoCollection {
    async fn ping(&self) -> BackendResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn insert_one(&self, document: Document) -> BackendResult<Bson> {
        Ok(
            self.collection
                .insert_one(document)
                .await
                .map_err(backend_error)?
                .inserted_id
        )
    }

    async fn find(&self, filter: Document, projection: Document, limit: Option<i64>) -> BackendResult<Vec<Document>> {
        let mut find = self.collection
            .find(filter)
            .projection(projection);

        if let Some(limit) = limit {
            find = find.limit(limit);
        }

        find
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)
    }

    async fn find_one(&self, filter: Document, projection: Document) -> BackendResult<Option<Document>> {
        self.collection
            .find_one(filter)
            .projection(projection)
            .await
            .map_err(backend_error)
    }

    async fn update(&self, filter: Document, set: Document, many: bool) -> BackendResult<UpdateOutcome> {
        let update = doc! { "$set": set };

        let result = if many {
            self.collection.update_many(filter, update).await
        } else {
            self.collection.update_one(filter, update).await
        }
        .map_err(backend_error)?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete(&self, filter: Document, many: bool) -> BackendResult<u64> {
        let result = if many {
            self.collection.delete_many(filter).await
        } else {
            self.collection.delete_one(filter).await
        }
        .map_err(backend_error)?;

        Ok(result.deleted_count)
    }

    async fn count(&self, filter: Document) -> BackendResult<u64> {
        self.collection
            .count_documents(filter)
            .await
            .map_err(backend_error)
    }

    async fn shutdown(self) -> BackendResult<()> {
        self.shutdown().await
    }
}

/// Builds a [`MongoCollection`] from a [`ConnectionConfig`].
pub struct MongoCollectionBuilder {
    config: ConnectionConfig,
}

impl MongoCollectionBuilder {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Client options for the configured server: the credential-free URI, the
    /// server-selection timeout, the app name and, when present, the credentials.
    pub async fn client_options(&self) -> BackendResult<ClientOptions> {
        let mut options = ClientOptions::parse(self.config.uri())
            .await
            .map_err(backend_error)?;

        options.server_selection_timeout = Some(self.config.server_selection_timeout);
        options.app_name = self.config.app_name.clone();

        if let Some(credentials) = &self.config.credentials {
            let mut credential = Credential::default();
            credential.username = Some(credentials.username.clone());
            credential.password = Some(credentials.password.clone());
            credential.source = credentials.source.clone();
            options.credential = Some(credential);
        }

        Ok(options)
    }
}

#[async_trait]
impl CollectionBackendBuilder for MongoCollectionBuilder {
    type Backend = MongoCollection;

    async fn build(self) -> BackendResult<Self::Backend> {
        self.config
            .validate()
            .map_err(|e| BackendError::new(e.to_string()))?;

        let client = Client::with_options(self.client_options().await?).map_err(backend_error)?;
        let collection = MongoCollection::new(client, &self.config.database, &self.config.collection);

        debug!(host = %self.config.host, port = self.config.port, namespace = %collection.namespace(), "client created");
        Ok(collection)
    }
}

/// Opens the configured collection and checks that the server answers a ping.
///
/// # Errors
///
/// Returns a validation error if the configuration names an unusable database or collection.
/// Returns [`ShelterError::Operation`](aac_crud_core::error::ShelterError::Operation) with
/// [`Operation::Connect`](aac_crud_core::error::Operation::Connect) if the client cannot be
/// created or the ping fails.
pub async fn connect(config: ConnectionConfig) -> ShelterResult<Repository<MongoCollection>> {
    config.validate()?;
    Repository::open(MongoCollection::builder(config)).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_client_options_apply_config() {
        let config = ConnectionConfig::new("db.example", 27018)
            .with_server_selection_timeout(Duration::from_millis(1500))
            .with_app_name("shelter-dashboard");
        let options = MongoCollection::builder(config).client_options().await.unwrap();

        assert_eq!(options.hosts.len(), 1);
        assert_eq!(options.hosts[0].to_string(), "db.example:27018");
        assert_eq!(options.server_selection_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(options.app_name.as_deref(), Some("shelter-dashboard"));
        assert!(options.credential.is_none());
    }

    #[tokio::test]
    async fn test_client_options_carry_optional_credentials() {
        let config = ConnectionConfig::default().with_credentials("aacuser", "secret");
        let options = MongoCollection::builder(config).client_options().await.unwrap();

        let credential = options.credential.unwrap();
        assert_eq!(credential.username.as_deref(), Some("aacuser"));
        assert_eq!(credential.password.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_build_targets_configured_namespace() {
        let config = ConnectionConfig::default().with_database("aac").with_collection("outcomes");
        let collection = MongoCollection::builder(config).build().await.unwrap();

        assert_eq!(collection.namespace(), "aac.outcomes");
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_names() {
        let config = ConnectionConfig::default().with_collection("system.profile");
        assert!(MongoCollection::builder(config).build().await.is_err());
    }
}
