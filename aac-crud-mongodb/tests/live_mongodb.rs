//! Tests against a running MongoDB server.
//!
//! Ignored by default. Run with `cargo test -p aac-crud-mongodb -- --ignored` after pointing
//! `AAC_MONGO_HOST` / `AAC_MONGO_PORT` at a server without access control.

use std::time::Duration;

use bson::{doc, oid::ObjectId};

use aac_crud_core::{
    config::ConnectionConfig,
    error::Operation,
    query::by_id,
    repository::Repository,
};
use aac_crud_mongodb::{MongoCollection, connect};

/// Opens a fresh, uniquely named collection so runs never see each other's documents.
///
/// Pair with [`discard`] so the collection does not outlive the test.
async fn scratch_shelter() -> Repository<MongoCollection> {
    let config = ConnectionConfig::from_env()
        .unwrap()
        .with_database("aac_test")
        .with_collection(format!("animals_{}", ObjectId::new().to_hex()));

    connect(config).await.unwrap()
}

/// Drops the scratch collection and closes the client.
async fn discard(shelter: Repository<MongoCollection>) {
    shelter.backend().drop_collection().await.unwrap();
    shelter.shutdown().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn test_create_read_delete_scenario() {
    let shelter = scratch_shelter().await;

    let id = shelter.create(doc! { "name": "Rex", "species": "dog" }).await.unwrap();
    assert!(!id.is_empty());

    let rex = shelter.read_one(by_id(&id), None).await.unwrap().unwrap();
    assert_eq!(rex.get_str("name").unwrap(), "Rex");
    assert!(rex.get("_id").is_none());

    assert_eq!(shelter.delete(by_id(&id), false).await.unwrap(), 1);
    assert!(shelter.read_one(by_id(&id), None).await.unwrap().is_none());

    discard(shelter).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn test_update_limit_and_count() {
    let shelter = scratch_shelter().await;

    for name in ["Rex", "Bella", "Max"] {
        shelter.create(doc! { "name": name, "species": "dog", "status": "intake" }).await.unwrap();
    }
    shelter.create(doc! { "name": "Milo", "species": "cat", "status": "intake" }).await.unwrap();

    assert_eq!(shelter.read(Some(doc! { "species": "dog" }.into()), None, Some(2)).await.unwrap().len(), 2);

    let modified = shelter.update(doc! { "species": "dog" }, doc! { "status": "adopted" }, true).await.unwrap();
    assert_eq!(modified, 3);
    assert_eq!(shelter.count(Some(doc! { "status": "adopted" }.into())).await.unwrap(), 3);

    assert_eq!(shelter.count(None).await.unwrap(), 4);
    assert_eq!(shelter.delete(doc! { "species": "dog" }, false).await.unwrap(), 1);
    assert_eq!(shelter.count(None).await.unwrap(), 3);

    discard(shelter).await;
}

#[tokio::test]
#[ignore = "waits for the server selection timeout"]
async fn test_unreachable_server_fails_fast() {
    let config = ConnectionConfig::new("127.0.0.1", 1)
        .with_server_selection_timeout(Duration::from_millis(200));

    let err = connect(config).await.unwrap_err();
    assert_eq!(err.failed_operation(), Some(Operation::Connect));
    assert!(err.to_string().starts_with("MongoDB connection failed:"));
}
