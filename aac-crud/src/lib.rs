//! Validated CRUD access to the AAC animal shelter collection.
//!
//! This crate is the primary entry point. It re-exports the repository, configuration and
//! error types from `aac-crud-core` and gives access to the available backends.
//!
//! # Features
//!
//! - **Defensive validation** - Malformed or empty arguments are rejected before the store is touched
//! - **No accidental mass writes** - Update and delete refuse an empty query
//! - **Two-kind errors** - [`ShelterError::Validation`](error::ShelterError::Validation) vs.
//!   [`ShelterError::Operation`](error::ShelterError::Operation)
//! - **Pluggable backends** - MongoDB (feature `mongodb`, on by default) and in-memory
//!
//! # Quick Start
//!
//! ```ignore
//! use aac_crud::{prelude::*, mongodb::connect};
//!
//! #[tokio::main]
//! async fn main() -> ShelterResult<()> {
//!     let shelter = connect(ConnectionConfig::default()).await?;
//!
//!     let id = shelter.create(doc! { "name": "Rex", "species": "dog" }).await?;
//!     let rex = shelter.read_one(by_id(&id), None).await?;
//!     println!("{rex:?}");
//!
//!     let adopted = shelter
//!         .update(doc! { "species": "dog" }, doc! { "status": "adopted" }, true)
//!         .await?;
//!     println!("{adopted} dogs adopted");
//!
//!     assert_eq!(shelter.delete(by_id(&id), false).await?, 1);
//!     shelter.shutdown().await
//! }
//! ```
//!
//! # Testing Without a Server
//!
//! Any code written against [`Repository`](repository::Repository) runs unchanged over the
//! in-memory backend:
//!
//! ```ignore
//! use aac_crud::{prelude::*, memory::InMemoryCollection};
//!
//! let shelter = Repository::connect(InMemoryCollection::new()).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as aac_crud;

pub mod prelude;

pub use aac_crud_core::{backend, config, error, query, repository};

// Re-export BSON types for convenience
pub use bson;

/// In-memory collection backend.
pub mod memory {
    pub use aac_crud_memory::{InMemoryCollection, InMemoryCollectionBuilder};
}

/// MongoDB collection backend.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use aac_crud_mongodb::{MongoCollection, MongoCollectionBuilder, connect};

    /// The repository over the AAC MongoDB collection.
    pub type AnimalShelter = aac_crud_core::repository::Repository<MongoCollection>;
}
