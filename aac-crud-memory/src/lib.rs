//! In-memory collection backend for aac-crud.
//!
//! This crate provides a thread-safe, in-process implementation of the `CollectionBackend`
//! trait. It evaluates MongoDB-style filters, projections and `$set` updates itself, which
//! makes it a drop-in stand-in for a live collection in tests and offline tooling.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **Store ordering** - Documents are returned in insertion order
//! - **MongoDB filter subset** - Equality, comparison, membership, existence and logical operators
//! - **Failure simulation** - [`InMemoryCollection::unavailable`] behaves like an unreachable server
//!
//! # Quick Start
//!
//! ```ignore
//! use aac_crud_core::{query::by_id, repository::Repository};
//! use aac_crud_memory::InMemoryCollection;
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let shelter = Repository::connect(InMemoryCollection::new()).await?;
//!
//!     let id = shelter.create(doc! { "name": "Rex", "species": "dog" }).await?;
//!     assert!(shelter.read_one(by_id(&id), None).await?.is_some());
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as aac_crud_memory;

pub mod store;
pub(crate) mod evaluator;

pub use store::{InMemoryCollection, InMemoryCollectionBuilder};
