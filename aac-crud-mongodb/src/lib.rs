//! MongoDB backend implementation for aac-crud.
//!
//! This crate provides a MongoDB-based implementation of the `CollectionBackend` trait,
//! delegating every repository operation to the driver's native collection API.
//!
//! To use this backend through the facade crate, enable the `mongodb` feature:
//!
//! ```toml
//! [dependencies]
//! aac-crud = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! The client is configured from a [`ConnectionConfig`](aac_crud_core::config::ConnectionConfig):
//! the connection string is `mongodb://<host>:<port>/` with no credentials embedded, the
//! server-selection timeout defaults to five seconds, and credentials are only attached to
//! the client options when configured. [`connect`] pings the `admin` database before
//! returning, so an unreachable server fails fast.
//!
//! # Example
//!
//! ```ignore
//! use aac_crud_core::config::ConnectionConfig;
//! use aac_crud_mongodb::connect;
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let shelter = connect(ConnectionConfig::default()).await?;
//!     let dogs = shelter.count(Some(doc! { "animal_type": "Dog" }.into())).await?;
//!
//!     println!("{dogs} dogs in the shelter");
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as aac_crud_mongodb;

pub mod store;

pub use store::{MongoCollection, MongoCollectionBuilder, connect};
