//! Validated CRUD access to a single document collection.
//!
//! This crate is the core of the aac-crud project and provides:
//!
//! - **Repository** ([`repository`]) - Create, read, update, delete and count with input validation
//! - **Backend abstraction** ([`backend`]) - The trait a concrete collection (MongoDB, in-memory) implements
//! - **Query arguments** ([`query`]) - Shape checks, projections and identifier filters
//! - **Configuration** ([`config`]) - Which server, database and collection to open
//! - **Error handling** ([`error`]) - The two-kind error type (validation vs. operation failure)
//!
//! # Example
//!
//! ```ignore
//! use aac_crud_core::{query::by_id, repository::Repository};
//! use bson::doc;
//!
//! let shelter = Repository::connect(backend).await?;
//! let id = shelter.create(doc! { "name": "Rex", "species": "dog" }).await?;
//!
//! assert!(shelter.read_one(by_id(&id), None).await?.is_some());
//! ```

#[allow(unused_extern_crates)]
extern crate self as aac_crud_core;

pub mod backend;
pub mod config;
pub mod error;
pub mod query;
pub mod repository;
