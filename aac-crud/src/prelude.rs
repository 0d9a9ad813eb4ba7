//! Convenient re-exports of commonly used types from aac-crud.
//!
//! ```ignore
//! use aac_crud::prelude::*;
//! ```
//!
//! This provides access to:
//! - The repository and its backend traits
//! - Connection configuration
//! - Projections and query helpers
//! - Error types
//! - BSON document construction

pub use aac_crud_core::{
    repository::Repository,
    backend::{CollectionBackend, CollectionBackendBuilder, UpdateOutcome},
    config::{ConnectionConfig, Credentials},
    query::{Projection, by_id, ID_FIELD},
    error::{Operation, ShelterError, ShelterResult},
};
pub use bson::{Bson, Document, doc};
