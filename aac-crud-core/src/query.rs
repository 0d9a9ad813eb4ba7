//! Query arguments and their shape checks.
//!
//! Queries are plain BSON documents passed to the store verbatim. This module only
//! decides whether a caller-supplied value has the right *shape*:
//!
//! - [`require_document`] accepts any document, including `{}`
//! - [`require_non_empty_document`] additionally rejects `{}`, which would otherwise
//!   match (and mutate) the whole collection
//!
//! It also provides [`Projection`], a validated field-inclusion map, and [`by_id`] for
//! looking a document up by the identifier [`Repository::create`](crate::repository::Repository::create)
//! returned.

use bson::{oid::ObjectId, Bson, Document, doc};

use crate::error::{ShelterError, ShelterResult};

/// Name of the store-assigned identity field.
pub const ID_FIELD: &str = "_id";

/// Returns the value as a document, or a validation error built from `message`.
pub fn require_document(value: Bson, message: &str) -> ShelterResult<Document> {
    match value {
        Bson::Document(document) => Ok(document),
        _ => Err(ShelterError::validation(message)),
    }
}

/// Returns the value as a non-empty document, or a validation error built from `message`.
pub fn require_non_empty_document(value: Bson, message: &str) -> ShelterResult<Document> {
    match require_document(value, message)? {
        document if document.is_empty() => Err(ShelterError::validation(message)),
        document => Ok(document),
    }
}

/// Builds a filter matching the document whose identifier renders as `id`.
///
/// Identifiers that parse as an ObjectId hex string are matched as ObjectIds,
/// anything else as a plain string.
///
/// A string identifier chosen by the caller that happens to be 24 hex characters is
/// therefore looked up as an ObjectId and will not match; build `doc! { "_id": id }`
/// directly for those.
pub fn by_id(id: &str) -> Document {
    match ObjectId::parse_str(id) {
        Ok(oid) => doc! { ID_FIELD: oid },
        Err(_) => doc! { ID_FIELD: id },
    }
}

/// Renders an identity value the way callers see it.
pub fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        Bson::Int32(n) => n.to_string(),
        Bson::Int64(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// A field-inclusion map controlling which fields a read returns.
///
/// Every flag must be `0`/`1` (any integer width) or a boolean. Flags are normalised
/// to `0`/`1` on construction. The default projection hides the identity field.
///
/// # Example
///
/// ```ignore
/// use aac_crud_core::query::Projection;
/// use bson::doc;
///
/// let names_only = Projection::include(["name", "species"]);
/// let custom = Projection::new(doc! { "_id": 0, "name": 1 })?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Projection(Document);

impl Projection {
    /// Validates and normalises a projection document.
    pub fn new(document: Document) -> ShelterResult<Self> {
        let mut normalized = Document::new();

        for (field, flag) in document {
            let included = match flag {
                Bson::Int32(0) | Bson::Int64(0) | Bson::Boolean(false) => 0,
                Bson::Int32(1) | Bson::Int64(1) | Bson::Boolean(true) => 1,
                other => {
                    return Err(ShelterError::validation(format!(
                        "Projection flag for '{field}' must be 0 or 1, got {other}"
                    )));
                }
            };
            normalized.insert(field, included);
        }

        Ok(Projection(normalized))
    }

    /// The default projection, `{"_id": 0}`.
    pub fn exclude_id() -> Self {
        Projection(doc! { ID_FIELD: 0 })
    }

    /// Returns only the named fields, without the identity field.
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut document = doc! { ID_FIELD: 0 };
        for field in fields {
            document.insert(field.into(), 1);
        }
        Projection(document)
    }

    /// Returns every field, including the identity field.
    pub fn all() -> Self {
        Projection(Document::new())
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }

    pub fn into_document(self) -> Document {
        self.0
    }
}

impl Default for Projection {
    fn default() -> Self {
        Projection::exclude_id()
    }
}

impl TryFrom<Document> for Projection {
    type Error = ShelterError;

    fn try_from(document: Document) -> Result<Self, Self::Error> {
        Projection::new(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_document_rejects_non_documents() {
        for value in [Bson::String("dog".into()), Bson::Int32(1), Bson::Null, Bson::Array(vec![])] {
            let err = require_document(value, "query must be a document").unwrap_err();
            assert!(err.is_validation());
        }
        assert!(require_document(Bson::Document(doc! {}), "unused").is_ok());
    }

    #[test]
    fn test_require_non_empty_document() {
        assert!(require_non_empty_document(Bson::Document(doc! {}), "empty").unwrap_err().is_validation());
        assert_eq!(
            require_non_empty_document(Bson::Document(doc! { "name": "Rex" }), "unused").unwrap(),
            doc! { "name": "Rex" }
        );
    }

    #[test]
    fn test_by_id_parses_object_ids() {
        let oid = ObjectId::new();
        assert_eq!(by_id(&oid.to_hex()), doc! { "_id": oid });
        assert_eq!(by_id("A725717"), doc! { "_id": "A725717" });

        let hex_string_id = "0123456789abcdef01234567";
        assert_ne!(by_id(hex_string_id), doc! { "_id": hex_string_id });
        assert!(by_id(hex_string_id).get_object_id("_id").is_ok());
    }

    #[test]
    fn test_id_to_string() {
        let oid = ObjectId::new();
        assert_eq!(id_to_string(&Bson::ObjectId(oid)), oid.to_hex());
        assert_eq!(id_to_string(&Bson::String("A1".into())), "A1");
        assert_eq!(id_to_string(&Bson::Int64(42)), "42");
    }

    #[test]
    fn test_projection_normalizes_flags() {
        let projection = Projection::new(doc! { "_id": false, "name": 1_i64, "breed": true }).unwrap();
        assert_eq!(projection.as_document(), &doc! { "_id": 0, "name": 1, "breed": 1 });
    }

    #[test]
    fn test_projection_rejects_other_values() {
        assert!(Projection::new(doc! { "name": 2 }).unwrap_err().is_validation());
        assert!(Projection::new(doc! { "name": "yes" }).unwrap_err().is_validation());
    }

    #[test]
    fn test_projection_defaults() {
        assert_eq!(Projection::default().into_document(), doc! { "_id": 0 });
        assert_eq!(Projection::include(["name"]).into_document(), doc! { "_id": 0, "name": 1 });
        assert!(Projection::all().as_document().is_empty());
    }
}
