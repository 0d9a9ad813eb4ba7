//! MongoDB-style filter, projection and `$set` evaluation over in-memory documents.
//!
//! Supported filter syntax:
//!
//! - implicit equality, `{ "species": "dog" }`, which also matches array members
//! - dotted paths into embedded documents, `{ "location.city": "Austin" }`, including
//!   through arrays of embedded documents (`{ "shots.kind": "rabies" }`) and array indexes
//!   (`{ "tags.0": "friendly" }`)
//! - embedded-document equality that respects field order, as the server does
//! - field operators `$eq $ne $gt $gte $lt $lte $in $nin $exists`
//! - top-level `$and $or $nor`
//!
//! Anything else is reported as a backend error, the way the server rejects unknown operators.
//! Projections address top-level fields only.

use std::{borrow::Cow, cmp::Ordering};
use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use aac_crud_core::{
    error::{BackendError, BackendResult},
    query::ID_FIELD,
};


/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalised to f64 so `Int32(3)` equals `Double(3.0)`.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    ObjectId(ObjectId),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(Vec<(&'a str, Comparable<'a>)>),
    /// Values with no meaningful comparison (binary, regex, ...); never equal to anything.
    Opaque,
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<Vec<_>>()
            ),
            _ => Comparable::Opaque,
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Follows a dotted path through embedded documents.
///
/// A segment that meets an array either indexes it (numeric segment) or continues into
/// every embedded document in it, collecting the values found into one array.
fn lookup<'a>(document: &'a Document, path: &str) -> Option<Cow<'a, Bson>> {
    match path.split_once('.') {
        None => document.get(path).map(Cow::Borrowed),
        Some((head, rest)) => descend(document.get(head)?, rest),
    }
}

fn descend<'a>(value: &'a Bson, path: &str) -> Option<Cow<'a, Bson>> {
    match value {
        Bson::Document(inner) => lookup(inner, path),
        Bson::Array(items) => {
            let (head, rest) = path.split_once('.').map_or((path, None), |(h, r)| (h, Some(r)));

            if let Ok(index) = head.parse::<usize>() {
                let item = items.get(index)?;
                return match rest {
                    None => Some(Cow::Borrowed(item)),
                    Some(rest) => descend(item, rest),
                };
            }

            let found = items
                .iter()
                .filter_map(Bson::as_document)
                .filter_map(|item| lookup(item, path))
                .flat_map(|value| match value.into_owned() {
                    Bson::Array(inner) => inner,
                    other => vec![other],
                })
                .collect::<Vec<_>>();

            (!found.is_empty()).then(|| Cow::Owned(Bson::Array(found)))
        }
        _ => None,
    }
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        Bson::Null => false,
        _ => true,
    }
}

fn is_operator_document(condition: &Bson) -> bool {
    matches!(
        condition,
        Bson::Document(doc) if doc.keys().next().is_some_and(|k| k.starts_with('$'))
    )
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns `true` if the document satisfies every clause of `filter`.
    pub fn matches(&self, filter: &Document) -> BackendResult<bool> {
        for (key, condition) in filter {
            let matched = match key.as_str() {
                "$and" => self.clauses(key, condition)?.iter().try_fold(true, |acc, clause| {
                    Ok::<_, BackendError>(acc && self.matches(clause)?)
                })?,
                "$or" => self.clauses(key, condition)?.iter().try_fold(false, |acc, clause| {
                    Ok::<_, BackendError>(acc || self.matches(clause)?)
                })?,
                "$nor" => !self.clauses(key, condition)?.iter().try_fold(false, |acc, clause| {
                    Ok::<_, BackendError>(acc || self.matches(clause)?)
                })?,
                op if op.starts_with('$') => {
                    return Err(BackendError::new(format!("unknown top level operator: {op}")));
                }
                path => self.matches_field(lookup(self.document, path).as_deref(), condition)?,
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn clauses<'b>(&self, op: &str, condition: &'b Bson) -> BackendResult<Vec<&'b Document>> {
        let invalid = || BackendError::new(format!("{op} must be a nonempty array of documents"));

        match condition {
            Bson::Array(items) if !items.is_empty() => items
                .iter()
                .map(|item| item.as_document().ok_or_else(invalid))
                .collect(),
            _ => Err(invalid()),
        }
    }

    fn matches_field(&self, value: Option<&Bson>, condition: &Bson) -> BackendResult<bool> {
        let operators = match condition {
            Bson::Document(operators) if is_operator_document(condition) => operators,
            _ => return Ok(Self::equals(value, condition)),
        };

        for (op, operand) in operators {
            let matched = match op.as_str() {
                "$eq" => Self::equals(value, operand),
                "$ne" => !Self::equals(value, operand),
                "$gt" => Self::compare(value, operand, |o| o == Ordering::Greater),
                "$gte" => Self::compare(value, operand, |o| o != Ordering::Less),
                "$lt" => Self::compare(value, operand, |o| o == Ordering::Less),
                "$lte" => Self::compare(value, operand, |o| o != Ordering::Greater),
                "$in" => Self::any_of(value, operand)?,
                "$nin" => !Self::any_of(value, operand)?,
                "$exists" => value.is_some() == truthy(operand),
                other => return Err(BackendError::new(format!("unknown operator: {other}"))),
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn equals(value: Option<&Bson>, target: &Bson) -> bool {
        match (value, target) {
            (None, Bson::Null) => true,
            (None, _) => false,
            (Some(Bson::Array(items)), target) if !matches!(target, Bson::Array(_)) => items
                .iter()
                .any(|item| Comparable::from(item) == Comparable::from(target)),
            (Some(value), target) => Comparable::from(value) == Comparable::from(target),
        }
    }

    fn compare(value: Option<&Bson>, target: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
        let target = Comparable::from(target);
        let check = |candidate: &Bson| {
            Comparable::from(candidate)
                .partial_cmp(&target)
                .is_some_and(&accept)
        };

        match value {
            Some(Bson::Array(items)) => items.iter().any(check),
            Some(value) => check(value),
            None => false,
        }
    }

    fn any_of(value: Option<&Bson>, operand: &Bson) -> BackendResult<bool> {
        match operand {
            Bson::Array(targets) => Ok(targets.iter().any(|target| Self::equals(value, target))),
            _ => Err(BackendError::new("$in needs an array")),
        }
    }
}

/// Shapes `document` according to `projection`.
///
/// Non-`_id` flags must be all inclusions or all exclusions. The identity field is
/// returned unless explicitly excluded. A projection that only includes `_id` returns
/// nothing else.
pub(crate) fn project(document: &Document, projection: &Document) -> BackendResult<Document> {
    let include_id = projection.get(ID_FIELD).is_none_or(truthy);
    let id_included = projection.get(ID_FIELD).is_some_and(truthy);
    let mut included = Vec::new();
    let mut excluded = Vec::new();

    for (field, flag) in projection.iter().filter(|(field, _)| field.as_str() != ID_FIELD) {
        if truthy(flag) {
            included.push(field.as_str());
        } else {
            excluded.push(field.as_str());
        }
    }

    let inclusion = !included.is_empty() || (id_included && excluded.is_empty());

    match (inclusion, excluded.first()) {
        (true, Some(field)) => Err(BackendError::new(format!(
            "Cannot do exclusion on field {field} in inclusion projection"
        ))),
        (true, None) => Ok(document
            .iter()
            .filter(|(key, _)| {
                (key.as_str() == ID_FIELD && include_id) || included.contains(&key.as_str())
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()),
        (false, _) => Ok(document
            .iter()
            .filter(|(key, _)| {
                !(key.as_str() == ID_FIELD && !include_id) && !excluded.contains(&key.as_str())
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()),
    }
}

/// Applies `$set` semantics, returning `true` if any value actually changed.
pub(crate) fn apply_set(document: &mut Document, set: &Document) -> BackendResult<bool> {
    let mut changed = false;

    for (path, value) in set {
        if path.starts_with('$') || path.is_empty() {
            return Err(BackendError::new(format!("The update path '{path}' is not valid")));
        }
        if path == ID_FIELD && document.get(ID_FIELD) != Some(value) {
            return Err(BackendError::new(
                "Performing an update on the path '_id' would modify the immutable field '_id'",
            ));
        }

        let mut segments: Vec<&str> = path.split('.').collect();
        let leaf = segments.pop().unwrap_or_default();
        let mut target = &mut *document;

        for segment in segments {
            if !target.contains_key(segment) {
                target.insert(segment, Document::new());
            }
            target = match target.get_mut(segment) {
                Some(Bson::Document(inner)) => inner,
                _ => {
                    return Err(BackendError::new(format!(
                        "Cannot create field '{leaf}' in element {{{segment}: ...}}"
                    )));
                }
            };
        }

        if target.get(leaf) != Some(value) {
            target.insert(leaf, value.clone());
            changed = true;
        }
    }

    Ok(changed)
}
