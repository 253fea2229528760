//! Document collection interface and query helpers

use std::{cmp::Ordering, collections::VecDeque};

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A stored document. Always a JSON object; `_id` is its key.
pub type Document = Value;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Projection, ordering and pagination for [`Collection::find`]
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Fields to keep (`_id` is always kept)
    pub projection: Option<Vec<String>>,
    pub sort: Option<(String, SortOrder)>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn projection<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some((field.into(), order));
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Results of a [`Collection::find`], consumed one at a time or all at once
#[derive(Debug, Default)]
pub struct Cursor {
    docs: VecDeque<Document>,
}

impl Cursor {
    pub fn new(docs: Vec<Document>) -> Self {
        Self { docs: docs.into() }
    }

    /// An exhausted cursor
    pub fn empty() -> Self {
        Self::default()
    }

    /// Remaining documents
    pub fn to_vec(self) -> Vec<Document> {
        self.docs.into()
    }

    /// Deserialize the remaining documents
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        self.docs
            .into_iter()
            .map(|d| serde_json::from_value(d).map_err(Error::from))
            .collect()
    }
}

impl Iterator for Cursor {
    type Item = Document;

    fn next(&mut self) -> Option<Document> {
        self.docs.pop_front()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneResult {
    pub inserted_id: Value,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsertManyResult {
    pub inserted_ids: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// Asynchronous document collection.
///
/// Filters are objects whose fields must all equal the document's
/// fields; an empty object or `null` matches everything.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Collection name
    fn name(&self) -> &str;

    async fn find_one(&self, filter: &Document) -> Result<Option<Document>>;

    async fn find(&self, filter: &Document, options: FindOptions) -> Result<Cursor>;

    /// Insert a document, assigning an `_id` if it has none
    async fn insert_one(&self, document: Document) -> Result<InsertOneResult>;

    async fn insert_many(&self, documents: Vec<Document>) -> Result<InsertManyResult>;

    /// Apply `$set` / `$unset` to the first matching document
    async fn update_one(&self, filter: &Document, update: &Document) -> Result<UpdateResult>;

    /// Replace the first matching document, keeping its `_id`
    async fn replace_one(&self, filter: &Document, replacement: Document) -> Result<UpdateResult>;

    async fn delete_one(&self, filter: &Document) -> Result<DeleteResult>;

    async fn delete_many(&self, filter: &Document) -> Result<DeleteResult>;

    async fn count_documents(&self, filter: &Document) -> Result<u64>;

    /// Distinct values of `field` among matching documents
    async fn distinct(&self, field: &str, filter: &Document) -> Result<Vec<Value>>;

    /// Create an index over `keys`, returning its name
    async fn create_index(&self, keys: &[(&str, SortOrder)]) -> Result<String>;
}

/// Whether `document` satisfies `filter`
pub fn matches_filter(document: &Document, filter: &Document) -> Result<bool> {
    match filter {
        Value::Null => Ok(true),
        Value::Object(fields) => Ok(fields
            .iter()
            .all(|(key, expected)| document.get(key) == Some(expected))),
        other => Err(Error::InvalidFilter(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Check that a filter is well formed without evaluating it
pub fn validate_filter(filter: &Document) -> Result<()> {
    matches_filter(&Value::Null, filter).map(|_| ())
}

/// Apply a `$set` / `$unset` update in place. Returns whether anything changed.
pub fn apply_update(document: &mut Document, update: &Document) -> Result<bool> {
    let ops = update
        .as_object()
        .ok_or_else(|| Error::InvalidUpdate("expected an object".to_string()))?;
    if ops.is_empty() || ops.keys().any(|k| k != "$set" && k != "$unset") {
        return Err(Error::InvalidUpdate(
            "only $set and $unset are supported".to_string(),
        ));
    }
    let fields = document
        .as_object_mut()
        .ok_or_else(|| Error::InvalidDocument("expected an object".to_string()))?;

    let mut changed = false;
    if let Some(set) = ops.get("$set").and_then(Value::as_object) {
        for (key, value) in set {
            if fields.get(key) != Some(value) {
                fields.insert(key.clone(), value.clone());
                changed = true;
            }
        }
    }
    if let Some(unset) = ops.get("$unset").and_then(Value::as_object) {
        for key in unset.keys() {
            changed |= fields.remove(key).is_some();
        }
    }
    Ok(changed)
}

/// Keep only `fields` (plus `_id`)
pub fn project(document: &Document, fields: &[String]) -> Document {
    let Some(source) = document.as_object() else {
        return document.clone();
    };
    let projected: Map<String, Value> = source
        .iter()
        .filter(|(key, _)| key.as_str() == "_id" || fields.iter().any(|f| f == *key))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Value::Object(projected)
}

/// Order two JSON values: null < bool < number < string, others equal
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Index name for a key list, e.g. `updatedAt_-1_userId_1`
pub fn index_name(keys: &[(&str, SortOrder)]) -> String {
    keys.iter()
        .map(|(field, order)| match order {
            SortOrder::Ascending => format!("{}_1", field),
            SortOrder::Descending => format!("{}_-1", field),
        })
        .collect::<Vec<_>>()
        .join("_")
}
