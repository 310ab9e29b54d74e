//! Typed view over one collection.
//!
//! [`TypedCollection`] binds a client, a collection name and a
//! [`DocumentMapper`] that converts between the store's `{id, content}`
//! envelope and the caller's own value type.
//!
//! ```no_run
//! use appdb::{AppDbClient, FlattenedMapper, TypedCollection};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Task {
//!     #[serde(default, skip_serializing_if = "Option::is_none")]
//!     app_db_doc_id: Option<String>,
//!     title: String,
//! }
//!
//! # async fn run() -> appdb::Result<()> {
//! let client = AppDbClient::new("https://example.domo.com/domo/datastores/v1");
//! let tasks = TypedCollection::new(client, "Tasks", FlattenedMapper::default());
//! let created: Task = tasks.create(&Task { app_db_doc_id: None, title: "write docs".into() }).await?;
//! assert!(created.app_db_doc_id.is_some());
//! # Ok(())
//! # }
//! ```

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::{AggregationParams, AppDbClient};
use crate::error::{AppDbError, Result};
use crate::models::{BulkResult, Document, Upsert};

/// Field the flattened mapper stores the document id under by default.
pub const DEFAULT_ID_FIELD: &str = "appDbDocId";

/// Converts between store envelopes and a caller-defined value type.
pub trait DocumentMapper<T> {
    /// Shape persisted as the document's `content`.
    type Content: Serialize + DeserializeOwned;

    /// Builds a value from a stored document's id and content.
    fn from_document(&self, id: String, content: Self::Content) -> Result<T>;

    /// Produces the content to persist for a value.
    fn to_content(&self, value: &T) -> Result<Self::Content>;

    /// The store-assigned id carried by a value, if it has one.
    fn document_id(&self, value: &T) -> Option<String>;
}

/// Maps `{id, content}` to `{...content, <id_field>: id}` and back.
///
/// Works for any serde type whose serialized form is a JSON object.
#[derive(Debug, Clone)]
pub struct FlattenedMapper {
    id_field: String,
}

impl FlattenedMapper {
    pub fn new(id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
        }
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    fn to_object<T: Serialize>(&self, value: &T) -> Result<Map<String, Value>> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(map),
            other => Err(AppDbError::Validation(format!(
                "flattened documents must serialize to a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl Default for FlattenedMapper {
    fn default() -> Self {
        Self::new(DEFAULT_ID_FIELD)
    }
}

impl<T> DocumentMapper<T> for FlattenedMapper
where
    T: Serialize + DeserializeOwned,
{
    type Content = Map<String, Value>;

    fn from_document(&self, id: String, mut content: Self::Content) -> Result<T> {
        content.insert(self.id_field.clone(), Value::String(id));
        Ok(serde_json::from_value(Value::Object(content))?)
    }

    fn to_content(&self, value: &T) -> Result<Self::Content> {
        let mut map = self.to_object(value)?;
        map.remove(&self.id_field);
        Ok(map)
    }

    fn document_id(&self, value: &T) -> Option<String> {
        let map = self.to_object(value).ok()?;
        match map.get(&self.id_field) {
            Some(Value::String(id)) if !id.trim().is_empty() => Some(id.clone()),
            _ => None,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Either a raw document id or a value carrying one.
#[derive(Debug)]
pub enum DocRef<'a, T> {
    Id(&'a str),
    Value(&'a T),
}

impl<'a, T> From<&'a str> for DocRef<'a, T> {
    fn from(id: &'a str) -> Self {
        DocRef::Id(id)
    }
}

impl<T> Clone for DocRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for DocRef<'_, T> {}

/// A collection whose documents are read and written as `T`.
pub struct TypedCollection<T, M> {
    client: AppDbClient,
    name: String,
    mapper: M,
    _value: PhantomData<fn() -> T>,
}

impl<T, M> TypedCollection<T, M>
where
    M: DocumentMapper<T>,
{
    pub fn new(client: AppDbClient, name: impl Into<String>, mapper: M) -> Self {
        Self {
            client,
            name: name.into(),
            mapper,
            _value: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &AppDbClient {
        &self.client
    }

    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    fn hydrate(&self, doc: Document<M::Content>) -> Result<T> {
        self.mapper.from_document(doc.id, doc.content)
    }

    fn hydrate_all(&self, docs: Vec<Document<M::Content>>) -> Result<Vec<T>> {
        docs.into_iter().map(|doc| self.hydrate(doc)).collect()
    }

    fn resolve_id(&self, target: DocRef<'_, T>) -> Result<String> {
        let id = match target {
            DocRef::Id(id) => Some(id.to_string()),
            DocRef::Value(value) => self.mapper.document_id(value),
        };
        match id {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(AppDbError::missing_document_id()),
        }
    }

    /// Retrieves every document in the collection.
    pub async fn fetch_all(&self) -> Result<Vec<T>> {
        let docs = self.client.fetch_all::<M::Content>(&self.name).await?;
        self.hydrate_all(docs)
    }

    /// Retrieves one document by its store id.
    pub async fn fetch_one(&self, id: &str) -> Result<T> {
        let doc = self.client.fetch_one::<M::Content>(&self.name, id).await?;
        self.hydrate(doc)
    }

    /// Stores `value` as a new document and returns it with its new id.
    pub async fn create(&self, value: &T) -> Result<T> {
        let content = self.mapper.to_content(value)?;
        let doc = self.client.create(&self.name, &content).await?;
        self.hydrate(doc)
    }

    /// Writes `value` over the document it identifies.
    pub async fn update(&self, value: &T) -> Result<()> {
        let id = self.resolve_id(DocRef::Value(value))?;
        let content = self.mapper.to_content(value)?;
        self.client.update(&self.name, &id, &content).await
    }

    /// Deletes by raw id or by a value that carries one.
    pub async fn delete(&self, target: DocRef<'_, T>) -> Result<()> {
        let id = self.resolve_id(target)?;
        self.client.delete(&self.name, &id).await
    }

    /// Not supported on typed collections; use `create`/`update` or `bulk_upsert`.
    pub async fn upsert(&self, _value: &T) -> Result<T> {
        Err(AppDbError::NotImplemented("upsert"))
    }

    /// Creates values without an id and updates those with one, in one request.
    pub async fn bulk_upsert(&self, values: &[T]) -> Result<BulkResult> {
        let docs = values
            .iter()
            .map(|value| {
                let content = self.mapper.to_content(value)?;
                Ok(match self.mapper.document_id(value) {
                    Some(id) => Upsert::Existing { id, content },
                    None => Upsert::New { content },
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.client.bulk_upsert(&self.name, &docs[..]).await
    }

    /// Deletes every referenced document in one request.
    ///
    /// Fails before sending anything if the list is empty or any reference
    /// has no id.
    pub async fn bulk_delete(&self, targets: &[DocRef<'_, T>]) -> Result<BulkResult> {
        let ids = targets
            .iter()
            .map(|target| self.resolve_id(*target))
            .collect::<Result<Vec<_>>>()?;
        self.client.bulk_delete(&self.name, &ids[..]).await
    }

    /// Runs a store-defined query.
    pub async fn query(&self, query: &Value) -> Result<Vec<T>> {
        let docs = self.client.query::<M::Content>(&self.name, query).await?;
        self.hydrate_all(docs)
    }

    /// Runs an aggregation query; rows are returned as the store sends them.
    pub async fn query_aggregation<R: DeserializeOwned>(
        &self,
        query: &Value,
        params: &AggregationParams,
    ) -> Result<Vec<R>> {
        self.client.query_aggregation(&self.name, query, params).await
    }

    /// Partially updates every document matched by `query`.
    pub async fn update_where(&self, query: &Value, operation: &Value) -> Result<Value> {
        self.client.update_where(&self.name, query, operation).await
    }
}
