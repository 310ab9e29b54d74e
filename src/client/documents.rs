//! Document CRUD, bulk and query operations.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use super::{require_document_id, require_non_empty, AggregationParams, AppDbClient};
use crate::error::{AppDbError, Result};
use crate::models::{BulkResult, ContentBody, Document, Upsert, UpsertOutcome};

impl AppDbClient {
    /// Retrieves every document in a collection.
    pub async fn fetch_all<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<Document<T>>> {
        require_non_empty(collection, "collection name")?;
        let url = self.documents_url(collection);
        let response = self
            .send(self.request(Method::GET, &url), collection)
            .await?;
        self.read_json(response).await
    }

    /// Retrieves one document by id.
    pub async fn fetch_one<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Document<T>> {
        require_non_empty(collection, "collection name")?;
        require_document_id(id)?;
        let url = self.document_url(collection, id);
        let response = self
            .send(self.request(Method::GET, &url), &document_subject(collection, id))
            .await?;
        self.read_json(response).await
    }

    /// Creates a document and returns it with its store-assigned id.
    pub async fn create<T>(&self, collection: &str, content: &T) -> Result<Document<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        require_non_empty(collection, "collection name")?;
        // The store expects the trailing slash on create
        let url = format!("{}/", self.documents_url(collection));
        let response = self
            .send(
                self.request(Method::POST, &url).json(&ContentBody { content }),
                collection,
            )
            .await?;
        self.read_json(response).await
    }

    /// Replaces the content of an existing document.
    ///
    /// Fails with a validation error, before any request, when `id` is empty.
    pub async fn update<T: Serialize>(&self, collection: &str, id: &str, content: &T) -> Result<()> {
        require_document_id(id)?;
        require_non_empty(collection, "collection name")?;
        let url = self.document_url(collection, id);
        self.send(
            self.request(Method::PUT, &url).json(&ContentBody { content }),
            &document_subject(collection, id),
        )
        .await?;
        Ok(())
    }

    /// Deletes a document. Deleting an id twice surfaces the store's 404.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        require_document_id(id)?;
        require_non_empty(collection, "collection name")?;
        let url = self.document_url(collection, id);
        self.send(
            self.request(Method::DELETE, &url),
            &document_subject(collection, id),
        )
        .await?;
        Ok(())
    }

    /// Updates an existing document or creates a new one, by variant.
    ///
    /// `Upsert::Existing` is handed back unchanged after the update;
    /// `Upsert::New` yields the server-issued document.
    pub async fn upsert<T>(&self, collection: &str, doc: Upsert<T>) -> Result<UpsertOutcome<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        match doc {
            Upsert::Existing { id, content } => {
                self.update(collection, &id, &content).await?;
                Ok(UpsertOutcome::Updated { id, content })
            }
            Upsert::New { content } => {
                let created = self.create(collection, &content).await?;
                Ok(UpsertOutcome::Created(created))
            }
        }
    }

    /// Creates many documents in one request; body is `[{content}, ...]`.
    pub async fn bulk_create<T: Serialize>(&self, collection: &str, contents: &[T]) -> Result<BulkResult> {
        require_non_empty(collection, "collection name")?;
        let body: Vec<ContentBody<'_, T>> =
            contents.iter().map(|content| ContentBody { content }).collect();
        let url = format!("{}/bulk", self.documents_url(collection));
        let response = self
            .send(self.request(Method::POST, &url).json(&body), collection)
            .await?;
        self.read_json(response).await
    }

    /// Creates or updates many documents in one request.
    ///
    /// Only aggregate counts come back; per-item failures are not reported.
    pub async fn bulk_upsert<T: Serialize>(&self, collection: &str, docs: &[Upsert<T>]) -> Result<BulkResult> {
        require_non_empty(collection, "collection name")?;
        if docs.iter().any(|d| matches!(d.id(), Some(id) if id.trim().is_empty())) {
            return Err(AppDbError::missing_document_id());
        }
        let url = format!("{}/bulk", self.documents_url(collection));
        let response = self
            .send(self.request(Method::PUT, &url).json(docs), collection)
            .await?;
        self.read_json(response).await
    }

    /// Deletes many documents with a single `?ids=a,b,c` request.
    pub async fn bulk_delete<S: AsRef<str>>(&self, collection: &str, ids: &[S]) -> Result<BulkResult> {
        require_non_empty(collection, "collection name")?;
        if ids.is_empty() {
            return Err(AppDbError::missing_document_id());
        }
        for id in ids {
            require_document_id(id.as_ref())?;
        }
        let joined = ids
            .iter()
            .map(|id| urlencoding::encode(id.as_ref()).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/bulk?ids={}", self.documents_url(collection), joined);
        let response = self
            .send(self.request(Method::DELETE, &url), collection)
            .await?;
        self.read_json(response).await
    }

    /// Runs a store-defined query; the query object is sent as-is.
    pub async fn query<T: DeserializeOwned>(&self, collection: &str, query: &Value) -> Result<Vec<Document<T>>> {
        require_non_empty(collection, "collection name")?;
        let url = format!("{}/query", self.documents_url(collection));
        let response = self
            .send(self.request(Method::POST, &url).json(query), collection)
            .await?;
        self.read_json(response).await
    }

    /// Runs a query with aggregation parameters.
    ///
    /// Rows decode into any `R`; use [`crate::dates::Revived`] to get native dates.
    pub async fn query_aggregation<R: DeserializeOwned>(
        &self,
        collection: &str,
        query: &Value,
        params: &AggregationParams,
    ) -> Result<Vec<R>> {
        require_non_empty(collection, "collection name")?;
        let url = aggregation_url(&self.documents_url(collection), params);
        let response = self
            .send(self.request(Method::POST, &url).json(query), collection)
            .await?;
        self.read_json(response).await
    }

    /// Partially updates every document matched by `query`.
    ///
    /// Both `query` and `operation` are serialized to JSON text and then
    /// embedded as strings in the outer body, as the store expects.
    pub async fn update_where(&self, collection: &str, query: &Value, operation: &Value) -> Result<Value> {
        require_non_empty(collection, "collection name")?;
        let body = update_where_body(query, operation)?;
        let url = format!("{}/update", self.documents_url(collection));
        let response = self
            .send(self.request(Method::PUT, &url).json(&body), collection)
            .await?;

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

fn document_subject(collection: &str, id: &str) -> String {
    format!("document '{}' in collection '{}'", id, collection)
}

fn aggregation_url(documents_url: &str, params: &AggregationParams) -> String {
    let query_string = params.to_query_string();
    if query_string.is_empty() {
        format!("{}/query", documents_url)
    } else {
        format!("{}/query?{}", documents_url, query_string)
    }
}

fn update_where_body(query: &Value, operation: &Value) -> Result<Value> {
    Ok(json!({
        "query": serde_json::to_string(query)?,
        "operation": serde_json::to_string(operation)?,
    }))
}
