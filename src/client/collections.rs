//! Collection administration and manual export.

use reqwest::{Method, StatusCode};

use super::{error_body, require_non_empty, status_error, AppDbClient};
use crate::error::Result;
use crate::models::{Collection, CollectionSchema, ExportStatus};

impl AppDbClient {
    /// Creates a collection from a schema.
    pub async fn create_collection(&self, schema: &CollectionSchema) -> Result<Collection> {
        require_non_empty(&schema.name, "collection name")?;
        let url = format!("{}/", self.collections_url());
        let response = self
            .send(self.request(Method::POST, &url).json(schema), &schema.name)
            .await?;
        self.read_json(response).await
    }

    /// Replaces the schema of the collection named in `schema`.
    pub async fn update_collection(&self, schema: &CollectionSchema) -> Result<Collection> {
        require_non_empty(&schema.name, "collection name")?;
        let url = self.collection_url(&schema.name);
        let response = self
            .send(self.request(Method::PUT, &url).json(schema), &schema.name)
            .await?;
        self.read_json(response).await
    }

    /// Deletes a collection and all of its documents.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        require_non_empty(name, "collection name")?;
        let url = self.collection_url(name);
        self.send(self.request(Method::DELETE, &url), name).await?;
        Ok(())
    }

    /// Triggers an export of sync-enabled collections to the data center.
    ///
    /// 200 means the export started, 423 Locked means one is already
    /// running; any other status is an error carrying the status text.
    pub async fn start_export(&self) -> Result<ExportStatus> {
        let url = self.export_url();
        let response = self.request(Method::POST, &url).send().await?;

        match response.status() {
            StatusCode::OK => Ok(ExportStatus::Started),
            StatusCode::LOCKED => {
                tracing::debug!("AppDb export already in progress");
                Ok(ExportStatus::AlreadyInProgress)
            }
            status => {
                let body = error_body(response).await;
                tracing::debug!(status = status.as_u16(), "AppDb export request failed");
                Err(status_error(status, &body))
            }
        }
    }
}
