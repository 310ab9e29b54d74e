//! HTTP client for the AppDb datastore API.
//!
//! One [`AppDbClient`] covers the whole REST surface:
//! - document CRUD, bulk and query operations (`documents.rs`)
//! - collection administration and export (`collections.rs`)
//! - collection-level permissions (`permissions.rs`)
//!
//! Every call is a single request/response pair. There is no retry, no
//! backoff and no client-side timeout; a non-success status aborts the call.

mod aggregation;
mod collections;
mod documents;
mod permissions;

pub use aggregation::AggregationParams;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::dates::normalize_dates;
use crate::error::{AppDbError, Result};

/// Default datastore root used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/domo/datastores/v1";

/// Stateless client for one AppDb datastore.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct AppDbClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    parse_dates: bool,
}

impl AppDbClient {
    /// Creates a client rooted at `base_url` (e.g. `https://host/domo/datastores/v1`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    /// Creates a client that sends requests through a caller-built `reqwest::Client`.
    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            api_token: None,
            parse_dates: false,
        }
    }

    /// Creates a client from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        let mut client = Self::new(config.base_url.value.clone())
            .with_date_parsing(config.parse_dates.value);
        if let Some(token) = &config.api_token {
            client = client.with_api_token(token.clone());
        }
        client
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Revive ISO-8601 strings in response bodies before decoding.
    ///
    /// Every string that is entirely a date-time is rewritten to RFC 3339,
    /// including values headed for plain `String` fields: `"2024-03-04T10:15"`
    /// comes back as `"2024-03-04T10:15:00+00:00"`. Date-only strings are left
    /// as they are.
    pub fn with_date_parsing(mut self, enabled: bool) -> Self {
        self.parse_dates = enabled;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn parses_dates(&self) -> bool {
        self.parse_dates
    }

    fn collections_url(&self) -> String {
        format!("{}/collections", self.base_url)
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.collections_url(), urlencoding::encode(collection))
    }

    fn documents_url(&self, collection: &str) -> String {
        format!("{}/documents", self.collection_url(collection))
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.documents_url(collection),
            urlencoding::encode(id)
        )
    }

    fn export_url(&self) -> String {
        format!("{}/export", self.base_url)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        tracing::debug!(%method, %url, "AppDb request");
        let builder = self.http.request(method, url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and turns any non-success status into an error.
    ///
    /// `subject` names what was addressed, for the `NotFound` message.
    async fn send(&self, builder: RequestBuilder, subject: &str) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = error_body(response).await;
        tracing::debug!(status = status.as_u16(), %subject, "AppDb request failed");

        if status == StatusCode::NOT_FOUND {
            return Err(AppDbError::NotFound(subject.to_string()));
        }
        Err(status_error(status, &body))
    }

    /// Decodes a response body, reviving dates first when enabled.
    async fn read_json<R: DeserializeOwned>(&self, response: Response) -> Result<R> {
        let text = response.text().await?;
        if self.parse_dates {
            let mut value: serde_json::Value = serde_json::from_str(&text)?;
            normalize_dates(&mut value);
            Ok(serde_json::from_value(value)?)
        } else {
            Ok(serde_json::from_str(&text)?)
        }
    }
}

/// Reads the body of a failed response; an unreadable body counts as empty.
async fn error_body(response: Response) -> String {
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(error = %e, "Could not read AppDb error body");
            String::new()
        }
    }
}

fn status_error(status: StatusCode, body: &str) -> AppDbError {
    let reason = status.canonical_reason().unwrap_or("Unknown status");
    let message = if body.trim().is_empty() {
        reason.to_string()
    } else {
        format!("{}: {}", reason, body.trim())
    };
    AppDbError::Transport {
        status: Some(status.as_u16()),
        message,
    }
}

fn require_non_empty(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppDbError::Validation(format!("missing {}", what)));
    }
    Ok(())
}

fn require_document_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(AppDbError::missing_document_id());
    }
    Ok(())
}
