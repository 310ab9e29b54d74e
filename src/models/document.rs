//! Document envelopes exchanged with the AppDb document endpoints.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::dates::optional_timestamp;

/// A stored document as returned by the store.
///
/// `id` is assigned by the store on creation and never by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document<T> {
    pub id: String,
    pub content: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<i64>,
    #[serde(
        default,
        with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_on: Option<DateTime<FixedOffset>>,
    #[serde(
        default,
        with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_on: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datastore_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
}

impl<T> Document<T> {
    /// Drop the metadata, keeping the id for a later update.
    pub fn into_upsert(self) -> Upsert<T> {
        Upsert::Existing {
            id: self.id,
            content: self.content,
        }
    }
}

/// A value headed for a bulk or single upsert.
///
/// The variant, not field inspection, decides between update and create.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Upsert<T> {
    /// A document the store already knows; serialized as `{id, content}`.
    Existing { id: String, content: T },
    /// A document to be created; serialized as `{content}`.
    New { content: T },
}

impl<T> Upsert<T> {
    pub fn existing(id: impl Into<String>, content: T) -> Self {
        Upsert::Existing {
            id: id.into(),
            content,
        }
    }

    pub fn new(content: T) -> Self {
        Upsert::New { content }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Upsert::Existing { id, .. } => Some(id),
            Upsert::New { .. } => None,
        }
    }

    pub fn content(&self) -> &T {
        match self {
            Upsert::Existing { content, .. } | Upsert::New { content } => content,
        }
    }
}

impl<T> From<Document<T>> for Upsert<T> {
    fn from(doc: Document<T>) -> Self {
        doc.into_upsert()
    }
}

/// Result of a single-document upsert.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome<T> {
    /// Routed to update; the input is handed back unchanged.
    Updated { id: String, content: T },
    /// Routed to create; carries the server-issued document.
    Created(Document<T>),
}

impl<T> UpsertOutcome<T> {
    pub fn id(&self) -> &str {
        match self {
            UpsertOutcome::Updated { id, .. } => id,
            UpsertOutcome::Created(doc) => &doc.id,
        }
    }

    pub fn content(&self) -> &T {
        match self {
            UpsertOutcome::Updated { content, .. } => content,
            UpsertOutcome::Created(doc) => &doc.content,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, UpsertOutcome::Created(_))
    }
}

/// Body sent for single-document create and update.
#[derive(Debug, Serialize)]
pub(crate) struct ContentBody<'a, T> {
    pub content: &'a T,
}

/// Aggregate counts reported by bulk endpoints, e.g. `{"Created": 2}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResult {
    #[serde(rename = "Created", default, skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,
    #[serde(rename = "Updated", default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<u64>,
    #[serde(rename = "Deleted", default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<u64>,
}
