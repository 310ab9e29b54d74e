//! AppDb client library
//!
//! Typed access to the AppDb document-store HTTP API:
//! - [`AppDbClient`]: document CRUD, bulk, query and aggregation calls,
//!   collection administration, export and permissions
//! - [`TypedCollection`]: one collection read and written as a caller type
//! - [`dates`]: ISO-8601 date revival for JSON payloads
//! - [`MirrorStore`]: local SQLite mirror for offline access

pub mod client;
pub mod config;
pub mod dates;
pub mod error;
pub mod mirror;
pub mod models;
pub mod typed;

pub use client::{AggregationParams, AppDbClient, DEFAULT_BASE_URL};
pub use config::{Config, ConfigError, ConfigSource, ConfigValue};
pub use dates::{parse_iso8601, parse_revived, revive, Revived};
pub use error::{AppDbError, Result};
pub use mirror::{MirrorEntry, MirrorError, MirrorSchema, MirrorStore};
pub use models::{
    BulkResult, Collection, CollectionSchema, Column, DataType, Document, ExportStatus,
    Permission, PermissionLevel, SchemaDefinition, Upsert, UpsertOutcome,
};
pub use typed::{DocRef, DocumentMapper, FlattenedMapper, TypedCollection, DEFAULT_ID_FIELD};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
