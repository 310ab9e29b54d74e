mod collection;
mod document;
mod permission;

pub use collection::{Collection, CollectionSchema, Column, DataType, ExportStatus, SchemaDefinition};
pub(crate) use document::ContentBody;
pub use document::{BulkResult, Document, Upsert, UpsertOutcome};
pub use permission::{Permission, PermissionLevel};
