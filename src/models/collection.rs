//! Collection schemas and server-side collection metadata.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::dates::optional_timestamp;

/// Column data types understood by AppDb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    String,
    Long,
    Double,
    Decimal,
    /// `YYYY-MM-DD`
    Date,
    /// `YYYY-MM-DDTHH:MM:SSZ`
    Datetime,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::String => write!(f, "STRING"),
            DataType::Long => write!(f, "LONG"),
            DataType::Double => write!(f, "DOUBLE"),
            DataType::Decimal => write!(f, "DECIMAL"),
            DataType::Date => write!(f, "DATE"),
            DataType::Datetime => write!(f, "DATETIME"),
        }
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STRING" => Ok(DataType::String),
            "LONG" => Ok(DataType::Long),
            "DOUBLE" => Ok(DataType::Double),
            "DECIMAL" => Ok(DataType::Decimal),
            "DATE" => Ok(DataType::Date),
            "DATETIME" => Ok(DataType::Datetime),
            _ => Err(format!(
                "Invalid data type '{}'. Valid options: STRING, LONG, DOUBLE, DECIMAL, DATE, DATETIME",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            visible: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = Some(false);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default)]
    pub columns: Vec<Column>,
}

/// Payload for creating or updating a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSchema {
    pub name: String,
    pub schema: SchemaDefinition,
    pub sync_enabled: bool,
}

impl CollectionSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: SchemaDefinition::default(),
            sync_enabled: false,
        }
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.schema.columns.push(column);
        self
    }

    pub fn with_sync_enabled(mut self, enabled: bool) -> Self {
        self.sync_enabled = enabled;
        self
    }
}

/// Collection details as reported by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub owner: Option<i64>,
    #[serde(default)]
    pub datastore_id: Option<String>,
    #[serde(default)]
    pub schema_json: Option<String>,
    #[serde(default)]
    pub schema: Option<SchemaDefinition>,
    #[serde(default)]
    pub sync_required: Option<bool>,
    #[serde(default)]
    pub full_replace_required: Option<bool>,
    #[serde(default, with = "optional_timestamp")]
    pub last_sync: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub updated_by: Option<i64>,
    #[serde(default, with = "optional_timestamp")]
    pub created_on: Option<DateTime<FixedOffset>>,
    #[serde(default, with = "optional_timestamp")]
    pub updated_on: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub exportable: Option<bool>,
    #[serde(default)]
    pub sync_enabled: Option<bool>,
}

/// Outcome of triggering a manual export to the data center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    Started,
    /// The store answered 423 Locked: an export is already running.
    AlreadyInProgress,
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStatus::Started => write!(f, "started"),
            ExportStatus::AlreadyInProgress => write!(f, "already in progress"),
        }
    }
}
