//! Local mirror store for offline access to collection data.
//!
//! A single SQLite file holds one table per partition (usually one per
//! collection). Each row is keyed by an auto-assigned local id and stores the
//! entry's value as JSON:
//!
//! ```text
//! "<partition>" (idb_id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT NOT NULL)
//! ```
//!
//! The schema version lives in `PRAGMA user_version`. Opening a file whose
//! version differs from the expected one drops every table and recreates the
//! expected partitions: there is no upgrade path, a version bump invalidates
//! the whole local cache.

mod entry;

pub use entry::MirrorEntry;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur in mirror store operations.
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to create mirror directory '{}': {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Unknown partition: {0}")]
    UnknownPartition(String),

    #[error("Error: No local id on entry")]
    MissingLocalId,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Expected layout of the mirror: a version and the set of partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSchema {
    version: u32,
    partitions: Vec<String>,
}

impl MirrorSchema {
    pub fn new<I, S>(version: u32, partitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for name in partitions {
            let name = name.into();
            if !name.trim().is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        Self {
            version,
            partitions: names,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn partitions(&self) -> &[String] {
        &self.partitions
    }

    pub fn contains(&self, partition: &str) -> bool {
        self.partitions.iter().any(|p| p == partition)
    }
}

/// Caller-owned handle to an opened mirror database.
#[derive(Debug, Clone)]
pub struct MirrorStore {
    pool: SqlitePool,
    schema: MirrorSchema,
}

impl MirrorStore {
    /// Opens (creating if missing) the mirror at `path` and applies `schema`.
    pub async fn open(path: impl AsRef<Path>, schema: MirrorSchema) -> Result<Self, MirrorError> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| MirrorError::Io(parent.to_path_buf(), e))?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", path.display());
        let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        tracing::debug!(path = %path.display(), version = schema.version, "Opened mirror store");

        let store = Self { pool, schema };
        store.apply_schema().await?;
        Ok(store)
    }

    /// Closes the underlying connection pool.
    pub async fn close(self) {
        self.pool.close().await;
    }

    pub fn schema(&self) -> &MirrorSchema {
        &self.schema
    }

    async fn apply_schema(&self) -> Result<(), MirrorError> {
        let mut tx = self.pool.begin().await?;

        let current: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&mut *tx)
            .await?;

        if current != i64::from(self.schema.version) {
            let existing: Vec<String> = sqlx::query_scalar(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            )
            .fetch_all(&mut *tx)
            .await?;

            if !existing.is_empty() {
                tracing::warn!(
                    from = current,
                    to = self.schema.version,
                    "Mirror schema version changed, dropping {} partition(s)",
                    existing.len()
                );
            }
            for table in &existing {
                sqlx::query(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))
                    .execute(&mut *tx)
                    .await?;
            }
        }

        for partition in &self.schema.partitions {
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {} (idb_id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT NOT NULL)",
                quote_ident(partition)
            ))
            .execute(&mut *tx)
            .await?;
        }

        // PRAGMA does not accept bound parameters
        sqlx::query(&format!("PRAGMA user_version = {}", self.schema.version))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    fn table_for(&self, partition: &str) -> Result<String, MirrorError> {
        if !self.schema.contains(partition) {
            return Err(MirrorError::UnknownPartition(partition.to_string()));
        }
        Ok(quote_ident(partition))
    }

    /// Writes an entry and returns its local id.
    ///
    /// Entries without a local id get a fresh one; entries with one replace
    /// the stored row.
    pub async fn save<T: Serialize>(&self, entry: &MirrorEntry<T>) -> Result<i64, MirrorError> {
        let table = self.table_for(&entry.partition)?;
        let body = serde_json::to_string(&entry.value)?;

        let local_id = match entry.local_id {
            Some(id) => {
                sqlx::query(&format!(
                    "INSERT OR REPLACE INTO {} (idb_id, body) VALUES (?, ?)",
                    table
                ))
                .bind(id)
                .bind(&body)
                .execute(&self.pool)
                .await?;
                id
            }
            None => sqlx::query(&format!("INSERT INTO {} (body) VALUES (?)", table))
                .bind(&body)
                .execute(&self.pool)
                .await?
                .last_insert_rowid(),
        };

        Ok(local_id)
    }

    /// Reads every entry of a partition, in local id order.
    pub async fn get_all<T: DeserializeOwned>(
        &self,
        partition: &str,
    ) -> Result<Vec<MirrorEntry<T>>, MirrorError> {
        let table = self.table_for(partition)?;
        let rows: Vec<(i64, String)> =
            sqlx::query_as(&format!("SELECT idb_id, body FROM {} ORDER BY idb_id", table))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(id, body)| {
                Ok(MirrorEntry {
                    partition: partition.to_string(),
                    local_id: Some(id),
                    value: serde_json::from_str(&body)?,
                })
            })
            .collect()
    }

    /// Removes an entry. Fails if the entry was never saved.
    pub async fn delete<T>(&self, entry: &MirrorEntry<T>) -> Result<(), MirrorError> {
        let local_id = entry.local_id.ok_or(MirrorError::MissingLocalId)?;
        let table = self.table_for(&entry.partition)?;
        sqlx::query(&format!("DELETE FROM {} WHERE idb_id = ?", table))
            .bind(local_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Removes every entry of a partition and returns how many were removed.
    pub async fn clear(&self, partition: &str) -> Result<u64, MirrorError> {
        let table = self.table_for(partition)?;
        let result = sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Replaces every entry of a partition with `values` in one transaction.
    ///
    /// Either the partition ends up holding exactly `values` or it is left
    /// untouched. Returns the number of entries written.
    pub async fn replace_all<T: Serialize>(
        &self,
        partition: &str,
        values: &[T],
    ) -> Result<usize, MirrorError> {
        let table = self.table_for(partition)?;
        let bodies = values
            .iter()
            .map(|value| serde_json::to_string(value))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for body in &bodies {
            sqlx::query(&format!("INSERT INTO {} (body) VALUES (?)", table))
                .bind(body)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            partition,
            removed,
            written = bodies.len(),
            "Replaced mirror partition"
        );
        Ok(bodies.len())
    }

    /// Names of the partition tables currently present in the file.
    pub async fn existing_partitions(&self) -> Result<Vec<String>, MirrorError> {
        let names = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
