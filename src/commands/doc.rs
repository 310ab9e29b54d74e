use clap::{Args, Subcommand};
use serde_json::Value;

use appdb::{AggregationParams, AppDbClient, Document, Revived, Upsert};

use super::{parse_json_arg, print_json};

#[derive(Args)]
pub struct DocCommand {
    #[command(subcommand)]
    pub command: DocSubcommand,
}

#[derive(Subcommand)]
pub enum DocSubcommand {
    /// List every document in a collection
    List {
        /// Collection name
        collection: String,
    },

    /// Show one document
    Get {
        /// Collection name
        collection: String,

        /// Document ID
        id: String,
    },

    /// Create a document from JSON content (or @file)
    Create {
        /// Collection name
        collection: String,

        /// Document content as JSON, or @path to a JSON file
        content: String,
    },

    /// Replace the content of an existing document
    Update {
        /// Collection name
        collection: String,

        /// Document ID
        id: String,

        /// Document content as JSON, or @path to a JSON file
        content: String,
    },

    /// Update the document with --id, or create one without it
    Upsert {
        /// Collection name
        collection: String,

        /// Document content as JSON, or @path to a JSON file
        content: String,

        /// Existing document ID
        #[arg(long)]
        id: Option<String>,
    },

    /// Delete a document
    Delete {
        /// Collection name
        collection: String,

        /// Document ID
        id: String,
    },

    /// Create or update many documents from a JSON array of {id?, content}
    BulkUpsert {
        /// Collection name
        collection: String,

        /// JSON array, or @path to a JSON file
        documents: String,
    },

    /// Delete many documents in one request
    BulkDelete {
        /// Collection name
        collection: String,

        /// Document IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Query documents
    Query {
        /// Collection name
        collection: String,

        /// Query object as JSON, or @path to a JSON file
        query: String,
    },

    /// Query documents with aggregations
    Aggregate {
        /// Collection name
        collection: String,

        /// Query object as JSON, or @path to a JSON file
        #[arg(default_value = "{}")]
        query: String,

        /// Field to group rows by
        #[arg(long)]
        group_by: Option<String>,

        /// Alias for the per-group document count
        #[arg(long)]
        count: Option<String>,

        #[arg(long)]
        avg: Option<String>,

        #[arg(long)]
        min: Option<String>,

        #[arg(long)]
        max: Option<String>,

        #[arg(long)]
        sum: Option<String>,

        /// e.g. "total descending"
        #[arg(long)]
        order_by: Option<String>,

        /// Maximum number of rows
        #[arg(long)]
        limit: Option<u64>,

        #[arg(long)]
        offset: Option<u64>,
    },

    /// Partially update every document matching a query
    UpdateWhere {
        /// Collection name
        collection: String,

        /// Query object as JSON, or @path to a JSON file
        query: String,

        /// Update operation as JSON, or @path to a JSON file
        operation: String,
    },
}

impl DocCommand {
    pub async fn run(&self, client: &AppDbClient) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            DocSubcommand::List { collection } => {
                let docs: Vec<Document<Value>> = client.fetch_all(collection).await?;
                if docs.is_empty() {
                    println!("No documents found");
                    return Ok(());
                }
                print_json(&docs)
            }

            DocSubcommand::Get { collection, id } => {
                let doc: Document<Value> = client.fetch_one(collection, id).await?;
                print_json(&doc)
            }

            DocSubcommand::Create {
                collection,
                content,
            } => {
                let content = parse_json_arg(content)?;
                let created = client.create(collection, &content).await?;
                println!("Created document {}", created.id);
                print_json(&created)
            }

            DocSubcommand::Update {
                collection,
                id,
                content,
            } => {
                let content = parse_json_arg(content)?;
                client.update(collection, id, &content).await?;
                println!("Updated document {}", id);
                Ok(())
            }

            DocSubcommand::Upsert {
                collection,
                content,
                id,
            } => {
                let content = parse_json_arg(content)?;
                let doc = match id {
                    Some(id) => Upsert::existing(id.clone(), content),
                    None => Upsert::new(content),
                };
                let outcome = client.upsert(collection, doc).await?;
                let verb = if outcome.was_created() {
                    "Created"
                } else {
                    "Updated"
                };
                println!("{} document {}", verb, outcome.id());
                Ok(())
            }

            DocSubcommand::Delete { collection, id } => {
                client.delete(collection, id).await?;
                println!("Deleted document {}", id);
                Ok(())
            }

            DocSubcommand::BulkUpsert {
                collection,
                documents,
            } => {
                let docs = upserts_from_json(parse_json_arg(documents)?)?;
                let result = client.bulk_upsert(collection, &docs).await?;
                print_json(&result)
            }

            DocSubcommand::BulkDelete { collection, ids } => {
                let result = client.bulk_delete(collection, ids).await?;
                print_json(&result)
            }

            DocSubcommand::Query { collection, query } => {
                let query = parse_json_arg(query)?;
                let docs: Vec<Document<Value>> = client.query(collection, &query).await?;
                print_json(&docs)
            }

            DocSubcommand::Aggregate {
                collection,
                query,
                group_by,
                count,
                avg,
                min,
                max,
                sum,
                order_by,
                limit,
                offset,
            } => {
                let query = parse_json_arg(query)?;
                let params = AggregationParams {
                    group_by: group_by.clone(),
                    count: count.clone(),
                    avg: avg.clone(),
                    min: min.clone(),
                    max: max.clone(),
                    sum: sum.clone(),
                    order_by: order_by.clone(),
                    limit: *limit,
                    offset: *offset,
                };
                let rows: Vec<Revived> = client
                    .query_aggregation(collection, &query, &params)
                    .await?;
                print_json(&rows)
            }

            DocSubcommand::UpdateWhere {
                collection,
                query,
                operation,
            } => {
                let query = parse_json_arg(query)?;
                let operation = parse_json_arg(operation)?;
                let result = client.update_where(collection, &query, &operation).await?;
                print_json(&result)
            }
        }
    }
}

/// Turns `[{"id": "...", "content": {...}}, {"content": {...}}]` into upserts.
fn upserts_from_json(value: Value) -> Result<Vec<Upsert<Value>>, Box<dyn std::error::Error>> {
    let Value::Array(items) = value else {
        return Err("Expected a JSON array of documents".into());
    };

    items
        .into_iter()
        .map(|item| -> Result<Upsert<Value>, Box<dyn std::error::Error>> {
            let Value::Object(mut map) = item else {
                return Err("Each document must be a JSON object".into());
            };
            let content = map
                .remove("content")
                .ok_or("Each document needs a \"content\" field")?;
            match map.remove("id") {
                Some(Value::String(id)) => Ok(Upsert::existing(id, content)),
                Some(Value::Null) | None => Ok(Upsert::new(content)),
                Some(_) => Err("Document \"id\" must be a string".into()),
            }
        })
        .collect()
}
