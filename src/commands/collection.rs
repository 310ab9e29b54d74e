use clap::{Args, Subcommand};

use appdb::{AppDbClient, CollectionSchema, Column, DataType, ExportStatus};

use super::print_json;

#[derive(Args)]
pub struct CollectionCommand {
    #[command(subcommand)]
    pub command: CollectionSubcommand,
}

#[derive(Subcommand)]
pub enum CollectionSubcommand {
    /// Create a collection
    Create {
        /// Collection name
        name: String,

        /// Column as NAME:TYPE (can be repeated)
        #[arg(long = "column", value_name = "NAME:TYPE", value_parser = parse_column)]
        columns: Vec<Column>,

        /// Include the collection in data center exports
        #[arg(long)]
        sync: bool,
    },

    /// Replace a collection's schema
    Update {
        /// Collection name
        name: String,

        /// Column as NAME:TYPE (can be repeated)
        #[arg(long = "column", value_name = "NAME:TYPE", value_parser = parse_column)]
        columns: Vec<Column>,

        /// Include the collection in data center exports
        #[arg(long)]
        sync: bool,
    },

    /// Delete a collection and all of its documents
    Delete {
        /// Collection name
        name: String,
    },

    /// Start an export of sync-enabled collections
    Export,
}

impl CollectionCommand {
    pub async fn run(&self, client: &AppDbClient) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            CollectionSubcommand::Create {
                name,
                columns,
                sync,
            } => {
                let schema = build_schema(name, columns, *sync);
                let collection = client.create_collection(&schema).await?;
                println!("Created collection '{}'", collection.name);
                print_json(&collection)
            }

            CollectionSubcommand::Update {
                name,
                columns,
                sync,
            } => {
                let schema = build_schema(name, columns, *sync);
                let collection = client.update_collection(&schema).await?;
                println!("Updated collection '{}'", collection.name);
                print_json(&collection)
            }

            CollectionSubcommand::Delete { name } => {
                client.delete_collection(name).await?;
                println!("Deleted collection '{}'", name);
                Ok(())
            }

            CollectionSubcommand::Export => {
                match client.start_export().await? {
                    ExportStatus::Started => println!("Export started"),
                    ExportStatus::AlreadyInProgress => println!("Export already in progress"),
                }
                Ok(())
            }
        }
    }
}

fn build_schema(name: &str, columns: &[Column], sync: bool) -> CollectionSchema {
    columns
        .iter()
        .cloned()
        .fold(CollectionSchema::new(name), CollectionSchema::with_column)
        .with_sync_enabled(sync)
}

fn parse_column(s: &str) -> Result<Column, String> {
    let (name, data_type) = s
        .split_once(':')
        .ok_or_else(|| format!("Invalid column '{}'. Expected NAME:TYPE", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Invalid column '{}'. Name cannot be empty", s));
    }
    let data_type: DataType = data_type.trim().parse()?;
    Ok(Column::new(name, data_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column() {
        let column = parse_column("price:double").unwrap();
        assert_eq!(column.name, "price");
        assert_eq!(column.data_type, DataType::Double);

        assert!(parse_column("price").is_err());
        assert!(parse_column(":LONG").is_err());
        assert!(parse_column("price:money").is_err());
    }

    #[test]
    fn test_build_schema() {
        let columns = vec![
            Column::new("name", DataType::String),
            Column::new("created", DataType::Datetime),
        ];
        let schema = build_schema("assets", &columns, true);

        assert_eq!(schema.name, "assets");
        assert!(schema.sync_enabled);
        assert_eq!(schema.schema.columns, columns);
    }
}
