use clap::{Args, Subcommand};
use serde_json::Value;
use std::path::Path;

use appdb::{AppDbClient, Document, MirrorEntry, MirrorError, MirrorSchema, MirrorStore};

use super::print_json;

/// Bumping this discards every existing local mirror.
pub const MIRROR_SCHEMA_VERSION: u32 = 1;

#[derive(Args)]
pub struct MirrorCommand {
    #[command(subcommand)]
    pub command: MirrorSubcommand,
}

#[derive(Subcommand)]
pub enum MirrorSubcommand {
    /// Download a collection into the local mirror, replacing what was there
    Pull {
        /// Collection name
        collection: String,
    },

    /// Show the mirrored documents of a collection
    List {
        /// Collection name
        collection: String,
    },
}

impl MirrorCommand {
    pub async fn run(
        &self,
        client: &AppDbClient,
        mirror_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            MirrorSubcommand::Pull { collection } => {
                let docs: Vec<Document<Value>> = client.fetch_all(collection).await?;

                let store = open_store(mirror_path, collection).await?;
                let count = store.replace_all(collection, &docs).await?;
                store.close().await;

                println!(
                    "Mirrored {} document(s) from '{}' to {}",
                    count,
                    collection,
                    mirror_path.display()
                );
                Ok(())
            }

            MirrorSubcommand::List { collection } => {
                let store = open_store(mirror_path, collection).await?;
                let entries: Vec<MirrorEntry<Document<Value>>> = store.get_all(collection).await?;
                store.close().await;

                if entries.is_empty() {
                    println!("No mirrored documents for '{}'", collection);
                    return Ok(());
                }
                let docs: Vec<&Document<Value>> = entries.iter().map(|e| &e.value).collect();
                print_json(&docs)
            }
        }
    }
}

async fn open_store(path: &Path, collection: &str) -> Result<MirrorStore, MirrorError> {
    MirrorStore::open(path, MirrorSchema::new(MIRROR_SCHEMA_VERSION, [collection])).await
}
