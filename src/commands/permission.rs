use clap::{Args, Subcommand};

use appdb::{AppDbClient, Permission, PermissionLevel};

#[derive(Args)]
pub struct PermissionCommand {
    #[command(subcommand)]
    pub command: PermissionSubcommand,
}

#[derive(Subcommand)]
pub enum PermissionSubcommand {
    /// Grant permissions on a collection
    Grant {
        /// Collection name
        collection: String,

        /// Principal kind: user, group or app
        level: PermissionLevel,

        /// User, group or app ID
        entity: String,

        /// Permissions (admin, write, read, share, delete, create_content,
        /// update_content, read_content, delete_content)
        #[arg(required = true)]
        permissions: Vec<Permission>,
    },

    /// Revoke every permission a principal holds on a collection
    Revoke {
        /// Collection name
        collection: String,

        /// Principal kind: user, group or app
        level: PermissionLevel,

        /// User, group or app ID
        entity: String,
    },
}

impl PermissionCommand {
    pub async fn run(&self, client: &AppDbClient) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            PermissionSubcommand::Grant {
                collection,
                level,
                entity,
                permissions,
            } => {
                client
                    .grant_permissions(collection, *level, entity, permissions)
                    .await?;
                let names: Vec<&str> = permissions.iter().map(Permission::as_str).collect();
                println!(
                    "Granted {} to {} {} on '{}'",
                    names.join(", "),
                    level,
                    entity,
                    collection
                );
                Ok(())
            }

            PermissionSubcommand::Revoke {
                collection,
                level,
                entity,
            } => {
                client.revoke_permissions(collection, *level, entity).await?;
                println!("Revoked permissions of {} {} on '{}'", level, entity, collection);
                Ok(())
            }
        }
    }
}
