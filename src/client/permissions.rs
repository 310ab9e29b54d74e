//! Collection-level security.

use reqwest::Method;

use super::{require_non_empty, AppDbClient};
use crate::error::Result;
use crate::models::{Permission, PermissionLevel};

impl AppDbClient {
    /// Sets the permissions a principal holds on a collection.
    ///
    /// Values are passed through; the store rejects invalid combinations.
    pub async fn grant_permissions(
        &self,
        collection: &str,
        level: PermissionLevel,
        entity_id: &str,
        permissions: &[Permission],
    ) -> Result<()> {
        require_non_empty(collection, "collection name")?;
        require_non_empty(entity_id, "entity id")?;
        let url = format!(
            "{}?permissions={}",
            self.permission_url(collection, level, entity_id),
            join_permissions(permissions)
        );
        self.send(self.request(Method::PUT, &url), collection).await?;
        Ok(())
    }

    /// Removes every permission a principal holds on a collection.
    pub async fn revoke_permissions(
        &self,
        collection: &str,
        level: PermissionLevel,
        entity_id: &str,
    ) -> Result<()> {
        require_non_empty(collection, "collection name")?;
        require_non_empty(entity_id, "entity id")?;
        let url = self.permission_url(collection, level, entity_id);
        self.send(self.request(Method::DELETE, &url), collection).await?;
        Ok(())
    }

    fn permission_url(&self, collection: &str, level: PermissionLevel, entity_id: &str) -> String {
        format!(
            "{}/permission/{}/{}",
            self.collection_url(collection),
            level.as_str(),
            urlencoding::encode(entity_id)
        )
    }
}

fn join_permissions(permissions: &[Permission]) -> String {
    permissions
        .iter()
        .map(Permission::as_str)
        .collect::<Vec<_>>()
        .join(",")
}
