//! Collection-level security types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of principal a permission grant targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionLevel {
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "GROUP")]
    Group,
    /// An app proxy identity.
    #[serde(rename = "RYUU_APP")]
    App,
}

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::User => "USER",
            PermissionLevel::Group => "GROUP",
            PermissionLevel::App => "RYUU_APP",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(PermissionLevel::User),
            "GROUP" => Ok(PermissionLevel::Group),
            "APP" | "RYUU_APP" => Ok(PermissionLevel::App),
            _ => Err(format!(
                "Invalid permission level '{}'. Valid options: user, group, app",
                s
            )),
        }
    }
}

/// A single collection permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Admin,
    Write,
    Read,
    Share,
    Delete,
    CreateContent,
    UpdateContent,
    ReadContent,
    DeleteContent,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Admin => "admin",
            Permission::Write => "write",
            Permission::Read => "read",
            Permission::Share => "share",
            Permission::Delete => "delete",
            Permission::CreateContent => "create_content",
            Permission::UpdateContent => "update_content",
            Permission::ReadContent => "read_content",
            Permission::DeleteContent => "delete_content",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Permission::Admin),
            "write" => Ok(Permission::Write),
            "read" => Ok(Permission::Read),
            "share" => Ok(Permission::Share),
            "delete" => Ok(Permission::Delete),
            "create_content" => Ok(Permission::CreateContent),
            "update_content" => Ok(Permission::UpdateContent),
            "read_content" => Ok(Permission::ReadContent),
            "delete_content" => Ok(Permission::DeleteContent),
            _ => Err(format!("Invalid permission '{}'", s)),
        }
    }
}
