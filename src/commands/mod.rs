mod collection;
mod config_cmd;
mod doc;
mod mirror;
mod permission;

pub use collection::CollectionCommand;
pub use config_cmd::ConfigCommand;
pub use doc::DocCommand;
pub use mirror::MirrorCommand;
pub use permission::PermissionCommand;

use serde::Serialize;
use serde_json::Value;

/// Parses a JSON argument; `@path` reads the JSON from a file.
pub(crate) fn parse_json_arg(arg: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read '{}': {}", path, e))?,
        None => arg.to_string(),
    };
    serde_json::from_str(&text).map_err(|e| format!("Invalid JSON: {}", e).into())
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
