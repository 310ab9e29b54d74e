use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::client::DEFAULT_BASE_URL;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Client configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Datastore root, e.g. "https://example.domo.com/domo/datastores/v1"
    pub base_url: ConfigValue<String>,
    /// Bearer token sent with every request (never printed)
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
    /// Revive ISO-8601 strings in responses
    pub parse_dates: ConfigValue<bool>,
    /// Path to the local mirror database
    pub mirror_path: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    base_url: Option<String>,
    api_token: Option<String>,
    parse_dates: Option<bool>,
    mirror_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut base_url = ConfigValue::new(DEFAULT_BASE_URL.to_string(), ConfigSource::Default);
        let mut api_token = None;
        let mut parse_dates = ConfigValue::new(false, ConfigSource::Default);
        let mut mirror_path =
            ConfigValue::new(Self::default_data_dir().join("mirror.db"), ConfigSource::Default);
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(url) = file_config.base_url {
                base_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(token) = file_config.api_token {
                api_token = Some(token);
            }
            if let Some(enabled) = file_config.parse_dates {
                parse_dates = ConfigValue::new(enabled, ConfigSource::File);
            }
            if let Some(mirror) = file_config.mirror_path {
                // Resolve relative paths against config file's directory
                let resolved = if mirror.is_relative() {
                    path.parent().map(|p| p.join(&mirror)).unwrap_or(mirror)
                } else {
                    mirror
                };
                mirror_path = ConfigValue::new(resolved, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Ok(url) = std::env::var("APPDB_BASE_URL") {
            base_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(token) = std::env::var("APPDB_API_TOKEN") {
            api_token = Some(token);
        }
        if let Ok(flag) = std::env::var("APPDB_PARSE_DATES") {
            let enabled = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
            parse_dates = ConfigValue::new(enabled, ConfigSource::Environment);
        }
        if let Ok(mirror) = std::env::var("APPDB_MIRROR_PATH") {
            mirror_path = ConfigValue::new(PathBuf::from(mirror), ConfigSource::Environment);
        }

        Ok(Self {
            base_url,
            api_token,
            parse_dates,
            mirror_path,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/appdb/
    /// - macOS: ~/Library/Application Support/appdb/
    /// - Windows: %APPDATA%/appdb/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("appdb")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/appdb/
    /// - macOS: ~/Library/Application Support/appdb/
    /// - Windows: %APPDATA%/appdb/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("appdb")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert!(config
            .mirror_path
            .value
            .to_string_lossy()
            .contains("mirror.db"));
        assert_eq!(config.mirror_path.source, ConfigSource::Default);
        assert_eq!(config.parse_dates.source, ConfigSource::Default);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "base_url: https://acme.example.com/domo/datastores/v1").unwrap();
        writeln!(file, "parse_dates: true").unwrap();
        writeln!(file, "mirror_path: /custom/path/mirror.db").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(
            config.base_url.value,
            "https://acme.example.com/domo/datastores/v1"
        );
        assert_eq!(config.base_url.source, ConfigSource::File);
        assert!(config.parse_dates.value);
        assert_eq!(config.parse_dates.source, ConfigSource::File);
        assert_eq!(
            config.mirror_path.value,
            PathBuf::from("/custom/path/mirror.db")
        );
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_mirror_path_resolves_against_config_dir() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "mirror_path: cache/mirror.db").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(
            config.mirror_path.value,
            temp_dir.path().join("cache/mirror.db")
        );
    }

    #[test]
    fn test_api_token_is_not_serialized() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "api_token: secret-token").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-token"));
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "base_url: http://fromfile/v1").unwrap();

        std::env::set_var("APPDB_BASE_URL", "http://fromenv/v1");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.base_url.value, "http://fromenv/v1");
        assert_eq!(config.base_url.source, ConfigSource::Environment);

        // Clean up
        std::env::remove_var("APPDB_BASE_URL");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
