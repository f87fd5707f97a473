use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: i64 = 20;

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

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database holding documents and accounts
    pub database_path: ConfigValue<PathBuf>,
    /// Root directory for uploaded files
    pub blob_dir: ConfigValue<PathBuf>,
    /// Prefix for blob URLs recorded on documents
    pub public_base_url: ConfigValue<String>,
    /// Maximum results per list query
    pub page_size: ConfigValue<i64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    blob_dir: Option<PathBuf>,
    public_base_url: Option<String>,
    page_size: Option<i64>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let data_dir = Self::default_data_dir();

        // Start with defaults
        let mut database_path =
            ConfigValue::new(data_dir.join("campus.db"), ConfigSource::Default);
        let mut blob_dir = ConfigValue::new(data_dir.join("blobs"), ConfigSource::Default);
        let mut public_base_url = None;
        let mut page_size = ConfigValue::new(DEFAULT_PAGE_SIZE, ConfigSource::Default);
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                database_path = ConfigValue::new(resolve(&path, db_path), ConfigSource::File);
            }
            if let Some(dir) = file_config.blob_dir {
                blob_dir = ConfigValue::new(resolve(&path, dir), ConfigSource::File);
            }
            if let Some(url) = file_config.public_base_url {
                public_base_url = Some(ConfigValue::new(url, ConfigSource::File));
            }
            if let Some(size) = file_config.page_size {
                page_size = ConfigValue::new(size, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Ok(db_path) = std::env::var("CAMPUS_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(dir) = std::env::var("CAMPUS_BLOB_DIR") {
            blob_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("CAMPUS_PUBLIC_BASE_URL") {
            public_base_url = Some(ConfigValue::new(url, ConfigSource::Environment));
        }
        if let Ok(size) = std::env::var("CAMPUS_PAGE_SIZE") {
            let size = size
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CAMPUS_PAGE_SIZE", size.clone()))?;
            page_size = ConfigValue::new(size, ConfigSource::Environment);
        }

        if page_size.value < 1 {
            return Err(ConfigError::InvalidValue(
                "page_size",
                page_size.value.to_string(),
            ));
        }

        // Blobs are served straight from disk unless a public URL is configured
        let public_base_url = public_base_url.unwrap_or_else(|| {
            ConfigValue::new(
                format!("file://{}", blob_dir.value.display()),
                ConfigSource::Default,
            )
        });

        Ok(Self {
            database_path,
            blob_dir,
            public_base_url,
            page_size,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/campus/
    /// - macOS: ~/Library/Application Support/campus/
    /// - Windows: %APPDATA%/campus/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("campus")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/campus/
    /// - macOS: ~/Library/Application Support/campus/
    /// - Windows: %APPDATA%/campus/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("campus")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }

    /// File remembering the signed-in uid between CLI invocations.
    pub fn session_path(&self) -> PathBuf {
        self.database_path
            .value
            .parent()
            .map(|dir| dir.join("session.json"))
            .unwrap_or_else(|| PathBuf::from("session.json"))
    }
}

/// Resolve relative paths against the config file's directory
fn resolve(config_path: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        config_path.parent().map(|p| p.join(&path)).unwrap_or(path)
    } else {
        path
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {1}", .0.display())]
    ReadError(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse config file '{}': {1}", .0.display())]
    ParseError(PathBuf, #[source] serde_yaml::Error),
    #[error("Invalid value for {0}: '{1}'")]
    InvalidValue(&'static str, String),
}

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
            .database_path
            .value
            .to_string_lossy()
            .contains("campus.db"));
        assert_eq!(config.database_path.source, ConfigSource::Default);
        assert_eq!(config.page_size.value, DEFAULT_PAGE_SIZE);
        assert_eq!(config.public_base_url.source, ConfigSource::Default);
        assert!(config.public_base_url.value.starts_with("file://"));
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path: /custom/path/db.sqlite").unwrap();
        writeln!(file, "public_base_url: https://cdn.campus.edu").unwrap();
        writeln!(file, "page_size: 50").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(
            config.database_path.value,
            PathBuf::from("/custom/path/db.sqlite")
        );
        assert_eq!(config.database_path.source, ConfigSource::File);
        assert_eq!(config.public_base_url.value, "https://cdn.campus.edu");
        assert_eq!(config.public_base_url.source, ConfigSource::File);
        assert_eq!(config.page_size.value, 50);
        assert_eq!(config.config_file, Some(config_path));
        assert_eq!(
            config.session_path(),
            PathBuf::from("/custom/path/session.json")
        );
    }

    #[test]
    fn test_relative_paths_resolve_against_config_dir() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "blob_dir: uploads").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.blob_dir.value, temp_dir.path().join("uploads"));
        assert_eq!(
            config.public_base_url.value,
            format!("file://{}", temp_dir.path().join("uploads").display())
        );
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "page_size: 10").unwrap();

        std::env::set_var("CAMPUS_PAGE_SIZE", "30");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.page_size.value, 30);
        assert_eq!(config.page_size.source, ConfigSource::Environment);

        std::env::remove_var("CAMPUS_PAGE_SIZE");
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

    #[test]
    fn test_zero_page_size_rejected() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "page_size: 0").unwrap();

        let err = Config::load(Some(config_path)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("page_size", _)));
    }
}
