//! Configuration file support for the CLI.
//!
//! Loads and saves CLI configuration from TOML files.

use std::path::{Path, PathBuf};

use anyhow::Result;
use docstore_client::ConnectionConfig;
use serde::{Deserialize, Serialize};

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Server hostname.
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name.
    #[serde(default)]
    pub database: Option<String>,

    /// Username.
    #[serde(default)]
    pub username: Option<String>,

    /// Password (read from the file, never written back).
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// SQLite database file; when set no server is contacted.
    #[serde(default)]
    pub sqlite: Option<PathBuf>,

    /// Default output format.
    #[serde(default = "default_format")]
    pub output_format: String,

    /// Cache column maps between operations.
    #[serde(default = "default_cache_columns")]
    pub cache_columns: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_format() -> String {
    "table".to_string()
}

fn default_cache_columns() -> bool {
    true
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: None,
            username: None,
            password: None,
            sqlite: None,
            output_format: default_format(),
            cache_columns: default_cache_columns(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Loads the default configuration file.
    ///
    /// Looks in the following locations:
    /// 1. ~/.config/docstore/config.toml
    /// 2. ~/.docstore/config.toml
    /// 3. Returns default if not found
    pub fn load_default() -> Result<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("docstore").join("config.toml");
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".docstore").join("config.toml");
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Returns the default configuration file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("docstore").join("config.toml"))
    }

    /// Builds the client connection configuration.
    pub fn connection_config(&self) -> ConnectionConfig {
        let mut config = match &self.sqlite {
            Some(path) => ConnectionConfig::sqlite(path),
            None => ConnectionConfig::new().host(self.host.clone()).port(self.port),
        };
        config.database = self.database.clone();
        config.username = self.username.clone();
        config.password = self.password.clone();
        config.cache_columns(self.cache_columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_client::Backend;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert!(config.database.is_none());
        assert!(config.sqlite.is_none());
        assert!(config.cache_columns);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = CliConfig {
            host: "test.host".to_string(),
            port: 9999,
            database: Some("testdb".to_string()),
            password: Some("secret".to_string()),
            ..CliConfig::default()
        };
        config.save(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("secret"));

        let loaded = CliConfig::from_file(&path).unwrap();
        assert_eq!(loaded.host, "test.host");
        assert_eq!(loaded.port, 9999);
        assert_eq!(loaded.database, Some("testdb".to_string()));
        assert!(loaded.password.is_none());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            host = "db.example.com"
            port = 5433
            database = "production"
            output_format = "json"
            cache_columns = false
        "#;

        let config: CliConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.host, "db.example.com");
        assert_eq!(config.port, 5433);
        assert_eq!(config.database, Some("production".to_string()));
        assert_eq!(config.output_format, "json");
        assert!(!config.cache_columns);
    }

    #[test]
    fn test_connection_config() {
        let config = CliConfig {
            database: Some("docs".to_string()),
            username: Some("alice".to_string()),
            ..CliConfig::default()
        };
        let conn = config.connection_config();
        assert_eq!(conn.backend, Backend::Postgres);
        assert_eq!(conn.username.as_deref(), Some("alice"));

        let config = CliConfig {
            sqlite: Some(PathBuf::from("local.db")),
            ..CliConfig::default()
        };
        let conn = config.connection_config();
        assert_eq!(
            conn.backend,
            Backend::Sqlite {
                path: PathBuf::from("local.db")
            }
        );
    }
}
