//! Configuration and database access
//!
//! Settings are read from `config.toml` in the user config directory
//! (`~/.config/convenios/config.toml` on Linux). `CONVENIOS_DATABASE_URL`
//! (also read from a `.env` file) overrides the configured database, and the
//! `--database` flag overrides both.

pub mod repository;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub const APP_DIR: &str = "convenios";
pub const DATABASE_URL_ENV: &str = "CONVENIOS_DATABASE_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL, e.g. `sqlite:///home/me/.local/share/convenios/convenios.db`
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Where exports land when `-o` is a bare file name
    pub directory: Option<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    let path = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("convenios.db");
    format!("sqlite://{}", path.display())
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Load from `path` (or the default location), then apply environment overrides.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Config::default()
        };

        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            log::debug!("Database URL overridden by {}", DATABASE_URL_ENV);
            config.database.url = url;
        }

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve an output path against the configured export directory
    pub fn export_path(&self, output: &Path) -> PathBuf {
        match &self.export.directory {
            Some(dir) if output.is_relative() && output.parent() == Some(Path::new("")) => {
                dir.join(output)
            }
            _ => output.to_path_buf(),
        }
    }
}

/// Open the SQLite pool, creating the database file and schema if needed
pub async fn connect(database: &DatabaseConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&database.url)
        .with_context(|| format!("Invalid database URL: {}", database.url))?
        .create_if_missing(true);

    if let Some(parent) = Path::new(options.get_filename()).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(database.max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database: {}", database.url))?;

    repository::schema::ensure_schema(&pool)
        .await
        .context("Failed to prepare database schema")?;

    log::debug!("Connected to {}", database.url);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [database]
            url = "sqlite://test.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.database.url, "sqlite://test.db");
        assert_eq!(config.database.max_connections, 5);
        assert!(config.export.directory.is_none());
    }

    #[test]
    fn test_export_path_only_redirects_bare_names() {
        let config = Config {
            export: ExportConfig {
                directory: Some(PathBuf::from("/srv/exports")),
            },
            ..Default::default()
        };
        assert_eq!(
            config.export_path(Path::new("relatorio.xlsx")),
            PathBuf::from("/srv/exports/relatorio.xlsx")
        );
        assert_eq!(
            config.export_path(Path::new("out/relatorio.xlsx")),
            PathBuf::from("out/relatorio.xlsx")
        );
    }
}
