use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "cet_select=debug,info";

/// SHA-256 of `change-me`; operators are expected to override it.
const DEFAULT_ADMIN_PASSWORD_HASH: &str =
    "e2186dbdb1bb4193608605e84f33208765b5693b55edd4f730a719a100eeea6f";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DataConfig {
    /// Cutoff dataset (CSV)
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Where the current login is kept between invocations
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdminConfig {
    pub username: String,
    /// Hex-encoded SHA-256 of the admin password
    pub password_hash: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                path: PathBuf::from("data/cleaned_cutoff_data_latest.csv"),
            },
            database: DatabaseConfig {
                path: "data/users.db".to_string(),
            },
            session: SessionConfig {
                path: PathBuf::from("data/session.json"),
            },
            admin: AdminConfig {
                username: "admin".to_string(),
                password_hash: DEFAULT_ADMIN_PASSWORD_HASH.to_string(),
            },
        }
    }
}

impl Config {
    /// Layer defaults, the optional config file and `CET_*` environment
    /// variables (e.g. `CET_DATA__PATH`).
    pub fn load(path: &str) -> Result<Self> {
        dotenv::dotenv().ok();

        let defaults = Self::default();
        let config = config::Config::builder()
            .set_default("data.path", defaults.data.path.to_string_lossy().to_string())?
            .set_default("database.path", defaults.database.path)?
            .set_default("session.path", defaults.session.path.to_string_lossy().to_string())?
            .set_default("admin.username", defaults.admin.username)?
            .set_default("admin.password_hash", defaults.admin.password_hash)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CET")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn uses_default_admin_password(&self) -> bool {
        self.admin.password_hash == DEFAULT_ADMIN_PASSWORD_HASH
    }

    /// Write this configuration as TOML, creating parent directories.
    pub fn write_toml(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let body = toml::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize configuration: {}", e))?;
        std::fs::write(path, body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let config = Config::load(missing.to_str().unwrap()).unwrap();
        assert_eq!(config.admin.username, "admin");
        assert!(config.uses_default_admin_password());
    }

    #[test]
    fn test_write_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("cet.toml");

        let mut config = Config::default();
        config.data.path = PathBuf::from("cutoffs/2024.csv");
        config.write_toml(&path).unwrap();

        let stem = dir.path().join("conf").join("cet");
        let loaded = Config::load(stem.to_str().unwrap()).unwrap();
        assert_eq!(loaded.data.path, PathBuf::from("cutoffs/2024.csv"));
        assert_eq!(loaded.database.path, "data/users.db");
    }

    #[test]
    fn test_default_log_filter_parses() {
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        assert!(DEFAULT_LOG_FILTER.starts_with("cet_select=debug"));
    }

    #[test]
    fn test_load_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[data\npath = ").unwrap();

        let stem = dir.path().join("broken");
        let err = Config::load(stem.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, crate::error::SelectError::Config(_)));
    }
}
