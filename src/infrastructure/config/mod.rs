use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration, merged from defaults, an optional
/// `equipflow.toml`, and `EQUIPFLOW_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub media_root: PathBuf,
    pub retention_limit: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_url: "sqlite://equipflow.db".to_string(),
            media_root: PathBuf::from("media/uploads"),
            retention_limit: 5,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("equipflow.toml"))
            .merge(Env::prefixed("EQUIPFLOW_"))
            .extract()
            .map_err(|e| AppError::Internal(format!("Invalid configuration: {}", e)))
    }
}
