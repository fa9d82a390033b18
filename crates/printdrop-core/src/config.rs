//! Configuration module
//!
//! Process-level configuration read once from the environment at startup.
//! Pipeline behaviour (interval, batch size, stage paths) lives in
//! [`crate::settings`] instead, because it is hot-reloaded.

use std::env;
use std::path::PathBuf;

use anyhow::Context;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_DATA_ROOT: &str = "./data";
const SETTINGS_FILE_NAME: &str = "config.json";
const MAX_REQUEST_BODY_MB: usize = 64;
const HTTP_CONCURRENCY_LIMIT: usize = 1_024;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Absolute root for default stage directories.
    pub data_root: PathBuf,
    pub settings_path: PathBuf,
    pub max_request_body_bytes: usize,
    pub http_concurrency_limit: usize,
    pub environment: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let port = match env::var("PORT") {
            Ok(value) => value
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            Err(_) => DEFAULT_PORT,
        };

        let data_root = env::var("PRINTDROP_DATA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_ROOT));
        let data_root = std::path::absolute(&data_root)
            .with_context(|| format!("Failed to resolve data root {}", data_root.display()))?;

        let settings_path = env::var("PRINTDROP_SETTINGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_root.join(SETTINGS_FILE_NAME));

        let max_request_body_mb = env::var("MAX_REQUEST_BODY_MB")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_REQUEST_BODY_MB)
            .max(1);

        let http_concurrency_limit = env::var("HTTP_CONCURRENCY_LIMIT")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(HTTP_CONCURRENCY_LIMIT)
            .max(1);

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            port,
            data_root,
            settings_path,
            max_request_body_bytes: max_request_body_mb * 1024 * 1024,
            http_concurrency_limit,
            environment,
        })
    }

    /// Defaults rooted at `data_root`, without reading the environment.
    pub fn with_data_root(data_root: impl Into<PathBuf>) -> Self {
        let data_root = data_root.into();
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            settings_path: data_root.join(SETTINGS_FILE_NAME),
            data_root,
            max_request_body_bytes: MAX_REQUEST_BODY_MB * 1024 * 1024,
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
            environment: "development".to_string(),
        }
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}
