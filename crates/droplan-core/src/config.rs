//! Configuration module
//!
//! Environment-based configuration for the droplan server. Values come from
//! the process environment (with `.env` support via dotenvy) and fall back to
//! LAN-friendly defaults, so `droplan-api` starts with zero configuration.

use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_STORAGE_PATH: &str = "./uploads";
const DEFAULT_TRUSTED_PROXY_COUNT: usize = 0;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    server_port: u16,
    storage_path: PathBuf,
    cors_origins: Vec<String>,
    trusted_proxy_count: usize,
    environment: String,
}

impl Config {
    /// Build a configuration with explicit values, bypassing the environment.
    pub fn new(server_port: u16, storage_path: impl Into<PathBuf>) -> Self {
        Config {
            server_port,
            storage_path: storage_path.into(),
            cors_origins: vec!["*".to_string()],
            trusted_proxy_count: DEFAULT_TRUSTED_PROXY_COUNT,
            environment: "development".to_string(),
        }
    }

    pub fn with_trusted_proxy_count(mut self, count: usize) -> Self {
        self.trusted_proxy_count = count;
        self
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Config {
            server_port: env::var("PORT")
                .or_else(|_| env::var("SERVER_PORT"))
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            storage_path: env::var("STORAGE_PATH")
                .unwrap_or_else(|_| DEFAULT_STORAGE_PATH.to_string())
                .into(),
            cors_origins,
            trusted_proxy_count: env::var("TRUSTED_PROXY_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TRUSTED_PROXY_COUNT),
            environment,
        })
    }

    /// Fail fast on misconfiguration before anything touches the disk.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("PORT must be non-zero"));
        }
        if self.storage_path.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("STORAGE_PATH must not be empty"));
        }
        Ok(())
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn trusted_proxy_count(&self) -> usize {
        self.trusted_proxy_count
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}
