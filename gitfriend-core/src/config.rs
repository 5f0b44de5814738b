use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct GitFriendConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub oracle: OracleConfig,
    #[serde(default)]
    pub github: GitHubApiConfig,
    #[serde(default)]
    pub trending: TrendingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OracleConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitHubApiConfig {
    pub per_page: u32,
    pub timeout_seconds: u64,
}

impl Default for GitHubApiConfig {
    fn default() -> Self {
        Self {
            per_page: 10,
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrendingConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://github-trending-api.de.a9sapp.eu".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl GitFriendConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }
}
