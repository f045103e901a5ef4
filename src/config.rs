use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com/v2.6";
pub const DEFAULT_SEARCH_URL: &str = "http://localhost:9200";
pub const DEFAULT_GA_COLLECT_URL: &str = "https://www.google-analytics.com/collect";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SEARCH_RESULT_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub verify_token: String,
    pub page_access_token: String,
    pub graph_url: String,
    pub search_url: String,
    pub search_result_size: usize,
    pub http_timeout: Option<Duration>,
    pub ga_tracking_id: Option<String>,
    pub ga_collect_url: String,
    pub bind_addr: String,
}

impl Config {
    /// Reads configuration from the process environment, loading a `.env`
    /// file first if one is present.
    pub fn from_env() -> Result<Config, ConfigError> {
        dotenv().ok();
        Ok(Config {
            verify_token: get_env("FB_VERIFY_TOKEN")?,
            page_access_token: get_env("FB_PAGE_ACCESS_TOKEN")?,
            graph_url: get_env_or_default("FB_GRAPH_URL", DEFAULT_GRAPH_URL),
            search_url: get_env_or_default("SEARCH_URL", DEFAULT_SEARCH_URL),
            search_result_size: parse_env("SEARCH_RESULT_SIZE")?
                .unwrap_or(DEFAULT_SEARCH_RESULT_SIZE),
            http_timeout: parse_env("HTTP_TIMEOUT_SECS")?.map(Duration::from_secs),
            ga_tracking_id: get_optional_env("GA_TRACKING_ID"),
            ga_collect_url: get_env_or_default("GA_COLLECT_URL", DEFAULT_GA_COLLECT_URL),
            bind_addr: get_env_or_default("BIND_ADDR", DEFAULT_BIND_ADDR),
        })
    }

    /// Builds the shared outbound HTTP client. Without a configured timeout
    /// reqwest's defaults apply.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.http_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

fn get_env(key: &'static str) -> Result<String, ConfigError> {
    get_optional_env(key).ok_or(ConfigError::Missing(key))
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn get_optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match get_optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(None),
    }
}
