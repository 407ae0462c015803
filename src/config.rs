use crate::tmdb::{POSTER_BASE, TMDB_BASE};
use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_ADDR: &str = "0.0.0.0:3146";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub image_base_url: String,
    pub language: String,
    pub bind_addr: SocketAddr,
    pub http_timeout: Duration,
}

impl Config {
    /// Defaults for everything except the API key.
    pub fn new(tmdb_api_key: impl Into<String>) -> Self {
        Self {
            tmdb_api_key: tmdb_api_key.into(),
            tmdb_base_url: TMDB_BASE.to_string(),
            image_base_url: POSTER_BASE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3146)),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.tmdb_base_url = url.into();
        self
    }

    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("Missing required environment variable: TMDB_API_KEY"))?;

        let bind_addr = optional("CINELIST_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("CINELIST_ADDR must be a socket address like 0.0.0.0:3146")?;
        let http_timeout = match optional("CINELIST_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .context("CINELIST_HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let config = Self {
            tmdb_base_url: optional("TMDB_BASE_URL").unwrap_or_else(|| TMDB_BASE.to_string()),
            image_base_url: optional("TMDB_IMAGE_BASE").unwrap_or_else(|| POSTER_BASE.to_string()),
            language: optional("TMDB_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            bind_addr,
            http_timeout,
            ..Self::new(api_key)
        };
        info!(
            "Catalog: {} (language {}), timeout {:?}",
            config.tmdb_base_url, config.language, config.http_timeout
        );
        Ok(config)
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
