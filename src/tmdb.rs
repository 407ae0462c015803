use crate::catalog::CatalogSource;
use crate::config::Config;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Entry, PageIndex, RawEntry};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";
pub const POSTER_BASE: &str = "https://image.tmdb.org/t/p/original";

const MAX_ERROR_BODY: usize = 512;

/// TMDB-backed listing of popular movies.
#[derive(Debug, Clone)]
pub struct TmdbCatalog {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct PopularResponse {
    #[serde(default)]
    results: Vec<RawEntry>,
}

impl TmdbCatalog {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let user_agent = format!("cinelist/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.http_timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            base_url: config.tmdb_base_url.trim_end_matches('/').to_string(),
            api_key: config.tmdb_api_key.clone(),
            language: config.language.clone(),
        })
    }

    fn popular_path(&self, page: PageIndex) -> String {
        format!(
            "/movie/popular?language={}&page={}",
            urlencoding::encode(&self.language),
            page
        )
    }

    // `path` is logged; the API key is appended only to the outgoing URL.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> CatalogResult<T> {
        let url = format!("{}{}&api_key={}", self.base_url, path, self.api_key);
        debug!("GET {}", path);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::Network(format!("{path}: {}", e.without_url())))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| CatalogError::Network(format!("reading body failed: {}", e.without_url())))?;
        if !status.is_success() {
            let mut message = text;
            message.truncate(floor_char_boundary(&message, MAX_ERROR_BODY));
            return Err(CatalogError::Service {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_str(&text)
            .map_err(|e| CatalogError::InvalidResponse(format!("{path}: {e}")))
    }
}

#[async_trait]
impl CatalogSource for TmdbCatalog {
    async fn popular_page(&self, page: PageIndex) -> CatalogResult<Vec<Entry>> {
        let data: PopularResponse = self.get_json(&self.popular_path(page)).await?;
        Ok(into_entries(data.results))
    }
}

/// Rows without an id can never join the watchlist, so they are dropped here.
fn into_entries(rows: Vec<RawEntry>) -> Vec<Entry> {
    rows.into_iter()
        .filter_map(|raw| match Entry::try_from(raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping catalog row: {}", e);
                None
            }
        })
        .collect()
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0)
}
