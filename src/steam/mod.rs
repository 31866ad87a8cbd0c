//! Steam Web API client for the three read-only endpoints the sync jobs use.
//! Public API (base): https://api.steampowered.com/
//!
//! Key endpoints:
//! - GET /ISteamChartsService/GetGamesByConcurrentPlayers/v1/ - current most-played ranking
//! - GET /IStoreService/GetAppList/v1/ - full app catalog (appid, name, last_modified)
//! - GET /ISteamNews/GetNewsForApp/v2/ - recent news items for one app
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::info;

use crate::util::env::{env_opt, env_parse, env_req};

fn truncate_for_log(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        // Error bodies are arbitrary UTF-8; max_len can land mid-character.
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("…");
    }
    s
}

/// Connection settings, sourced from the environment and passed in at
/// construction time. The API key is never baked into the binary.
#[derive(Debug, Clone)]
pub struct SteamConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl SteamConfig {
    /// `STEAM_API_KEY` is required; base URL and timeout have defaults.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_key: env_req("STEAM_API_KEY")?,
            base_url: env_opt("STEAM_API_BASE_URL")
                .unwrap_or_else(|| "https://api.steampowered.com".to_string()),
            timeout_secs: env_parse("STEAM_HTTP_TIMEOUT_SECS", 15),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SteamClient {
    base_url: String,
    http: Client,
    api_key: String,
}

/// One entry of the most-played ranking (rank 1 = most concurrent players).
#[derive(Debug, Clone, Deserialize)]
pub struct RankedEntry {
    pub rank: i32,
    pub appid: i64,
    #[serde(default)]
    pub concurrent_in_game: i64,
    #[serde(default)]
    pub peak_in_game: i64,
}

#[derive(Debug, Deserialize)]
struct ChartsEnvelope {
    response: ChartsBody,
}

#[derive(Debug, Deserialize)]
struct ChartsBody {
    #[serde(default)]
    ranks: Vec<RankedEntry>,
}

/// One catalog entry from the full app list. `name` decodes to an empty
/// string when the feed omits it.
#[derive(Debug, Clone, Deserialize)]
pub struct AppEntry {
    pub appid: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub last_modified: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AppListEnvelope {
    response: AppListBody,
}

#[derive(Debug, Deserialize)]
struct AppListBody {
    #[serde(default)]
    apps: Vec<AppEntry>,
}

/// One news article as served by the news endpoint. `date` is epoch seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsEntry {
    #[serde(default)]
    pub gid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub contents: String,
    #[serde(default)]
    pub date: i64,
    pub appid: i64,
}

#[derive(Debug, Deserialize)]
struct NewsEnvelope {
    appnews: AppNews,
}

#[derive(Debug, Deserialize)]
struct AppNews {
    #[serde(default)]
    newsitems: Vec<NewsEntry>,
}

/// Ranking + catalog feeds consumed by the catalog sync.
#[async_trait::async_trait]
pub trait ChartsApi: Send + Sync {
    /// Current most-played ranking, ordered by rank (typically top 100).
    async fn top_games_by_concurrent_players(&self) -> Result<Vec<RankedEntry>>;
    /// Full application catalog; can run to tens of thousands of entries.
    async fn app_list(&self) -> Result<Vec<AppEntry>>;
}

/// Per-app news feed consumed by the news sync.
#[async_trait::async_trait]
pub trait NewsApi: Send + Sync {
    /// Up to `count` recent news items for one appid.
    async fn news_for_app(&self, appid: i64, count: u32) -> Result<Vec<NewsEntry>>;
}

impl SteamClient {
    pub fn new(config: SteamConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let http = Client::builder()
            .user_agent("gamepulse/0.1")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            http,
            api_key: config.api_key,
        })
    }
}

#[async_trait::async_trait]
impl ChartsApi for SteamClient {
    async fn top_games_by_concurrent_players(&self) -> Result<Vec<RankedEntry>> {
        let url = format!(
            "{}/ISteamChartsService/GetGamesByConcurrentPlayers/v1/",
            self.base_url
        );
        // The endpoint wants its options as a JSON-encoded query parameter.
        // We request the extended payload; downstream only keeps the rank tuple.
        let input_json = json!({
            "data_request": {
                "include_release": true,
                "include_reviews": true,
                "include_full_description": true
            }
        })
        .to_string();

        let resp = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .query(&[("key", self.api_key.clone()), ("input_json", input_json)])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), 2000);
            return Err(anyhow!(
                "steam charts fetch failed: {status} url={url} body={body}"
            ));
        }

        let body: ChartsEnvelope = resp.json().await?;
        info!(
            ranks = body.response.ranks.len(),
            "fetched concurrent-player ranking"
        );
        Ok(body.response.ranks)
    }

    async fn app_list(&self) -> Result<Vec<AppEntry>> {
        let url = format!("{}/IStoreService/GetAppList/v1/", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), 2000);
            return Err(anyhow!(
                "steam app list fetch failed: {status} url={url} body={body}"
            ));
        }

        let body: AppListEnvelope = resp.json().await?;
        info!(apps = body.response.apps.len(), "fetched app catalog");
        Ok(body.response.apps)
    }
}

#[async_trait::async_trait]
impl NewsApi for SteamClient {
    async fn news_for_app(&self, appid: i64, count: u32) -> Result<Vec<NewsEntry>> {
        let url = format!("{}/ISteamNews/GetNewsForApp/v2/", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .query(&[
                ("key", self.api_key.clone()),
                ("appid", appid.to_string()),
                ("count", count.to_string()),
            ])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), 2000);
            return Err(anyhow!(
                "steam news fetch failed: {status} url={url} appid={appid} body={body}"
            ));
        }

        let body: NewsEnvelope = resp.json().await?;
        Ok(body.appnews.newsitems)
    }
}
