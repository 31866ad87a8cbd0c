//! Catalog sync: rebuild the stored game snapshot from the ranking and
//! catalog feeds. Runs before the news sync, which depends on stored ranks.
use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::steam::{AppEntry, ChartsApi, RankedEntry};
use crate::store::{GameRecord, GameStore};

pub struct CatalogSynchronizer<A, S> {
    pub api: A,
    pub store: S,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSyncSummary {
    pub ranked: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub stored: usize,
    pub timestamp: DateTime<Utc>,
}

/// Name used when a ranked appid has no catalog entry.
pub fn placeholder_name(appid: i64) -> String {
    format!("Unknown Game ({appid})")
}

/// Index the catalog by appid. Built once per run; the catalog can run to
/// tens of thousands of entries, the ranked list stays bounded.
pub fn index_catalog(catalog: &[AppEntry]) -> HashMap<i64, &AppEntry> {
    catalog.iter().map(|a| (a.appid, a)).collect()
}

/// Join each ranked entry with its catalog row. Misses fall back to the
/// placeholder name with no timestamp. Matches coalesce field by field the
/// same way: the catalog carries unnamed apps, which get the placeholder,
/// and a `last_modified` of 0 is stored as None. `news_count` starts at 0
/// either way.
pub fn join_ranked_with_catalog(
    ranked: &[RankedEntry],
    catalog: &HashMap<i64, &AppEntry>,
) -> Vec<GameRecord> {
    ranked
        .iter()
        .map(|r| {
            let (name, last_modified) = match catalog.get(&r.appid) {
                Some(app) => {
                    let name = if app.name.is_empty() {
                        placeholder_name(r.appid)
                    } else {
                        app.name.clone()
                    };
                    (name, app.last_modified.filter(|&ts| ts != 0))
                }
                None => (placeholder_name(r.appid), None),
            };
            GameRecord {
                appid: r.appid,
                name,
                concurrent_players: r.concurrent_in_game,
                peak_players: r.peak_in_game,
                rank: r.rank,
                last_modified,
                news_count: 0,
            }
        })
        .collect()
}

impl<A, S> CatalogSynchronizer<A, S>
where
    A: ChartsApi,
    S: GameStore,
{
    pub fn new(api: A, store: S) -> Self {
        Self { api, store }
    }

    /// Full wholesale rebuild. Both fetches complete before the destructive
    /// delete, so an upstream failure leaves the stored set untouched. The
    /// delete and insert are not wrapped in a transaction; a crash between
    /// them leaves the collection empty until the next run.
    pub async fn sync_top_games(&self) -> Result<CatalogSyncSummary> {
        let ranked = self.api.top_games_by_concurrent_players().await?;
        let catalog = self.api.app_list().await?;

        let index = index_catalog(&catalog);
        let matched = ranked
            .iter()
            .filter(|r| index.contains_key(&r.appid))
            .count();
        let games = join_ranked_with_catalog(&ranked, &index);

        self.store.delete_all().await?;
        self.store.insert_many(&games).await?;

        info!(
            stored = games.len(),
            matched,
            unmatched = games.len() - matched,
            "game snapshot rebuilt"
        );

        Ok(CatalogSyncSummary {
            ranked: ranked.len(),
            matched,
            unmatched: games.len() - matched,
            stored: games.len(),
            timestamp: Utc::now(),
        })
    }
}
