//! News sync: wholesale-replace stored news for every game at or under the
//! rank threshold, one game at a time.
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::steam::NewsApi;
use crate::store::{GameStore, NewsItem, NewsStore};

pub struct NewsSynchronizer<A, S> {
    pub api: A,
    pub store: S,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSyncSummary {
    pub games: usize,
    pub synced: usize,
    pub failed: usize,
    pub items: usize,
    pub timestamp: DateTime<Utc>,
}

impl<A, S> NewsSynchronizer<A, S>
where
    A: NewsApi,
    S: GameStore + NewsStore,
{
    pub fn new(api: A, store: S) -> Self {
        Self { api, store }
    }

    /// One sequential pass over the stored games with `rank <= rank_threshold`.
    /// A failure for one appid is logged and the loop moves on; that game's
    /// stored news and counter keep their prior values. This per-game catch
    /// is the only failure containment in the pipeline.
    pub async fn sync_news_for_top_games(
        &self,
        rank_threshold: i32,
        per_game_limit: u32,
    ) -> Result<NewsSyncSummary> {
        let games = self.store.games_within_rank(rank_threshold).await?;
        info!(
            games = games.len(),
            rank_threshold, per_game_limit, "starting news sync"
        );

        let mut synced = 0usize;
        let mut failed = 0usize;
        let mut items = 0usize;
        for game in &games {
            match self.sync_game_news(game.appid, per_game_limit).await {
                Ok(count) => {
                    synced += 1;
                    items += count;
                }
                Err(e) => {
                    failed += 1;
                    warn!(appid = game.appid, error = %e, "news sync failed for game; continuing");
                }
            }
        }

        info!(synced, failed, items, "news sync finished");
        Ok(NewsSyncSummary {
            games: games.len(),
            synced,
            failed,
            items,
            timestamp: Utc::now(),
        })
    }

    /// Wholesale replace of one game's news: fetch, delete, insert, then
    /// refresh the denormalized counter. A zero-item fetch still clears the
    /// old rows and zeroes the counter; the empty insert is a store-level
    /// no-op.
    pub async fn sync_game_news(&self, appid: i64, per_game_limit: u32) -> Result<usize> {
        let fetched = self.api.news_for_app(appid, per_game_limit).await?;
        let items: Vec<NewsItem> = fetched
            .into_iter()
            .map(|n| NewsItem {
                gid: n.gid,
                appid: n.appid,
                title: n.title,
                contents: n.contents,
                published_at: n.date,
            })
            .collect();

        self.store.delete_for_app(appid).await?;
        NewsStore::insert_many(&self.store, &items).await?;
        self.store.set_news_count(appid, items.len() as i64).await?;

        Ok(items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steam::NewsEntry;
    use crate::store::GameRecord;
    use anyhow::anyhow;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    fn game(appid: i64, rank: i32, news_count: i64) -> GameRecord {
        GameRecord {
            appid,
            name: format!("Game {appid}"),
            concurrent_players: 100,
            peak_players: 200,
            rank,
            last_modified: None,
            news_count,
        }
    }

    fn entry(appid: i64, gid: &str) -> NewsEntry {
        NewsEntry {
            gid: gid.to_string(),
            title: format!("News {gid}"),
            contents: "body".to_string(),
            date: 1_700_000_100,
            appid,
        }
    }

    fn stored(appid: i64, gid: &str) -> NewsItem {
        NewsItem {
            gid: gid.to_string(),
            appid,
            title: format!("News {gid}"),
            contents: "body".to_string(),
            published_at: 1_600_000_000,
        }
    }

    struct FakeNews {
        responses: HashMap<i64, Vec<NewsEntry>>,
        fail_for: HashSet<i64>,
        calls: Mutex<Vec<(i64, u32)>>,
    }

    impl FakeNews {
        fn new(responses: HashMap<i64, Vec<NewsEntry>>) -> Self {
            Self {
                responses,
                fail_for: HashSet::new(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl NewsApi for FakeNews {
        async fn news_for_app(&self, appid: i64, count: u32) -> Result<Vec<NewsEntry>> {
            self.calls.lock().unwrap().push((appid, count));
            if self.fail_for.contains(&appid) {
                return Err(anyhow!("news endpoint 500"));
            }
            let items = self.responses.get(&appid).cloned().unwrap_or_default();
            Ok(items.into_iter().take(count as usize).collect())
        }
    }

    #[derive(Default)]
    struct MemStore {
        games: Mutex<Vec<GameRecord>>,
        news: Mutex<Vec<NewsItem>>,
    }

    impl MemStore {
        fn with_games(games: Vec<GameRecord>) -> Self {
            Self {
                games: Mutex::new(games),
                news: Mutex::new(Vec::new()),
            }
        }

        fn news_for(&self, appid: i64) -> Vec<NewsItem> {
            self.news
                .lock()
                .unwrap()
                .iter()
                .filter(|n| n.appid == appid)
                .cloned()
                .collect()
        }

        fn count_for(&self, appid: i64) -> i64 {
            self.games
                .lock()
                .unwrap()
                .iter()
                .find(|g| g.appid == appid)
                .map(|g| g.news_count)
                .unwrap_or(-1)
        }
    }

    #[async_trait::async_trait]
    impl GameStore for MemStore {
        async fn delete_all(&self) -> Result<()> {
            self.games.lock().unwrap().clear();
            Ok(())
        }

        async fn insert_many(&self, games: &[GameRecord]) -> Result<()> {
            self.games.lock().unwrap().extend_from_slice(games);
            Ok(())
        }

        async fn games_within_rank(&self, threshold: i32) -> Result<Vec<GameRecord>> {
            Ok(self
                .games
                .lock()
                .unwrap()
                .iter()
                .filter(|g| g.rank <= threshold)
                .cloned()
                .collect())
        }

        async fn set_news_count(&self, appid: i64, news_count: i64) -> Result<()> {
            for g in self.games.lock().unwrap().iter_mut() {
                if g.appid == appid {
                    g.news_count = news_count;
                }
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl NewsStore for MemStore {
        async fn delete_for_app(&self, appid: i64) -> Result<()> {
            self.news.lock().unwrap().retain(|n| n.appid != appid);
            Ok(())
        }

        async fn insert_many(&self, items: &[NewsItem]) -> Result<()> {
            self.news.lock().unwrap().extend_from_slice(items);
            Ok(())
        }
    }

    #[tokio::test]
    async fn fetches_exactly_the_games_within_threshold() {
        let store = MemStore::with_games(vec![game(10, 1, 0), game(20, 2, 0), game(30, 3, 0)]);
        let api = FakeNews::new(HashMap::new());
        let sync = NewsSynchronizer::new(api, store);

        let summary = sync.sync_news_for_top_games(2, 5).await.unwrap();

        assert_eq!(summary.games, 2);
        let calls = sync.api.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(10, 5), (20, 5)]);
    }

    #[tokio::test]
    async fn threshold_one_syncs_only_the_top_game() {
        let store = MemStore::with_games(vec![game(10, 1, 0), game(20, 2, 0)]);
        let api = FakeNews::new(HashMap::from([(
            10,
            vec![entry(10, "a1"), entry(10, "a2")],
        )]));
        let sync = NewsSynchronizer::new(api, store);

        sync.sync_news_for_top_games(1, 100).await.unwrap();

        assert_eq!(sync.api.calls.lock().unwrap().clone(), vec![(10, 100)]);
        assert_eq!(sync.store.count_for(10), 2);
        assert_eq!(sync.store.count_for(20), 0);
        assert!(sync.store.news_for(20).is_empty());
    }

    #[tokio::test]
    async fn zero_item_response_clears_rows_and_counter() {
        let store = MemStore::with_games(vec![game(10, 1, 3)]);
        store
            .news
            .lock()
            .unwrap()
            .extend(vec![stored(10, "old1"), stored(10, "old2"), stored(10, "old3")]);
        let api = FakeNews::new(HashMap::new());
        let sync = NewsSynchronizer::new(api, store);

        let summary = sync.sync_news_for_top_games(1, 50).await.unwrap();

        assert_eq!(summary.synced, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.items, 0);
        assert!(sync.store.news_for(10).is_empty());
        assert_eq!(sync.store.count_for(10), 0);
    }

    #[tokio::test]
    async fn per_game_limit_zero_is_not_an_error() {
        let store = MemStore::with_games(vec![game(10, 1, 1)]);
        store.news.lock().unwrap().push(stored(10, "old"));
        let api = FakeNews::new(HashMap::from([(10, vec![entry(10, "fresh")])]));
        let sync = NewsSynchronizer::new(api, store);

        let summary = sync.sync_news_for_top_games(1, 0).await.unwrap();

        assert_eq!(summary.failed, 0);
        assert_eq!(sync.api.calls.lock().unwrap().clone(), vec![(10, 0)]);
        assert!(sync.store.news_for(10).is_empty());
        assert_eq!(sync.store.count_for(10), 0);
    }

    #[tokio::test]
    async fn failed_game_keeps_prior_state_and_loop_continues() {
        let store = MemStore::with_games(vec![game(10, 1, 2), game(20, 2, 0)]);
        store
            .news
            .lock()
            .unwrap()
            .extend(vec![stored(10, "keep1"), stored(10, "keep2")]);
        let mut api = FakeNews::new(HashMap::from([(20, vec![entry(20, "b1")])]));
        api.fail_for.insert(10);
        let sync = NewsSynchronizer::new(api, store);

        let summary = sync.sync_news_for_top_games(2, 10).await.unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.synced, 1);
        assert_eq!(summary.items, 1);
        // Failed game untouched.
        assert_eq!(sync.store.news_for(10).len(), 2);
        assert_eq!(sync.store.count_for(10), 2);
        // Later game still processed.
        assert_eq!(sync.store.news_for(20).len(), 1);
        assert_eq!(sync.store.count_for(20), 1);
    }

    #[tokio::test]
    async fn replaces_existing_news_wholesale() {
        let store = MemStore::with_games(vec![game(10, 1, 2)]);
        store
            .news
            .lock()
            .unwrap()
            .extend(vec![stored(10, "old1"), stored(10, "old2")]);
        let api = FakeNews::new(HashMap::from([(10, vec![entry(10, "new1")])]));
        let sync = NewsSynchronizer::new(api, store);

        sync.sync_news_for_top_games(1, 10).await.unwrap();

        let rows = sync.store.news_for(10);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].gid, "new1");
        assert_eq!(rows[0].published_at, 1_700_000_100);
        assert_eq!(sync.store.count_for(10), 1);
    }
}
