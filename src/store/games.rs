use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder};
use tracing::instrument;

use super::Db;

/// One row per ranked application. The whole set is rebuilt on every catalog
/// sync; only `news_count` mutates in place afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GameRecord {
    pub appid: i64,
    pub name: String,
    pub concurrent_players: i64,
    pub peak_players: i64,
    pub rank: i32,
    pub last_modified: Option<i64>,
    pub news_count: i64,
}

/// Collection-level operations the sync jobs need from the games store.
#[async_trait::async_trait]
pub trait GameStore: Send + Sync {
    async fn delete_all(&self) -> Result<()>;
    /// Bulk insert. Must be a no-op (not an error) on an empty slice.
    async fn insert_many(&self, games: &[GameRecord]) -> Result<()>;
    /// Games with `rank <= threshold` (inclusive). No ordering guarantee.
    async fn games_within_rank(&self, threshold: i32) -> Result<Vec<GameRecord>>;
    /// Partial update of the denormalized news counter for one appid.
    async fn set_news_count(&self, appid: i64, news_count: i64) -> Result<()>;
}

#[async_trait::async_trait]
impl GameStore for Db {
    #[instrument(skip(self))]
    async fn delete_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM games")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, games))]
    async fn insert_many(&self, games: &[GameRecord]) -> Result<()> {
        if games.is_empty() {
            return Ok(());
        }
        let mut qb: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new(
            "INSERT INTO games (appid, name, concurrent_players, peak_players, rank, last_modified, news_count) ",
        );
        qb.push_values(games, |mut b, g| {
            b.push_bind(g.appid)
                .push_bind(&g.name)
                .push_bind(g.concurrent_players)
                .push_bind(g.peak_players)
                .push_bind(g.rank)
                .push_bind(g.last_modified)
                .push_bind(g.news_count);
        });
        qb.build().persistent(false).execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn games_within_rank(&self, threshold: i32) -> Result<Vec<GameRecord>> {
        let rows = sqlx::query_as::<_, GameRecord>(
            "SELECT appid, name, concurrent_players, peak_players, rank, last_modified, news_count
             FROM games
             WHERE rank <= $1",
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn set_news_count(&self, appid: i64, news_count: i64) -> Result<()> {
        sqlx::query("UPDATE games SET news_count = $2, updated_at = now() WHERE appid = $1")
            .bind(appid)
            .bind(news_count)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
