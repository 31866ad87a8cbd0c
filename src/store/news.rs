use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::QueryBuilder;
use tracing::instrument;

use super::Db;

/// One stored news article. `gid` comes from the source feed and is not
/// guaranteed globally unique across appids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub gid: String,
    pub appid: i64,
    pub title: String,
    pub contents: String,
    /// Epoch seconds, source-native unit.
    pub published_at: i64,
}

/// Collection-level operations the news sync needs from the news store.
#[async_trait::async_trait]
pub trait NewsStore: Send + Sync {
    /// Drop every stored article for one appid.
    async fn delete_for_app(&self, appid: i64) -> Result<()>;
    /// Bulk insert. Must be a no-op (not an error) on an empty slice.
    async fn insert_many(&self, items: &[NewsItem]) -> Result<()>;
}

#[async_trait::async_trait]
impl NewsStore for Db {
    #[instrument(skip(self))]
    async fn delete_for_app(&self, appid: i64) -> Result<()> {
        sqlx::query("DELETE FROM game_news WHERE appid = $1")
            .bind(appid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, items))]
    async fn insert_many(&self, items: &[NewsItem]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let mut qb: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new(
            "INSERT INTO game_news (gid, appid, title, contents, published_at) ",
        );
        qb.push_values(items, |mut b, n| {
            b.push_bind(&n.gid)
                .push_bind(n.appid)
                .push_bind(&n.title)
                .push_bind(&n.contents)
                .push_bind(n.published_at);
        });
        qb.build().persistent(false).execute(&self.pool).await?;
        Ok(())
    }
}
