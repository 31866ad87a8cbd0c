//! Postgres-backed snapshot store: one table for ranked games, one for
//! per-game news. Both are wholesale-replaced by the sync jobs.
use anyhow::Result;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    PgPool,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

pub mod games;
pub mod news;

pub use games::{GameRecord, GameStore};
pub use news::{NewsItem, NewsStore};

#[derive(Clone)]
pub struct Db {
    pub pool: PgPool,
}

impl Db {
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let mut connect_options = PgConnectOptions::from_str(database_url)?;

        // Be explicit about TLS when the DSN asks for it.
        if database_url.contains("sslmode=require") {
            connect_options = connect_options.ssl_mode(PgSslMode::Require);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(connect_options)
            .await?;
        info!("connected to db");
        Ok(Self { pool })
    }

    /// Create the snapshot tables and indexes if missing. Idempotent; the job
    /// binaries call this on startup so a fresh database needs no manual setup.
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS games (
                id                 BIGSERIAL PRIMARY KEY,
                appid              BIGINT NOT NULL,
                name               TEXT NOT NULL,
                concurrent_players BIGINT NOT NULL,
                peak_players       BIGINT NOT NULL,
                rank               INT NOT NULL,
                last_modified      BIGINT,
                news_count         BIGINT NOT NULL DEFAULT 0,
                updated_at         TIMESTAMPTZ NOT NULL DEFAULT now()
             );
             CREATE INDEX IF NOT EXISTS idx_games_rank ON games(rank);
             CREATE INDEX IF NOT EXISTS idx_games_appid ON games(appid);",
        )
        .execute(&self.pool)
        .await?;

        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS game_news (
                id           BIGSERIAL PRIMARY KEY,
                gid          TEXT NOT NULL,
                appid        BIGINT NOT NULL,
                title        TEXT NOT NULL,
                contents     TEXT NOT NULL,
                published_at BIGINT NOT NULL,
                created_at   TIMESTAMPTZ NOT NULL DEFAULT now()
             );
             CREATE INDEX IF NOT EXISTS idx_game_news_appid ON game_news(appid);",
        )
        .execute(&self.pool)
        .await?;

        info!("schema ensured");
        Ok(())
    }
}
