use anyhow::Result;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::Row;
use std::str::FromStr;

use crate::util::env as env_util;

#[derive(Debug, Clone, Default)]
pub struct DbCountsConfig {
    /// Optional override for the Postgres connection string.
    pub database_url: Option<String>,
    /// Override the top-games LIMIT (defaults to env TOP_GAMES_LIMIT or 10).
    pub top_games_limit: Option<i64>,
}

pub async fn run(cfg: DbCountsConfig) -> Result<()> {
    env_util::init_env();
    let db_url = match cfg.database_url.clone() {
        Some(url) => url,
        None => env_util::db_url()?,
    };
    let mut connect_options = PgConnectOptions::from_str(&db_url)?.statement_cache_capacity(0);
    if db_url.contains("sslmode=require") {
        connect_options = connect_options.ssl_mode(PgSslMode::Require);
    }
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_with(connect_options)
        .await?;

    fn is_undefined_table_error(err: &sqlx::Error) -> bool {
        match err {
            sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("42P01"),
            _ => false,
        }
    }

    // Missing tables just mean the sync jobs have not run yet; report 0.
    macro_rules! count {
        ($sql:expr) => {
            match sqlx::query_scalar::<_, i64>($sql)
                .persistent(false)
                .fetch_one(&pool)
                .await
            {
                Ok(val) => val,
                Err(e) if is_undefined_table_error(&e) => 0,
                Err(e) => return Err(e.into()),
            }
        };
    }

    let games = count!("SELECT count(*) FROM games");
    let games_with_news = count!("SELECT count(*) FROM games WHERE news_count > 0");
    let news = count!("SELECT count(*) FROM game_news");
    let news_appids = count!("SELECT count(DISTINCT appid) FROM game_news");

    use std::fmt::Write as _;
    let mut out = String::new();
    writeln!(out, "DB COUNTS SUMMARY:").ok();
    writeln!(out, "games: {games} (with news: {games_with_news})").ok();
    writeln!(out, "game_news: {news} (distinct appids: {news_appids})").ok();
    println!("{}", out);

    let limit = cfg
        .top_games_limit
        .unwrap_or_else(|| env_util::env_parse("TOP_GAMES_LIMIT", 10));
    let rows = match sqlx::query(
        "SELECT rank, appid, name, concurrent_players, news_count FROM games ORDER BY rank ASC LIMIT $1",
    )
    .persistent(false)
    .bind(limit)
    .fetch_all(&pool)
    .await
    {
        Ok(rows) => rows,
        Err(e) if is_undefined_table_error(&e) => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    if !rows.is_empty() {
        println!("top {} by rank:", rows.len());
        for r in rows {
            let rank: i32 = r.try_get("rank").unwrap_or_default();
            let appid: i64 = r.try_get("appid").unwrap_or_default();
            let name: String = r.try_get("name").unwrap_or_default();
            let concurrent: i64 = r.try_get("concurrent_players").unwrap_or_default();
            let news_count: i64 = r.try_get("news_count").unwrap_or_default();
            println!("  #{rank:<3} {appid:>8}  {name}  players={concurrent} news={news_count}");
        }
    }

    Ok(())
}
