use anyhow::Result;
use chrono::Utc;
use gamepulse::steam::{SteamClient, SteamConfig};
use gamepulse::store::Db;
use gamepulse::sync::NewsSynchronizer;
use gamepulse::util::env as env_util;
use gamepulse::util::log::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing("info")?;
    env_util::preflight_check(
        "sync_news",
        &["STEAM_API_KEY"],
        &[
            "NEWS_RANK_THRESHOLD",
            "NEWS_PER_GAME",
            "DATABASE_URL",
            "DB_HOST",
        ],
    )?;

    let database_url = env_util::db_url()?;
    let max_conns: u32 = env_util::env_parse("DB_MAX_CONNS", 5);
    let rank_threshold: i32 = env_util::env_parse("NEWS_RANK_THRESHOLD", 1);
    let per_game_limit: u32 = env_util::env_parse("NEWS_PER_GAME", 10_000);

    let db = Db::connect(&database_url, max_conns).await?;
    db.ensure_schema().await?;

    let steam = SteamClient::new(SteamConfig::from_env()?)?;
    let job = NewsSynchronizer::new(steam, db);

    let start = Utc::now();
    let summary = job
        .sync_news_for_top_games(rank_threshold, per_game_limit)
        .await?;
    println!(
        "[sync_news] games={} synced={} failed={} items={} elapsed_ms={} ts={}",
        summary.games,
        summary.synced,
        summary.failed,
        summary.items,
        (Utc::now() - start).num_milliseconds(),
        summary.timestamp
    );
    Ok(())
}
