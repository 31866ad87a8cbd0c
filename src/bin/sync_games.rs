use anyhow::Result;
use chrono::Utc;
use gamepulse::steam::{SteamClient, SteamConfig};
use gamepulse::store::Db;
use gamepulse::sync::CatalogSynchronizer;
use gamepulse::util::env as env_util;
use gamepulse::util::log::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing("info")?;
    env_util::preflight_check(
        "sync_games",
        &["STEAM_API_KEY"],
        &[
            "STEAM_API_BASE_URL",
            "DATABASE_URL",
            "DB_HOST",
            "DB_MAX_CONNS",
        ],
    )?;

    let database_url = env_util::db_url()?;
    let max_conns: u32 = env_util::env_parse("DB_MAX_CONNS", 5);
    let db = Db::connect(&database_url, max_conns).await?;
    db.ensure_schema().await?;

    let steam = SteamClient::new(SteamConfig::from_env()?)?;
    let job = CatalogSynchronizer::new(steam, db);

    let start = Utc::now();
    let summary = job.sync_top_games().await?;
    println!(
        "[sync_games] ranked={} matched={} unmatched={} stored={} elapsed_ms={} ts={}",
        summary.ranked,
        summary.matched,
        summary.unmatched,
        summary.stored,
        (Utc::now() - start).num_milliseconds(),
        summary.timestamp
    );
    Ok(())
}
