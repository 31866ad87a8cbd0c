use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gamepulse::cli::db_counts::{run as db_counts_run, DbCountsConfig};
use gamepulse::steam::{SteamClient, SteamConfig};
use gamepulse::store::Db;
use gamepulse::sync::{CatalogSynchronizer, NewsSynchronizer};
use gamepulse::util::env as env_util;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gp", version, about = "GamePulse admin CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Rebuild the games snapshot from the Steam charts and app list
    SyncGames {
        /// Optional override for the database URL
        #[arg(long)]
        db_url: Option<String>,
    },
    /// Refresh news for stored games up to the rank threshold
    SyncNews {
        /// Optional override for the database URL
        #[arg(long)]
        db_url: Option<String>,
        /// Sync news for games with rank <= this value (default env NEWS_RANK_THRESHOLD or 1)
        #[arg(long)]
        rank_threshold: Option<i32>,
        /// Maximum news items fetched per game (default env NEWS_PER_GAME or 10000)
        #[arg(long)]
        per_game_limit: Option<u32>,
    },
    /// Print row counts for the games and game_news tables
    DbCounts {
        /// Optional override for the database URL
        #[arg(long)]
        db_url: Option<String>,
        /// Override TOP_GAMES_LIMIT (defaults to env/10)
        #[arg(long)]
        top_games_limit: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Commands::SyncGames { db_url } => {
            let database_url = resolve_database_url(db_url)?;
            info!(url = %redact_postgres_url(&database_url), "sync-games: connecting");
            let db = connect(&database_url).await?;
            let steam = SteamClient::new(SteamConfig::from_env()?)?;
            let job = CatalogSynchronizer::new(steam, db);
            let summary = job.sync_top_games().await?;
            info!(
                ranked = summary.ranked,
                matched = summary.matched,
                unmatched = summary.unmatched,
                stored = summary.stored,
                timestamp = %summary.timestamp,
                "sync-games: completed"
            );
        }
        Commands::SyncNews {
            db_url,
            rank_threshold,
            per_game_limit,
        } => {
            let database_url = resolve_database_url(db_url)?;
            info!(url = %redact_postgres_url(&database_url), "sync-news: connecting");
            let db = connect(&database_url).await?;
            let rank_threshold =
                rank_threshold.unwrap_or_else(|| env_util::env_parse("NEWS_RANK_THRESHOLD", 1));
            let per_game_limit =
                per_game_limit.unwrap_or_else(|| env_util::env_parse("NEWS_PER_GAME", 10_000));
            let steam = SteamClient::new(SteamConfig::from_env()?)?;
            let job = NewsSynchronizer::new(steam, db);
            let summary = job
                .sync_news_for_top_games(rank_threshold, per_game_limit)
                .await?;
            info!(
                games = summary.games,
                synced = summary.synced,
                failed = summary.failed,
                items = summary.items,
                timestamp = %summary.timestamp,
                "sync-news: completed"
            );
        }
        Commands::DbCounts {
            db_url,
            top_games_limit,
        } => {
            let cfg = DbCountsConfig {
                database_url: db_url,
                top_games_limit,
            };
            db_counts_run(cfg).await?;
        }
    }

    Ok(())
}

async fn connect(database_url: &str) -> Result<Db> {
    let max_conns: u32 = env_util::env_parse("DB_MAX_CONNS", 5);
    let db = Db::connect(database_url, max_conns).await?;
    db.ensure_schema().await?;
    Ok(db)
}

fn resolve_database_url(db_url: Option<String>) -> Result<String> {
    if let Some(url) = db_url {
        let trimmed = url.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    let env_url =
        env_util::db_url().with_context(|| "resolve_database_url: missing database URL")?;
    let trimmed = env_url.trim();
    if trimmed.is_empty() {
        bail!("database URL is empty; set DATABASE_URL / DB_URL or pass --db-url");
    }
    Ok(trimmed.to_string())
}

fn redact_postgres_url(raw: &str) -> String {
    // Keep host/port/db visible for debugging; hide credentials.
    let raw = raw.trim();
    match url::Url::parse(raw) {
        Ok(mut u) => {
            let scheme = u.scheme().to_ascii_lowercase();
            if scheme == "postgres" || scheme == "postgresql" {
                let _ = u.set_username("***");
                let _ = u.set_password(Some("***"));
            }
            u.to_string()
        }
        Err(_) => match raw.split_once('@') {
            Some((_, rest)) if raw.starts_with("postgres") => format!("postgres://***@{rest}"),
            _ => raw.to_string(),
        },
    }
}
