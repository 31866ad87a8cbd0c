//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::str::FromStr;
use std::sync::Once;
use tracing::info;

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        let _ = dotenv::dotenv();
    });
}

/// Get required env var; error if missing.
pub fn env_req(key: &str) -> anyhow::Result<String> {
    init_env();
    std::env::var(key).map_err(|_| anyhow::anyhow!("missing env var {key}"))
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Clone,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Database URL resolution (tries explicit -> composed). Returns first found.
pub fn db_url() -> anyhow::Result<String> {
    init_env();
    for k in ["DATABASE_URL", "DB_URL"] {
        if let Some(v) = env_opt(k) {
            return Ok(v);
        }
    }

    // Fall back to composing from individual DB_* variables.
    if let Some(dsn) = build_dsn_from_db_vars() {
        return Ok(dsn);
    }

    Err(anyhow::anyhow!(
        "no database URL env vars set (DATABASE_URL, DB_URL, or DB_HOST/DB_USERNAME/...)"
    ))
}

fn build_dsn_from_db_vars() -> Option<String> {
    let host = env_opt("DB_HOST")?;
    let user = env_opt("DB_USERNAME")?;
    let password = env_opt("DB_PASSWORD");
    let database = env_opt("DB_DATABASE").unwrap_or_else(|| "postgres".into());
    let port = env_opt("DB_PORT").unwrap_or_else(|| "5432".into());
    let ssl_mode = env_opt("DB_SSLMODE").unwrap_or_else(|| "prefer".into());

    let port_u16: u16 = port.parse::<u16>().unwrap_or(5432);

    // The password may contain reserved URL characters; build via `url::Url`
    // so username/password are percent-encoded safely.
    let mut out = url::Url::parse("postgresql://localhost").ok()?;
    out.set_username(&user).ok()?;
    if let Some(pass) = password {
        out.set_password(Some(&pass)).ok()?;
    }
    out.set_host(Some(host.trim())).ok()?;
    out.set_port(Some(port_u16)).ok()?;
    out.set_path(&format!("/{database}"));

    if ssl_mode != "disable" {
        out.query_pairs_mut().append_pair("sslmode", &ssl_mode);
    }

    Some(out.to_string())
}

fn redact_value(key: &str, val: &str) -> String {
    let k = key.to_ascii_uppercase();
    if k.contains("PASSWORD") || k.contains("SECRET") || k.contains("KEY") || k.contains("TOKEN") {
        return "***".to_string();
    }

    let val_trim = val.trim();

    // Always redact postgres DSNs even if the key isn't obviously sensitive.
    if let Ok(mut u) = url::Url::parse(val_trim) {
        let scheme = u.scheme().to_ascii_lowercase();
        if scheme == "postgres" || scheme == "postgresql" {
            let _ = u.set_username("***");
            let _ = u.set_password(Some("***"));
            return u.to_string();
        }
    }

    val_trim.to_string()
}

/// Validate required keys and log a consolidated, redacted snapshot of configuration.
/// Returns error if any required key is missing.
pub fn preflight_check(title: &str, required: &[&str], also_log: &[&str]) -> anyhow::Result<()> {
    init_env();
    let mut missing: Vec<&str> = Vec::new();
    for &k in required {
        if env_opt(k).is_none() {
            missing.push(k);
        }
    }
    let mut snapshot: Vec<(String, String)> = Vec::new();
    for &k in also_log {
        let v = env_opt(k).unwrap_or_default();
        snapshot.push((k.to_string(), redact_value(k, &v)));
    }
    info!(target = "preflight", title, snapshot = ?snapshot, "configuration snapshot");
    if !missing.is_empty() {
        return Err(anyhow::anyhow!(format!(
            "missing required env: {:?}",
            missing
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_sensitive_keys() {
        assert_eq!(redact_value("STEAM_API_KEY", "abc123"), "***");
        assert_eq!(redact_value("DB_PASSWORD", "hunter2"), "***");
        assert_eq!(redact_value("DB_MAX_CONNS", "5"), "5");
    }

    #[test]
    fn redacts_postgres_dsn_credentials() {
        let out = redact_value("DATABASE_URL", "postgresql://user:pw@db.example.com:5432/games");
        assert!(!out.contains("user"));
        assert!(!out.contains("pw@"));
        assert!(out.contains("db.example.com"));
    }
}
